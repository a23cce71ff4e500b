use chrono::Local;
use std::path::PathBuf;

use super::{build_runtime, load_config};
use crate::constants::REPORTING_UNIT_LABEL;
use crate::error::Result;
use crate::models::{Mover, ProviderKind, ReportConfig};
use crate::pipeline::{fetch_and_analyze, Analysis};
use crate::report::session_label;
use crate::services::{VciClient, YahooClient};
use crate::utils::{format_optional, format_thousands};

/// Fetch and print the ranked and sector tables without writing files
pub fn run(config_path: Option<PathBuf>) {
    let config = match load_config(config_path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ {}", e);
            std::process::exit(1);
        }
    };

    let runtime = match build_runtime() {
        Ok(r) => r,
        Err(e) => {
            eprintln!("❌ {}", e);
            std::process::exit(1);
        }
    };

    let today = Local::now().date_naive();
    match runtime.block_on(analyze(&config, today)) {
        Ok(analysis) => print!("{}", render_tables(&analysis, &config.currency_symbol)),
        Err(e) => {
            eprintln!("❌ {}", e);
            std::process::exit(1);
        }
    }
}

async fn analyze(config: &ReportConfig, today: chrono::NaiveDate) -> Result<Analysis> {
    let analysis = match config.provider {
        ProviderKind::Yahoo => {
            let mut provider = YahooClient::new(config.rate_limit_per_minute)?;
            fetch_and_analyze(&mut provider, config, today).await
        }
        ProviderKind::Vci => {
            let mut provider = VciClient::new(config.rate_limit_per_minute)?;
            fetch_and_analyze(&mut provider, config, today).await
        }
    };
    Ok(analysis)
}

fn mover_lines(out: &mut String, movers: &[Mover], currency_symbol: &str) {
    if movers.is_empty() {
        out.push_str("   (no data)\n");
    }
    for m in movers {
        out.push_str(&format!(
            "   {:<16} {}{:>12}  {:>+7.2}%\n",
            m.ticker,
            currency_symbol,
            format_thousands(m.close, 2),
            m.change * 100.0
        ));
    }
}

/// Plain-text rendering of the ranked, sector and movers tables
pub fn render_tables(analysis: &Analysis, currency_symbol: &str) -> String {
    let mut out = String::new();

    out.push_str(&format!(
        "📈 Market Cap ({} {})\n",
        currency_symbol, REPORTING_UNIT_LABEL
    ));
    out.push_str(&format!("{:>3}  {:<16} {:>16}  {}\n", "#", "Stock", "Market Cap", "Sector"));
    for entry in &analysis.ranked {
        out.push_str(&format!(
            "{:>3}  {:<16} {:>16}  {}\n",
            entry.rank,
            entry.ticker,
            format_optional(entry.market_cap, 1),
            entry.sector
        ));
    }

    out.push_str("\n🏷️  Sector Allocation\n");
    if analysis.sectors.is_empty() {
        out.push_str("   (no market cap data)\n");
    } else {
        out.push_str(&format!("{:>3}  {:<24} {:>16}  {:>8}\n", "#", "Sector", "Market Cap", "Alloc %"));
        for row in &analysis.sectors.rows {
            out.push_str(&format!(
                "{:>3}  {:<24} {:>16}  {:>7.2}%\n",
                row.rank,
                row.sector,
                format_thousands(row.market_cap, 1),
                row.percentage
            ));
        }
    }
    if !analysis.sectors.unallocated.is_empty() {
        out.push_str(&format!(
            "   Without market cap: {}\n",
            analysis.sectors.unallocated.join(", ")
        ));
    }

    let session = session_label(analysis.movers.session);
    out.push_str(&format!("\n🟢 Top Gainers ({})\n", session));
    mover_lines(&mut out, &analysis.movers.gainers, currency_symbol);
    out.push_str(&format!("\n🔴 Top Losers ({})\n", session));
    mover_lines(&mut out, &analysis.movers.losers, currency_symbol);

    out
}
