use chrono::Local;
use std::path::{Path, PathBuf};

use super::{build_runtime, load_config};
use crate::error::Result;
use crate::models::{ProviderKind, ReportConfig};
use crate::pipeline::{run_report, RunSummary};
use crate::services::{VciClient, YahooClient};

pub fn run(config_path: Option<PathBuf>, output_dir: Option<PathBuf>) {
    println!("🚀 Daily Portfolio Report: START");
    println!("⏰ Started at: {}", Local::now().format("%Y-%m-%d %H:%M:%S"));

    let config = match load_config(config_path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ {}", e);
            std::process::exit(1);
        }
    };

    let output_dir = output_dir.unwrap_or_else(|| config.output_dir.clone());
    println!(
        "📋 {} holdings via {}, {} day lookback",
        config.holdings.len(),
        config.provider.name(),
        config.lookback_days
    );
    println!("📁 Output directory: {}", output_dir.display());

    let runtime = match build_runtime() {
        Ok(r) => r,
        Err(e) => {
            eprintln!("❌ {}", e);
            std::process::exit(1);
        }
    };

    let today = Local::now().date_naive();
    match runtime.block_on(generate(&config, &output_dir, today)) {
        Ok(summary) => print_summary(&summary),
        Err(e) => {
            eprintln!("\n❌ Report failed: {}", e);
            std::process::exit(1);
        }
    }
}

async fn generate(
    config: &ReportConfig,
    output_dir: &Path,
    today: chrono::NaiveDate,
) -> Result<RunSummary> {
    match config.provider {
        ProviderKind::Yahoo => {
            let mut provider = YahooClient::new(config.rate_limit_per_minute)?;
            run_report(&mut provider, config, output_dir, today).await
        }
        ProviderKind::Vci => {
            let mut provider = VciClient::new(config.rate_limit_per_minute)?;
            run_report(&mut provider, config, output_dir, today).await
        }
    }
}

fn print_summary(summary: &RunSummary) {
    if !summary.warnings.is_empty() {
        println!("\n⚠️  {} fetch warnings:", summary.warnings.len());
        for warning in &summary.warnings {
            println!("   - {}", warning);
        }
    }

    println!("\n📊 Charts: {}/{}", summary.generated_charts(), summary.charts.len());
    for chart in &summary.charts {
        match &chart.result {
            Ok(path) => println!("   ✅ {}", path.display()),
            Err(e) => println!("   ⏭️  {} skipped: {}", chart.kind.file_name(), e),
        }
    }

    println!("📧 Report: {}", summary.report_path.display());
    println!("\n✅ Daily report generated with charts and email summary.");
}
