//! The daily run: fetch, compute tables, render charts, compose the report

use chrono::NaiveDate;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::charts::{self, ChartInputs, ChartOutcome};
use crate::error::Result;
use crate::models::{FetchWarning, FetchedPortfolio, Movers, RankedEntry, ReportConfig, SectorAllocation};
use crate::report::{self, ReportContext};
use crate::services::{
    daily_returns, fetch_portfolio, rank_by_market_cap, sector_allocation, top_movers,
    MarketDataProvider, ReturnTable,
};
use crate::utils::ensure_output_dir;

/// Tables derived from one fetch
#[derive(Debug, Clone)]
pub struct Analysis {
    pub fetched: FetchedPortfolio,
    pub returns: ReturnTable,
    pub ranked: Vec<RankedEntry>,
    pub sectors: SectorAllocation,
    pub movers: Movers,
}

/// Compute returns, ranking, sector allocation and movers
pub fn analyze(fetched: FetchedPortfolio, movers_limit: usize) -> Analysis {
    let series: Vec<_> = fetched.prices.iter().map(daily_returns).collect();
    let returns = ReturnTable::build(&series);
    let ranked = rank_by_market_cap(&fetched.entries);
    let sectors = sector_allocation(&fetched.entries);
    let movers = top_movers(&fetched.prices, movers_limit);

    info!(
        "Analysis: {} return rows x {} dates, {} sectors, {} gainers, {} losers",
        returns.rows.len(),
        returns.dates.len(),
        sectors.rows.len(),
        movers.gainers.len(),
        movers.losers.len()
    );

    Analysis {
        fetched,
        returns,
        ranked,
        sectors,
        movers,
    }
}

/// Fetch every holding and compute the tables
pub async fn fetch_and_analyze<P: MarketDataProvider>(
    provider: &mut P,
    config: &ReportConfig,
    today: NaiveDate,
) -> Analysis {
    let fetched = fetch_portfolio(provider, config, today).await;
    analyze(fetched, config.movers_limit)
}

/// What a report run produced
#[derive(Debug)]
pub struct RunSummary {
    pub report_path: PathBuf,
    pub charts: Vec<ChartOutcome>,
    pub warnings: Vec<FetchWarning>,
}

impl RunSummary {
    pub fn generated_charts(&self) -> usize {
        self.charts.iter().filter(|c| c.is_generated()).count()
    }
}

/// Render charts and the HTML report for an analysis into `output_dir`
pub fn write_outputs(
    analysis: &Analysis,
    config: &ReportConfig,
    output_dir: &Path,
    as_of: NaiveDate,
) -> Result<(PathBuf, Vec<ChartOutcome>)> {
    ensure_output_dir(output_dir)?;

    let inputs = ChartInputs {
        returns: &analysis.returns,
        ranked: &analysis.ranked,
        sectors: &analysis.sectors,
        prices: &analysis.fetched.prices,
        highlighted_ticker: &config.highlighted_ticker,
        currency_symbol: &config.currency_symbol,
    };
    let chart_outcomes = charts::render_all(output_dir, &inputs)?;

    let html = report::compose(&ReportContext {
        as_of,
        currency_symbol: &config.currency_symbol,
        movers: &analysis.movers,
        ranked: &analysis.ranked,
        sectors: &analysis.sectors,
        charts: &chart_outcomes,
    })?;
    let report_path = report::write_report(output_dir, &html)?;

    Ok((report_path, chart_outcomes))
}

/// Run the whole pipeline against `provider`
pub async fn run_report<P: MarketDataProvider>(
    provider: &mut P,
    config: &ReportConfig,
    output_dir: &Path,
    today: NaiveDate,
) -> Result<RunSummary> {
    // Fail on an unusable output directory before spending time on the network
    ensure_output_dir(output_dir)?;

    let analysis = fetch_and_analyze(provider, config, today).await;
    let (report_path, charts) = write_outputs(&analysis, config, output_dir, today)?;

    Ok(RunSummary {
        report_path,
        charts,
        warnings: analysis.fetched.warnings,
    })
}
