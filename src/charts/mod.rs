//! PNG charts for the daily report.
//!
//! Every chart is a pure function from upstream tables to an SVG document.
//! [`render_all`] rasterizes each one and writes it into the output
//! directory. A chart that cannot be drawn is skipped with a warning and
//! any file of the same name from an earlier run is removed. Failing to
//! write or remove a file aborts the run.

mod heatmap;
mod market_cap;
mod price_trends;
mod sector_pie;
mod svg;

use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

use crate::constants::artifact;
use crate::error::Result;
use crate::models::{PriceSeries, RankedEntry, SectorAllocation};
use crate::services::ReturnTable;
use crate::utils::{remove_if_exists, write_atomic};

pub use heatmap::{diverging_color, returns_heatmap};
pub use market_cap::market_cap_bars;
pub use price_trends::{line_style, price_trends};
pub use sector_pie::{sector_pie, slice_label};
pub use svg::{raster_options, rasterize};

#[derive(Error, Debug)]
pub enum ChartError {
    #[error("no data to plot for {0}")]
    NoData(&'static str),

    #[error("invalid SVG: {0}")]
    Svg(String),

    #[error("rasterization failed: {0}")]
    Raster(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartKind {
    Heatmap,
    MarketCap,
    SectorAllocation,
    PriceTrends,
}

impl ChartKind {
    pub const ALL: [ChartKind; 4] = [
        ChartKind::Heatmap,
        ChartKind::MarketCap,
        ChartKind::SectorAllocation,
        ChartKind::PriceTrends,
    ];

    pub fn file_name(&self) -> &'static str {
        match self {
            ChartKind::Heatmap => artifact::HEATMAP,
            ChartKind::MarketCap => artifact::MARKET_CAP,
            ChartKind::SectorAllocation => artifact::SECTOR_ALLOCATION,
            ChartKind::PriceTrends => artifact::PRICE_TRENDS,
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            ChartKind::Heatmap => "Daily Returns Heatmap",
            ChartKind::MarketCap => "Market Cap of Portfolio Stocks",
            ChartKind::SectorAllocation => "Sector Allocation",
            ChartKind::PriceTrends => "Daily Closing Prices",
        }
    }
}

impl fmt::Display for ChartKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.file_name())
    }
}

/// Everything the four charts are drawn from
pub struct ChartInputs<'a> {
    pub returns: &'a ReturnTable,
    pub ranked: &'a [RankedEntry],
    pub sectors: &'a SectorAllocation,
    pub prices: &'a [PriceSeries],
    pub highlighted_ticker: &'a str,
    pub currency_symbol: &'a str,
}

/// Result of one chart: the written file, or why it was skipped
#[derive(Debug)]
pub struct ChartOutcome {
    pub kind: ChartKind,
    pub result: std::result::Result<PathBuf, ChartError>,
}

impl ChartOutcome {
    pub fn is_generated(&self) -> bool {
        self.result.is_ok()
    }
}

/// Build the SVG document for one chart
pub fn build_svg(kind: ChartKind, inputs: &ChartInputs) -> std::result::Result<String, ChartError> {
    match kind {
        ChartKind::Heatmap => returns_heatmap(inputs.returns),
        ChartKind::MarketCap => market_cap_bars(inputs.ranked, inputs.currency_symbol),
        ChartKind::SectorAllocation => sector_pie(inputs.sectors),
        ChartKind::PriceTrends => price_trends(
            inputs.prices,
            inputs.highlighted_ticker,
            inputs.currency_symbol,
        ),
    }
}

/// Render all four charts into `output_dir`.
///
/// Chart-level failures are recorded in the outcome and do not stop the
/// other charts. Only a failed file write or removal is returned as an
/// error.
pub fn render_all(output_dir: &Path, inputs: &ChartInputs) -> Result<Vec<ChartOutcome>> {
    let options = raster_options();
    let mut outcomes = Vec::with_capacity(ChartKind::ALL.len());

    for kind in ChartKind::ALL {
        let png = build_svg(kind, inputs).and_then(|svg| rasterize(&svg, &options));

        let result = match png {
            Ok(bytes) => {
                let path = output_dir.join(kind.file_name());
                write_atomic(&path, &bytes)?;
                info!("Chart written: {}", path.display());
                Ok(path)
            }
            Err(e) => {
                warn!("Skipping chart {}: {}", kind, e);
                // An image left by an earlier run must not pass for this one
                remove_if_exists(&output_dir.join(kind.file_name()))?;
                Err(e)
            }
        };

        outcomes.push(ChartOutcome { kind, result });
    }

    Ok(outcomes)
}
