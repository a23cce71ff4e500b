use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::PriceSeries;

/// A portfolio holding after the fetch stage.
///
/// `market_cap` is in the provider's base currency unit and stays `None`
/// when it could not be retrieved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioEntry {
    pub ticker: String,
    pub sector: String,
    pub market_cap: Option<f64>,
}

/// Which piece of data a fetch warning refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchField {
    PriceHistory,
    MarketCap,
}

impl std::fmt::Display for FetchField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FetchField::PriceHistory => write!(f, "price history"),
            FetchField::MarketCap => write!(f, "market cap"),
        }
    }
}

/// Non-fatal per-ticker problem recorded during the fetch stage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FetchWarning {
    pub ticker: String,
    pub field: FetchField,
    pub reason: String,
}

impl std::fmt::Display for FetchWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {} unavailable ({})", self.ticker, self.field, self.reason)
    }
}

/// Everything the fetch stage produced, built fresh for each run.
///
/// `entries` follows configuration order and always holds every configured
/// ticker. `prices` only holds tickers with a non-empty history.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FetchedPortfolio {
    pub entries: Vec<PortfolioEntry>,
    pub prices: Vec<PriceSeries>,
    pub warnings: Vec<FetchWarning>,
}

impl FetchedPortfolio {
    pub fn price_series(&self, ticker: &str) -> Option<&PriceSeries> {
        self.prices.iter().find(|s| s.ticker == ticker)
    }

    pub fn known_market_caps(&self) -> usize {
        self.entries.iter().filter(|e| e.market_cap.is_some()).count()
    }
}

/// A row of the market-cap ranking, market cap in the reporting unit
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedEntry {
    pub rank: usize,
    pub ticker: String,
    pub sector: String,
    pub market_cap: Option<f64>,
}

/// A row of the sector allocation, market cap in the reporting unit
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SectorRow {
    pub rank: usize,
    pub sector: String,
    pub market_cap: f64,
    pub percentage: f64,
    /// Tickers of this sector whose market cap is unknown
    pub missing: usize,
}

/// Market cap grouped by sector with each sector's share of the total.
///
/// Empty when no market cap at all is known.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SectorAllocation {
    pub rows: Vec<SectorRow>,
    /// Sectors where no holding has a known market cap
    pub unallocated: Vec<String>,
    pub total: f64,
}

impl SectorAllocation {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn percentage_sum(&self) -> f64 {
        self.rows.iter().map(|r| r.percentage).sum()
    }
}

/// One entry of the gainers / losers lists
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Mover {
    pub ticker: String,
    pub close: f64,
    /// Latest daily change as a fraction
    pub change: f64,
}

/// Top gainers and losers of the latest session
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Movers {
    /// Most recent trading day across all series; only tickers that closed
    /// on it are ranked
    pub session: Option<NaiveDate>,
    pub gainers: Vec<Mover>,
    pub losers: Vec<Mover>,
}
