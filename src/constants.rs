//! Report constants
//!
//! Artifact names, the reporting unit and the defaults used when no
//! configuration file is present.

/// Market caps are reported in crores: raw value / 10,000,000.
///
/// Applied once, by the portfolio aggregator. Everything downstream of
/// aggregation (charts, HTML) already receives scaled values.
pub const REPORTING_UNIT_DIVISOR: f64 = 10_000_000.0;

/// Label of the reporting unit shown in chart axes and table headings
pub const REPORTING_UNIT_LABEL: &str = "Crore";

/// Display format for dates in tables and chart axes (dd-mm-YYYY)
pub const DATE_LABEL_FORMAT: &str = "%d-%m-%Y";

/// Output artifact file names
pub mod artifact {
    pub const HEATMAP: &str = "heatmap.png";
    pub const MARKET_CAP: &str = "marketcap.png";
    pub const SECTOR_ALLOCATION: &str = "sector_allocation.png";
    pub const PRICE_TRENDS: &str = "price_trends.png";
    pub const REPORT: &str = "email_body.html";
}

/// Default configuration file looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "portfolio.json";

/// Default output directory
pub const DEFAULT_OUTPUT_DIR: &str = "output";

/// Default lookback window in calendar days
pub const DEFAULT_LOOKBACK_DAYS: u32 = 10;

/// Default number of entries in each of the gainers / losers lists
pub const DEFAULT_MOVERS_LIMIT: usize = 10;

/// Default pause between two provider requests
pub const DEFAULT_REQUEST_DELAY_MS: u64 = 500;

/// Default provider rate limit
pub const DEFAULT_RATE_LIMIT_PER_MINUTE: u32 = 60;

/// Default currency symbol for prices in the report
pub const DEFAULT_CURRENCY_SYMBOL: &str = "₹";

/// Default holdings: (ticker, sector)
pub const DEFAULT_HOLDINGS: &[(&str, &str)] = &[
    ("ICICIBANK.NS", "Banking"),
    ("HDFCBANK.NS", "Financial Services"),
    ("CDSL.NS", "Financial Services"),
    ("ETERNAL.NS", "Consumer Services"),
];

/// Default highlighted ticker in the price trend chart
pub const DEFAULT_HIGHLIGHTED_TICKER: &str = "HDFCBANK.NS";
