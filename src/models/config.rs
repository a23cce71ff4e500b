use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use crate::constants::{
    DEFAULT_CURRENCY_SYMBOL, DEFAULT_HIGHLIGHTED_TICKER, DEFAULT_HOLDINGS, DEFAULT_LOOKBACK_DAYS,
    DEFAULT_MOVERS_LIMIT, DEFAULT_OUTPUT_DIR, DEFAULT_RATE_LIMIT_PER_MINUTE,
    DEFAULT_REQUEST_DELAY_MS,
};
use crate::error::{Error, Result};

/// Market data provider backing the fetch stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// Yahoo Finance (global tickers, e.g. `HDFCBANK.NS`)
    Yahoo,
    /// Vietcap (Vietnamese tickers, e.g. `VCB`)
    #[serde(alias = "vietcap")]
    Vci,
}

impl ProviderKind {
    pub fn name(&self) -> &'static str {
        match self {
            ProviderKind::Yahoo => "yahoo",
            ProviderKind::Vci => "vci",
        }
    }
}

/// A configured holding: ticker plus its sector
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Holding {
    pub ticker: String,
    pub sector: String,
}

impl Holding {
    pub fn new(ticker: impl Into<String>, sector: impl Into<String>) -> Self {
        Self {
            ticker: ticker.into(),
            sector: sector.into(),
        }
    }
}

/// Configuration for one report run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Market data provider
    pub provider: ProviderKind,

    /// Holdings in display order; this order breaks ranking ties
    pub holdings: Vec<Holding>,

    /// Historical window in calendar days, ending today
    pub lookback_days: u32,

    /// Directory receiving charts and the HTML report
    pub output_dir: PathBuf,

    /// Ticker drawn with a heavier line in the price trend chart
    pub highlighted_ticker: String,

    /// Currency symbol used for prices in the report
    pub currency_symbol: String,

    /// Maximum entries in each of the gainers / losers lists
    pub movers_limit: usize,

    /// Pause between two tickers
    pub request_delay_ms: u64,

    /// Provider requests allowed per minute
    pub rate_limit_per_minute: u32,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            provider: ProviderKind::Yahoo,
            holdings: DEFAULT_HOLDINGS
                .iter()
                .map(|(ticker, sector)| Holding::new(*ticker, *sector))
                .collect(),
            lookback_days: DEFAULT_LOOKBACK_DAYS,
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            highlighted_ticker: DEFAULT_HIGHLIGHTED_TICKER.to_string(),
            currency_symbol: DEFAULT_CURRENCY_SYMBOL.to_string(),
            movers_limit: DEFAULT_MOVERS_LIMIT,
            request_delay_ms: DEFAULT_REQUEST_DELAY_MS,
            rate_limit_per_minute: DEFAULT_RATE_LIMIT_PER_MINUTE,
        }
    }
}

impl ReportConfig {
    /// Load and validate a configuration from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Cannot read {}: {}", path.display(), e)))?;
        let config: ReportConfig = serde_json::from_str(&content)
            .map_err(|e| Error::Config(format!("Invalid config {}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load `path` when it exists, otherwise fall back to the defaults.
    ///
    /// An explicitly requested file that is missing is an error.
    pub fn load(path: &Path, explicit: bool) -> Result<Self> {
        if path.exists() {
            tracing::info!("Loading configuration from {}", path.display());
            Self::from_file(path)
        } else if explicit {
            Err(Error::Config(format!("Config file not found: {}", path.display())))
        } else {
            tracing::info!(
                "No configuration at {}, using built-in defaults",
                path.display()
            );
            let config = Self::default();
            config.validate()?;
            Ok(config)
        }
    }

    /// Write the configuration as pretty JSON
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path.as_ref(), json)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.holdings.is_empty() {
            return Err(Error::Config("At least one holding is required".to_string()));
        }

        let mut seen = HashSet::new();
        for holding in &self.holdings {
            if holding.ticker.trim().is_empty() {
                return Err(Error::Config("Holding with empty ticker".to_string()));
            }
            if holding.sector.trim().is_empty() {
                return Err(Error::Config(format!(
                    "Holding {} has an empty sector",
                    holding.ticker
                )));
            }
            if !seen.insert(holding.ticker.as_str()) {
                return Err(Error::Config(format!("Duplicate ticker: {}", holding.ticker)));
            }
        }

        if self.lookback_days == 0 {
            return Err(Error::Config("lookback_days must be at least 1".to_string()));
        }

        if !seen.contains(self.highlighted_ticker.as_str()) {
            return Err(Error::Config(format!(
                "Highlighted ticker {} is not one of the holdings",
                self.highlighted_ticker
            )));
        }

        if self.rate_limit_per_minute == 0 {
            return Err(Error::Config("rate_limit_per_minute must be at least 1".to_string()));
        }

        Ok(())
    }

    /// Tickers in configuration order
    pub fn tickers(&self) -> Vec<String> {
        self.holdings.iter().map(|h| h.ticker.clone()).collect()
    }
}
