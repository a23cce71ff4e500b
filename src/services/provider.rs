//! Market data provider seam
//!
//! The fetch stage only talks to [`MarketDataProvider`]; concrete clients
//! live in `yahoo` and `vci`.

use chrono::NaiveDate;

use crate::models::PricePoint;

#[derive(Debug)]
pub enum ProviderError {
    Http(isahc::Error),
    Serialization(serde_json::Error),
    InvalidResponse(String),
    RateLimit,
    /// 401 from the server; the session (cookie or crumb) has to be renewed
    Unauthorized,
    NoData,
}

impl From<isahc::Error> for ProviderError {
    fn from(error: isahc::Error) -> Self {
        ProviderError::Http(error)
    }
}

impl From<serde_json::Error> for ProviderError {
    fn from(error: serde_json::Error) -> Self {
        ProviderError::Serialization(error)
    }
}

impl std::fmt::Display for ProviderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProviderError::Http(e) => write!(f, "HTTP error: {}", e),
            ProviderError::Serialization(e) => write!(f, "Serialization error: {}", e),
            ProviderError::InvalidResponse(s) => write!(f, "Invalid response: {}", s),
            ProviderError::RateLimit => write!(f, "Rate limit exceeded"),
            ProviderError::Unauthorized => write!(f, "Unauthorized (401)"),
            ProviderError::NoData => write!(f, "No data available"),
        }
    }
}

impl std::error::Error for ProviderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ProviderError::Http(e) => Some(e),
            ProviderError::Serialization(e) => Some(e),
            _ => None,
        }
    }
}

/// Source of daily closes and market capitalization per ticker.
///
/// Implementations may fail or return nothing for any ticker; callers treat
/// every error as missing data for that ticker only.
#[allow(async_fn_in_trait)]
pub trait MarketDataProvider {
    /// Short name used in log lines
    fn name(&self) -> &str;

    /// Daily closes with `start <= date <= end`
    async fn price_history(
        &mut self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<PricePoint>, ProviderError>;

    /// Market capitalization in the currency's base unit, `None` when the
    /// provider does not know it
    async fn market_cap(&mut self, ticker: &str) -> Result<Option<f64>, ProviderError>;
}
