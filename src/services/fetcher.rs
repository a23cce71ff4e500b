use chrono::{Duration as ChronoDuration, NaiveDate};
use std::time::Duration as StdDuration;
use tracing::{debug, info, warn};

use super::provider::MarketDataProvider;
use crate::models::{
    FetchField, FetchWarning, FetchedPortfolio, Holding, PortfolioEntry, PriceSeries,
    ReportConfig,
};

/// Lookback window `[end - lookback_days, end]`, inclusive
pub fn lookback_window(end: NaiveDate, lookback_days: u32) -> (NaiveDate, NaiveDate) {
    (end - ChronoDuration::days(i64::from(lookback_days)), end)
}

/// Fetch price history and market cap for every configured holding.
///
/// Tickers are processed one after another. Any per-ticker failure is
/// logged and recorded as a [`FetchWarning`]; the ticker stays in
/// `entries` with the missing field unset.
pub async fn fetch_portfolio<P: MarketDataProvider>(
    provider: &mut P,
    config: &ReportConfig,
    today: NaiveDate,
) -> FetchedPortfolio {
    let (start, end) = lookback_window(today, config.lookback_days);
    info!(
        "Fetching {} tickers from {} ({} to {})",
        config.holdings.len(),
        provider.name(),
        start,
        end
    );

    let mut fetched = FetchedPortfolio::default();
    let delay = StdDuration::from_millis(config.request_delay_ms);

    for (i, holding) in config.holdings.iter().enumerate() {
        if i > 0 && !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let (series, entry, warnings) = fetch_holding(provider, holding, start, end).await;
        if let Some(series) = series {
            fetched.prices.push(series);
        }
        fetched.entries.push(entry);
        fetched.warnings.extend(warnings);
    }

    info!(
        "Fetch complete: {}/{} with prices, {}/{} with market cap, {} warnings",
        fetched.prices.len(),
        fetched.entries.len(),
        fetched.known_market_caps(),
        fetched.entries.len(),
        fetched.warnings.len()
    );

    fetched
}

async fn fetch_holding<P: MarketDataProvider>(
    provider: &mut P,
    holding: &Holding,
    start: NaiveDate,
    end: NaiveDate,
) -> (Option<PriceSeries>, PortfolioEntry, Vec<FetchWarning>) {
    let ticker = holding.ticker.as_str();
    let mut warnings = Vec::new();

    let series = match provider.price_history(ticker, start, end).await {
        Ok(points) => {
            let series = PriceSeries::new(ticker, points);
            if series.is_empty() {
                warn!("Warning: No data for {}", ticker);
                warnings.push(FetchWarning {
                    ticker: ticker.to_string(),
                    field: FetchField::PriceHistory,
                    reason: "no price history in window".to_string(),
                });
                None
            } else {
                if let Some((first, last)) = series.date_range() {
                    debug!("{}: {} closes ({} to {})", ticker, series.len(), first, last);
                }
                Some(series)
            }
        }
        Err(e) => {
            warn!("Error fetching price history for {}: {}", ticker, e);
            warnings.push(FetchWarning {
                ticker: ticker.to_string(),
                field: FetchField::PriceHistory,
                reason: e.to_string(),
            });
            None
        }
    };

    let market_cap = match provider.market_cap(ticker).await {
        Ok(Some(cap)) if cap.is_finite() && cap > 0.0 => Some(cap),
        Ok(Some(cap)) => {
            warn!("Warning: Unusable market cap {} for {}", cap, ticker);
            warnings.push(FetchWarning {
                ticker: ticker.to_string(),
                field: FetchField::MarketCap,
                reason: format!("non-positive market cap ({})", cap),
            });
            None
        }
        Ok(None) => {
            warn!("Warning: No market cap for {}", ticker);
            warnings.push(FetchWarning {
                ticker: ticker.to_string(),
                field: FetchField::MarketCap,
                reason: "market cap not reported".to_string(),
            });
            None
        }
        Err(e) => {
            warn!("Error fetching market cap for {}: {}", ticker, e);
            warnings.push(FetchWarning {
                ticker: ticker.to_string(),
                field: FetchField::MarketCap,
                reason: e.to_string(),
            });
            None
        }
    };

    let entry = PortfolioEntry {
        ticker: ticker.to_string(),
        sector: holding.sector.clone(),
        market_cap,
    };

    (series, entry, warnings)
}
