use chrono::{DateTime, Duration as ChronoDuration, NaiveDate, Utc};
use serde_json::Value;

use super::http::HttpFetcher;
use super::provider::{MarketDataProvider, ProviderError};
use crate::models::PricePoint;

const CHART_URL: &str = "https://query1.finance.yahoo.com/v8/finance/chart/";
const QUOTE_SUMMARY_URL: &str = "https://query2.finance.yahoo.com/v10/finance/quoteSummary/";
/// Sets the session cookie the crumb is bound to (the response itself is a 404)
const COOKIE_URL: &str = "https://fc.yahoo.com";
const CRUMB_URL: &str = "https://query1.finance.yahoo.com/v1/test/getcrumb";

/// Yahoo Finance client: daily closes from the chart API, market cap from
/// the quote summary `price` module.
///
/// The quote summary endpoint only answers requests that carry a session
/// cookie and the matching crumb, so both are fetched on first use and
/// renewed once when the server answers 401.
pub struct YahooClient {
    http: HttpFetcher,
    crumb: Option<String>,
}

impl YahooClient {
    pub fn new(rate_limit_per_minute: u32) -> Result<Self, ProviderError> {
        Ok(Self {
            http: HttpFetcher::new("yahoo", rate_limit_per_minute)?,
            crumb: None,
        })
    }

    async fn ensure_crumb(&mut self) -> Result<String, ProviderError> {
        if let Some(crumb) = &self.crumb {
            return Ok(crumb.clone());
        }

        self.http.prime_cookies(COOKIE_URL).await;
        let body = self.http.get_text(CRUMB_URL).await?;
        let crumb = parse_crumb(&body)?;
        tracing::debug!("Yahoo session crumb acquired");

        self.crumb = Some(crumb.clone());
        Ok(crumb)
    }

    async fn quote_summary(&mut self, ticker: &str) -> Result<Value, ProviderError> {
        let crumb = self.ensure_crumb().await?;
        match self.http.get_json(&quote_summary_url(ticker, &crumb)).await {
            Err(ProviderError::Unauthorized) => {
                tracing::info!("Yahoo session expired, renewing crumb");
                self.crumb = None;
                let crumb = self.ensure_crumb().await?;
                self.http.get_json(&quote_summary_url(ticker, &crumb)).await
            }
            other => other,
        }
    }

    fn chart_url(ticker: &str, start: NaiveDate, end: NaiveDate) -> String {
        // One day of slack on each side; exchange-local dates are filtered afterwards
        let period1 = (start - ChronoDuration::days(1))
            .and_hms_opt(0, 0, 0)
            .map(|dt| dt.and_utc().timestamp())
            .unwrap_or(0);
        let period2 = (end + ChronoDuration::days(1))
            .and_hms_opt(23, 59, 59)
            .map(|dt| dt.and_utc().timestamp())
            .unwrap_or(0);

        format!(
            "{}{}?period1={}&period2={}&interval=1d&events=history",
            CHART_URL, ticker, period1, period2
        )
    }
}

impl MarketDataProvider for YahooClient {
    fn name(&self) -> &str {
        "yahoo"
    }

    async fn price_history(
        &mut self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<PricePoint>, ProviderError> {
        let url = Self::chart_url(ticker, start, end);
        tracing::debug!("YAHOO_GET_HISTORY: ticker={}, start={}, end={}", ticker, start, end);

        let response = self.http.get_json(&url).await?;
        parse_chart(&response, start, end)
    }

    async fn market_cap(&mut self, ticker: &str) -> Result<Option<f64>, ProviderError> {
        let response = self.quote_summary(ticker).await?;
        parse_market_cap(&response)
    }
}

/// Quote summary URL for the `price` module, authenticated by `crumb`
pub fn quote_summary_url(ticker: &str, crumb: &str) -> String {
    format!(
        "{}{}?modules=price&crumb={}",
        QUOTE_SUMMARY_URL,
        urlencoding::encode(ticker),
        urlencoding::encode(crumb)
    )
}

/// Validate the getcrumb body. Without a session cookie Yahoo answers with
/// an HTML or JSON error page instead of a bare token.
pub fn parse_crumb(body: &str) -> Result<String, ProviderError> {
    let crumb = body.trim();
    if crumb.is_empty()
        || crumb.len() > 64
        || crumb.chars().any(|c| c.is_whitespace() || matches!(c, '<' | '{' | '"'))
    {
        return Err(ProviderError::InvalidResponse(format!(
            "Unexpected crumb response: {:.40}",
            crumb
        )));
    }
    Ok(crumb.to_string())
}

/// Extract daily closes from a chart API response.
///
/// Timestamps are shifted by the exchange's `gmtoffset` before taking the
/// date, so a session is attributed to its local trading day.
pub fn parse_chart(
    response: &Value,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Vec<PricePoint>, ProviderError> {
    let chart = response
        .get("chart")
        .ok_or_else(|| ProviderError::InvalidResponse("Missing key: chart".to_string()))?;

    if let Some(error) = chart.get("error").filter(|e| !e.is_null()) {
        let description = error
            .get("description")
            .and_then(|d| d.as_str())
            .unwrap_or("unknown error");
        return Err(ProviderError::InvalidResponse(description.to_string()));
    }

    let result = chart
        .get("result")
        .and_then(|r| r.as_array())
        .and_then(|r| r.first())
        .ok_or(ProviderError::NoData)?;

    // Instruments without trades in the range come back without timestamps
    let timestamps = match result.get("timestamp").and_then(|t| t.as_array()) {
        Some(ts) => ts,
        None => return Ok(Vec::new()),
    };

    let closes = result
        .pointer("/indicators/quote/0/close")
        .and_then(|c| c.as_array())
        .ok_or_else(|| ProviderError::InvalidResponse("Missing close prices".to_string()))?;

    if closes.len() != timestamps.len() {
        return Err(ProviderError::InvalidResponse(
            "Inconsistent array lengths".to_string(),
        ));
    }

    let gmt_offset = result
        .pointer("/meta/gmtoffset")
        .and_then(|o| o.as_i64())
        .unwrap_or(0);

    let mut points = Vec::with_capacity(timestamps.len());
    for (i, (ts, close)) in timestamps.iter().zip(closes.iter()).enumerate() {
        let timestamp = ts.as_i64().ok_or_else(|| {
            ProviderError::InvalidResponse(format!("Invalid timestamp at index {}: {:?}", i, ts))
        })?;

        // null closes mark halted sessions
        let close = match close.as_f64() {
            Some(c) => c,
            None => continue,
        };

        let date = DateTime::<Utc>::from_timestamp(timestamp + gmt_offset, 0)
            .ok_or_else(|| {
                ProviderError::InvalidResponse(format!("Cannot convert timestamp {}", timestamp))
            })?
            .date_naive();

        if date >= start && date <= end {
            points.push(PricePoint::new(date, close));
        }
    }

    Ok(points)
}

/// Extract `price.marketCap.raw` from a quote summary response
pub fn parse_market_cap(response: &Value) -> Result<Option<f64>, ProviderError> {
    let summary = response
        .get("quoteSummary")
        .ok_or_else(|| ProviderError::InvalidResponse("Missing key: quoteSummary".to_string()))?;

    if let Some(error) = summary.get("error").filter(|e| !e.is_null()) {
        let description = error
            .get("description")
            .and_then(|d| d.as_str())
            .unwrap_or("unknown error");
        return Err(ProviderError::InvalidResponse(description.to_string()));
    }

    let price = summary
        .pointer("/result/0/price")
        .ok_or(ProviderError::NoData)?;

    let market_cap = price
        .get("marketCap")
        .and_then(|m| m.get("raw").or(Some(m)))
        .and_then(|m| m.as_f64())
        .filter(|m| m.is_finite() && *m > 0.0);

    Ok(market_cap)
}
