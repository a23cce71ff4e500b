use chrono::{DateTime, Datelike, Duration as ChronoDuration, NaiveDate, Utc};
use serde_json::Value;

use super::http::HttpFetcher;
use super::provider::{MarketDataProvider, ProviderError};
use crate::models::PricePoint;

const BASE_URL: &str = "https://trading.vietcap.com.vn/api/";
const GRAPHQL_URL: &str = "https://trading.vietcap.com.vn/data-mt/graphql";

const VCI_HEADERS: &[(&str, &str)] = &[
    ("Referer", "https://trading.vietcap.com.vn/"),
    ("Origin", "https://trading.vietcap.com.vn"),
];

const MARKET_CAP_QUERY: &str = r#"query Query($ticker: String!) {
    CompanyListingInfo(ticker: $ticker) {
        issueShare
        __typename
    }
    TickerPriceInfo(ticker: $ticker) {
        ticker
        matchPrice
        __typename
    }
}"#;

/// Vietcap client: daily OHLC chart for closes, GraphQL listing info for
/// market cap (match price x issued shares)
pub struct VciClient {
    http: HttpFetcher,
}

impl VciClient {
    pub fn new(rate_limit_per_minute: u32) -> Result<Self, ProviderError> {
        Ok(Self {
            http: HttpFetcher::new("vci", rate_limit_per_minute)?,
        })
    }
}

impl MarketDataProvider for VciClient {
    fn name(&self) -> &str {
        "vci"
    }

    async fn price_history(
        &mut self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<PricePoint>, ProviderError> {
        let url = format!("{}chart/OHLCChart/gap-chart", BASE_URL);
        let payload = serde_json::json!({
            "timeFrame": "ONE_DAY",
            "symbols": [ticker.to_uppercase()],
            "to": end_of_day_timestamp(end),
            "countBack": count_back(start, end)
        });

        tracing::debug!(
            "VCI_GET_HISTORY_INPUT: symbol={}, start={}, end={}, url={}",
            ticker,
            start,
            end,
            url
        );

        let response = self.http.post_json(&url, &payload, VCI_HEADERS).await?;
        parse_gap_chart(&response, start, end)
    }

    async fn market_cap(&mut self, ticker: &str) -> Result<Option<f64>, ProviderError> {
        let payload = serde_json::json!({
            "query": MARKET_CAP_QUERY,
            "variables": { "ticker": ticker.to_uppercase() }
        });

        let response = self.http.post_json(GRAPHQL_URL, &payload, VCI_HEADERS).await?;
        parse_market_cap(&response)
    }
}

fn end_of_day_timestamp(date: NaiveDate) -> i64 {
    date.and_hms_opt(23, 59, 59)
        .map(|dt| dt.and_utc().timestamp())
        .unwrap_or(0)
}

/// Number of bars to request: business days in the window plus a buffer,
/// since the API counts back from `to` and skips holidays
fn count_back(start: NaiveDate, end: NaiveDate) -> u32 {
    let mut business_days = 0u32;
    let mut current = start;
    while current <= end {
        let weekday = current.weekday().num_days_from_sunday();
        if weekday != 0 && weekday != 6 {
            business_days += 1;
        }
        current += ChronoDuration::days(1);
    }
    business_days + 10
}

/// Parse the gap-chart response (`[{"o": [...], "c": [...], "t": [...]}]`)
pub fn parse_gap_chart(
    response: &Value,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Vec<PricePoint>, ProviderError> {
    let data_item = response
        .as_array()
        .and_then(|items| items.first())
        .ok_or(ProviderError::NoData)?;

    let closes = data_item
        .get("c")
        .and_then(|c| c.as_array())
        .ok_or_else(|| ProviderError::InvalidResponse("Missing key: c".to_string()))?;
    let times = data_item
        .get("t")
        .and_then(|t| t.as_array())
        .ok_or_else(|| ProviderError::InvalidResponse("Missing key: t".to_string()))?;

    if closes.len() != times.len() {
        return Err(ProviderError::InvalidResponse(
            "Inconsistent array lengths".to_string(),
        ));
    }

    let mut points = Vec::with_capacity(times.len());
    for (i, (time, close)) in times.iter().zip(closes.iter()).enumerate() {
        // Timestamps arrive either as strings or as integers
        let timestamp = if let Some(ts_str) = time.as_str() {
            ts_str.parse::<i64>().map_err(|_| {
                ProviderError::InvalidResponse(format!(
                    "Cannot parse timestamp string '{}' at index {}",
                    ts_str, i
                ))
            })?
        } else if let Some(ts_int) = time.as_i64() {
            ts_int
        } else {
            return Err(ProviderError::InvalidResponse(format!(
                "Invalid timestamp format at index {}: {:?}",
                i, time
            )));
        };

        let date = DateTime::<Utc>::from_timestamp(timestamp, 0)
            .ok_or_else(|| {
                ProviderError::InvalidResponse(format!("Cannot convert timestamp {}", timestamp))
            })?
            .date_naive();

        if let Some(close) = close.as_f64() {
            if date >= start && date <= end {
                points.push(PricePoint::new(date, close));
            }
        }
    }

    Ok(points)
}

/// Market cap from the GraphQL listing response: match price x issued shares
pub fn parse_market_cap(response: &Value) -> Result<Option<f64>, ProviderError> {
    let data = response.get("data").ok_or(ProviderError::NoData)?;

    let shares = data
        .pointer("/CompanyListingInfo/issueShare")
        .and_then(|v| v.as_f64());
    let price = data
        .pointer("/TickerPriceInfo/matchPrice")
        .and_then(|v| v.as_f64());

    Ok(match (price, shares) {
        (Some(price), Some(shares)) if price > 0.0 && shares > 0.0 => Some(price * shares),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 12, d).unwrap()
    }

    #[test]
    fn test_count_back_skips_weekends() {
        // Mon 2 .. Sun 8 December 2024: five business days
        assert_eq!(count_back(day(2), day(8)), 15);
        assert_eq!(count_back(day(7), day(8)), 10);
    }

    #[test]
    fn test_parse_gap_chart() {
        // 2024-12-02 and 2024-12-03 at 02:00 UTC, mixed timestamp encodings
        let response = json!([{
            "o": [25000.0, 25100.0],
            "h": [25300.0, 25400.0],
            "l": [24900.0, 25000.0],
            "c": [25200.0, 25350.0],
            "v": [1000, 1200],
            "t": ["1733104800", 1733191200]
        }]);

        let points = parse_gap_chart(&response, day(1), day(5)).unwrap();
        assert_eq!(
            points,
            vec![PricePoint::new(day(2), 25200.0), PricePoint::new(day(3), 25350.0)]
        );

        let narrowed = parse_gap_chart(&response, day(3), day(3)).unwrap();
        assert_eq!(narrowed.len(), 1);
    }

    #[test]
    fn test_parse_gap_chart_empty_response() {
        assert!(matches!(
            parse_gap_chart(&json!([]), day(1), day(5)),
            Err(ProviderError::NoData)
        ));
    }

    #[test]
    fn test_parse_market_cap() {
        let response = json!({
            "data": {
                "CompanyListingInfo": {"issueShare": 5589091262u64},
                "TickerPriceInfo": {"matchPrice": 92000.0}
            }
        });
        assert_eq!(parse_market_cap(&response).unwrap(), Some(92000.0 * 5589091262.0));

        let no_price = json!({"data": {"CompanyListingInfo": {"issueShare": 100}}});
        assert_eq!(parse_market_cap(&no_price).unwrap(), None);
    }
}
