use std::cmp::Ordering;
use tracing::debug;

use super::returns::daily_returns;
use crate::models::{Mover, Movers, PriceSeries};

/// Top gainers and losers of the latest session.
///
/// The session is the most recent date any series closed on. Tickers whose
/// last close is older are left out, so a halted stock cannot show up with
/// a stale move. Each remaining ticker contributes its last close and the
/// change into that close. Gainers are positive changes, largest first;
/// losers are negative changes, steepest first. Both lists hold at most
/// `limit` entries.
pub fn top_movers(prices: &[PriceSeries], limit: usize) -> Movers {
    let session = prices.iter().filter_map(|s| s.last()).map(|p| p.date).max();

    let latest: Vec<Mover> = prices
        .iter()
        .filter_map(|series| {
            let last = series.last()?;
            if Some(last.date) != session {
                debug!("{} last closed on {}, not in the latest session", series.ticker, last.date);
                return None;
            }
            let change = daily_returns(series).points.last()?.change?;
            Some(Mover {
                ticker: series.ticker.clone(),
                close: last.close,
                change,
            })
        })
        .collect();

    let mut gainers: Vec<Mover> = latest.iter().filter(|m| m.change > 0.0).cloned().collect();
    gainers.sort_by(|a, b| b.change.partial_cmp(&a.change).unwrap_or(Ordering::Equal));
    gainers.truncate(limit);

    let mut losers: Vec<Mover> = latest.into_iter().filter(|m| m.change < 0.0).collect();
    losers.sort_by(|a, b| a.change.partial_cmp(&b.change).unwrap_or(Ordering::Equal));
    losers.truncate(limit);

    Movers {
        session,
        gainers,
        losers,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PricePoint;
    use chrono::NaiveDate;

    fn series(ticker: &str, closes: &[f64]) -> PriceSeries {
        let points = closes
            .iter()
            .enumerate()
            .map(|(i, c)| {
                PricePoint::new(NaiveDate::from_ymd_opt(2025, 4, 1 + i as u32).unwrap(), *c)
            })
            .collect();
        PriceSeries::new(ticker, points)
    }

    #[test]
    fn test_top_movers() {
        let prices = vec![
            series("UP1", &[100.0, 101.0]),
            series("UP2", &[100.0, 105.0]),
            series("DOWN1", &[100.0, 99.0]),
            series("DOWN2", &[100.0, 90.0]),
            series("FLAT", &[100.0, 100.0]),
            series("SINGLE", &[100.0]),
        ];

        let movers = top_movers(&prices, 10);
        let gainers: Vec<&str> = movers.gainers.iter().map(|m| m.ticker.as_str()).collect();
        let losers: Vec<&str> = movers.losers.iter().map(|m| m.ticker.as_str()).collect();

        assert_eq!(gainers, vec!["UP2", "UP1"]);
        assert_eq!(losers, vec!["DOWN2", "DOWN1"]);
        assert_eq!(movers.gainers[0].close, 105.0);
        assert!((movers.losers[0].change - (-0.1)).abs() < 1e-12);
    }

    #[test]
    fn test_top_movers_limit() {
        let prices = vec![
            series("A", &[100.0, 101.0]),
            series("B", &[100.0, 102.0]),
            series("C", &[100.0, 103.0]),
        ];
        let movers = top_movers(&prices, 2);
        assert_eq!(movers.gainers.len(), 2);
        assert_eq!(movers.gainers[0].ticker, "C");
        assert!(movers.losers.is_empty());
    }

    #[test]
    fn test_top_movers_skip_tickers_without_latest_close() {
        let day = |d| NaiveDate::from_ymd_opt(2025, 4, d).unwrap();
        let prices = vec![
            series("HALTED", &[100.0, 130.0]),
            PriceSeries::new(
                "LIVE",
                vec![
                    PricePoint::new(day(1), 50.0),
                    PricePoint::new(day(2), 51.0),
                    PricePoint::new(day(3), 52.0),
                ],
            ),
        ];

        let movers = top_movers(&prices, 10);
        assert_eq!(movers.session, Some(day(3)));
        let gainers: Vec<&str> = movers.gainers.iter().map(|m| m.ticker.as_str()).collect();
        assert_eq!(gainers, vec!["LIVE"]);
    }

    #[test]
    fn test_top_movers_without_prices() {
        let movers = top_movers(&[], 5);
        assert_eq!(movers, Movers::default());
        assert!(movers.session.is_none());
    }
}
