//! Daily returns and the ticker x date returns table

use chrono::NaiveDate;
use std::collections::{BTreeMap, BTreeSet};

use crate::models::{PriceSeries, ReturnPoint, ReturnSeries};
use crate::utils::date_label;

/// Daily change `(p[i] - p[i-1]) / p[i-1]` for each date after the first.
///
/// A series with fewer than two closes gives an empty result.
pub fn daily_returns(series: &PriceSeries) -> ReturnSeries {
    let points = series
        .points
        .windows(2)
        .map(|pair| {
            let (prev, curr) = (pair[0].close, pair[1].close);
            let change = if prev != 0.0 && prev.is_finite() && curr.is_finite() {
                Some((curr - prev) / prev)
            } else {
                None
            };
            ReturnPoint {
                date: pair[1].date,
                change,
            }
        })
        .collect();

    ReturnSeries {
        ticker: series.ticker.clone(),
        points,
    }
}

/// One row of the returns table
#[derive(Debug, Clone, PartialEq)]
pub struct ReturnRow {
    pub ticker: String,
    /// Aligned with [`ReturnTable::dates`]; `None` marks a missing cell
    pub cells: Vec<Option<f64>>,
}

/// Dense ticker x date table of daily returns
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReturnTable {
    pub dates: Vec<NaiveDate>,
    pub rows: Vec<ReturnRow>,
}

impl ReturnTable {
    /// Merge per-ticker return series by date.
    ///
    /// Rows are tickers with a non-empty series, sorted by symbol. Columns
    /// are the union of dates in calendar order; a date where every ticker
    /// lacks a value is dropped.
    pub fn build(series: &[ReturnSeries]) -> Self {
        let mut by_ticker: BTreeMap<&str, BTreeMap<NaiveDate, f64>> = BTreeMap::new();

        for s in series.iter().filter(|s| !s.is_empty()) {
            let cells = by_ticker.entry(s.ticker.as_str()).or_default();
            for point in &s.points {
                if let Some(change) = point.change.filter(|c| c.is_finite()) {
                    cells.insert(point.date, change);
                }
            }
        }

        // Only dates carrying at least one value, so fully empty columns never appear
        let dates: Vec<NaiveDate> = by_ticker
            .values()
            .flat_map(|cells| cells.keys().copied())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let rows = by_ticker
            .into_iter()
            .map(|(ticker, cells)| ReturnRow {
                ticker: ticker.to_string(),
                cells: dates.iter().map(|d| cells.get(d).copied()).collect(),
            })
            .collect();

        Self { dates, rows }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty() || self.dates.is_empty()
    }

    /// Column labels in dd-mm-YYYY format
    pub fn date_labels(&self) -> Vec<String> {
        self.dates.iter().map(|d| date_label(*d)).collect()
    }

    pub fn row(&self, ticker: &str) -> Option<&ReturnRow> {
        self.rows.iter().find(|r| r.ticker == ticker)
    }

    /// Largest absolute value in the table, used to scale colours
    pub fn max_abs(&self) -> Option<f64> {
        self.rows
            .iter()
            .flat_map(|r| r.cells.iter().flatten())
            .map(|v| v.abs())
            .fold(None, |acc: Option<f64>, v| Some(acc.map_or(v, |a| a.max(v))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PricePoint;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 2, d).unwrap()
    }

    fn series(ticker: &str, closes: &[(u32, f64)]) -> PriceSeries {
        PriceSeries::new(
            ticker,
            closes.iter().map(|(d, c)| PricePoint::new(day(*d), *c)).collect(),
        )
    }

    fn round2(v: f64) -> f64 {
        (v * 100.0).round() / 100.0
    }

    #[test]
    fn test_daily_returns_example() {
        let returns = daily_returns(&series("X", &[(3, 100.0), (4, 102.0), (5, 99.0)]));

        assert_eq!(returns.len(), 2);
        assert_eq!(returns.points[0].date, day(4));
        let values: Vec<f64> = returns.points.iter().map(|p| p.change.unwrap()).collect();
        assert_eq!(round2(values[0]), 0.02);
        assert_eq!(round2(values[1]), -0.03);
        assert!((values[1] - (-0.0294)).abs() < 1e-4);
    }

    #[test]
    fn test_daily_returns_length_is_n_minus_one() {
        for n in 0..6u32 {
            let closes: Vec<(u32, f64)> = (1..=n).map(|d| (d, 100.0 + d as f64)).collect();
            let returns = daily_returns(&series("X", &closes));
            assert_eq!(returns.len(), n.saturating_sub(1) as usize);
        }
    }

    #[test]
    fn test_table_merges_by_date_and_marks_missing() {
        let a = daily_returns(&series("BBB", &[(3, 10.0), (4, 11.0), (5, 11.0)]));
        let b = daily_returns(&series("AAA", &[(4, 20.0), (6, 19.0)]));
        let empty = daily_returns(&series("ZZZ", &[(4, 5.0)]));

        let table = ReturnTable::build(&[a, b, empty]);

        assert_eq!(table.dates, vec![day(4), day(5), day(6)]);
        assert_eq!(table.date_labels(), vec!["04-02-2025", "05-02-2025", "06-02-2025"]);

        // Sorted by ticker; the single-close ticker has no row
        let tickers: Vec<&str> = table.rows.iter().map(|r| r.ticker.as_str()).collect();
        assert_eq!(tickers, vec!["AAA", "BBB"]);

        assert_eq!(table.rows[0].cells[0], None);
        assert_eq!(table.rows[0].cells[1], None);
        assert!((table.rows[0].cells[2].unwrap() - (-0.05)).abs() < 1e-12);

        assert!((table.rows[1].cells[0].unwrap() - 0.1).abs() < 1e-12);
        assert_eq!(table.rows[1].cells[1], Some(0.0));
        assert_eq!(table.rows[1].cells[2], None);
    }

    #[test]
    fn test_table_prunes_dates_without_values() {
        // A missing change (undefined division) must not create a column
        let returns = ReturnSeries {
            ticker: "X".to_string(),
            points: vec![
                ReturnPoint { date: day(3), change: None },
                ReturnPoint { date: day(4), change: Some(0.01) },
            ],
        };

        let table = ReturnTable::build(&[returns]);
        assert_eq!(table.dates, vec![day(4)]);
        assert_eq!(table.rows[0].cells, vec![Some(0.01)]);
    }

    #[test]
    fn test_empty_inputs() {
        let table = ReturnTable::build(&[]);
        assert!(table.is_empty());
        assert_eq!(table.max_abs(), None);
    }

    #[test]
    fn test_max_abs() {
        let a = daily_returns(&series("A", &[(3, 100.0), (4, 90.0), (5, 99.0)]));
        let table = ReturnTable::build(&[a]);
        assert!((table.max_abs().unwrap() - 0.1).abs() < 1e-12);
    }
}
