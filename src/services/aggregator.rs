use std::cmp::Ordering;
use tracing::debug;

use crate::constants::REPORTING_UNIT_DIVISOR;
use crate::models::{PortfolioEntry, RankedEntry, SectorAllocation, SectorRow};

/// Convert a raw market cap to the reporting unit (crores)
pub fn to_reporting_unit(raw: f64) -> f64 {
    raw / REPORTING_UNIT_DIVISOR
}

/// A cap that can take part in sums and shares: finite and above zero
fn usable_cap(cap: Option<f64>) -> Option<f64> {
    cap.filter(|c| c.is_finite() && *c > 0.0)
}

/// Descending by value, `None` after every known value
fn cmp_desc_missing_last(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => b.partial_cmp(&a).unwrap_or(Ordering::Equal),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Rank holdings by market cap, largest first.
///
/// Missing and non-positive caps sort last. The sort is stable, so equal
/// or missing values keep configuration order. Caps are returned in the
/// reporting unit.
pub fn rank_by_market_cap(entries: &[PortfolioEntry]) -> Vec<RankedEntry> {
    let mut ranked: Vec<RankedEntry> = entries
        .iter()
        .map(|e| RankedEntry {
            rank: 0,
            ticker: e.ticker.clone(),
            sector: e.sector.clone(),
            market_cap: usable_cap(e.market_cap).map(to_reporting_unit),
        })
        .collect();

    ranked.sort_by(|a, b| cmp_desc_missing_last(a.market_cap, b.market_cap));

    for (i, entry) in ranked.iter_mut().enumerate() {
        entry.rank = i + 1;
    }

    ranked
}

/// Sum known market caps per sector and compute each sector's share.
///
/// Zero, negative and non-finite caps count as missing. Sectors without
/// any known cap go to `unallocated`. Rows are ordered by market cap
/// descending, ties in order of first appearance. When no cap is known at
/// all the allocation is empty.
pub fn sector_allocation(entries: &[PortfolioEntry]) -> SectorAllocation {
    // (sector, known cap sum, count of known, count of missing), first-appearance order
    let mut groups: Vec<(String, f64, usize, usize)> = Vec::new();

    for entry in entries {
        let idx = match groups.iter().position(|g| g.0 == entry.sector) {
            Some(idx) => idx,
            None => {
                groups.push((entry.sector.clone(), 0.0, 0, 0));
                groups.len() - 1
            }
        };
        let group = &mut groups[idx];
        match usable_cap(entry.market_cap) {
            Some(cap) => {
                group.1 += to_reporting_unit(cap);
                group.2 += 1;
            }
            None => group.3 += 1,
        }
    }

    let (known, unallocated): (Vec<_>, Vec<_>) = groups.into_iter().partition(|g| g.2 > 0);
    let unallocated: Vec<String> = unallocated.into_iter().map(|g| g.0).collect();

    let total: f64 = known.iter().map(|g| g.1).sum();
    if known.is_empty() || total <= 0.0 {
        debug!("No market caps known, sector allocation is empty");
        return SectorAllocation {
            rows: Vec::new(),
            unallocated,
            total: 0.0,
        };
    }

    let mut rows: Vec<SectorRow> = known
        .into_iter()
        .map(|(sector, cap, _, missing)| SectorRow {
            rank: 0,
            sector,
            market_cap: cap,
            percentage: cap / total * 100.0,
            missing,
        })
        .collect();

    rows.sort_by(|a, b| cmp_desc_missing_last(Some(a.market_cap), Some(b.market_cap)));
    for (i, row) in rows.iter_mut().enumerate() {
        row.rank = i + 1;
    }

    SectorAllocation {
        rows,
        unallocated,
        total,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(ticker: &str, sector: &str, cap: Option<f64>) -> PortfolioEntry {
        PortfolioEntry {
            ticker: ticker.to_string(),
            sector: sector.to_string(),
            market_cap: cap,
        }
    }

    #[test]
    fn test_example_allocation_and_ranking() {
        let entries = vec![
            entry("A", "Banking", Some(500.0 * REPORTING_UNIT_DIVISOR)),
            entry("B", "Banking", Some(300.0 * REPORTING_UNIT_DIVISOR)),
            entry("C", "Tech", Some(200.0 * REPORTING_UNIT_DIVISOR)),
        ];

        let ranked = rank_by_market_cap(&entries);
        let order: Vec<&str> = ranked.iter().map(|r| r.ticker.as_str()).collect();
        assert_eq!(order, vec!["A", "B", "C"]);
        assert_eq!(ranked[0].market_cap, Some(500.0));
        assert_eq!(ranked[2].rank, 3);

        let allocation = sector_allocation(&entries);
        assert_eq!(allocation.rows.len(), 2);
        assert_eq!(allocation.rows[0].sector, "Banking");
        assert!((allocation.rows[0].market_cap - 800.0).abs() < 1e-9);
        assert!((allocation.rows[0].percentage - 80.0).abs() < 1e-9);
        assert_eq!(allocation.rows[1].sector, "Tech");
        assert!((allocation.rows[1].percentage - 20.0).abs() < 1e-9);
        assert!((allocation.total - 1000.0).abs() < 1e-9);
    }

    #[test]
    fn test_ranking_missing_last_and_stable() {
        let entries = vec![
            entry("N1", "X", None),
            entry("T1", "X", Some(100.0)),
            entry("BIG", "Y", Some(900.0)),
            entry("N2", "Y", None),
            entry("T2", "Y", Some(100.0)),
        ];

        let ranked = rank_by_market_cap(&entries);
        let order: Vec<&str> = ranked.iter().map(|r| r.ticker.as_str()).collect();
        assert_eq!(order, vec!["BIG", "T1", "T2", "N1", "N2"]);
        let ranks: Vec<usize> = ranked.iter().map(|r| r.rank).collect();
        assert_eq!(ranks, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_missing_caps_do_not_count_as_zero() {
        let entries = vec![
            entry("A", "Banking", Some(3.0e9)),
            entry("B", "Banking", None),
            entry("C", "Energy", None),
            entry("D", "Tech", Some(1.0e9)),
        ];

        let allocation = sector_allocation(&entries);
        let sectors: Vec<&str> = allocation.rows.iter().map(|r| r.sector.as_str()).collect();
        assert_eq!(sectors, vec!["Banking", "Tech"]);
        assert_eq!(allocation.rows[0].missing, 1);
        assert_eq!(allocation.unallocated, vec!["Energy"]);
        assert!((allocation.rows[0].percentage - 75.0).abs() < 1e-9);
    }

    #[test]
    fn test_percentages_sum_to_hundred() {
        let entries = vec![
            entry("A", "S1", Some(123_456_789.0)),
            entry("B", "S2", Some(987_654_321.0)),
            entry("C", "S3", Some(55_555_555.5)),
            entry("D", "S1", Some(1.0)),
            entry("E", "S4", Some(333_333_333.3)),
        ];
        let allocation = sector_allocation(&entries);
        assert!((allocation.percentage_sum() - 100.0).abs() <= 0.1);
    }

    #[test]
    fn test_all_missing_is_empty_state() {
        let entries = vec![entry("A", "Banking", None), entry("B", "Tech", None)];
        let allocation = sector_allocation(&entries);
        assert!(allocation.is_empty());
        assert_eq!(allocation.total, 0.0);
        assert_eq!(allocation.unallocated, vec!["Banking", "Tech"]);
    }

    #[test]
    fn test_sector_ties_keep_first_appearance() {
        let entries = vec![
            entry("A", "Tech", Some(1.0e7)),
            entry("B", "Banking", Some(1.0e7)),
        ];
        let allocation = sector_allocation(&entries);
        assert_eq!(allocation.rows[0].sector, "Tech");
        assert_eq!(allocation.rows[1].sector, "Banking");
    }

    #[test]
    fn test_non_positive_caps_are_missing() {
        let entries = vec![entry("A", "Banking", Some(0.0)), entry("B", "Tech", None)];
        let allocation = sector_allocation(&entries);
        assert!(allocation.is_empty());
        assert_eq!(allocation.unallocated, vec!["Banking", "Tech"]);

        let entries = vec![
            entry("A", "Banking", Some(300.0 * REPORTING_UNIT_DIVISOR)),
            entry("B", "Tech", Some(-100.0 * REPORTING_UNIT_DIVISOR)),
            entry("C", "Energy", Some(f64::NAN)),
        ];
        let allocation = sector_allocation(&entries);
        assert_eq!(allocation.rows.len(), 1);
        assert_eq!(allocation.rows[0].sector, "Banking");
        assert!((allocation.rows[0].percentage - 100.0).abs() < 1e-9);
        assert!((allocation.total - 300.0).abs() < 1e-9);
        assert_eq!(allocation.unallocated, vec!["Tech", "Energy"]);

        let ranked = rank_by_market_cap(&entries);
        assert_eq!(ranked[0].ticker, "A");
        assert_eq!(ranked[1].market_cap, None);
        assert_eq!(ranked[2].market_cap, None);
    }
}
