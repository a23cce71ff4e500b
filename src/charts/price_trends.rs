use chrono::NaiveDate;
use std::collections::BTreeSet;

use super::svg::{
    label, line, marker, polyline, rect, svg_footer, svg_header, title, vertical_label, GRID_COLOR,
    TAB10,
};
use super::ChartError;
use crate::models::PriceSeries;
use crate::utils::{date_label, format_thousands};

const WIDTH: f64 = 1000.0;
const HEIGHT: f64 = 560.0;
const LEFT_PAD: f64 = 80.0;
const RIGHT_PAD: f64 = 30.0;
const TOP_PAD: f64 = 50.0;
const BOTTOM_PAD: f64 = 100.0;
const Y_TICKS: usize = 5;

const HIGHLIGHT_WIDTH: f64 = 3.0;
const HIGHLIGHT_OPACITY: f64 = 1.0;
const DEFAULT_WIDTH: f64 = 1.5;
const DEFAULT_OPACITY: f64 = 0.7;

/// Stroke width and opacity for a ticker's line
pub fn line_style(ticker: &str, highlighted: &str) -> (f64, f64) {
    if ticker == highlighted {
        (HIGHLIGHT_WIDTH, HIGHLIGHT_OPACITY)
    } else {
        (DEFAULT_WIDTH, DEFAULT_OPACITY)
    }
}

fn price_extent(series: &[&PriceSeries]) -> Option<(f64, f64)> {
    let mut closes = series.iter().flat_map(|s| s.points.iter().map(|p| p.close));
    let first = closes.next()?;
    let (min_v, max_v) = closes.fold((first, first), |(lo, hi), v| (lo.min(v), hi.max(v)));

    // Pad so flat lines do not sit on the frame
    let pad = if max_v > min_v { (max_v - min_v) * 0.05 } else { min_v.abs().max(1.0) * 0.05 };
    Some((min_v - pad, max_v + pad))
}

/// Daily closing prices, one line per ticker.
///
/// Tickers with an empty series get neither a line nor a legend entry; a
/// ticker with a single close is drawn as a dot.
pub fn price_trends(
    prices: &[PriceSeries],
    highlighted: &str,
    currency_symbol: &str,
) -> Result<String, ChartError> {
    let series: Vec<&PriceSeries> = prices.iter().filter(|s| !s.is_empty()).collect();
    let (min_v, max_v) = price_extent(&series).ok_or(ChartError::NoData("price trends"))?;

    let dates: Vec<NaiveDate> = series
        .iter()
        .flat_map(|s| s.points.iter().map(|p| p.date))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let plot_w = WIDTH - LEFT_PAD - RIGHT_PAD;
    let plot_h = HEIGHT - TOP_PAD - BOTTOM_PAD;
    let x_at = |date: &NaiveDate| -> f64 {
        let idx = dates.iter().position(|d| d == date).unwrap_or(0);
        if dates.len() > 1 {
            LEFT_PAD + plot_w * idx as f64 / (dates.len() - 1) as f64
        } else {
            LEFT_PAD + plot_w / 2.0
        }
    };
    let y_at = |value: f64| TOP_PAD + plot_h * (1.0 - (value - min_v) / (max_v - min_v));

    let mut svg = svg_header(WIDTH, HEIGHT);
    title(&mut svg, WIDTH, "Daily Closing Prices");

    for tick in 0..=Y_TICKS {
        let value = min_v + (max_v - min_v) * tick as f64 / Y_TICKS as f64;
        let y = y_at(value);
        line(&mut svg, LEFT_PAD, y, LEFT_PAD + plot_w, y, GRID_COLOR, 0.5);
        label(&mut svg, LEFT_PAD - 6.0, y + 3.0, "end", 9.0, &format_thousands(value, 0));
    }
    vertical_label(
        &mut svg,
        18.0,
        TOP_PAD + plot_h / 2.0,
        11.0,
        &format!("Price ({})", currency_symbol),
    );

    for date in &dates {
        let x = x_at(date);
        line(&mut svg, x, TOP_PAD, x, TOP_PAD + plot_h, GRID_COLOR, 0.5);
        vertical_label(&mut svg, x + 3.0, TOP_PAD + plot_h + 8.0, 9.0, &date_label(*date));
    }

    // Highlighted line drawn last so it sits on top
    let mut order: Vec<(usize, &PriceSeries)> = series.iter().copied().enumerate().collect();
    order.sort_by_key(|(_, s)| s.ticker == highlighted);

    for (i, s) in order {
        let points: Vec<(f64, f64)> = s.points.iter().map(|p| (x_at(&p.date), y_at(p.close))).collect();
        let (width, opacity) = line_style(&s.ticker, highlighted);
        let color = TAB10[i % TAB10.len()];
        match points.as_slice() {
            [(x, y)] => marker(&mut svg, *x, *y, width * 1.5, color, opacity),
            _ => polyline(&mut svg, &points, color, width, opacity),
        }
    }

    // Legend in series order
    let legend_x = LEFT_PAD + 12.0;
    for (i, s) in series.iter().enumerate() {
        let y = TOP_PAD + 10.0 + i as f64 * 16.0;
        let (width, _) = line_style(&s.ticker, highlighted);
        rect(&mut svg, legend_x, y - width / 2.0, 18.0, width, TAB10[i % TAB10.len()], None);
        label(&mut svg, legend_x + 24.0, y + 4.0, "start", 10.0, &s.ticker);
    }

    svg.push_str(svg_footer());
    Ok(svg)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PricePoint;

    fn series(ticker: &str, closes: &[(u32, f64)]) -> PriceSeries {
        PriceSeries::new(
            ticker,
            closes
                .iter()
                .map(|(d, c)| PricePoint::new(NaiveDate::from_ymd_opt(2025, 6, *d).unwrap(), *c))
                .collect(),
        )
    }

    #[test]
    fn test_line_style() {
        assert_eq!(line_style("HDFCBANK.NS", "HDFCBANK.NS"), (3.0, 1.0));
        assert_eq!(line_style("CDSL.NS", "HDFCBANK.NS"), (1.5, 0.7));
    }

    #[test]
    fn test_lines_and_highlight() {
        let prices = vec![
            series("CDSL.NS", &[(2, 1500.0), (3, 1520.0), (4, 1490.0)]),
            series("HDFCBANK.NS", &[(2, 1900.0), (3, 1940.0)]),
            series("ETERNAL.NS", &[]),
        ];

        let svg = price_trends(&prices, "HDFCBANK.NS", "₹").unwrap();
        assert_eq!(svg.matches("<polyline").count(), 2);
        assert_eq!(svg.matches(r#"stroke-width="3" stroke-opacity="1""#).count(), 1);
        assert_eq!(svg.matches(r#"stroke-width="1.5" stroke-opacity="0.7""#).count(), 1);
        assert!(svg.contains("Price (₹)"));
        assert!(svg.contains("04-06-2025"));
        assert!(!svg.contains("ETERNAL.NS"));

        // Highlighted line is the last one drawn
        let last = svg.rfind("<polyline").unwrap();
        assert!(svg[last..].contains(r#"stroke-width="3""#));
    }

    #[test]
    fn test_single_point_and_flat_series() {
        let prices = vec![series("A", &[(2, 100.0)])];
        let svg = price_trends(&prices, "A", "$").unwrap();
        assert!(!svg.contains("<polyline"));
        assert!(svg.contains(r##"r="4.5" fill="#1f77b4" fill-opacity="1""##));
        assert!(!svg.contains("NaN"));

        // A one-close ticker next to a full line still shows up
        let prices = vec![
            series("A", &[(2, 100.0), (3, 101.0)]),
            series("B", &[(3, 50.0)]),
        ];
        let svg = price_trends(&prices, "A", "$").unwrap();
        assert_eq!(svg.matches("<polyline").count(), 1);
        assert_eq!(svg.matches("<circle").count(), 1);
    }

    #[test]
    fn test_no_prices() {
        let prices = vec![series("A", &[])];
        assert!(matches!(
            price_trends(&prices, "A", "₹"),
            Err(ChartError::NoData(_))
        ));
    }
}
