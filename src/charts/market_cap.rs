use super::svg::{label, line, rect, svg_footer, svg_header, title, GRID_COLOR, SET2};
use super::ChartError;
use crate::constants::REPORTING_UNIT_LABEL;
use crate::models::RankedEntry;
use crate::utils::format_thousands;

const WIDTH: f64 = 900.0;
const BAR_HEIGHT: f64 = 26.0;
const BAR_GAP: f64 = 10.0;
const LEFT_PAD: f64 = 130.0;
const RIGHT_PAD: f64 = 130.0;
const TOP_PAD: f64 = 50.0;
const BOTTOM_PAD: f64 = 50.0;

/// Horizontal bar chart of market caps in ranked order.
///
/// Caps are expected in the reporting unit. Holdings without a cap keep
/// their row with an "N/A" label and no bar.
pub fn market_cap_bars(ranked: &[RankedEntry], currency_symbol: &str) -> Result<String, ChartError> {
    let max_cap = ranked
        .iter()
        .filter_map(|r| r.market_cap)
        .filter(|c| c.is_finite() && *c > 0.0)
        .fold(None, |acc: Option<f64>, v| Some(acc.map_or(v, |a| a.max(v))))
        .ok_or(ChartError::NoData("market cap"))?;

    let plot_width = WIDTH - LEFT_PAD - RIGHT_PAD;
    let height = TOP_PAD + ranked.len() as f64 * (BAR_HEIGHT + BAR_GAP) + BOTTOM_PAD;

    let mut svg = svg_header(WIDTH, height);
    title(&mut svg, WIDTH, "Market Cap of Portfolio Stocks");

    let axis_bottom = height - BOTTOM_PAD + 4.0;
    line(&mut svg, LEFT_PAD, TOP_PAD - 4.0, LEFT_PAD, axis_bottom, "#808080", 1.0);

    for quarter in 1..=4 {
        let x = LEFT_PAD + plot_width * quarter as f64 / 4.0;
        line(&mut svg, x, TOP_PAD - 4.0, x, axis_bottom, GRID_COLOR, 0.5);
        label(
            &mut svg,
            x,
            axis_bottom + 14.0,
            "middle",
            9.0,
            &format_thousands(max_cap * quarter as f64 / 4.0, 0),
        );
    }

    for (i, entry) in ranked.iter().enumerate() {
        let y = TOP_PAD + i as f64 * (BAR_HEIGHT + BAR_GAP);
        let text_y = y + BAR_HEIGHT / 2.0 + 4.0;
        label(&mut svg, LEFT_PAD - 8.0, text_y, "end", 11.0, &entry.ticker);

        match entry.market_cap.filter(|c| c.is_finite()) {
            Some(cap) => {
                let bar_width = (cap.max(0.0) / max_cap) * plot_width;
                let color = SET2[i % SET2.len()];
                rect(&mut svg, LEFT_PAD, y, bar_width, BAR_HEIGHT, color, None);
                label(
                    &mut svg,
                    LEFT_PAD + bar_width + 6.0,
                    text_y,
                    "start",
                    10.0,
                    &format_thousands(cap, 1),
                );
            }
            None => label(&mut svg, LEFT_PAD + 6.0, text_y, "start", 10.0, "N/A"),
        }
    }

    label(
        &mut svg,
        LEFT_PAD + plot_width / 2.0,
        height - 10.0,
        "middle",
        11.0,
        &format!("Market Cap ({} {})", currency_symbol, REPORTING_UNIT_LABEL),
    );

    svg.push_str(svg_footer());
    Ok(svg)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ranked(ticker: &str, rank: usize, cap: Option<f64>) -> RankedEntry {
        RankedEntry {
            rank,
            ticker: ticker.to_string(),
            sector: "Banking".to_string(),
            market_cap: cap,
        }
    }

    #[test]
    fn test_bars_and_missing_label() {
        let entries = vec![
            ranked("ICICIBANK.NS", 1, Some(1_000_000.0)),
            ranked("CDSL.NS", 2, Some(25_000.5)),
            ranked("ETERNAL.NS", 3, None),
        ];

        let svg = market_cap_bars(&entries, "₹").unwrap();
        assert!(svg.contains("ICICIBANK.NS"));
        assert!(svg.contains("1,000,000.0"));
        assert!(svg.contains("25,000.5"));
        assert!(svg.contains("N/A"));
        assert!(svg.contains("Market Cap (₹ Crore)"));
        // Two filled bars in palette colours, none for the missing cap
        assert!(svg.contains(SET2[0]));
        assert!(svg.contains(SET2[1]));
        assert!(!svg.contains(SET2[2]));

        let icici = svg.find("ICICIBANK.NS").unwrap();
        let cdsl = svg.find("CDSL.NS").unwrap();
        assert!(icici < cdsl);
    }

    #[test]
    fn test_no_known_caps() {
        let entries = vec![ranked("A", 1, None)];
        assert!(matches!(
            market_cap_bars(&entries, "₹"),
            Err(ChartError::NoData(_))
        ));
        assert!(matches!(market_cap_bars(&[], "₹"), Err(ChartError::NoData(_))));
    }
}
