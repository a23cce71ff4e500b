use super::svg::{
    label, rect, svg_footer, svg_header, title, vertical_label, GRID_COLOR, MISSING_FILL,
};
use super::ChartError;
use crate::services::ReturnTable;

const CELL: f64 = 38.0;
const LEFT_PAD: f64 = 120.0;
const RIGHT_PAD: f64 = 100.0;
const TOP_PAD: f64 = 48.0;
const BOTTOM_PAD: f64 = 90.0;
const MIN_PLOT_WIDTH: f64 = 300.0;

const NEGATIVE: (f64, f64, f64) = (215.0, 48.0, 39.0);
const NEUTRAL: (f64, f64, f64) = (255.0, 255.0, 255.0);
const POSITIVE: (f64, f64, f64) = (26.0, 152.0, 80.0);

const COLORBAR_STEPS: usize = 20;

/// Diverging red-white-green colour for `value`, scaled by `max_abs`
pub fn diverging_color(value: f64, max_abs: f64) -> String {
    let scale = if max_abs > 0.0 { max_abs } else { 1.0 };
    let t = (value / scale).clamp(-1.0, 1.0);
    let target = if t >= 0.0 { POSITIVE } else { NEGATIVE };
    let t = t.abs();

    let mix = |from: f64, to: f64| (from + (to - from) * t).round() as u8;
    format!(
        "#{:02x}{:02x}{:02x}",
        mix(NEUTRAL.0, target.0),
        mix(NEUTRAL.1, target.1),
        mix(NEUTRAL.2, target.2)
    )
}

fn format_percent(value: f64) -> String {
    format!("{:.1}%", value * 100.0)
}

/// Ticker x date heatmap of daily returns.
///
/// Missing cells are hatched grey so they never read as a zero return.
pub fn returns_heatmap(table: &ReturnTable) -> Result<String, ChartError> {
    if table.is_empty() {
        return Err(ChartError::NoData("returns heatmap"));
    }

    let max_abs = table.max_abs().unwrap_or(0.0);
    let cols = table.dates.len();
    let rows = table.rows.len();

    let grid_width = cols as f64 * CELL;
    let width = LEFT_PAD + grid_width.max(MIN_PLOT_WIDTH) + RIGHT_PAD;
    let height = TOP_PAD + rows as f64 * CELL + BOTTOM_PAD;

    let mut svg = svg_header(width, height);
    svg.push_str(&format!(
        r##"<defs><pattern id="missing" patternUnits="userSpaceOnUse" width="6" height="6"><rect width="6" height="6" fill="{fill}" /><path d="M0,6 L6,0" stroke="#9e9e9e" stroke-width="1" /></pattern></defs>"##,
        fill = MISSING_FILL
    ));
    title(&mut svg, width, "Daily Returns Heatmap");

    for (r, row) in table.rows.iter().enumerate() {
        let y = TOP_PAD + r as f64 * CELL;
        label(&mut svg, LEFT_PAD - 8.0, y + CELL / 2.0 + 4.0, "end", 11.0, &row.ticker);

        for (c, cell) in row.cells.iter().enumerate() {
            let x = LEFT_PAD + c as f64 * CELL;
            match cell {
                Some(value) => {
                    let fill = diverging_color(*value, max_abs);
                    rect(&mut svg, x, y, CELL, CELL, &fill, Some(GRID_COLOR));
                    label(
                        &mut svg,
                        x + CELL / 2.0,
                        y + CELL / 2.0 + 3.0,
                        "middle",
                        8.0,
                        &format_percent(*value),
                    );
                }
                None => rect(&mut svg, x, y, CELL, CELL, "url(#missing)", Some(GRID_COLOR)),
            }
        }
    }

    let axis_y = TOP_PAD + rows as f64 * CELL + 8.0;
    for (c, date) in table.date_labels().iter().enumerate() {
        let x = LEFT_PAD + c as f64 * CELL + CELL / 2.0 + 4.0;
        vertical_label(&mut svg, x, axis_y, 10.0, date);
    }

    // Colour bar, top = +max_abs, bottom = -max_abs
    let bar_x = LEFT_PAD + grid_width.max(MIN_PLOT_WIDTH) + 24.0;
    let bar_h = (rows as f64 * CELL).max(120.0);
    let step_h = bar_h / COLORBAR_STEPS as f64;
    for i in 0..COLORBAR_STEPS {
        let t = 1.0 - 2.0 * (i as f64 + 0.5) / COLORBAR_STEPS as f64;
        let fill = diverging_color(t * max_abs, max_abs);
        rect(&mut svg, bar_x, TOP_PAD + i as f64 * step_h, 16.0, step_h + 0.5, &fill, None);
    }
    rect(&mut svg, bar_x, TOP_PAD, 16.0, bar_h, "none", Some("#808080"));
    label(&mut svg, bar_x + 20.0, TOP_PAD + 8.0, "start", 9.0, &format_percent(max_abs));
    label(&mut svg, bar_x + 20.0, TOP_PAD + bar_h / 2.0 + 3.0, "start", 9.0, "0.0%");
    label(&mut svg, bar_x + 20.0, TOP_PAD + bar_h, "start", 9.0, &format_percent(-max_abs));

    svg.push_str(svg_footer());
    Ok(svg)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::ReturnRow;
    use chrono::NaiveDate;

    fn table() -> ReturnTable {
        ReturnTable {
            dates: vec![
                NaiveDate::from_ymd_opt(2025, 6, 2).unwrap(),
                NaiveDate::from_ymd_opt(2025, 6, 3).unwrap(),
            ],
            rows: vec![
                ReturnRow {
                    ticker: "CDSL.NS".to_string(),
                    cells: vec![Some(0.02), None],
                },
                ReturnRow {
                    ticker: "HDFCBANK.NS".to_string(),
                    cells: vec![Some(-0.01), Some(0.0)],
                },
            ],
        }
    }

    #[test]
    fn test_diverging_color() {
        assert_eq!(diverging_color(0.0, 0.05), "#ffffff");
        assert_eq!(diverging_color(0.05, 0.05), "#1a9850");
        assert_eq!(diverging_color(-0.05, 0.05), "#d73027");
        // Clamped beyond the scale, zero scale does not divide by zero
        assert_eq!(diverging_color(-1.0, 0.05), "#d73027");
        assert_eq!(diverging_color(0.0, 0.0), "#ffffff");
    }

    #[test]
    fn test_heatmap_marks_missing_cells() {
        let svg = returns_heatmap(&table()).unwrap();

        assert!(svg.starts_with("<svg"));
        assert!(svg.ends_with("</svg>"));
        assert_eq!(svg.matches("url(#missing)").count(), 1);
        assert!(svg.contains("CDSL.NS"));
        assert!(svg.contains("02-06-2025"));
        assert!(svg.contains("rotate(-90"));
        assert!(svg.contains("2.0%"));
    }

    #[test]
    fn test_heatmap_without_data() {
        let result = returns_heatmap(&ReturnTable::default());
        assert!(matches!(result, Err(ChartError::NoData(_))));
    }
}
