use super::svg::{label, svg_footer, svg_header, title, SET2};
use super::ChartError;
use crate::models::SectorAllocation;

const WIDTH: f64 = 800.0;
const HEIGHT: f64 = 640.0;
const RADIUS: f64 = 210.0;
/// Angle of the first slice edge, counter-clockwise from three o'clock
const START_ANGLE: f64 = 140.0;

/// Point on the circle at `angle` degrees, counter-clockwise with y pointing down
fn polar(cx: f64, cy: f64, r: f64, angle: f64) -> (f64, f64) {
    let rad = angle.to_radians();
    (cx + r * rad.cos(), cy - r * rad.sin())
}

/// SVG path for a slice spanning `sweep` degrees from `start`
fn slice_path(cx: f64, cy: f64, r: f64, start: f64, sweep: f64) -> String {
    let (x1, y1) = polar(cx, cy, r, start);
    let (x2, y2) = polar(cx, cy, r, start + sweep);
    let large_arc = if sweep > 180.0 { 1 } else { 0 };
    format!(
        "M{cx:.2},{cy:.2} L{x1:.2},{y1:.2} A{r:.2},{r:.2} 0 {large_arc} 0 {x2:.2},{y2:.2} Z",
        cx = cx,
        cy = cy,
        x1 = x1,
        y1 = y1,
        r = r,
        large_arc = large_arc,
        x2 = x2,
        y2 = y2
    )
}

/// Slice caption in the form `Banking 80.0%`
pub fn slice_label(sector: &str, percentage: f64) -> String {
    format!("{} {:.1}%", sector, percentage)
}

/// Pie chart of sector allocation percentages.
pub fn sector_pie(allocation: &SectorAllocation) -> Result<String, ChartError> {
    if allocation.is_empty() {
        return Err(ChartError::NoData("sector allocation"));
    }

    let cx = WIDTH / 2.0;
    let cy = HEIGHT / 2.0 + 20.0;

    let mut svg = svg_header(WIDTH, HEIGHT);
    title(&mut svg, WIDTH, "Sector Allocation");

    let total: f64 = allocation.rows.iter().map(|r| r.percentage).sum();
    let mut angle = START_ANGLE;

    for (i, row) in allocation.rows.iter().enumerate() {
        let color = SET2[i % SET2.len()];
        let sweep = if total > 0.0 { row.percentage / total * 360.0 } else { 0.0 };

        // A lone slice spans the whole circle, which an arc path cannot draw
        if allocation.rows.len() == 1 || sweep >= 359.999 {
            svg.push_str(&format!(
                r##"<circle cx="{cx:.2}" cy="{cy:.2}" r="{r:.2}" fill="{color}" stroke="#ffffff" stroke-width="1.5" />"##,
                cx = cx,
                cy = cy,
                r = RADIUS,
                color = color
            ));
        } else if sweep > 0.0 {
            svg.push_str(&format!(
                r##"<path d="{d}" fill="{color}" stroke="#ffffff" stroke-width="1.5" />"##,
                d = slice_path(cx, cy, RADIUS, angle, sweep),
                color = color
            ));
        }

        let mid = angle + sweep / 2.0;
        let (lx, ly) = polar(cx, cy, RADIUS * 1.12, mid);
        let anchor = if mid.to_radians().cos() >= 0.0 { "start" } else { "end" };
        label(&mut svg, lx, ly + 4.0, anchor, 12.0, &slice_label(&row.sector, row.percentage));

        angle += sweep;
    }

    if !allocation.unallocated.is_empty() {
        label(
            &mut svg,
            cx,
            HEIGHT - 16.0,
            "middle",
            10.0,
            &format!("No market cap data: {}", allocation.unallocated.join(", ")),
        );
    }

    svg.push_str(svg_footer());
    Ok(svg)
}
