//! SVG building blocks and PNG rasterization

use resvg::{tiny_skia, usvg};
use tracing::{debug, warn};

use super::ChartError;
use crate::utils::escape_markup;

/// Raster scale factor applied when converting to PNG
const RASTER_SCALE: f32 = 2.0;

pub const TITLE_COLOR: &str = "#262626";
pub const LABEL_COLOR: &str = "#595959";
pub const GRID_COLOR: &str = "#dddddd";
pub const MISSING_FILL: &str = "#d9d9d9";

/// Seaborn "Set2"
pub const SET2: &[&str] = &[
    "#66c2a5", "#fc8d62", "#8da0cb", "#e78ac3", "#a6d854", "#ffd92f", "#e5c494", "#b3b3b3",
];

/// Matplotlib "tab10"
pub const TAB10: &[&str] = &[
    "#1f77b4", "#ff7f0e", "#2ca02c", "#d62728", "#9467bd", "#8c564b", "#e377c2", "#7f7f7f",
    "#bcbd22", "#17becf",
];

pub fn svg_header(width: f64, height: f64) -> String {
    format!(
        r##"<svg xmlns="http://www.w3.org/2000/svg" width="{w:.0}" height="{h:.0}" viewBox="0 0 {w:.0} {h:.0}" font-family="Arial, Helvetica, sans-serif" font-size="11"><rect x="0" y="0" width="{w:.0}" height="{h:.0}" fill="#ffffff" />"##,
        w = width,
        h = height
    )
}

pub fn svg_footer() -> &'static str {
    "</svg>"
}

pub fn title(svg: &mut String, width: f64, text: &str) {
    svg.push_str(&format!(
        r#"<text x="{x:.2}" y="24" text-anchor="middle" font-size="15" font-weight="bold" fill="{color}">{text}</text>"#,
        x = width / 2.0,
        color = TITLE_COLOR,
        text = escape_markup(text)
    ));
}

/// Plain text label; `anchor` is start, middle or end
pub fn label(svg: &mut String, x: f64, y: f64, anchor: &str, size: f64, text: &str) {
    svg.push_str(&format!(
        r#"<text x="{x:.2}" y="{y:.2}" text-anchor="{anchor}" font-size="{size}" fill="{color}">{text}</text>"#,
        x = x,
        y = y,
        anchor = anchor,
        size = size,
        color = LABEL_COLOR,
        text = escape_markup(text)
    ));
}

/// Text rotated -90 degrees around its anchor point, reading bottom to top
pub fn vertical_label(svg: &mut String, x: f64, y: f64, size: f64, text: &str) {
    svg.push_str(&format!(
        r#"<text x="{x:.2}" y="{y:.2}" text-anchor="end" font-size="{size}" fill="{color}" transform="rotate(-90 {x:.2} {y:.2})">{text}</text>"#,
        x = x,
        y = y,
        size = size,
        color = LABEL_COLOR,
        text = escape_markup(text)
    ));
}

pub fn rect(svg: &mut String, x: f64, y: f64, w: f64, h: f64, fill: &str, stroke: Option<&str>) {
    let stroke_attr = match stroke {
        Some(color) => format!(r#" stroke="{}" stroke-width="0.5""#, color),
        None => String::new(),
    };
    svg.push_str(&format!(
        r#"<rect x="{x:.2}" y="{y:.2}" width="{w:.2}" height="{h:.2}" fill="{fill}"{stroke} />"#,
        x = x,
        y = y,
        w = w.max(0.0),
        h = h.max(0.0),
        fill = fill,
        stroke = stroke_attr
    ));
}

pub fn line(svg: &mut String, x1: f64, y1: f64, x2: f64, y2: f64, stroke: &str, width: f64) {
    svg.push_str(&format!(
        r#"<line x1="{x1:.2}" y1="{y1:.2}" x2="{x2:.2}" y2="{y2:.2}" stroke="{stroke}" stroke-width="{width}" />"#,
        x1 = x1,
        y1 = y1,
        x2 = x2,
        y2 = y2,
        stroke = stroke,
        width = width
    ));
}

pub fn polyline(svg: &mut String, points: &[(f64, f64)], stroke: &str, width: f64, opacity: f64) {
    if points.is_empty() {
        return;
    }

    let coords: String = points
        .iter()
        .map(|(x, y)| format!("{:.2},{:.2}", x, y))
        .collect::<Vec<_>>()
        .join(" ");

    svg.push_str(&format!(
        r#"<polyline fill="none" stroke="{stroke}" stroke-width="{width}" stroke-opacity="{opacity}" stroke-linejoin="round" points="{coords}" />"#,
        stroke = stroke,
        width = width,
        opacity = opacity,
        coords = coords
    ));
}

/// Filled dot for a series with a single point, where a line has no length
pub fn marker(svg: &mut String, x: f64, y: f64, radius: f64, fill: &str, opacity: f64) {
    svg.push_str(&format!(
        r#"<circle cx="{x:.2}" cy="{y:.2}" r="{r}" fill="{fill}" fill-opacity="{opacity}" />"#,
        x = x,
        y = y,
        r = radius,
        fill = fill,
        opacity = opacity
    ));
}

/// Rasterize an SVG document to PNG bytes
pub fn rasterize(svg: &str, options: &usvg::Options) -> Result<Vec<u8>, ChartError> {
    let tree = usvg::Tree::from_str(svg, options).map_err(|e| ChartError::Svg(e.to_string()))?;

    let size = tree.size().to_int_size();
    let width = (size.width() as f32 * RASTER_SCALE).ceil() as u32;
    let height = (size.height() as f32 * RASTER_SCALE).ceil() as u32;

    let mut pixmap = tiny_skia::Pixmap::new(width, height)
        .ok_or_else(|| ChartError::Raster(format!("invalid canvas size {}x{}", width, height)))?;
    pixmap.fill(tiny_skia::Color::WHITE);

    resvg::render(
        &tree,
        tiny_skia::Transform::from_scale(RASTER_SCALE, RASTER_SCALE),
        &mut pixmap.as_mut(),
    );

    pixmap
        .encode_png()
        .map_err(|e| ChartError::Raster(e.to_string()))
}

/// Rasterizer options with the system fonts loaded
pub fn raster_options() -> usvg::Options<'static> {
    let mut options = usvg::Options::default();
    options.fontdb_mut().load_system_fonts();
    has_fonts(&options.fontdb);
    options
}

/// Without any font every `<text>` element is dropped from the PNG
fn has_fonts(fontdb: &usvg::fontdb::Database) -> bool {
    if fontdb.is_empty() {
        warn!("No system fonts found, chart titles and labels will be missing");
        false
    } else {
        debug!("Loaded {} font faces", fontdb.len());
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rasterize_produces_png() {
        let mut svg = svg_header(120.0, 80.0);
        rect(&mut svg, 10.0, 10.0, 50.0, 30.0, "#66c2a5", None);
        svg.push_str(svg_footer());

        let png = rasterize(&svg, &usvg::Options::default()).unwrap();
        assert_eq!(&png[..8], b"\x89PNG\r\n\x1a\n");
    }

    #[test]
    fn test_rasterize_rejects_invalid_svg() {
        let result = rasterize("<svg", &usvg::Options::default());
        assert!(matches!(result, Err(ChartError::Svg(_))));
    }

    #[test]
    fn test_has_fonts() {
        assert!(!has_fonts(&usvg::fontdb::Database::new()));

        let options = raster_options();
        assert_eq!(has_fonts(&options.fontdb), !options.fontdb.is_empty());
    }

    #[test]
    fn test_marker() {
        let mut svg = String::new();
        marker(&mut svg, 10.0, 20.5, 4.5, "#1f77b4", 0.7);
        assert_eq!(
            svg,
            r##"<circle cx="10.00" cy="20.50" r="4.5" fill="#1f77b4" fill-opacity="0.7" />"##
        );
    }

    #[test]
    fn test_labels_are_escaped() {
        let mut svg = String::new();
        label(&mut svg, 0.0, 0.0, "start", 10.0, "M&M <Ltd>");
        assert!(svg.contains("M&amp;M &lt;Ltd&gt;"));
    }
}
