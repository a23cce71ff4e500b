//! HTML summary of the daily run.
//!
//! The document is `email_body.html` with `{{name}}` placeholders; tables,
//! list items and chart references are rendered from the smaller fragment
//! templates below and inserted as markup.

mod template;

use chrono::NaiveDate;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::charts::ChartOutcome;
use crate::constants::{artifact, REPORTING_UNIT_LABEL};
use crate::error::Result;
use crate::models::{Mover, Movers, RankedEntry, SectorAllocation};
use crate::utils::{date_label, format_optional, format_thousands, write_atomic};

pub use template::{render, render_each, TemplateError, Vars};

const EMAIL_BODY: &str = include_str!("email_body.html");
const REPORT_TITLE: &str = "Daily Portfolio Analysis Report";

const MARKET_CAP_TABLE: &str = "<table border=\"1\" cellpadding=\"5\" style=\"border-collapse: collapse;\">
  <tr><th>#</th><th>Stock</th><th>Market Cap</th><th>Sector</th></tr>
{{rows}}</table>";
const MARKET_CAP_ROW: &str =
    "  <tr><td>{{rank}}</td><td>{{ticker}}</td><td>{{market_cap}}</td><td>{{sector}}</td></tr>\n";

const SECTOR_TABLE: &str = "<table border=\"1\" cellpadding=\"5\" style=\"border-collapse: collapse;\">
  <tr><th>#</th><th>Sector</th><th>Market Cap</th><th>Allocation %</th></tr>
{{rows}}</table>";
const SECTOR_ROW: &str =
    "  <tr><td>{{rank}}</td><td>{{sector}}</td><td>{{market_cap}}</td><td>{{percentage}}</td></tr>\n";
const SECTORS_EMPTY: &str = "<p>No market cap data available for sector allocation.</p>\n";
const UNALLOCATED: &str = "<p>Sectors without market cap data: {{sectors}}</p>\n";

const MOVER_ITEM: &str = "<li>{{ticker}}: {{currency}}{{close}} ({{change}})</li>";
const MOVERS_EMPTY: &str = "<li>No data available</li>";

const CHARTS_ATTACHED: &str = "<p>Attached charts:</p>\n<ul>{{items}}</ul>\n";
const CHART_ITEM: &str = "<li>{{title}} ({{file}})</li>";
const CHARTS_NONE: &str = "<p>No charts were generated for this run.</p>\n";
const CHARTS_SKIPPED: &str = "<p>Not generated (insufficient data): {{titles}}</p>\n";

/// Inputs to the report, all computed upstream
pub struct ReportContext<'a> {
    pub as_of: NaiveDate,
    pub currency_symbol: &'a str,
    pub movers: &'a Movers,
    pub ranked: &'a [RankedEntry],
    pub sectors: &'a SectorAllocation,
    pub charts: &'a [ChartOutcome],
}

fn format_change(change: f64) -> String {
    let pct = change * 100.0;
    if pct >= 0.0 {
        format!("+{:.2}%", pct)
    } else {
        format!("{:.2}%", pct)
    }
}

/// Heading qualifier for the movers lists, e.g. `05-06-2025 session`
pub fn session_label(session: Option<NaiveDate>) -> String {
    match session {
        Some(date) => format!("{} session", date_label(date)),
        None => "latest session".to_string(),
    }
}

fn mover_items(
    movers: &[Mover],
    currency_symbol: &str,
) -> std::result::Result<String, TemplateError> {
    if movers.is_empty() {
        return Ok(MOVERS_EMPTY.to_string());
    }

    render_each(MOVER_ITEM, movers, |m| {
        Vars::new()
            .text("ticker", m.ticker.as_str())
            .text("currency", currency_symbol)
            .text("close", format_thousands(m.close, 2))
            .text("change", format_change(m.change))
    })
}

/// Ranked market-cap table: `#`, Stock, Market Cap, Sector
pub fn market_cap_table(ranked: &[RankedEntry]) -> Result<String> {
    let rows = render_each(MARKET_CAP_ROW, ranked, |entry| {
        Vars::new()
            .text("rank", entry.rank.to_string())
            .text("ticker", entry.ticker.as_str())
            .text("market_cap", format_optional(entry.market_cap, 1))
            .text("sector", entry.sector.as_str())
    })?;
    Ok(render(MARKET_CAP_TABLE, &Vars::new().html("rows", rows))?)
}

/// Sector table: `#`, Sector, Market Cap, Allocation %
pub fn sector_table(allocation: &SectorAllocation) -> Result<String> {
    let rows = render_each(SECTOR_ROW, &allocation.rows, |row| {
        Vars::new()
            .text("rank", row.rank.to_string())
            .text("sector", row.sector.as_str())
            .text("market_cap", format_thousands(row.market_cap, 1))
            .text("percentage", format!("{:.2}%", row.percentage))
    })?;
    Ok(render(SECTOR_TABLE, &Vars::new().html("rows", rows))?)
}

fn sector_section(allocation: &SectorAllocation) -> Result<String> {
    let mut html = if allocation.is_empty() {
        SECTORS_EMPTY.to_string()
    } else {
        sector_table(allocation)? + "\n"
    };

    if !allocation.unallocated.is_empty() {
        let vars = Vars::new().text("sectors", allocation.unallocated.join(", "));
        html.push_str(&render(UNALLOCATED, &vars)?);
    }
    Ok(html)
}

fn chart_references(charts: &[ChartOutcome]) -> Result<String> {
    let generated: Vec<&ChartOutcome> = charts.iter().filter(|c| c.is_generated()).collect();
    let skipped: Vec<&str> = charts
        .iter()
        .filter(|c| !c.is_generated())
        .map(|c| c.kind.title())
        .collect();

    let mut html = if generated.is_empty() {
        CHARTS_NONE.to_string()
    } else {
        let items = render_each(CHART_ITEM, &generated, |c| {
            Vars::new()
                .text("title", c.kind.title())
                .text("file", c.kind.file_name())
        })?;
        render(CHARTS_ATTACHED, &Vars::new().html("items", items))?
    };

    if !skipped.is_empty() {
        let vars = Vars::new().text("titles", skipped.join(", "));
        html.push_str(&render(CHARTS_SKIPPED, &vars)?);
    }
    Ok(html)
}

/// Compose the complete HTML document
pub fn compose(ctx: &ReportContext) -> Result<String> {
    let vars = Vars::new()
        .text("title", REPORT_TITLE)
        .text("as_of", date_label(ctx.as_of))
        .text("session", session_label(ctx.movers.session))
        .text("currency", ctx.currency_symbol)
        .text("unit", REPORTING_UNIT_LABEL)
        .html("charts", chart_references(ctx.charts)?)
        .html("gainers", mover_items(&ctx.movers.gainers, ctx.currency_symbol)?)
        .html("losers", mover_items(&ctx.movers.losers, ctx.currency_symbol)?)
        .html("market_cap_table", market_cap_table(ctx.ranked)?)
        .html("sector_section", sector_section(ctx.sectors)?);

    Ok(render(EMAIL_BODY, &vars)?)
}

/// Write the report into `output_dir`, returning its path
pub fn write_report(output_dir: &Path, html: &str) -> Result<PathBuf> {
    let path = output_dir.join(artifact::REPORT);
    write_atomic(&path, html.as_bytes())?;
    info!("Report written: {}", path.display());
    Ok(path)
}
