use chrono::NaiveDate;
use std::fs;
use std::path::{Path, PathBuf};

use crate::constants::DATE_LABEL_FORMAT;
use crate::error::{Error, Result};

/// Format a date the way tables and chart axes show it (dd-mm-YYYY)
pub fn date_label(date: NaiveDate) -> String {
    date.format(DATE_LABEL_FORMAT).to_string()
}

/// Format a number with thousands separators and fixed decimals.
///
/// `format_thousands(1234567.891, 1)` gives `"1,234,567.9"`.
pub fn format_thousands(value: f64, decimals: usize) -> String {
    if !value.is_finite() {
        return "N/A".to_string();
    }

    let formatted = format!("{:.*}", decimals, value.abs());
    let (int_part, frac_part) = match formatted.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (formatted.as_str(), None),
    };

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    // "-0.0" after rounding is shown without the sign
    let negative = value < 0.0 && formatted.chars().any(|c| c.is_ascii_digit() && c != '0');

    let mut out = String::new();
    if negative {
        out.push('-');
    }
    out.push_str(&grouped);
    if let Some(frac) = frac_part {
        out.push('.');
        out.push_str(frac);
    }
    out
}

/// Same as [`format_thousands`] but renders a missing value as `N/A`
pub fn format_optional(value: Option<f64>, decimals: usize) -> String {
    match value {
        Some(v) => format_thousands(v, decimals),
        None => "N/A".to_string(),
    }
}

/// Escape text for inclusion in HTML or SVG markup
pub fn escape_markup(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Create the output directory (and parents) if it does not exist
pub fn ensure_output_dir(dir: &Path) -> Result<()> {
    if !dir.exists() {
        fs::create_dir_all(dir).map_err(|e| {
            Error::Io(format!("Failed to create output directory {}: {}", dir.display(), e))
        })?;
        tracing::info!("Created output directory: {}", dir.display());
    }
    Ok(())
}

/// Write a file through a temporary sibling and rename it into place,
/// so readers never observe a half-written artifact.
pub fn write_atomic(path: &Path, contents: &[u8]) -> Result<()> {
    let tmp_path = temp_sibling(path);

    fs::write(&tmp_path, contents)
        .map_err(|e| Error::Io(format!("Failed to write {}: {}", tmp_path.display(), e)))?;

    if let Err(e) = fs::rename(&tmp_path, path) {
        let _ = fs::remove_file(&tmp_path);
        return Err(Error::Io(format!("Failed to move {} into place: {}", path.display(), e)));
    }

    Ok(())
}

/// Delete `path`; a file that is already absent is not an error
pub fn remove_if_exists(path: &Path) -> Result<()> {
    match fs::remove_file(path) {
        Ok(()) => {
            tracing::info!("Removed stale {}", path.display());
            Ok(())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(Error::Io(format!("Failed to remove {}: {}", path.display(), e))),
    }
}

fn temp_sibling(path: &Path) -> PathBuf {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "artifact".to_string());
    path.with_file_name(format!(".{}.tmp", file_name))
}
