//! Formatting helpers and file system checks.
//!
//! - Cell text for Markdown tables (escaping, truncation)
//! - Human-readable sizes and durations for the audio playlist
//! - Output directory validation for exports

use std::error::Error;
use std::fs as stdfs;
use tokio::fs;
use tracing::{info, instrument};

/// Truncate to `max` characters, appending `…` when anything was cut.
///
/// Counts characters, not bytes, so Cyrillic titles are cut cleanly.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(truncate_chars("short", 10), "short");
/// assert_eq!(truncate_chars("Заголовок", 4), "Заго…");
/// ```
pub fn truncate_chars(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        None => s.to_string(),
        Some((cut, _)) => format!("{}…", &s[..cut]),
    }
}

/// Make text safe for a single Markdown table cell.
pub fn escape_cell(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('|', "\\|")
        .replace("\r\n", " ")
        .replace(['\n', '\r'], " ")
}

/// Human-readable file size: bytes, whole KB, or MB with one decimal.
/// Zero renders as an empty string.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(format_size(512), "512 B");
/// assert_eq!(format_size(183_500), "179 KB");
/// assert_eq!(format_size(2_411_724), "2.3 MB");
/// ```
pub fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = 1024 * 1024;
    if bytes == 0 {
        String::new()
    } else if bytes < KB {
        format!("{bytes} B")
    } else if bytes < MB {
        format!("{:.0} KB", bytes as f64 / KB as f64)
    } else {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    }
}

/// `m:ss`, or empty for missing, zero or non-finite durations.
pub fn format_duration(seconds: Option<f64>) -> String {
    match seconds {
        Some(s) if s.is_finite() && s > 0.0 => {
            let total = s.floor() as u64;
            format!("{}:{:02}", total / 60, total % 60)
        }
        _ => String::new(),
    }
}

/// Ensure a directory exists and is writable.
///
/// Creates the directory if needed, then writes and removes a probe file.
#[instrument(level = "info", skip_all, fields(path = %path))]
pub async fn ensure_writable_dir(path: &str) -> Result<(), Box<dyn Error>> {
    if let Err(e) = fs::create_dir_all(path).await {
        return Err(Box::new(e));
    }
    let probe_path = format!("{}/..__probe_write__", path.trim_end_matches('/'));
    match stdfs::File::create(&probe_path) {
        Ok(_) => {
            let _ = stdfs::remove_file(&probe_path);
            info!("Output directory is writable");
            Ok(())
        }
        Err(e) => Err(Box::new(e)),
    }
}
