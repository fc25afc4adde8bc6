//! JSON export of a loaded snapshot.
//!
//! # Output Structure
//!
//! ```text
//! out_dir/
//! └── 2025-05-06/
//!     ├── news.json
//!     ├── prompts.json
//!     ├── sheets.json
//!     ├── slides.json
//!     ├── audio.json
//!     ├── release.json
//!     └── health.json
//! ```
//!
//! Exporting twice on the same day overwrites that day's files.

use crate::models::Snapshot;
use crate::utils::ensure_writable_dir;
use chrono::Local;
use serde::Serialize;
use std::error::Error;
use std::path::PathBuf;
use tokio::fs;
use tracing::{error, info, instrument};

async fn write_pretty<T: Serialize + ?Sized>(dir: &str, name: &str, value: &T) -> Result<(), Box<dyn Error>> {
    let path = format!("{dir}/{name}.json");
    let json = serde_json::to_string_pretty(value)?;
    fs::write(&path, json).await?;
    info!(%path, "Wrote export file");
    Ok(())
}

/// Write every resource of `snapshot` under `{out_dir}/{today}/`.
///
/// Returns the dated directory.
#[instrument(level = "info", skip_all, fields(out_dir = %out_dir))]
pub async fn write_snapshot(snapshot: &Snapshot, out_dir: &str) -> Result<PathBuf, Box<dyn Error>> {
    let date = Local::now().date_naive().to_string();
    let full_dir = format!("{}/{}", out_dir.trim_end_matches('/'), date);

    if let Err(e) = ensure_writable_dir(&full_dir).await {
        error!(%full_dir, error = %e, "Export directory is not writable");
        return Err(e);
    }

    write_pretty(&full_dir, "news", &snapshot.news).await?;
    write_pretty(&full_dir, "prompts", &snapshot.prompts).await?;
    write_pretty(&full_dir, "sheets", &snapshot.sheets).await?;
    write_pretty(&full_dir, "slides", &snapshot.slides).await?;
    write_pretty(&full_dir, "audio", &snapshot.audio).await?;
    write_pretty(&full_dir, "release", &snapshot.release).await?;
    write_pretty(&full_dir, "health", &snapshot.health).await?;

    info!(%full_dir, "Export complete");
    Ok(PathBuf::from(full_dir))
}
