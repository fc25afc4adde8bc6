//! Named sheets with special meaning, dated news archives, and the ads book.
//!
//! Most sheets are plain tables. A handful are dedicated to one purpose:
//!
//! | Sheet | Purpose |
//! |-------|---------|
//! | `REF` | reference data (topics, labels) |
//! | `schedule` | publishing schedule |
//! | `errors` | processing error log |
//! | `audio` | audio generation prompts |
//! | `ai-instructions` | remote copy of the prompt table |
//! | `ads` | advertisement entries |
//!
//! Sheets named `news <date>` are read-only snapshots of past editions.

use crate::error::ConsoleError;
use crate::models::{AD_HEADERS, AdEntry, RecordId, SheetCollection, SheetTable};
use once_cell::sync::Lazy;
use regex::Regex;

pub const REF_SHEET: &str = "REF";
pub const SCHEDULE_SHEET: &str = "schedule";
pub const ERRORS_SHEET: &str = "errors";
pub const AUDIO_SHEET: &str = "audio";
pub const PROMPTS_SHEET: &str = "ai-instructions";
pub const ADS_SHEET: &str = "ads";

/// Sheets with a dedicated editor.
pub const DEDICATED_SHEETS: [&str; 4] = [REF_SHEET, SCHEDULE_SHEET, ERRORS_SHEET, AUDIO_SHEET];

static ARCHIVE_NAME: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^news\s").expect("static regex"));
static ARCHIVE_PREFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^news\s*").expect("static regex"));

pub fn is_archive(name: &str) -> bool {
    name != "news" && ARCHIVE_NAME.is_match(name)
}

/// Archive sheet names, newest first (names carry ISO dates).
pub fn archive_names(sheets: &SheetCollection) -> Vec<&str> {
    let mut names: Vec<&str> = sheets.keys().map(String::as_str).filter(|n| is_archive(n)).collect();
    names.sort_unstable_by(|a, b| b.cmp(a));
    names
}

/// `news 2025-05-06` → `2025-05-06`.
pub fn archive_label(name: &str) -> &str {
    match ARCHIVE_PREFIX.find(name) {
        Some(m) => &name[m.end()..],
        None => name,
    }
}

/// The `ads` sheet for a list of entries.
pub fn ads_table(ads: &[AdEntry]) -> SheetTable {
    SheetTable::new(
        AD_HEADERS.iter().map(|h| h.to_string()).collect(),
        ads.iter().map(AdEntry::to_row).collect(),
    )
}

/// Editable list of ads. Indexes are zero-based.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AdBook {
    pub entries: Vec<AdEntry>,
}

impl AdBook {
    pub fn new(entries: Vec<AdEntry>) -> Self {
        Self { entries }
    }

    pub fn active_count(&self) -> usize {
        self.entries.iter().filter(|a| a.active).count()
    }

    /// Append a default entry identified by `id_millis` (creation time).
    pub fn add(&mut self, id_millis: i64) -> &mut AdEntry {
        self.entries.push(AdEntry::new(RecordId::Number(id_millis.into())));
        let last = self.entries.len() - 1;
        &mut self.entries[last]
    }

    fn get_mut(&mut self, index: usize) -> Result<&mut AdEntry, ConsoleError> {
        let len = self.entries.len();
        self.entries
            .get_mut(index)
            .ok_or_else(|| ConsoleError::validation(format!("No ad #{} (have {len})", index + 1)))
    }

    pub fn remove(&mut self, index: usize) -> Result<AdEntry, ConsoleError> {
        self.get_mut(index)?;
        Ok(self.entries.remove(index))
    }

    pub fn toggle(&mut self, index: usize) -> Result<bool, ConsoleError> {
        let ad = self.get_mut(index)?;
        ad.active = !ad.active;
        Ok(ad.active)
    }

    pub fn update(&mut self, index: usize, field: &str, value: &str) -> Result<(), ConsoleError> {
        self.get_mut(index)?.set_field(field, value)
    }
}
