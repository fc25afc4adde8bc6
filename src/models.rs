//! Data models for the digest content service.
//!
//! This module defines the resources the console reads and writes:
//! - [`NewsItem`]: one row of the news report, with unknown fields preserved
//! - [`SheetTable`] / [`PromptSet`]: header-ordered tables, saved as a unit
//! - [`Slide`], [`AudioFile`]: read-only generated media listings
//! - [`AdEntry`]: advertisement rows kept in the `ads` sheet
//! - [`DataMode`]: the persisted choice between the API and local data
//!
//! Field names on the wire are camelCase (with the odd `processed_at`), so
//! most structs carry explicit serde renames.

use crate::error::ConsoleError;
use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// A loosely-typed record as delivered by the spreadsheet backend.
pub type Row = serde_json::Map<String, Value>;

/// Free-form release metadata.
pub type ReleaseInfo = Row;

/// Sheet name → table.
pub type SheetCollection = BTreeMap<String, SheetTable>;

/// The AI instruction table. Same shape as any other sheet, always replaced whole.
pub type PromptSet = SheetTable;

/// Identifier as found on the wire: sometimes a number, sometimes a string.
///
/// Two ids are the same record when their string forms are equal, so `7` and
/// `"7"` match.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordId {
    Number(serde_json::Number),
    Text(String),
}

impl RecordId {
    /// Parse user input. Only canonical integers (`12`, not `012` or `+12`)
    /// become numbers, so the string form never changes.
    pub fn parse(s: &str) -> Self {
        match s.parse::<i64>() {
            Ok(n) if n.to_string() == s => RecordId::Number(n.into()),
            _ => RecordId::Text(s.to_string()),
        }
    }

    pub fn from_index(n: usize) -> Self {
        RecordId::Number((n as u64).into())
    }

    pub fn matches(&self, other: &RecordId) -> bool {
        self.to_string() == other.to_string()
    }
}

impl PartialEq for RecordId {
    fn eq(&self, other: &Self) -> bool {
        self.matches(other)
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordId::Number(n) => write!(f, "{n}"),
            RecordId::Text(s) => f.write_str(s),
        }
    }
}

fn scalar_text(v: Value) -> Option<String> {
    match v {
        Value::Null => None,
        Value::String(s) => Some(s),
        other => Some(other.to_string()),
    }
}

/// Any JSON value as optional text; non-string scalars keep their JSON spelling.
fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(scalar_text(Value::deserialize(deserializer)?))
}

fn lenient_id<'de, D>(deserializer: D) -> Result<Option<RecordId>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Null => None,
        Value::Number(n) => Some(RecordId::Number(n)),
        other => scalar_text(other).map(RecordId::Text),
    })
}

/// `null` → empty, a lone string → one item, arrays keep their non-null items.
fn lenient_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Array(items) => items.into_iter().filter_map(scalar_text).collect(),
        other => scalar_text(other).into_iter().collect(),
    })
}

fn lenient_name<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(lenient_text(deserializer)?.unwrap_or_default())
}

fn lenient_size<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite() && *f > 0.0).map(|f| f as u64))
            .unwrap_or(0),
        Value::String(s) => s.trim().parse().unwrap_or(0),
        _ => 0,
    })
}

fn lenient_seconds<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    })
}

/// A news report row.
///
/// Only the fields the console acts on are typed; everything else the
/// processing service attaches (titles, metadata, priority...) rides along in
/// `fields` and keeps its original order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewsItem {
    #[serde(default, deserialize_with = "lenient_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<RecordId>,
    #[serde(default, deserialize_with = "lenient_id", skip_serializing_if = "Option::is_none")]
    pub sqk: Option<RecordId>,
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(rename = "verifyStatus", default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub verify_status: Option<String>,
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub processed_at: Option<String>,
    #[serde(flatten)]
    pub fields: Row,
}

impl NewsItem {
    /// A freshly submitted URL awaiting processing.
    pub fn pending(id: RecordId, url: impl Into<String>) -> Self {
        Self {
            id: Some(id),
            url: Some(url.into()),
            status: Some("pending".to_string()),
            result: Some(String::new()),
            error: Some(String::new()),
            processed_at: Some(String::new()),
            ..Default::default()
        }
    }

    /// Flatten into a generic row for table shaping.
    pub fn to_row(&self) -> Row {
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map,
            _ => Row::new(),
        }
    }
}

/// Body of `POST /report/update`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewsUpdate {
    #[serde(default)]
    pub add: Vec<String>,
    #[serde(default)]
    pub remove: Vec<RecordId>,
}

/// A header-ordered table. Headers and rows always travel together.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SheetTable {
    #[serde(default, deserialize_with = "lenient_headers")]
    pub headers: Vec<String>,
    #[serde(default)]
    pub rows: Vec<Row>,
}

fn lenient_headers<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<Vec<Option<Value>>> = Option::deserialize(deserializer)?;
    Ok(raw
        .unwrap_or_default()
        .into_iter()
        .map(|h| match h {
            Some(Value::String(s)) => s,
            Some(Value::Null) | None => String::new(),
            Some(other) => other.to_string(),
        })
        .collect())
}

impl SheetTable {
    pub fn new(headers: Vec<String>, rows: Vec<Row>) -> Self {
        Self { headers, rows }
    }

    /// Headers that name a column (blank headers are placeholders).
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.headers.iter().map(String::as_str).filter(|h| !h.is_empty())
    }

    /// Overwrite one cell. `row` is zero-based.
    pub fn set_cell(&mut self, row: usize, column: &str, value: &str) -> Result<(), ConsoleError> {
        if !self.columns().any(|c| c == column) {
            return Err(ConsoleError::validation(format!("Unknown column: {column}")));
        }
        let len = self.rows.len();
        let target = self
            .rows
            .get_mut(row)
            .ok_or_else(|| ConsoleError::validation(format!("Row {} out of range (1..={len})", row + 1)))?;
        target.insert(column.to_string(), Value::String(value.to_string()));
        Ok(())
    }
}

/// One generated slide.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Slide {
    #[serde(default, deserialize_with = "lenient_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<RecordId>,
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub slide: Option<String>,
    #[serde(rename = "type", default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, deserialize_with = "lenient_list")]
    pub texts: Vec<String>,
    #[serde(default, deserialize_with = "lenient_list")]
    pub urls: Vec<String>,
    #[serde(default, deserialize_with = "lenient_id", skip_serializing_if = "Option::is_none")]
    pub sqk: Option<RecordId>,
    #[serde(rename = "topicId", default, deserialize_with = "lenient_id", skip_serializing_if = "Option::is_none")]
    pub topic_id: Option<RecordId>,
    #[serde(rename = "thumbnailUrl", default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
}

/// The slide classifications the pipeline produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SlideKind {
    TopicOverview,
    NewsSlide,
    AdOrTitle,
    Other,
}

impl SlideKind {
    pub const ALL: [SlideKind; 4] = [
        SlideKind::TopicOverview,
        SlideKind::NewsSlide,
        SlideKind::AdOrTitle,
        SlideKind::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SlideKind::TopicOverview => "topic-overview",
            SlideKind::NewsSlide => "news-slide",
            SlideKind::AdOrTitle => "ad-or-title",
            SlideKind::Other => "other",
        }
    }

    /// Exact match on the wire value; anything unrecognised is `None`.
    pub fn from_wire(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.as_str() == s)
    }
}

impl Slide {
    /// Known kind, falling back to [`SlideKind::Other`].
    pub fn kind(&self) -> SlideKind {
        self.kind
            .as_deref()
            .and_then(SlideKind::from_wire)
            .unwrap_or(SlideKind::Other)
    }

    /// Label shown on the card; the raw type or `unknown`.
    pub fn kind_label(&self) -> &str {
        match self.kind.as_deref() {
            Some(k) if !k.is_empty() => k,
            _ => "unknown",
        }
    }

    pub fn title(&self) -> String {
        if let Some(first) = self.texts.first().filter(|t| !t.is_empty()) {
            return first.clone();
        }
        if let Some(slide) = self.slide.as_ref().filter(|s| !s.is_empty()) {
            return slide.clone();
        }
        match &self.id {
            Some(id) => format!("Slide {id}"),
            None => "Slide".to_string(),
        }
    }

    pub fn subtitle(&self) -> String {
        self.texts.iter().skip(1).take(2).map(String::as_str).collect::<Vec<_>>().join(" | ")
    }

    /// Thumbnail from the API when present, otherwise the statically served file.
    pub fn image_src(&self) -> String {
        match self.thumbnail_url.as_ref().filter(|u| !u.is_empty()) {
            Some(url) => url.clone(),
            None => format!("/slides/{}.png", self.slide.as_deref().unwrap_or_default()),
        }
    }
}

/// One rendered audio file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AudioFile {
    #[serde(default, deserialize_with = "lenient_name")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient_size")]
    pub size: u64,
    /// Seconds, if something already measured it. Never written back.
    #[serde(default, deserialize_with = "lenient_seconds", skip_serializing)]
    pub duration: Option<f64>,
}

impl AudioFile {
    pub fn source_path(&self) -> String {
        format!("/audio/{}", self.name)
    }
}

/// Header order of the `ads` sheet.
pub const AD_HEADERS: [&str; 8] = [
    "id", "title", "url", "active", "startDate", "endDate", "position", "notes",
];

/// An advertisement slot. The date window is informational only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdEntry {
    pub id: RecordId,
    pub title: String,
    pub url: String,
    pub active: bool,
    #[serde(rename = "startDate")]
    pub start_date: String,
    #[serde(rename = "endDate")]
    pub end_date: String,
    pub position: String,
    pub notes: String,
}

impl AdEntry {
    pub fn new(id: RecordId) -> Self {
        Self {
            id,
            title: String::new(),
            url: String::new(),
            active: true,
            start_date: String::new(),
            end_date: String::new(),
            position: "any".to_string(),
            notes: String::new(),
        }
    }

    /// Build from a sheet row. Spreadsheets hand back booleans as text, so
    /// `active` accepts `true`, `TRUE`, `1` and friends.
    pub fn from_row(row: &Row, index: usize) -> Self {
        let text = |key: &str| -> String {
            match row.get(key) {
                Some(Value::String(s)) => s.clone(),
                Some(Value::Null) | None => String::new(),
                Some(other) => other.to_string(),
            }
        };
        let id = match row.get("id") {
            Some(Value::Number(n)) => RecordId::Number(n.clone()),
            Some(Value::String(s)) if !s.is_empty() => RecordId::parse(s),
            _ => RecordId::from_index(index + 1),
        };
        let active = match row.get("active") {
            Some(Value::Bool(b)) => *b,
            Some(Value::Number(n)) => n.as_i64().is_some_and(|n| n != 0),
            Some(Value::String(s)) => matches!(s.trim().to_lowercase().as_str(), "true" | "1" | "yes"),
            _ => false,
        };
        let position = text("position");
        Self {
            id,
            title: text("title"),
            url: text("url"),
            active,
            start_date: text("startDate"),
            end_date: text("endDate"),
            position: if position.is_empty() { "any".to_string() } else { position },
            notes: text("notes"),
        }
    }

    pub fn to_row(&self) -> Row {
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map,
            _ => Row::new(),
        }
    }

    /// Set one editable field by its sheet header name.
    pub fn set_field(&mut self, field: &str, value: &str) -> Result<(), ConsoleError> {
        match field {
            "title" => self.title = value.to_string(),
            "url" => self.url = value.to_string(),
            "startDate" => self.start_date = parse_day(value)?,
            "endDate" => self.end_date = parse_day(value)?,
            "position" => self.position = value.to_string(),
            "notes" => self.notes = value.to_string(),
            "active" => {
                self.active = value
                    .parse::<bool>()
                    .map_err(|_| ConsoleError::validation(format!("active must be true or false, got {value}")))?
            }
            other => return Err(ConsoleError::validation(format!("Unknown ad field: {other}"))),
        }
        Ok(())
    }
}

/// Validate an ad date as `YYYY-MM-DD`. Empty clears the date.
pub fn parse_day(value: &str) -> Result<String, ConsoleError> {
    if value.is_empty() {
        return Ok(String::new());
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map(|d| d.to_string())
        .map_err(|e| ConsoleError::validation(format!("expected YYYY-MM-DD, got {value:?}: {e}")))
}

/// Response of `GET /health`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HealthStatus {
    #[serde(default)]
    pub ok: bool,
    #[serde(flatten)]
    pub details: Row,
}

impl HealthStatus {
    pub fn down() -> Self {
        Self::default()
    }
}

/// Acknowledgement returned by write operations.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SaveAck {
    #[serde(default)]
    pub ok: bool,
    #[serde(flatten)]
    pub details: Row,
}

impl SaveAck {
    pub fn ok() -> Self {
        Self {
            ok: true,
            details: Row::new(),
        }
    }
}

/// Where data comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataMode {
    Api,
    Local,
}

impl DataMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            DataMode::Api => "api",
            DataMode::Local => "local",
        }
    }
}

impl fmt::Display for DataMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DataMode {
    type Err = ConsoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "api" => Ok(DataMode::Api),
            "local" => Ok(DataMode::Local),
            other => Err(ConsoleError::validation(format!(
                "unknown data mode {other:?} (expected api or local)"
            ))),
        }
    }
}

/// Everything the dashboard shows, loaded in one pass.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Snapshot {
    pub news: Vec<NewsItem>,
    pub prompts: PromptSet,
    pub sheets: SheetCollection,
    pub slides: Vec<Slide>,
    pub audio: Vec<AudioFile>,
    pub release: ReleaseInfo,
    pub health: HealthStatus,
}
