//! Column and row models for tables without a fixed schema.
//!
//! News rows arrive with whatever fields the processing service filled in.
//! [`news_columns`] picks the columns worth showing: known fields first, in the
//! order of [`PRIORITY_COLUMNS`], then any other field that carries data, in
//! first-seen order. Generic sheets are simpler: [`sheet_columns`] shows one
//! column per header and nothing else.
//!
//! Rows also get a display id ([`row_id`]) and a status class ([`row_class`]).

use crate::models::Row;
use itertools::Itertools;
use serde_json::Value;
use std::collections::HashSet;
use std::fmt;

/// Display width of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Width {
    Fixed(u16),
    Flex { flex: u8, min: u16 },
}

impl Width {
    /// Minimum width in pixels.
    pub fn min_px(&self) -> u16 {
        match self {
            Width::Fixed(w) => *w,
            Width::Flex { min, .. } => *min,
        }
    }
}

/// Static description of a known column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnSpec {
    pub field: &'static str,
    pub header: &'static str,
    pub width: Width,
}

const fn fixed(field: &'static str, header: &'static str, w: u16) -> ColumnSpec {
    ColumnSpec {
        field,
        header,
        width: Width::Fixed(w),
    }
}

const fn flex(field: &'static str, header: &'static str, flex: u8, min: u16) -> ColumnSpec {
    ColumnSpec {
        field,
        header,
        width: Width::Flex { flex, min },
    }
}

/// Known news fields, in display order.
pub const PRIORITY_COLUMNS: [ColumnSpec; 19] = [
    fixed("id", "ID", 70),
    fixed("sqk", "SQK", 80),
    flex("url", "URL", 2, 260),
    fixed("topic", "Topic", 140),
    fixed("priority", "Priority", 100),
    flex("titleRu", "Title RU", 2, 220),
    flex("summary", "Summary", 3, 320),
    flex("titleEn", "Title EN", 2, 220),
    fixed("source", "Source", 140),
    fixed("verifyStatus", "Verify", 110),
    fixed("contentMethod", "Method", 110),
    fixed("metaDate", "Date", 160),
    fixed("metaAuthor", "Author", 140),
    fixed("metaSiteName", "Site", 140),
    fixed("metaLang", "Lang", 80),
    flex("error", "Error / Log", 2, 220),
    fixed("status", "Status", 120),
    flex("result", "Result", 2, 200),
    fixed("processed_at", "Processed At", 160),
];

/// Columns shown when there are no rows at all.
pub const EMPTY_STATE_COLUMNS: usize = 10;

/// Fields that are bookkeeping, never data.
const SKIP_FIELDS: [&str; 2] = ["__rowNumber", "null"];

const EXTRA_WIDTH: Width = Width::Flex { flex: 1, min: 120 };
const SHEET_WIDTH: Width = Width::Flex { flex: 1, min: 140 };

/// A column chosen for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub field: String,
    pub header: String,
    pub width: Width,
}

impl From<&ColumnSpec> for Column {
    fn from(spec: &ColumnSpec) -> Self {
        Self {
            field: spec.field.to_string(),
            header: spec.header.to_string(),
            width: spec.width,
        }
    }
}

fn has_data(v: &Value) -> bool {
    match v {
        Value::Null => false,
        Value::String(s) => !s.is_empty(),
        _ => true,
    }
}

/// Infer the columns for a news-style table.
pub fn news_columns(rows: &[Row]) -> Vec<Column> {
    if rows.is_empty() {
        return PRIORITY_COLUMNS[..EMPTY_STATE_COLUMNS].iter().map(Column::from).collect();
    }

    // First-seen order matters for the trailing columns.
    let with_data: Vec<&str> = rows
        .iter()
        .flat_map(|row| row.iter())
        .filter(|(k, v)| has_data(v) && !SKIP_FIELDS.contains(&k.as_str()))
        .map(|(k, _)| k.as_str())
        .unique()
        .collect();
    let present: HashSet<&str> = with_data.iter().copied().collect();

    let mut columns: Vec<Column> = PRIORITY_COLUMNS
        .iter()
        .filter(|spec| present.contains(spec.field))
        .map(Column::from)
        .collect();

    let known: HashSet<&str> = PRIORITY_COLUMNS.iter().map(|s| s.field).collect();
    columns.extend(
        with_data
            .into_iter()
            .filter(|f| !known.contains(f))
            .map(|f| Column {
                field: f.to_string(),
                header: f.to_string(),
                width: EXTRA_WIDTH,
            }),
    );
    columns
}

/// One column per non-empty header, in order.
pub fn sheet_columns(headers: &[String]) -> Vec<Column> {
    headers
        .iter()
        .filter(|h| !h.is_empty())
        .map(|h| Column {
            field: h.clone(),
            header: h.clone(),
            width: SHEET_WIDTH,
        })
        .collect()
}

/// How a row is identified on screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowId {
    Explicit(String),
    Position(usize),
}

impl fmt::Display for RowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RowId::Explicit(s) => f.write_str(s),
            RowId::Position(n) => write!(f, "{n}"),
        }
    }
}

/// Which values count as "present" when picking a row id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdRule {
    /// Anything but null (news tables).
    NonNull,
    /// Skip null, `""`, `0` and `false` as well (sheet tables).
    Truthy,
}

fn id_candidate(v: Option<&Value>, rule: IdRule) -> Option<String> {
    let v = v?;
    let usable = match (rule, v) {
        (_, Value::Null) => false,
        (IdRule::NonNull, _) => true,
        (IdRule::Truthy, Value::String(s)) => !s.is_empty(),
        (IdRule::Truthy, Value::Bool(b)) => *b,
        (IdRule::Truthy, Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0),
        (IdRule::Truthy, _) => true,
    };
    usable.then(|| match v {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    })
}

/// Display id for the row at zero-based `index`: `id`, else `sqk`, else the
/// 1-based position.
pub fn row_id(row: &Row, index: usize, rule: IdRule) -> RowId {
    id_candidate(row.get("id"), rule)
        .or_else(|| id_candidate(row.get("sqk"), rule))
        .map(RowId::Explicit)
        .unwrap_or(RowId::Position(index + 1))
}

/// Visual status bucket of a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowClass {
    Error,
    Pending,
    Plain,
}

fn status_text(v: Option<&Value>) -> Option<String> {
    match v? {
        Value::Null => None,
        Value::String(s) if s.is_empty() => None,
        Value::Bool(false) => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// Lowercased status token: `status`, or `verifyStatus` when `status` is blank.
pub fn status_token(row: &Row) -> String {
    status_text(row.get("status"))
        .or_else(|| status_text(row.get("verifyStatus")))
        .unwrap_or_default()
        .to_lowercase()
}

pub fn row_class(row: &Row) -> RowClass {
    match status_token(row).as_str() {
        "error" => RowClass::Error,
        "pending" => RowClass::Pending,
        _ => RowClass::Plain,
    }
}

/// Processing totals for the dashboard. Only `status` counts here.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusSummary {
    pub total: usize,
    pub done: usize,
    pub pending: usize,
    pub errors: usize,
}

pub fn status_summary(rows: &[Row]) -> StatusSummary {
    let token = |row: &Row| status_text(row.get("status")).unwrap_or_default().to_lowercase();
    let errors = rows.iter().filter(|r| token(r) == "error").count();
    let pending = rows.iter().filter(|r| token(r) == "pending").count();
    StatusSummary {
        total: rows.len(),
        done: rows.len() - errors - pending,
        pending,
        errors,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn rows(v: Value) -> Vec<Row> {
        v.as_array()
            .unwrap()
            .iter()
            .map(|r| r.as_object().unwrap().clone())
            .collect()
    }

    fn fields(cols: &[Column]) -> Vec<&str> {
        cols.iter().map(|c| c.field.as_str()).collect()
    }

    #[test]
    fn test_empty_fields_are_dropped() {
        let rows = rows(json!([
            {"id": 1, "url": "a", "empty": ""},
            {"id": 2, "url": "b", "empty": null}
        ]));
        assert_eq!(fields(&news_columns(&rows)), vec!["id", "url"]);
    }

    #[test]
    fn test_priority_order_then_first_seen_extras() {
        let rows = rows(json!([
            {"zeta": "z", "status": "done", "url": "u", "alpha": "a"},
            {"summary": "s", "id": 4, "beta": 1}
        ]));
        assert_eq!(
            fields(&news_columns(&rows)),
            vec!["id", "url", "summary", "status", "zeta", "alpha", "beta"]
        );
        let extra = news_columns(&rows).pop().unwrap();
        assert_eq!(extra.header, "beta");
        assert_eq!(extra.width, Width::Flex { flex: 1, min: 120 });
    }

    #[test]
    fn test_skip_fields_ignored() {
        let rows = rows(json!([{"__rowNumber": 7, "null": "x", "url": "u"}]));
        assert_eq!(fields(&news_columns(&rows)), vec!["url"]);
    }

    #[test]
    fn test_empty_rows_get_default_schema() {
        let cols = news_columns(&[]);
        assert_eq!(cols.len(), EMPTY_STATE_COLUMNS);
        assert_eq!(cols[0].field, "id");
        assert_eq!(cols[9].field, "verifyStatus");
        assert_eq!(cols[9].header, "Verify");
    }

    #[test]
    fn test_priority_table_fields_are_unique() {
        let unique: HashSet<&str> = PRIORITY_COLUMNS.iter().map(|c| c.field).collect();
        assert_eq!(unique.len(), PRIORITY_COLUMNS.len());
    }

    #[test]
    fn test_every_priority_column_is_recognised() {
        for spec in PRIORITY_COLUMNS {
            let mut row = Row::new();
            row.insert(spec.field.to_string(), json!("x"));
            let cols = news_columns(&[row]);
            assert_eq!(cols, vec![Column::from(&spec)], "{}", spec.field);
        }
    }

    #[test]
    fn test_sheet_columns_follow_headers() {
        let headers = vec!["b".to_string(), String::new(), "a".to_string()];
        let cols = sheet_columns(&headers);
        assert_eq!(fields(&cols), vec!["b", "a"]);
        assert!(cols.iter().all(|c| c.width.min_px() == 140));
    }

    #[test]
    fn test_row_id_fallbacks() {
        let rows = rows(json!([
            {"id": 5, "sqk": "S"},
            {"sqk": "X1"},
            {"url": "u"},
            {"id": null, "sqk": null}
        ]));
        let ids: Vec<RowId> = rows
            .iter()
            .enumerate()
            .map(|(i, r)| row_id(r, i, IdRule::NonNull))
            .collect();
        assert_eq!(
            ids,
            vec![
                RowId::Explicit("5".into()),
                RowId::Explicit("X1".into()),
                RowId::Position(3),
                RowId::Position(4),
            ]
        );
    }

    #[test]
    fn test_row_id_truthy_rule() {
        let row = json!({"id": "", "sqk": 0}).as_object().unwrap().clone();
        assert_eq!(row_id(&row, 1, IdRule::Truthy), RowId::Position(2));
        assert_eq!(row_id(&row, 1, IdRule::NonNull), RowId::Explicit(String::new()));
    }

    #[test]
    fn test_row_class() {
        let rows = rows(json!([
            {"status": "ERROR"},
            {"status": "", "verifyStatus": "Pending"},
            {"status": "done", "verifyStatus": "error"},
            {}
        ]));
        let classes: Vec<RowClass> = rows.iter().map(row_class).collect();
        assert_eq!(
            classes,
            vec![RowClass::Error, RowClass::Pending, RowClass::Plain, RowClass::Plain]
        );
    }

    #[test]
    fn test_status_summary_uses_status_only() {
        let rows = rows(json!([
            {"status": "done"},
            {"status": "pending"},
            {"status": "Error"},
            {"verifyStatus": "error"}
        ]));
        assert_eq!(
            status_summary(&rows),
            StatusSummary {
                total: 4,
                done: 2,
                pending: 1,
                errors: 1
            }
        );
    }
}
