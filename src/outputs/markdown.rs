//! Markdown rendering of console views.
//!
//! Every command prints Markdown so the output reads well in a terminal and
//! pastes cleanly into chat or a wiki. Tables go through the shaper first, so
//! column choice and row ids match what the rest of the console assumes.

use crate::models::{AudioFile, HealthStatus, NewsItem, ReleaseInfo, Row, SheetCollection, SheetTable, Slide, SlideKind};
use crate::shaper::{self, Column, IdRule, RowClass, StatusSummary};
use crate::sheets::{AdBook, DEDICATED_SHEETS, PROMPTS_SHEET, ADS_SHEET, archive_label, archive_names, is_archive};
use crate::utils::{escape_cell, format_duration, format_size, truncate_chars};
use itertools::Itertools;
use serde_json::Value;
use std::fmt::Write;

/// Characters of cell text per column, derived from its minimum pixel width.
fn cell_budget(col: &Column, compact: bool) -> usize {
    let base = (col.width.min_px() / 7).max(8) as usize;
    if compact { (base * 2 / 3).max(6) } else { base }
}

fn value_text(v: Option<&Value>) -> String {
    match v {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

fn class_marker(class: RowClass) -> &'static str {
    match class {
        RowClass::Error => "⚠",
        RowClass::Pending => "⏳",
        RowClass::Plain => "",
    }
}

fn table_header(out: &mut String, headers: &[&str]) {
    writeln!(out, "| {} |", headers.iter().map(|h| escape_cell(h)).join(" | ")).unwrap();
    writeln!(out, "|{}|", headers.iter().map(|_| "---").join("|")).unwrap();
}

fn table_row(out: &mut String, cells: &[String]) {
    writeln!(out, "| {} |", cells.join(" | ")).unwrap();
}

fn rows_table(rows: &[Row], columns: &[Column], rule: IdRule, compact: bool) -> String {
    let mut md = String::new();
    let mut headers = vec!["#", ""];
    headers.extend(columns.iter().map(|c| c.header.as_str()));
    table_header(&mut md, &headers);
    for (i, row) in rows.iter().enumerate() {
        let mut cells = vec![
            escape_cell(&shaper::row_id(row, i, rule).to_string()),
            class_marker(shaper::row_class(row)).to_string(),
        ];
        cells.extend(columns.iter().map(|c| {
            escape_cell(&truncate_chars(&value_text(row.get(&c.field)), cell_budget(c, compact)))
        }));
        table_row(&mut md, &cells);
    }
    md
}

/// News-style table with inferred columns.
pub fn news_table(rows: &[Row], compact: bool) -> String {
    let columns = shaper::news_columns(rows);
    rows_table(rows, &columns, IdRule::NonNull, compact)
}

pub fn news_items_table(items: &[NewsItem], compact: bool) -> String {
    let rows: Vec<Row> = items.iter().map(NewsItem::to_row).collect();
    news_table(&rows, compact)
}

/// Generic sheet: one column per header.
pub fn sheet_table(table: &SheetTable) -> String {
    let columns = shaper::sheet_columns(&table.headers);
    rows_table(&table.rows, &columns, IdRule::Truthy, true)
}

pub fn status_summary(summary: &StatusSummary) -> String {
    let mut md = String::new();
    table_header(&mut md, &["Total", "Done", "Pending", "Errors"]);
    table_row(
        &mut md,
        &[
            summary.total.to_string(),
            summary.done.to_string(),
            summary.pending.to_string(),
            summary.errors.to_string(),
        ],
    );
    md
}

/// One-line data source indicator.
pub fn data_source(health: &HealthStatus) -> String {
    if health.ok {
        "🟢 Working with the API".to_string()
    } else {
        "🟠 Local data".to_string()
    }
}

/// Overview: status counts and a compact news table.
pub fn dashboard(news: &[NewsItem], health: &HealthStatus) -> String {
    let rows: Vec<Row> = news.iter().map(NewsItem::to_row).collect();
    let mut md = String::new();
    writeln!(md, "# Overview\n").unwrap();
    writeln!(md, "{}\n", data_source(health)).unwrap();
    writeln!(md, "{}", status_summary(&shaper::status_summary(&rows))).unwrap();
    writeln!(md, "## Latest news\n").unwrap();
    md.push_str(&news_table(&rows, true));
    md
}

/// All sheets with row counts and their role.
pub fn sheet_list(sheets: &SheetCollection) -> String {
    let mut md = String::new();
    table_header(&mut md, &["Sheet", "Rows", "Columns", "Role"]);
    for (name, table) in sheets {
        let role = if DEDICATED_SHEETS.contains(&name.as_str()) {
            "dedicated"
        } else if name == PROMPTS_SHEET {
            "prompts"
        } else if name == ADS_SHEET {
            "ads"
        } else if is_archive(name) {
            "archive (read-only)"
        } else {
            ""
        };
        table_row(
            &mut md,
            &[
                escape_cell(name),
                table.rows.len().to_string(),
                table.columns().count().to_string(),
                role.to_string(),
            ],
        );
    }
    md
}

/// Titled sheet view.
pub fn sheet_view(name: &str, table: &SheetTable) -> String {
    let mut md = String::new();
    writeln!(md, "# {name}\n").unwrap();
    md.push_str(&sheet_table(table));
    md
}

pub fn archive_list(sheets: &SheetCollection) -> String {
    let names = archive_names(sheets);
    if names.is_empty() {
        return "No archived editions yet.\n".to_string();
    }
    let mut md = String::new();
    writeln!(md, "# Archive\n").unwrap();
    for name in names {
        let count = sheets.get(name).map(|t| t.rows.len()).unwrap_or_default();
        writeln!(md, "- {} ({count} news) `{name}`", archive_label(name)).unwrap();
    }
    md
}

pub fn archive_view(name: &str, table: &SheetTable) -> String {
    let mut md = String::new();
    writeln!(md, "# {name} ({} news)\n", table.rows.len()).unwrap();
    md.push_str(&news_table(&table.rows, true));
    md
}

/// Gallery: per-type counts, then one line per slide.
pub fn slides_gallery(slides: &[Slide]) -> String {
    let mut md = String::new();
    let counts = SlideKind::ALL
        .iter()
        .filter_map(|kind| {
            let n = slides.iter().filter(|s| s.kind.as_deref() == Some(kind.as_str())).count();
            (n > 0).then(|| format!("{}: {n}", kind.as_str()))
        })
        .join(" · ");
    write!(md, "Total: {}", slides.len()).unwrap();
    if !counts.is_empty() {
        write!(md, " · {counts}").unwrap();
    }
    md.push_str("\n\n");

    table_header(&mut md, &["#", "Type", "Title", "Subtitle", "Image"]);
    for slide in slides {
        table_row(
            &mut md,
            &[
                slide.id.as_ref().map(ToString::to_string).unwrap_or_default(),
                escape_cell(slide.kind_label()),
                escape_cell(&truncate_chars(&slide.title(), 60)),
                escape_cell(&truncate_chars(&slide.subtitle(), 60)),
                escape_cell(&slide.image_src()),
            ],
        );
    }
    md
}

pub fn slide_detail(slide: &Slide) -> String {
    let mut md = String::new();
    writeln!(md, "# {}\n", slide.title()).unwrap();
    writeln!(md, "![{}]({})\n", slide.slide.as_deref().unwrap_or_default(), slide.image_src()).unwrap();
    let mut chips = vec![format!("`{}`", slide.kind_label())];
    if let Some(sqk) = &slide.sqk {
        chips.push(format!("SQK: {sqk}"));
    }
    if let Some(topic) = &slide.topic_id {
        chips.push(format!("Topic: {topic}"));
    }
    writeln!(md, "{}\n", chips.join(" · ")).unwrap();
    writeln!(md, "## Content\n").unwrap();
    for text in &slide.texts {
        writeln!(md, "> {text}").unwrap();
    }
    if !slide.urls.is_empty() {
        writeln!(md, "\n## Links\n").unwrap();
        for url in &slide.urls {
            writeln!(md, "- <{url}>").unwrap();
        }
    }
    md
}

pub fn audio_playlist(files: &[AudioFile]) -> String {
    let mut md = String::new();
    writeln!(md, "{} files\n", files.len()).unwrap();
    table_header(&mut md, &["#", "File", "Duration", "Size", "Source"]);
    for (i, file) in files.iter().enumerate() {
        table_row(
            &mut md,
            &[
                (i + 1).to_string(),
                escape_cell(&file.name),
                format_duration(file.duration),
                format_size(file.size),
                escape_cell(&file.source_path()),
            ],
        );
    }
    md
}

pub fn ads_list(book: &AdBook) -> String {
    if book.entries.is_empty() {
        return "No ads yet. Use `ads add` to create the first one.\n".to_string();
    }
    let mut md = String::new();
    writeln!(md, "Total: {} · Active: {}\n", book.entries.len(), book.active_count()).unwrap();
    table_header(
        &mut md,
        &["#", "Id", "State", "Position", "Title", "URL", "Start", "End", "Notes"],
    );
    for (i, ad) in book.entries.iter().enumerate() {
        table_row(
            &mut md,
            &[
                (i + 1).to_string(),
                ad.id.to_string(),
                if ad.active { "active" } else { "off" }.to_string(),
                escape_cell(&ad.position),
                escape_cell(&truncate_chars(&ad.title, 40)),
                escape_cell(&truncate_chars(&ad.url, 40)),
                escape_cell(&ad.start_date),
                escape_cell(&ad.end_date),
                escape_cell(&truncate_chars(&ad.notes, 40)),
            ],
        );
    }
    md
}

pub fn release(info: &ReleaseInfo) -> String {
    if info.is_empty() {
        return "No release information.\n".to_string();
    }
    let mut md = String::new();
    writeln!(md, "# Release\n").unwrap();
    for (key, value) in info {
        writeln!(md, "- **{key}**: {}", escape_cell(&value_text(Some(value)))).unwrap();
    }
    md
}
