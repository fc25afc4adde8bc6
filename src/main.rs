//! # News Digest Console
//!
//! A terminal admin console for a news digest pipeline. It reviews processed
//! news, edits AI prompts and spreadsheet tables, browses archived editions,
//! generated slides and audio, and manages advertisement slots.
//!
//! ## Features
//!
//! - Talks to the pipeline's content API, or works fully offline
//! - Falls back to locally persisted data (seeded on first run) whenever the
//!   API is unreachable or answers with garbage
//! - Renders every view as Markdown on stdout
//! - Exports a full snapshot as dated JSON files
//!
//! ## Usage
//!
//! ```sh
//! news_digest_console overview
//! news_digest_console --api-base https://digest.example.com/api sheets list
//! ```
//!
//! ## Architecture
//!
//! 1. **Config**: flags and env, then an optional YAML file, then build defaults
//! 2. **Data access**: [`facade::DataAccess`] routes each call to the API or to
//!    local storage according to the persisted mode and [`policy::FallbackPolicy`]
//! 3. **Shaping**: [`shaper`] derives columns, row ids and status classes
//! 4. **Output**: [`outputs::markdown`] for views, [`outputs::json`] for exports

use chrono::Utc;
use clap::Parser;
use std::error::Error;
use std::path::Path;
use tracing::{debug, info, instrument};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod api;
mod cli;
mod config;
mod error;
mod facade;
mod models;
mod outputs;
mod policy;
mod seed;
mod shaper;
mod sheets;
mod store;
mod utils;

use api::HttpRemote;
use cli::{
    AdFields, AdsCommand, ArchiveCommand, Cli, Command, ModeCommand, NewsCommand, PromptsCommand,
    ReleaseCommand, SaveTarget, SheetsCommand, SlidesCommand,
};
use config::{ConsoleConfig, FileConfig, Overrides};
use error::ConsoleError;
use facade::DataAccess;
use models::{NewsUpdate, RecordId, ReleaseInfo, SaveAck, SheetTable};
use outputs::{json, markdown};
use sheets::{AdBook, PROMPTS_SHEET};
use store::FileStore;

type Console = DataAccess<HttpRemote, FileStore>;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tfmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let args = Cli::parse();
    debug!(?args.api_base, ?args.state_dir, ?args.config, "Parsed CLI arguments");

    let file_cfg = match &args.config {
        Some(path) => config::load_file(path).await?,
        None => FileConfig::default(),
    };
    let cfg = ConsoleConfig::resolve(
        Overrides {
            api_base: args.api_base.clone(),
            state_dir: args.state_dir.clone(),
        },
        file_cfg,
    )?;
    let remote = HttpRemote::new(&cfg.api_base)?;
    let store = FileStore::new(&cfg.state_dir);
    info!(api_base = %remote.base(), state_dir = %store.dir().display(), "Configuration resolved");

    let console = DataAccess::new(remote, store, cfg.default_mode);

    match run(&console, args.command).await {
        Ok(output) => {
            print!("{output}");
            Ok(())
        }
        Err(e) => {
            debug!(error = %e, "Command failed");
            eprintln!("error: {e}");
            if e.downcast_ref::<ConsoleError>().is_some_and(ConsoleError::is_remote) {
                eprintln!("hint: the API did not accept the change; local data is unchanged");
            }
            std::process::exit(1);
        }
    }
}

/// Execute one command and return what should be printed.
#[instrument(level = "info", skip(console))]
async fn run(console: &Console, command: Command) -> Result<String, Box<dyn Error>> {
    let out = match command {
        Command::Overview => {
            let snapshot = console.load_all().await;
            markdown::dashboard(&snapshot.news, &snapshot.health)
        }
        Command::News(cmd) => news(console, cmd).await?,
        Command::Prompts(cmd) => prompts(console, cmd).await?,
        Command::Sheets(cmd) => sheets_cmd(console, cmd).await?,
        Command::Archive(cmd) => archive(console, cmd).await?,
        Command::Slides(cmd) => slides(console, cmd).await?,
        Command::Audio => markdown::audio_playlist(&console.fetch_audio().await),
        Command::Ads(cmd) => ads(console, cmd).await?,
        Command::Release(cmd) => release(console, cmd).await?,
        Command::Mode(ModeCommand::Show) => format!("Data mode: {}\n", console.mode()),
        Command::Mode(ModeCommand::Set { mode }) => {
            console.set_mode(mode);
            format!("Data mode set to {mode}\n")
        }
        Command::Health => markdown::data_source(&console.check_api().await) + "\n",
        Command::Export { out } => {
            let snapshot = console.load_all().await;
            let dir = json::write_snapshot(&snapshot, &out).await?;
            format!("Exported to {}\n", dir.display())
        }
    };
    Ok(out)
}

/// CLI rows and ads are numbered from 1.
fn zero_based(n: usize, what: &str) -> Result<usize, ConsoleError> {
    n.checked_sub(1)
        .ok_or_else(|| ConsoleError::validation(format!("{what} numbers start at 1")))
}

fn ack_line(ack: &SaveAck, what: &str) -> String {
    if ack.ok {
        format!("{what} saved\n")
    } else {
        format!("{what} was not acknowledged by the API\n")
    }
}

async fn read_json_file<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, ConsoleError> {
    let raw = tokio::fs::read_to_string(path).await?;
    serde_json::from_str(&raw).map_err(|e| ConsoleError::validation(format!("{}: {e}", path.display())))
}

async fn news(console: &Console, cmd: NewsCommand) -> Result<String, Box<dyn Error>> {
    match cmd {
        NewsCommand::List { compact } => {
            let items = console.fetch_news().await;
            Ok(markdown::news_items_table(&items, compact))
        }
        NewsCommand::Process { add, remove } => {
            let add: Vec<String> = add
                .into_iter()
                .map(|u| u.trim().to_string())
                .filter(|u| !u.is_empty())
                .collect();
            if add.is_empty() && remove.is_empty() {
                return Err(ConsoleError::validation("Nothing to process: pass --add or --remove").into());
            }
            let update = NewsUpdate {
                add,
                remove: remove.iter().map(|id| RecordId::parse(id)).collect(),
            };
            let ack = console.update_news(&update).await;
            let mut out = ack_line(&ack, "News update");
            out.push('\n');
            out.push_str(&markdown::news_items_table(&console.fetch_news().await, true));
            Ok(out)
        }
    }
}

async fn prompts(console: &Console, cmd: PromptsCommand) -> Result<String, Box<dyn Error>> {
    match cmd {
        PromptsCommand::Show => Ok(markdown::sheet_view(PROMPTS_SHEET, &console.fetch_prompts().await)),
        PromptsCommand::Set {
            row,
            column,
            value,
            target,
        } => {
            let mut table = console.fetch_prompts().await;
            table.set_cell(zero_based(row, "Row")?, &column, &value)?;
            if target.remote {
                console.save_sheet_remote(PROMPTS_SHEET, &table).await?;
                Ok(format!("Prompts saved to the {PROMPTS_SHEET} sheet\n"))
            } else {
                Ok(ack_line(&console.save_prompts(&table).await, "Prompts"))
            }
        }
    }
}

async fn save_sheet(
    console: &Console,
    name: &str,
    table: &SheetTable,
    target: SaveTarget,
) -> Result<String, Box<dyn Error>> {
    if target.remote {
        console.save_sheet_remote(name, table).await?;
        Ok(format!("Sheet {name} saved to the API\n"))
    } else {
        Ok(ack_line(&console.save_sheet_local(name, table), &format!("Sheet {name}")))
    }
}

async fn sheets_cmd(console: &Console, cmd: SheetsCommand) -> Result<String, Box<dyn Error>> {
    match cmd {
        SheetsCommand::List => Ok(markdown::sheet_list(&console.fetch_sheets().await)),
        SheetsCommand::Show { name } => {
            let all = console.fetch_sheets().await;
            let table = all
                .get(&name)
                .ok_or_else(|| ConsoleError::validation(format!("No sheet named {name:?}")))?;
            Ok(markdown::sheet_view(&name, table))
        }
        SheetsCommand::Set {
            name,
            row,
            column,
            value,
            target,
        } => {
            let all = console.fetch_sheets().await;
            let mut table = all
                .get(&name)
                .cloned()
                .ok_or_else(|| ConsoleError::validation(format!("No sheet named {name:?}")))?;
            table.set_cell(zero_based(row, "Row")?, &column, &value)?;
            save_sheet(console, &name, &table, target).await
        }
        SheetsCommand::Import { name, file, target } => {
            let table: SheetTable = read_json_file(&file).await?;
            info!(sheet = %name, rows = table.rows.len(), "Importing sheet");
            save_sheet(console, &name, &table, target).await
        }
    }
}

async fn archive(console: &Console, cmd: ArchiveCommand) -> Result<String, Box<dyn Error>> {
    let all = console.fetch_sheets().await;
    match cmd {
        ArchiveCommand::List => Ok(markdown::archive_list(&all)),
        ArchiveCommand::Show { name } => {
            let found = [name.clone(), format!("news {name}")]
                .into_iter()
                .find(|n| sheets::is_archive(n) && all.contains_key(n));
            match found {
                Some(n) => Ok(markdown::archive_view(&n, &all[&n])),
                None => Err(ConsoleError::validation(format!("No archived edition {name:?}")).into()),
            }
        }
    }
}

async fn slides(console: &Console, cmd: SlidesCommand) -> Result<String, Box<dyn Error>> {
    let all = console.fetch_slides().await;
    match cmd {
        SlidesCommand::List { kind: None } => Ok(markdown::slides_gallery(&all)),
        SlidesCommand::List { kind: Some(kind) } => {
            let picked: Vec<_> = all
                .into_iter()
                .filter(|s| s.kind().as_str() == kind || s.kind_label() == kind)
                .collect();
            Ok(markdown::slides_gallery(&picked))
        }
        SlidesCommand::Show { id } => {
            let wanted = RecordId::parse(&id);
            let slide = all
                .iter()
                .find(|s| s.id.as_ref().is_some_and(|sid| sid.matches(&wanted)) || s.slide.as_deref() == Some(&id))
                .ok_or_else(|| ConsoleError::validation(format!("No slide {id:?}")))?;
            Ok(markdown::slide_detail(slide))
        }
    }
}

fn apply_ad_fields(book: &mut AdBook, fields: AdFields) -> Result<(), ConsoleError> {
    let entry = book.add(Utc::now().timestamp_millis());
    let pairs = [
        ("title", fields.title),
        ("url", fields.url),
        ("startDate", fields.start),
        ("endDate", fields.end),
        ("position", fields.position),
        ("notes", fields.notes),
    ];
    for (field, value) in pairs {
        if let Some(v) = value {
            entry.set_field(field, &v)?;
        }
    }
    Ok(())
}

async fn save_ads(console: &Console, book: &AdBook, target: SaveTarget) -> Result<String, Box<dyn Error>> {
    let mut out = if target.remote {
        console.save_ads_remote(&book.entries).await?;
        "Ads saved to the API\n".to_string()
    } else {
        ack_line(&console.save_ads_local(&book.entries), "Ads")
    };
    out.push('\n');
    out.push_str(&markdown::ads_list(book));
    Ok(out)
}

async fn ads(console: &Console, cmd: AdsCommand) -> Result<String, Box<dyn Error>> {
    let mut book = AdBook::new(console.fetch_ads().await);
    match cmd {
        AdsCommand::List => Ok(markdown::ads_list(&book)),
        AdsCommand::Add { fields, target } => {
            apply_ad_fields(&mut book, fields)?;
            save_ads(console, &book, target).await
        }
        AdsCommand::Toggle { index, target } => {
            let active = book.toggle(zero_based(index, "Ad")?)?;
            info!(index, active, "Toggled ad");
            save_ads(console, &book, target).await
        }
        AdsCommand::Remove { index, target } => {
            let removed = book.remove(zero_based(index, "Ad")?)?;
            info!(id = %removed.id, "Removed ad");
            save_ads(console, &book, target).await
        }
        AdsCommand::Set {
            index,
            field,
            value,
            target,
        } => {
            book.update(zero_based(index, "Ad")?, &field, &value)?;
            save_ads(console, &book, target).await
        }
    }
}

async fn release(console: &Console, cmd: ReleaseCommand) -> Result<String, Box<dyn Error>> {
    match cmd {
        ReleaseCommand::Show => Ok(markdown::release(&console.fetch_release().await)),
        ReleaseCommand::Import { file } => {
            let info: ReleaseInfo = read_json_file(&file).await?;
            Ok(ack_line(&console.save_release_local(&info), "Release info"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_based() {
        assert_eq!(zero_based(1, "Row").unwrap(), 0);
        assert_eq!(zero_based(7, "Ad").unwrap(), 6);
        assert!(matches!(zero_based(0, "Row"), Err(ConsoleError::Validation(_))));
    }

    #[test]
    fn test_apply_ad_fields_appends_entry() {
        let mut book = AdBook::default();
        let fields = AdFields {
            title: Some("Spring sale".into()),
            start: Some("2025-05-01".into()),
            ..Default::default()
        };
        apply_ad_fields(&mut book, fields).unwrap();
        assert_eq!(book.entries.len(), 1);
        let ad = &book.entries[0];
        assert_eq!(ad.title, "Spring sale");
        assert_eq!(ad.start_date, "2025-05-01");
        assert_eq!(ad.position, "any");
        assert!(ad.active);

        let err = book.update(0, "endDate", "next Tuesday").unwrap_err();
        assert!(matches!(err, ConsoleError::Validation(_)));
        assert_eq!(book.entries[0].end_date, "");
    }
}
