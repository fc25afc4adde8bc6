//! Command-line interface definitions for the digest console.
//!
//! Global options can come from flags or environment variables. Every view
//! command prints Markdown to stdout; logs go to stderr.

use crate::models::{DataMode, parse_day};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Command-line arguments for the digest console.
///
/// # Examples
///
/// ```sh
/// # Dashboard against the configured API (falls back to local data)
/// news_digest_console overview
///
/// # Work offline from now on
/// news_digest_console mode set local
///
/// # Queue two URLs and drop row 3
/// news_digest_console news process --add https://a.example --add https://b.example --remove 3
///
/// # Edit a REF cell and push the sheet to the server
/// news_digest_console sheets set REF 2 label "Tech" --remote
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Base URL of the content API
    #[arg(long, env = "DIGEST_API_BASE", global = true)]
    pub api_base: Option<String>,

    /// Directory holding the local data copy
    #[arg(long, env = "DIGEST_STATE_DIR", global = true)]
    pub state_dir: Option<PathBuf>,

    /// Optional path to a YAML config file
    #[arg(short, long, env = "DIGEST_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Status counts and the latest news
    Overview,
    /// Review and process news items
    #[command(subcommand)]
    News(NewsCommand),
    /// View and edit AI prompts
    #[command(subcommand)]
    Prompts(PromptsCommand),
    /// View and edit spreadsheet tables
    #[command(subcommand)]
    Sheets(SheetsCommand),
    /// Browse archived editions
    #[command(subcommand)]
    Archive(ArchiveCommand),
    /// Browse generated slides
    #[command(subcommand)]
    Slides(SlidesCommand),
    /// List generated audio files
    Audio,
    /// Manage advertisement entries
    #[command(subcommand)]
    Ads(AdsCommand),
    /// Release metadata
    #[command(subcommand)]
    Release(ReleaseCommand),
    /// Show or switch between API and local data
    #[command(subcommand)]
    Mode(ModeCommand),
    /// Ping the content API
    Health,
    /// Write all data as JSON files
    Export {
        /// Output directory
        #[arg(short, long)]
        out: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum NewsCommand {
    /// Show the news table
    List {
        /// Narrower cells
        #[arg(long)]
        compact: bool,
    },
    /// Submit new URLs and remove rows by id
    Process {
        /// URL to submit (repeatable)
        #[arg(long = "add", value_name = "URL")]
        add: Vec<String>,
        /// Row id to remove (repeatable)
        #[arg(long = "remove", value_name = "ID")]
        remove: Vec<String>,
    },
}

/// Where an edit is saved.
#[derive(Args, Debug, Clone, Copy)]
pub struct SaveTarget {
    /// Write through the API's sheet endpoint; errors instead of falling back
    #[arg(long)]
    pub remote: bool,
}

#[derive(Subcommand, Debug)]
pub enum PromptsCommand {
    /// Show the prompt table
    Show,
    /// Change one cell and save the whole table
    Set {
        /// Row number, starting at 1
        row: usize,
        column: String,
        value: String,
        #[command(flatten)]
        target: SaveTarget,
    },
}

#[derive(Subcommand, Debug)]
pub enum SheetsCommand {
    /// List sheets
    List,
    /// Show one sheet
    Show { name: String },
    /// Change one cell and save the sheet
    Set {
        name: String,
        /// Row number, starting at 1
        row: usize,
        column: String,
        value: String,
        #[command(flatten)]
        target: SaveTarget,
    },
    /// Replace a sheet with `{headers, rows}` from a JSON file
    Import {
        name: String,
        file: PathBuf,
        #[command(flatten)]
        target: SaveTarget,
    },
}

#[derive(Subcommand, Debug)]
pub enum ArchiveCommand {
    /// List archived editions, newest first
    List,
    /// Show one archived edition (`news 2025-05-06` or just `2025-05-06`)
    Show { name: String },
}

#[derive(Subcommand, Debug)]
pub enum SlidesCommand {
    /// Gallery view
    List {
        /// Only slides of this type
        #[arg(long = "type", value_name = "TYPE")]
        kind: Option<String>,
    },
    /// Details of one slide
    Show { id: String },
}

/// Editable ad fields.
#[derive(Args, Debug, Default)]
pub struct AdFields {
    #[arg(long)]
    pub title: Option<String>,
    #[arg(long)]
    pub url: Option<String>,
    /// First day shown (YYYY-MM-DD)
    #[arg(long, value_parser = parse_date)]
    pub start: Option<String>,
    /// Last day shown (YYYY-MM-DD)
    #[arg(long, value_parser = parse_date)]
    pub end: Option<String>,
    #[arg(long)]
    pub position: Option<String>,
    #[arg(long)]
    pub notes: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum AdsCommand {
    /// List ads with active count
    List,
    /// Add an ad
    Add {
        #[command(flatten)]
        fields: AdFields,
        #[command(flatten)]
        target: SaveTarget,
    },
    /// Switch an ad on or off
    Toggle {
        /// Ad number, starting at 1
        index: usize,
        #[command(flatten)]
        target: SaveTarget,
    },
    /// Delete an ad
    Remove {
        index: usize,
        #[command(flatten)]
        target: SaveTarget,
    },
    /// Change one field (title, url, startDate, endDate, position, notes, active)
    Set {
        index: usize,
        field: String,
        value: String,
        #[command(flatten)]
        target: SaveTarget,
    },
}

#[derive(Subcommand, Debug)]
pub enum ReleaseCommand {
    Show,
    /// Store release metadata from a JSON file locally
    Import { file: PathBuf },
}

#[derive(Subcommand, Debug)]
pub enum ModeCommand {
    Show,
    Set { mode: DataMode },
}

fn parse_date(s: &str) -> Result<String, String> {
    parse_day(s).map_err(|e| e.to_string())
}
