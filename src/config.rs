//! Console configuration.
//!
//! Values come from three layers, highest precedence first:
//! 1. command-line flags (or their environment variables, see [`crate::cli`])
//! 2. an optional YAML file (`--config console.yaml`)
//! 3. build-time defaults baked in with `option_env!`
//!
//! ```yaml
//! api_base: https://digest.example.com/api
//! default_mode: local
//! state_dir: /var/lib/digest-console
//! ```
//!
//! The mode here is only the *default*: once a mode has been persisted with
//! `mode set`, the stored flag wins on every call.

use crate::error::ConsoleError;
use crate::models::DataMode;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, instrument};
use url::Url;

/// API base URL compiled into the binary (`DIGEST_API_BASE` at build time).
pub const BUILD_API_BASE: &str = match option_env!("DIGEST_API_BASE") {
    Some(base) => base,
    None => "http://localhost:3001/api",
};

/// Default state directory, relative to the working directory.
pub const DEFAULT_STATE_DIR: &str = ".digest_console";

/// Default mode compiled into the binary: `local` when built with
/// `DIGEST_USE_LOCAL_DATA=1`, `api` otherwise.
pub fn build_default_mode() -> DataMode {
    match option_env!("DIGEST_USE_LOCAL_DATA") {
        Some("1") => DataMode::Local,
        _ => DataMode::Api,
    }
}

/// Optional settings file.
#[derive(Debug, Default, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub api_base: Option<String>,
    pub default_mode: Option<DataMode>,
    pub state_dir: Option<PathBuf>,
}

/// Values supplied on the command line.
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub api_base: Option<String>,
    pub state_dir: Option<PathBuf>,
}

/// Resolved configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct ConsoleConfig {
    pub api_base: String,
    pub default_mode: DataMode,
    pub state_dir: PathBuf,
}

impl ConsoleConfig {
    pub fn resolve(overrides: Overrides, file: FileConfig) -> Result<Self, ConsoleError> {
        let api_base = overrides
            .api_base
            .or(file.api_base)
            .unwrap_or_else(|| BUILD_API_BASE.to_string());
        validate_base(&api_base)?;
        Ok(Self {
            api_base,
            default_mode: file.default_mode.unwrap_or_else(build_default_mode),
            state_dir: overrides
                .state_dir
                .or(file.state_dir)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_STATE_DIR)),
        })
    }
}

fn validate_base(base: &str) -> Result<(), ConsoleError> {
    let url = Url::parse(base).map_err(|e| ConsoleError::Config(format!("invalid api base {base:?}: {e}")))?;
    match url.scheme() {
        "http" | "https" => Ok(()),
        other => Err(ConsoleError::Config(format!(
            "api base must be http or https, got {other}"
        ))),
    }
}

/// Read a YAML settings file.
#[instrument(level = "debug", skip_all, fields(path = %path.display()))]
pub async fn load_file(path: &Path) -> Result<FileConfig, ConsoleError> {
    let raw = fs::read_to_string(path).await?;
    let cfg: FileConfig = serde_yaml::from_str(&raw)
        .map_err(|e| ConsoleError::Config(format!("{}: {e}", path.display())))?;
    debug!(?cfg, "Loaded config file");
    Ok(cfg)
}
