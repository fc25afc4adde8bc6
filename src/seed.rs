//! Bundled seed data.
//!
//! The JSON files under `seed/` are compiled into the binary and serve as the
//! dataset of last resort: when local storage is empty or corrupt and the API
//! is unreachable, these are what the console shows.

use crate::models::{AudioFile, NewsItem, PromptSet, ReleaseInfo, SheetCollection, Slide};
use serde::de::DeserializeOwned;
use tracing::error;

const NEWS: &str = include_str!("../seed/news.json");
const PROMPTS: &str = include_str!("../seed/prompts.json");
const SHEETS: &str = include_str!("../seed/sheets.json");
const SLIDES: &str = include_str!("../seed/slides.json");
const AUDIO: &str = include_str!("../seed/audio.json");
const RELEASE: &str = include_str!("../seed/release.json");

fn parse<T: DeserializeOwned + Default>(name: &str, raw: &str) -> T {
    serde_json::from_str(raw).unwrap_or_else(|e| {
        error!(seed = name, error = %e, "Bundled seed data does not parse; using empty value");
        T::default()
    })
}

pub fn news() -> Vec<NewsItem> {
    parse("news", NEWS)
}

pub fn prompts() -> PromptSet {
    parse("prompts", PROMPTS)
}

pub fn sheets() -> SheetCollection {
    parse("sheets", SHEETS)
}

pub fn slides() -> Vec<Slide> {
    parse("slides", SLIDES)
}

pub fn audio() -> Vec<AudioFile> {
    parse("audio", AUDIO)
}

pub fn release() -> ReleaseInfo {
    parse("release", RELEASE)
}

#[cfg(test)]
mod tests {
    use super::*;

    // Strict parse here; the runtime path falls back to empty values.
    #[test]
    fn test_all_seeds_parse() {
        serde_json::from_str::<Vec<NewsItem>>(NEWS).unwrap();
        serde_json::from_str::<PromptSet>(PROMPTS).unwrap();
        serde_json::from_str::<SheetCollection>(SHEETS).unwrap();
        serde_json::from_str::<Vec<Slide>>(SLIDES).unwrap();
        serde_json::from_str::<Vec<AudioFile>>(AUDIO).unwrap();
        serde_json::from_str::<ReleaseInfo>(RELEASE).unwrap();
    }

    #[test]
    fn test_seed_contents() {
        assert_eq!(news().len(), 4);
        assert_eq!(prompts().headers, vec!["key", "description", "prompt"]);
        let sheets = sheets();
        assert!(sheets.contains_key("REF"));
        assert!(sheets.contains_key("news 2025-05-05"));
        assert_eq!(slides().len(), 5);
        assert_eq!(audio().len(), 3);
        assert_eq!(release().get("edition").and_then(|v| v.as_str()), Some("morning"));
    }
}
