//! Playlist manifest model.
//!
//! The manifest is a JSON array of entries discriminated by `type`:
//!
//! ```json
//! [
//!   { "type": "heading", "title": "Psalms of Trust", "level": 2 },
//!   { "type": "psalm", "title": "Psalm 23", "subtitle": "Crimond",
//!     "tune": "psalm23.abc", "text": "psalm23.txt" }
//! ]
//! ```
//!
//! A psalm's notation file is `tune` (or `notationFile`) and its text file is
//! `text` (or `textFile`). The playlist is immutable once loaded.

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::PsalterError;

fn default_level() -> u8 {
    2
}

/// Heading level as written, falling back to the default for `null`, `0` or
/// anything that is not a small positive integer.
fn lenient_level<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u8, D::Error> {
    let value = serde_json::Value::deserialize(deserializer)?;
    let level = match &value {
        serde_json::Value::Number(n) => n.as_u64(),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    };
    Ok(level
        .and_then(|l| u8::try_from(l).ok())
        .filter(|&l| l > 0)
        .unwrap_or_else(default_level))
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum PlaylistEntry {
    Heading {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        title: Option<String>,
        #[serde(default = "default_level", deserialize_with = "lenient_level")]
        level: u8,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        text: Option<String>,
    },
    Psalm {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        title: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        subtitle: Option<String>,
        #[serde(alias = "notationFile")]
        tune: String,
        #[serde(alias = "textFile")]
        text: String,
    },
}

impl PlaylistEntry {
    pub fn is_psalm(&self) -> bool {
        matches!(self, PlaylistEntry::Psalm { .. })
    }

    pub fn title(&self) -> Option<&str> {
        match self {
            PlaylistEntry::Heading { title, .. } | PlaylistEntry::Psalm { title, .. } => {
                title.as_deref()
            }
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Playlist {
    entries: Vec<PlaylistEntry>,
}

impl Playlist {
    pub fn new(entries: Vec<PlaylistEntry>) -> Self {
        Playlist { entries }
    }

    pub fn from_json(json: &str) -> Result<Self, PsalterError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn entries(&self) -> &[PlaylistEntry] {
        &self.entries
    }

    pub fn get(&self, index: usize) -> Option<&PlaylistEntry> {
        self.entries.get(index)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Indices of psalm entries, in playlist order.
    pub fn psalm_indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.entries
            .iter()
            .enumerate()
            .filter(|(_, e)| e.is_psalm())
            .map(|(i, _)| i)
    }
}

/// Element id of the notation container for the entry at `index`.
pub fn notation_target(index: usize) -> String {
    format!("abc{}", index)
}
