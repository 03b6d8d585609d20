//! # View-State Codec
//!
//! Reads and writes the two user-selectable page parameters in the page address:
//!
//! | Param | Meaning | Default |
//! |-------|---------|---------|
//! | `t` | transpose, signed semitones | `0` |
//! | `v` | active voices, e.g. `SA` | `SATB` |
//!
//! A parameter equal to its default is removed, so the address stays canonical
//! and a shared link reproduces exactly the same view.
//!
//! ## Example
//! ```rust
//! use psalter::view_state::{read_transpose, write_transpose};
//! use url::Url;
//!
//! let mut url = Url::parse("https://example.org/psalter/?t=-3").unwrap();
//! assert_eq!(read_transpose(&url), -3);
//!
//! write_transpose(&mut url, 0);
//! assert_eq!(url.as_str(), "https://example.org/psalter/");
//! ```

use log::warn;
use url::Url;

use crate::voices::{Voice, VoiceSelection};

pub const TRANSPOSE_PARAM: &str = "t";
pub const VOICES_PARAM: &str = "v";

/// Read the transpose offset. Absent or unparseable values read as `0`.
pub fn read_transpose(url: &Url) -> i32 {
    match query_param(url, TRANSPOSE_PARAM) {
        None => 0,
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!("ignoring malformed transpose parameter {:?}", raw);
            0
        }),
    }
}

/// Write the transpose offset, removing the parameter when it is `0`.
pub fn write_transpose(url: &mut Url, semitones: i32) {
    let value = (semitones != 0).then(|| semitones.to_string());
    set_query_param(url, TRANSPOSE_PARAM, value.as_deref());
}

/// Read the voice selection. Absent means all four voices.
pub fn read_voices(url: &Url) -> VoiceSelection {
    query_param(url, VOICES_PARAM)
        .map(|raw| VoiceSelection::parse(&raw.to_uppercase()))
        .unwrap_or_default()
}

/// Write the voice selection in canonical order, removing the parameter for `SATB`.
pub fn write_voices(url: &mut Url, voices: &VoiceSelection) {
    let value = (!voices.is_full()).then(|| voices.to_string());
    set_query_param(url, VOICES_PARAM, value.as_deref());
}

/// Both page parameters together.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ViewState {
    pub transpose: i32,
    pub voices: VoiceSelection,
}

impl ViewState {
    pub fn from_url(url: &Url) -> Self {
        ViewState {
            transpose: read_transpose(url),
            voices: read_voices(url),
        }
    }

    pub fn write_to(&self, url: &mut Url) {
        write_transpose(url, self.transpose);
        write_voices(url, &self.voices);
    }

    pub fn transpose_up(&mut self) {
        self.transpose = self.transpose.saturating_add(1);
    }

    pub fn transpose_down(&mut self) {
        self.transpose = self.transpose.saturating_sub(1);
    }

    pub fn toggle_voice(&mut self, voice: Voice) {
        self.voices.toggle(voice);
    }
}

/// Display form of a transpose offset: positive values carry a `+`.
pub fn format_transpose(semitones: i32) -> String {
    if semitones > 0 {
        format!("+{}", semitones)
    } else {
        semitones.to_string()
    }
}

fn query_param(url: &Url, key: &str) -> Option<String> {
    url.query_pairs()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.into_owned())
}

/// Set or remove one query parameter in place.
///
/// The first occurrence keeps its position, duplicates are dropped, and other
/// parameters and the fragment are untouched. An empty query leaves no `?`.
fn set_query_param(url: &mut Url, key: &str, value: Option<&str>) {
    let mut pairs: Vec<(String, String)> = Vec::new();
    let mut replaced = false;

    for (k, v) in url.query_pairs() {
        if k != key {
            pairs.push((k.into_owned(), v.into_owned()));
        } else if !replaced {
            replaced = true;
            if let Some(value) = value {
                pairs.push((key.to_string(), value.to_string()));
            }
        }
    }
    if !replaced {
        if let Some(value) = value {
            pairs.push((key.to_string(), value.to_string()));
        }
    }

    if pairs.is_empty() {
        url.set_query(None);
    } else {
        url.query_pairs_mut().clear().extend_pairs(pairs);
    }
}
