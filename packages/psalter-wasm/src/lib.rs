use psalter::view_state::{self, ViewState};
use psalter::{PlaylistEntry, Voice, VoiceSelection};
use serde::Serialize;
use url::Url;
use wasm_bindgen::prelude::*;

#[derive(Serialize)]
struct BindingError {
    message: String,
}

fn to_js_error(e: impl std::fmt::Display) -> JsValue {
    let error = BindingError {
        message: e.to_string(),
    };
    JsValue::from_str(&serde_json::to_string(&error).unwrap_or_else(|_| error.message.clone()))
}

fn parse_href(href: &str) -> Result<Url, JsValue> {
    Url::parse(href).map_err(|e| to_js_error(psalter::PsalterError::from(e)))
}

/// One psalm to fetch and render, as the page script sees it.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PsalmSource {
    index: usize,
    target: String,
    tune: String,
    text: String,
}

/// Filter ABC notation down to the voices in `voices` (e.g. "SA")
#[wasm_bindgen]
pub fn filter_voices(abc: &str, voices: &str) -> String {
    psalter::filter_for(abc, voices)
}

/// Voices a tune declares through `V:` lines, or undefined for a single-line tune
#[wasm_bindgen]
pub fn declared_voices(abc: &str) -> Option<String> {
    psalter::declared_voices(abc).map(|v| v.to_string())
}

/// Transpose offset stored in a page address
#[wasm_bindgen]
pub fn read_transpose(href: &str) -> Result<i32, JsValue> {
    Ok(view_state::read_transpose(&parse_href(href)?))
}

/// Page address with the transpose offset replaced; meant for `history.replaceState`
#[wasm_bindgen]
pub fn write_transpose(href: &str, semitones: i32) -> Result<String, JsValue> {
    let mut url = parse_href(href)?;
    view_state::write_transpose(&mut url, semitones);
    Ok(url.into())
}

/// Shift the transpose offset by `delta` semitones
#[wasm_bindgen]
pub fn transpose_by(href: &str, delta: i32) -> Result<String, JsValue> {
    let mut url = parse_href(href)?;
    let current = view_state::read_transpose(&url);
    view_state::write_transpose(&mut url, current.saturating_add(delta));
    Ok(url.into())
}

/// Canonical voice string stored in a page address
#[wasm_bindgen]
pub fn read_voices(href: &str) -> Result<String, JsValue> {
    Ok(view_state::read_voices(&parse_href(href)?).to_string())
}

#[wasm_bindgen]
pub fn write_voices(href: &str, voices: &str) -> Result<String, JsValue> {
    let mut url = parse_href(href)?;
    view_state::write_voices(&mut url, &VoiceSelection::parse(voices));
    Ok(url.into())
}

/// Toggle one voice letter (S, A, T or B); other letters leave the address unchanged
#[wasm_bindgen]
pub fn toggle_voice(href: &str, voice: char) -> Result<String, JsValue> {
    let mut url = parse_href(href)?;
    if let Some(voice) = voice.to_uppercase().next().and_then(Voice::from_char) {
        let mut state = ViewState::from_url(&url);
        state.toggle_voice(voice);
        state.write_to(&mut url);
    }
    Ok(url.into())
}

/// Display form of a transpose offset ("+2", "0", "-3")
#[wasm_bindgen]
pub fn format_transpose(semitones: i32) -> String {
    view_state::format_transpose(semitones)
}

#[wasm_bindgen]
pub fn stylize(text: &str) -> String {
    psalter::stylize(text)
}

#[wasm_bindgen]
pub fn slugify(title: &str) -> String {
    psalter::slugify(title)
}

/// Psalm entries of a playlist manifest as a JSON array of
/// `{index, target, tune, text}`
#[wasm_bindgen]
pub fn psalm_sources(manifest: &str) -> Result<String, JsValue> {
    let playlist = psalter::Playlist::from_json(manifest).map_err(to_js_error)?;
    let sources: Vec<PsalmSource> = playlist
        .entries()
        .iter()
        .enumerate()
        .filter_map(|(index, entry)| match entry {
            PlaylistEntry::Psalm { tune, text, .. } => Some(PsalmSource {
                index,
                target: psalter::notation_target(index),
                tune: tune.clone(),
                text: text.clone(),
            }),
            PlaylistEntry::Heading { .. } => None,
        })
        .collect();
    serde_json::to_string(&sources).map_err(to_js_error)
}
