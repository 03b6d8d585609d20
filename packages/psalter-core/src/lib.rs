pub mod address;
pub mod cache;
pub mod engine;
pub mod error;
pub mod orchestrator;
pub mod page;
pub mod playlist;
pub mod schedule;
pub mod stylize;
pub mod view_state;
pub mod voices;

pub use address::{Address, MemoryAddress};
pub use cache::RenderCache;
pub use engine::{Fetcher, LocalBoxFuture, RenderEngine, RenderOptions};
pub use error::*;
pub use orchestrator::{LoadReport, Orchestrator, Psalter, Session, SourceLayout};
pub use page::{Block, Page, PsalmSection, TocEntry};
pub use playlist::{notation_target, Playlist, PlaylistEntry};
pub use schedule::Debouncer;
pub use stylize::{slugify, stylize};
pub use view_state::ViewState;
pub use voices::{declared_voices, filter_voices, Voice, VoiceSelection};

/// Filter a notation document for the voices named in `voices` (e.g. `"SA"`).
///
/// Convenience wrapper over [`filter_voices`] for callers holding the raw
/// `v` parameter string.
pub fn filter_for(document: &str, voices: &str) -> String {
    filter_voices(document, &VoiceSelection::parse(voices))
}
