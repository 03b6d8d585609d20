//! # Orchestrator Module
//!
//! Keeps the on-screen notation, the playback controls and the page address
//! consistent with each other.
//!
//! ## Purpose
//! A [`Psalter`] owns one page session: the playlist, the page blocks, the
//! render cache and the address. It is driven by three kinds of events:
//!
//! 1. **Load** - [`Psalter::load`] fetches the manifest, builds the page and
//!    retrieves every psalm's notation and text concurrently
//! 2. **View-state changes** - voice toggles and transposition rewrite the
//!    address and re-render every cached psalm
//! 3. **Resize** - [`Psalter::resize`] re-renders once the viewport has been
//!    stable for 250 ms
//!
//! Re-rendering never touches the network: it re-filters the notation cached
//! at load time.
//!
//! ## Scheduling
//! Everything runs on one thread inside a [`tokio::task::LocalSet`]. Visual
//! rendering is synchronous and happens in playlist order as soon as a
//! re-render is requested; playback controls are built concurrently and
//! installed as each finishes, the latest build for an entry replacing
//! whatever was there.
//!
//! ## Sub-modules
//! - `rerender` - [`Orchestrator`], the re-render pass
//! - `builder` - page construction and the initial fetch fan-out

mod builder;
mod rerender;

#[cfg(test)]
mod tests;

pub use builder::{LoadReport, SourceLayout};
pub use rerender::Orchestrator;

use std::cell::Ref;
use std::future::Future;

use log::debug;

use crate::address::Address;
use crate::cache::RenderCache;
use crate::engine::{Fetcher, RenderEngine};
use crate::error::PsalterError;
use crate::page::{Block, Page};
use crate::playlist::Playlist;
use crate::schedule::{Debouncer, RESIZE_DEBOUNCE};
use crate::view_state::{self, ViewState};
use crate::voices::{Voice, VoiceSelection};

/// Mutable state of one page.
#[derive(Debug)]
pub struct Session<C, A> {
    pub playlist: Playlist,
    pub page: Page,
    pub cache: RenderCache<C>,
    pub address: A,
    /// Width available to the notation, sampled from the viewport.
    pub display_width: u32,
}

impl<C, A: Address> Session<C, A> {
    pub fn new(address: A, display_width: u32) -> Self {
        Session {
            playlist: Playlist::default(),
            page: Page::default(),
            cache: RenderCache::new(),
            address,
            display_width,
        }
    }

    pub fn view_state(&self) -> ViewState {
        ViewState::from_url(&self.address.current())
    }
}

/// A psalter page: session state, the rendering engine and the resize debouncer.
pub struct Psalter<E: RenderEngine, A: Address> {
    orchestrator: Orchestrator<E, A>,
    resize: Debouncer,
}

impl<E, A> Psalter<E, A>
where
    E: RenderEngine + 'static,
    A: Address + 'static,
{
    pub fn new(engine: E, address: A, display_width: u32) -> Self {
        Psalter {
            orchestrator: Orchestrator::new(engine, Session::new(address, display_width)),
            resize: Debouncer::new(RESIZE_DEBOUNCE),
        }
    }

    pub fn session(&self) -> Ref<'_, Session<E::Control, A>> {
        self.orchestrator.session()
    }

    pub fn engine(&self) -> &E {
        self.orchestrator.engine()
    }

    pub fn orchestrator(&self) -> &Orchestrator<E, A> {
        &self.orchestrator
    }

    pub fn view_state(&self) -> ViewState {
        self.session().view_state()
    }

    /// Build the page from the manifest and retrieve every psalm. See [`Orchestrator::load`].
    pub async fn load<F: Fetcher>(
        &self,
        fetcher: &F,
        layout: &SourceLayout,
    ) -> Result<LoadReport, PsalterError> {
        self.orchestrator.load(fetcher, layout).await
    }

    /// The block the address fragment points at, to scroll to once loaded.
    pub fn scroll_target(&self) -> Option<Block> {
        let session = self.session();
        let url = session.address.current();
        session.page.resolve_anchor(url.fragment()?).cloned()
    }

    /// Re-render every cached psalm with the current view state.
    pub fn rerender_all(&self) -> impl Future<Output = ()> + 'static {
        self.orchestrator.rerender_all()
    }

    pub fn toggle_voice(&self, voice: Voice) -> impl Future<Output = ()> + 'static {
        let mut voices = self.view_state().voices;
        voices.toggle(voice);
        self.set_voices(voices)
    }

    pub fn set_voices(&self, voices: VoiceSelection) -> impl Future<Output = ()> + 'static {
        debug!("voices -> {}", voices);
        self.update_address(|url| view_state::write_voices(url, &voices));
        self.rerender_all()
    }

    pub fn set_transpose(&self, semitones: i32) -> impl Future<Output = ()> + 'static {
        debug!("transpose -> {}", view_state::format_transpose(semitones));
        self.update_address(|url| view_state::write_transpose(url, semitones));
        self.rerender_all()
    }

    pub fn transpose_up(&self) -> impl Future<Output = ()> + 'static {
        self.set_transpose(self.view_state().transpose.saturating_add(1))
    }

    pub fn transpose_down(&self) -> impl Future<Output = ()> + 'static {
        self.set_transpose(self.view_state().transpose.saturating_sub(1))
    }

    /// Record a new viewport width and schedule a debounced re-render.
    pub fn resize(&mut self, display_width: u32) {
        self.orchestrator.session_mut().display_width = display_width;
        let orchestrator = self.orchestrator.clone();
        self.resize.schedule(async move { orchestrator.rerender_all().await });
    }

    /// `true` while a resize re-render is waiting out the quiet window.
    pub fn resize_pending(&self) -> bool {
        self.resize.is_pending()
    }

    fn update_address<F: FnOnce(&mut url::Url)>(&self, edit: F) {
        self.orchestrator.session_mut().address.modify(edit);
    }
}
