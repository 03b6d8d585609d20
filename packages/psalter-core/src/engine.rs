//! Boundaries to the outside world: the notation rendering/audio engine and
//! file retrieval.
//!
//! Both are opaque services. Visual rendering is synchronous; building a
//! playback control and fetching a file may suspend, so they return boxed
//! local futures that own everything they need.

use std::future::Future;
use std::pin::Pin;

use crate::error::PsalterError;

/// A `'static`, single-threaded boxed future.
pub type LocalBoxFuture<T> = Pin<Box<dyn Future<Output = T> + 'static>>;

/// Per-call rendering parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderOptions {
    /// Width available to the staff, in CSS pixels.
    pub display_width: u32,
    /// Semitone shift applied to the rendered and played piece.
    pub transpose: i32,
}

/// The external notation engine.
pub trait RenderEngine {
    /// Opaque handle for one rendered piece.
    type Handle;
    /// A playable audio control bound to a rendered piece.
    type Control: 'static;

    /// Render notation text into the element `target`.
    fn render(
        &self,
        target: &str,
        notation: &str,
        options: &RenderOptions,
    ) -> Result<Self::Handle, PsalterError>;

    /// Build a playback control for a rendered piece.
    fn build_playback(
        &self,
        handle: Self::Handle,
        target: &str,
        transpose: i32,
    ) -> LocalBoxFuture<Result<Self::Control, PsalterError>>;
}

/// Retrieves the playlist manifest and per-entry files by relative path.
pub trait Fetcher {
    fn fetch(&self, path: &str) -> LocalBoxFuture<Result<String, PsalterError>>;
}

/// Wrap an already-known value as a [`LocalBoxFuture`].
pub fn ready<T: 'static>(value: T) -> LocalBoxFuture<T> {
    Box::pin(std::future::ready(value))
}
