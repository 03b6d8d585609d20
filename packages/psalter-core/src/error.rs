//! # Error Types
//!
//! This module defines the error type shared by every fallible psalter operation.
//!
//! Filtering and view-state reads never fail; errors only come from the
//! boundaries: retrieving files, parsing the playlist manifest, the external
//! rendering engine, and malformed page addresses.
//!
//! ## Usage
//! ```rust
//! use psalter::{Playlist, PsalterError};
//!
//! match Playlist::from_json("not json") {
//!     Ok(playlist) => println!("{} entries", playlist.len()),
//!     Err(PsalterError::Manifest(message)) => eprintln!("bad manifest: {}", message),
//!     Err(e) => eprintln!("Error: {}", e),
//! }
//! ```

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PsalterError {
    /// A playlist, notation or text file could not be retrieved.
    ///
    /// # Example
    /// ```
    /// # use psalter::PsalterError;
    /// let err = PsalterError::Fetch {
    ///     path: "abc/psalm23.abc".to_string(),
    ///     message: "not found".to_string(),
    /// };
    /// assert_eq!(err.to_string(), "Failed to fetch 'abc/psalm23.abc': not found");
    /// ```
    #[error("Failed to fetch '{path}': {message}")]
    Fetch { path: String, message: String },

    /// The playlist manifest is not a valid entry list.
    #[error("Invalid playlist manifest: {0}")]
    Manifest(String),

    /// The rendering engine refused a render or playback request.
    #[error("Rendering engine error: {0}")]
    Engine(String),

    /// A page address could not be parsed as a URL.
    #[error("Invalid page address: {0}")]
    Address(#[from] url::ParseError),
}

impl From<serde_json::Error> for PsalterError {
    fn from(e: serde_json::Error) -> Self {
        PsalterError::Manifest(e.to_string())
    }
}
