//! File retrieval for the command line: a directory on disk or the embedded
//! sample playlist.

use std::fs;
use std::path::PathBuf;

use psalter::engine::ready;
use psalter::{Fetcher, LocalBoxFuture, PsalterError};

/// Reads playlist files relative to a root directory.
#[derive(Debug, Clone)]
pub struct FsFetcher {
    root: PathBuf,
}

impl FsFetcher {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        FsFetcher { root: root.into() }
    }
}

impl Fetcher for FsFetcher {
    fn fetch(&self, path: &str) -> LocalBoxFuture<Result<String, PsalterError>> {
        let result = fs::read_to_string(self.root.join(path)).map_err(|e| PsalterError::Fetch {
            path: path.to_string(),
            message: e.to_string(),
        });
        ready(result)
    }
}

/// Serves the sample playlist compiled into the binary.
#[derive(Debug, Clone, Copy, Default)]
pub struct LibraryFetcher;

impl Fetcher for LibraryFetcher {
    fn fetch(&self, path: &str) -> LocalBoxFuture<Result<String, PsalterError>> {
        let result = psalter_library::get_file(path)
            .map(|file| file.content.to_string())
            .ok_or_else(|| PsalterError::Fetch {
                path: path.to_string(),
                message: "no such sample file".to_string(),
            });
        ready(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_library_fetcher() {
        let manifest = LibraryFetcher.fetch("playlist.json").await.unwrap();
        assert!(manifest.contains("\"psalm\""));
        assert!(matches!(
            LibraryFetcher.fetch("abc/missing.abc").await,
            Err(PsalterError::Fetch { .. })
        ));
    }

    #[tokio::test]
    async fn test_fs_fetcher_reports_path() {
        let fetcher = FsFetcher::new("/nonexistent-psalter-root");
        match fetcher.fetch("abc/psalm23.abc").await {
            Err(PsalterError::Fetch { path, .. }) => assert_eq!(path, "abc/psalm23.abc"),
            other => panic!("unexpected {:?}", other),
        }
    }
}
