use log::{debug, warn};
use tokio::task::JoinSet;

use super::rerender::{render_entry, Orchestrator};
use crate::address::Address;
use crate::engine::{Fetcher, RenderEngine};
use crate::error::PsalterError;
use crate::page::Page;
use crate::playlist::{Playlist, PlaylistEntry};
use crate::stylize::stylize;

/// Where the manifest and per-entry files live, relative to the fetcher's root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLayout {
    pub manifest: String,
    pub tune_dir: String,
    pub text_dir: String,
}

impl Default for SourceLayout {
    fn default() -> Self {
        SourceLayout {
            manifest: "playlist.json".to_string(),
            tune_dir: "abc".to_string(),
            text_dir: "text".to_string(),
        }
    }
}

impl SourceLayout {
    pub fn tune_path(&self, file: &str) -> String {
        join_path(&self.tune_dir, file)
    }

    pub fn text_path(&self, file: &str) -> String {
        join_path(&self.text_dir, file)
    }
}

fn join_path(dir: &str, file: &str) -> String {
    let dir = dir.trim_end_matches('/');
    if dir.is_empty() {
        file.to_string()
    } else {
        format!("{}/{}", dir, file)
    }
}

/// Outcome of a page load.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadReport {
    /// Notation and text retrievals launched.
    pub retrievals: usize,
    /// Retrievals that failed; their sections stay incomplete.
    pub failures: usize,
}

impl<E, A> Orchestrator<E, A>
where
    E: RenderEngine + 'static,
    A: Address + 'static,
{
    /// Fetch the manifest, build the page, then retrieve every psalm's files.
    ///
    /// All retrievals are launched before any is awaited. Each notation file
    /// is cached, rendered and given a playback control as soon as it
    /// arrives; each text file is stylized into its section. The returned
    /// future resolves once every retrieval and playback build has settled.
    /// A failed retrieval only leaves its own section incomplete.
    pub async fn load<F: Fetcher>(
        &self,
        fetcher: &F,
        layout: &SourceLayout,
    ) -> Result<LoadReport, PsalterError> {
        let manifest = fetcher.fetch(&layout.manifest).await?;
        let playlist = Playlist::from_json(&manifest)?;
        debug!("loaded playlist with {} entries", playlist.len());

        {
            let mut session = self.session_mut();
            session.page = Page::build(&playlist);
            session.playlist = playlist.clone();
        }

        let mut retrievals: JoinSet<Result<(), PsalterError>> = JoinSet::new();
        for (index, entry) in playlist.entries().iter().enumerate() {
            let PlaylistEntry::Psalm { tune, text, .. } = entry else {
                continue;
            };

            let notation = fetcher.fetch(&layout.tune_path(tune));
            let this = self.clone();
            retrievals.spawn_local(async move {
                this.receive_notation(index, notation.await?).await;
                Ok(())
            });

            let text = fetcher.fetch(&layout.text_path(text));
            let session = self.shared_session();
            retrievals.spawn_local(async move {
                let html = stylize(&text.await?);
                session.borrow_mut().page.set_text(index, html);
                Ok(())
            });
        }

        let mut report = LoadReport::default();
        while let Some(joined) = retrievals.join_next().await {
            report.retrievals += 1;
            match joined {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    warn!("{}", e);
                    report.failures += 1;
                }
                Err(e) => {
                    warn!("retrieval task failed: {}", e);
                    report.failures += 1;
                }
            }
        }

        debug!(
            "page ready: {} retrievals, {} failed",
            report.retrievals, report.failures
        );
        Ok(report)
    }

    async fn receive_notation(&self, index: usize, notation: String) {
        let control = {
            let mut session = self.session_mut();
            if !session.cache.store_notation(index, notation) {
                return;
            }
            let view = session.view_state();
            let display_width = session.display_width;
            let generation = session.cache.begin_render(index);
            match session.cache.notation(index) {
                Some(notation) => render_entry(self.engine(), index, notation, &view, display_width)
                    .map(|control| (generation, control)),
                None => None,
            }
        };

        if let Some((generation, control)) = control {
            // a panicked build leaves the entry without a control
            let _ = self.install_control(index, generation, control).await;
        }
    }
}
