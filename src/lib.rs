pub mod config;
pub mod error;
pub mod fetch;
pub mod html;

pub use config::SiteConfig;
pub use error::CliError;
pub use fetch::{FsFetcher, LibraryFetcher};
pub use html::{to_html, StaticEngine};

use log::{info, warn};
use psalter::view_state::{write_transpose, write_voices};
use psalter::{Fetcher, MemoryAddress, Psalter, VoiceSelection};
use tokio::task::LocalSet;

/// View-state overrides from the command line.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ViewOverrides {
    pub transpose: Option<i32>,
    pub voices: Option<VoiceSelection>,
}

/// Load a playlist and render it to a static HTML page.
///
/// The view state comes from the config's `base-url`, with any overrides
/// written into it first so the page shows exactly what that address would.
pub fn build_page<F: Fetcher>(
    config: &SiteConfig,
    fetcher: &F,
    overrides: &ViewOverrides,
) -> Result<String, CliError> {
    let mut url = config.base_url.clone();
    if let Some(transpose) = overrides.transpose {
        write_transpose(&mut url, transpose);
    }
    if let Some(voices) = &overrides.voices {
        write_voices(&mut url, voices);
    }
    info!("building page for {}", url);

    let psalter = Psalter::new(StaticEngine::new(), MemoryAddress::new(url), config.display_width);

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .map_err(|source| CliError::Io {
            path: "<runtime>".to_string(),
            source,
        })?;
    let report = LocalSet::new().block_on(&runtime, psalter.load(fetcher, &config.layout))?;
    if report.failures > 0 {
        warn!(
            "{} of {} retrievals failed; those sections are incomplete",
            report.failures, report.retrievals
        );
    }

    let view = psalter.view_state();
    let session = psalter.session();
    Ok(to_html(&config.title, &session.page, psalter.engine(), &view))
}
