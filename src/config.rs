//! Site configuration for the `build` command.
//!
//! Read from a YAML file such as:
//!
//! ```yaml
//! title: Evening Psalter
//! manifest: playlist.json
//! tune-dir: abc
//! text-dir: text
//! display-width: 720
//! base-url: https://example.org/psalter/?v=SA
//! ```
//!
//! Every field is optional.

use std::fs;
use std::path::Path;

use psalter::SourceLayout;
use serde::Deserialize;
use url::Url;

use crate::error::CliError;

pub const DEFAULT_DISPLAY_WIDTH: u32 = 800;
pub const DEFAULT_BASE_URL: &str = "http://localhost/";

/// Raw config for YAML deserialization
#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct RawConfig {
    title: Option<String>,
    manifest: Option<String>,
    tune_dir: Option<String>,
    text_dir: Option<String>,
    display_width: Option<u32>,
    base_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SiteConfig {
    pub title: String,
    pub layout: SourceLayout,
    pub display_width: u32,
    /// Page address the view state is read from.
    pub base_url: Url,
}

impl Default for SiteConfig {
    fn default() -> Self {
        SiteConfig {
            title: "Psalter".to_string(),
            layout: SourceLayout::default(),
            display_width: DEFAULT_DISPLAY_WIDTH,
            base_url: Url::parse(DEFAULT_BASE_URL).expect("default base url is valid"),
        }
    }
}

impl SiteConfig {
    pub fn from_yaml(content: &str) -> Result<Self, CliError> {
        // an empty file deserializes to `()`, not to an empty map
        if content.trim().is_empty() {
            return Ok(SiteConfig::default());
        }
        let raw: RawConfig = serde_yaml::from_str(content)?;
        let defaults = SiteConfig::default();

        let base_url = match raw.base_url {
            Some(url) => Url::parse(&url).map_err(psalter::PsalterError::from)?,
            None => defaults.base_url,
        };
        if raw.display_width == Some(0) {
            return Err(CliError::Config("display-width must be positive".to_string()));
        }

        Ok(SiteConfig {
            title: raw.title.unwrap_or(defaults.title),
            layout: SourceLayout {
                manifest: raw.manifest.unwrap_or(defaults.layout.manifest),
                tune_dir: raw.tune_dir.unwrap_or(defaults.layout.tune_dir),
                text_dir: raw.text_dir.unwrap_or(defaults.layout.text_dir),
            },
            display_width: raw.display_width.unwrap_or(defaults.display_width),
            base_url,
        })
    }

    /// Load `path`, or the defaults if it does not exist.
    pub fn load(path: &Path) -> Result<Self, CliError> {
        if !path.exists() {
            return Ok(SiteConfig::default());
        }
        let content = fs::read_to_string(path).map_err(|source| CliError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_yaml(&content)
    }
}
