//! Static HTML output for a loaded psalter page.
//!
//! [`StaticEngine`] stands in for the browser notation engine: it records the
//! filtered notation and render options for each target, and
//! [`to_html`] writes them out as `abc-element` blocks carrying the ABC source
//! and `data-` attributes for client-side rendering and playback.

use std::cell::RefCell;
use std::collections::HashMap;

use psalter::engine::ready;
use psalter::view_state::format_transpose;
use psalter::{
    Block, LocalBoxFuture, Page, PsalmSection, PsalterError, RenderEngine, RenderOptions,
    ViewState, Voice,
};
use quick_xml::escape::escape;

/// Notation and options of one rendered piece.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedTune {
    pub notation: String,
    pub options: RenderOptions,
}

/// Where the page script should attach an audio control.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaybackSlot {
    pub target: String,
    pub transpose: i32,
}

#[derive(Debug, Default)]
pub struct StaticEngine {
    tunes: RefCell<HashMap<String, RenderedTune>>,
}

impl StaticEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tune(&self, target: &str) -> Option<RenderedTune> {
        self.tunes.borrow().get(target).cloned()
    }
}

impl RenderEngine for StaticEngine {
    type Handle = String;
    type Control = PlaybackSlot;

    fn render(
        &self,
        target: &str,
        notation: &str,
        options: &RenderOptions,
    ) -> Result<String, PsalterError> {
        self.tunes.borrow_mut().insert(
            target.to_string(),
            RenderedTune {
                notation: notation.to_string(),
                options: *options,
            },
        );
        Ok(target.to_string())
    }

    fn build_playback(
        &self,
        handle: String,
        _target: &str,
        transpose: i32,
    ) -> LocalBoxFuture<Result<PlaybackSlot, PsalterError>> {
        ready(Ok(PlaybackSlot {
            target: handle,
            transpose,
        }))
    }
}

/// Write a complete HTML document for the page.
pub fn to_html(title: &str, page: &Page, engine: &StaticEngine, view: &ViewState) -> String {
    let mut html = String::new();

    html.push_str("<!DOCTYPE html>\n");
    html.push_str("<html>\n<head>\n");
    html.push_str("  <meta charset=\"utf-8\">\n");
    html.push_str(&format!("  <title>{}</title>\n", escape(title)));
    html.push_str("</head>\n<body>\n");

    html.push_str(&controls_to_html(view));

    html.push_str("<nav id=\"toc\">\n");
    for entry in page.toc() {
        let class = if entry.bold { " class=\"toc-heading\"" } else { "" };
        html.push_str(&format!(
            "  <a href=\"#{}\"{}>{}</a>\n",
            escape(&entry.anchor),
            class,
            escape(&entry.title)
        ));
    }
    html.push_str("</nav>\n");

    html.push_str("<main id=\"content\">\n");
    for block in page.blocks() {
        match block {
            Block::Heading {
                level,
                title,
                anchor,
            } => {
                html.push_str(&format!(
                    "  <h{level} id=\"{anchor}\">{title}{link}</h{level}>\n",
                    level = level,
                    anchor = escape(anchor),
                    title = escape(title),
                    link = header_link(anchor),
                ));
            }
            Block::Text(text) => {
                html.push_str(&format!("  <div>{}</div>\n", escape(text)));
            }
            Block::Section(section) => {
                html.push_str(&section_to_html(section, engine.tune(&section.target).as_ref()));
            }
        }
    }
    html.push_str("</main>\n");

    html.push_str("</body>\n</html>\n");
    html
}

fn header_link(anchor: &str) -> String {
    format!("<a href=\"#{}\" class=\"header-link\">#</a>", escape(anchor))
}

fn controls_to_html(view: &ViewState) -> String {
    let mut html = String::new();
    html.push_str("<div id=\"controls\">\n");
    html.push_str(&format!(
        "  <span class=\"transpose\" data-transpose=\"{}\">{}</span>\n",
        view.transpose,
        format_transpose(view.transpose)
    ));
    for voice in Voice::ALL {
        let checked = if view.voices.contains(voice) { " checked" } else { "" };
        html.push_str(&format!(
            "  <label><input type=\"checkbox\" data-voice=\"{}\"{}> {}</label>\n",
            voice.as_char(),
            checked,
            voice.name()
        ));
    }
    html.push_str("</div>\n");
    html
}

fn section_to_html(section: &PsalmSection, tune: Option<&RenderedTune>) -> String {
    let mut html = String::new();
    html.push_str("  <div class=\"music-section\">\n");

    if let Some(title) = &section.title {
        let anchor = section.anchor.as_deref().unwrap_or_default();
        html.push_str(&format!(
            "    <h3 class=\"section-title\" id=\"{}\">{}{}</h3>\n",
            escape(anchor),
            escape(title),
            header_link(anchor)
        ));
    }
    if let Some(subtitle) = &section.subtitle {
        html.push_str(&format!(
            "    <h4 class=\"section-subtitle\">{}</h4>\n",
            escape(subtitle)
        ));
    }

    html.push_str("    <div class=\"notation-container\">\n");
    match tune {
        Some(tune) => {
            html.push_str(&format!(
                "      <div class=\"abc-element\" id=\"{}\" data-width=\"{}\" data-transpose=\"{}\">\n",
                escape(&section.target),
                tune.options.display_width,
                tune.options.transpose
            ));
            html.push_str(&format!(
                "<pre class=\"abc-source\">{}</pre>\n",
                escape(&tune.notation)
            ));
            html.push_str("      </div>\n");
            html.push_str(&format!(
                "      <div class=\"audio-control\" data-target=\"{}\"></div>\n",
                escape(&section.target)
            ));
        }
        None => {
            html.push_str(&format!(
                "      <div class=\"abc-element\" id=\"{}\"></div>\n",
                escape(&section.target)
            ));
        }
    }
    html.push_str("    </div>\n");

    html.push_str("    <div class=\"section-text\">");
    if let Some(text) = &section.text {
        html.push_str(text);
    }
    html.push_str("</div>\n");

    html.push_str("  </div>\n");
    html
}
