//! The on-screen page model built from a playlist.
//!
//! Headings become anchored heading blocks (plus a bold table-of-contents
//! link); psalm entries become sections holding a notation target element and
//! a text slot that is filled once the text file arrives.

use crate::playlist::{notation_target, Playlist, PlaylistEntry};
use crate::stylize::slugify;

#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    Heading {
        level: u8,
        title: String,
        anchor: String,
    },
    /// Plain body text under a heading entry.
    Text(String),
    Section(PsalmSection),
}

#[derive(Debug, Clone, PartialEq)]
pub struct PsalmSection {
    /// Playlist index of the entry.
    pub index: usize,
    pub title: Option<String>,
    pub anchor: Option<String>,
    pub subtitle: Option<String>,
    /// Element id of the notation container.
    pub target: String,
    /// Stylized HTML of the text file, once retrieved.
    pub text: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TocEntry {
    pub title: String,
    pub anchor: String,
    /// Heading links are bold, psalm links are not.
    pub bold: bool,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    blocks: Vec<Block>,
    toc: Vec<TocEntry>,
}

impl Page {
    pub fn build(playlist: &Playlist) -> Self {
        let mut page = Page::default();

        for (index, entry) in playlist.entries().iter().enumerate() {
            match entry {
                PlaylistEntry::Heading { title, level, text } => {
                    if let Some(title) = title {
                        let anchor = slugify(title);
                        page.toc.push(TocEntry {
                            title: title.clone(),
                            anchor: anchor.clone(),
                            bold: true,
                        });
                        page.blocks.push(Block::Heading {
                            level: (*level).clamp(1, 6),
                            title: title.clone(),
                            anchor,
                        });
                    }
                    if let Some(text) = text {
                        page.blocks.push(Block::Text(text.clone()));
                    }
                }
                PlaylistEntry::Psalm {
                    title, subtitle, ..
                } => {
                    let anchor = title.as_deref().map(slugify);
                    if let (Some(title), Some(anchor)) = (title, &anchor) {
                        page.toc.push(TocEntry {
                            title: title.clone(),
                            anchor: anchor.clone(),
                            bold: false,
                        });
                    }
                    page.blocks.push(Block::Section(PsalmSection {
                        index,
                        title: title.clone(),
                        anchor,
                        subtitle: subtitle.clone(),
                        target: notation_target(index),
                        text: None,
                    }));
                }
            }
        }

        page
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn toc(&self) -> &[TocEntry] {
        &self.toc
    }

    pub fn sections(&self) -> impl Iterator<Item = &PsalmSection> {
        self.blocks.iter().filter_map(|b| match b {
            Block::Section(s) => Some(s),
            _ => None,
        })
    }

    pub fn section(&self, index: usize) -> Option<&PsalmSection> {
        self.sections().find(|s| s.index == index)
    }

    /// Fill the text slot of the section for playlist entry `index`.
    pub fn set_text(&mut self, index: usize, html: String) -> bool {
        let section = self.blocks.iter_mut().find_map(|b| match b {
            Block::Section(s) if s.index == index => Some(s),
            _ => None,
        });
        match section {
            Some(section) => {
                section.text = Some(html);
                true
            }
            None => false,
        }
    }

    /// The block an address fragment scrolls to, if any.
    pub fn resolve_anchor(&self, fragment: &str) -> Option<&Block> {
        self.blocks.iter().find(|b| match b {
            Block::Heading { anchor, .. } => anchor == fragment,
            Block::Section(s) => s.anchor.as_deref() == Some(fragment),
            Block::Text(_) => false,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn playlist() -> Playlist {
        Playlist::from_json(
            r#"[
                { "type": "heading", "title": "Psalms of Trust", "text": "For evensong" },
                { "type": "heading", "level": 9, "title": "Deep" },
                { "type": "psalm", "title": "Psalm 23", "subtitle": "Crimond",
                  "tune": "23.abc", "text": "23.txt" },
                { "type": "psalm", "tune": "121.abc", "text": "121.txt" }
            ]"#,
        )
        .unwrap()
    }

    #[test]
    fn test_build_blocks() {
        let page = Page::build(&playlist());
        assert_eq!(page.blocks().len(), 5);
        assert_eq!(
            page.blocks()[0],
            Block::Heading {
                level: 2,
                title: "Psalms of Trust".to_string(),
                anchor: "psalms-of-trust".to_string(),
            }
        );
        assert_eq!(page.blocks()[1], Block::Text("For evensong".to_string()));
        assert!(matches!(page.blocks()[2], Block::Heading { level: 6, .. }));

        let section = page.section(2).unwrap();
        assert_eq!(section.target, "abc2");
        assert_eq!(section.anchor.as_deref(), Some("psalm-23"));
        assert_eq!(section.subtitle.as_deref(), Some("Crimond"));
        assert_eq!(section.text, None);

        assert_eq!(page.section(3).unwrap().anchor, None);
    }

    #[test]
    fn test_toc_skips_untitled() {
        let page = Page::build(&playlist());
        let toc: Vec<(&str, bool)> = page.toc().iter().map(|t| (t.anchor.as_str(), t.bold)).collect();
        assert_eq!(toc, vec![("psalms-of-trust", true), ("deep", true), ("psalm-23", false)]);
    }

    #[test]
    fn test_set_text() {
        let mut page = Page::build(&playlist());
        assert!(page.set_text(3, "<em>I lift</em>".to_string()));
        assert!(!page.set_text(0, "heading".to_string()));
        assert_eq!(page.section(3).unwrap().text.as_deref(), Some("<em>I lift</em>"));
    }

    #[test]
    fn test_resolve_anchor() {
        let page = Page::build(&playlist());
        assert!(matches!(page.resolve_anchor("psalm-23"), Some(Block::Section(s)) if s.index == 2));
        assert!(matches!(page.resolve_anchor("deep"), Some(Block::Heading { .. })));
        assert_eq!(page.resolve_anchor("psalm-150"), None);
    }
}
