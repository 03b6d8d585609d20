//! # Voice Filter
//!
//! Filters an ABC notation document down to a subset of vocal parts before it
//! is handed to the rendering engine.
//!
//! ## Structural markers
//! Only two kinds of lines are structural; everything else passes through
//! verbatim:
//!
//! - **Staff grouping declarations** - `%%staves` / `%%score` directives listing
//!   parenthesized voice groups, e.g. `%%staves [(S A) (T B)]`
//! - **Voice line pairs** - a `V:<id>` line followed by exactly one content line
//!   belonging to that voice
//!
//! ## Example
//! ```rust
//! use psalter::{filter_voices, VoiceSelection};
//!
//! let abc = "%%staves [(S A) (T B)]\nV:S\nc2 d2|\nV:T\nE2 F2|";
//! let selection = VoiceSelection::parse("S");
//!
//! assert_eq!(filter_voices(abc, &selection), "%%staves [(S)]\nV:S\nc2 d2|");
//! ```
//!
//! The filter never fails: malformed structure is passed through untouched.

use std::borrow::Cow;
use std::fmt;

/// One vocal part.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Voice {
    Soprano,
    Alto,
    Tenor,
    Bass,
}

impl Voice {
    /// All voices in canonical order.
    pub const ALL: [Voice; 4] = [Voice::Soprano, Voice::Alto, Voice::Tenor, Voice::Bass];

    pub fn from_char(c: char) -> Option<Voice> {
        match c {
            'S' => Some(Voice::Soprano),
            'A' => Some(Voice::Alto),
            'T' => Some(Voice::Tenor),
            'B' => Some(Voice::Bass),
            _ => None,
        }
    }

    /// Parse a notation voice identifier. Only the exact single-letter ids match.
    pub fn from_id(id: &str) -> Option<Voice> {
        let mut chars = id.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Voice::from_char(c),
            _ => None,
        }
    }

    pub fn as_char(self) -> char {
        match self {
            Voice::Soprano => 'S',
            Voice::Alto => 'A',
            Voice::Tenor => 'T',
            Voice::Bass => 'B',
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Voice::Soprano => "Soprano",
            Voice::Alto => "Alto",
            Voice::Tenor => "Tenor",
            Voice::Bass => "Bass",
        }
    }

    fn bit(self) -> u8 {
        1 << (self as u8)
    }
}

/// A non-empty set of active voices.
///
/// The canonical text form lists the voices in S, A, T, B order; the full set
/// `SATB` is the default. An empty set cannot be built: every constructor and
/// [`toggle`](VoiceSelection::toggle) collapses it to the full set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VoiceSelection {
    mask: u8,
}

const FULL_MASK: u8 = 0b1111;

impl VoiceSelection {
    pub fn full() -> Self {
        VoiceSelection { mask: FULL_MASK }
    }

    /// Parse a voice string such as `"sa"` or `"TB"`.
    ///
    /// Letters are upper-cased first; characters outside S/A/T/B are ignored.
    /// A string selecting nothing yields the full set.
    pub fn parse(s: &str) -> Self {
        let mask = s
            .chars()
            .flat_map(char::to_uppercase)
            .filter_map(Voice::from_char)
            .fold(0, |mask, v| mask | v.bit());
        Self::from_mask(mask)
    }

    pub fn from_voices<I: IntoIterator<Item = Voice>>(voices: I) -> Self {
        Self::from_mask(voices.into_iter().fold(0, |mask, v| mask | v.bit()))
    }

    fn from_mask(mask: u8) -> Self {
        if mask == 0 {
            Self::full()
        } else {
            VoiceSelection { mask }
        }
    }

    pub fn contains(&self, voice: Voice) -> bool {
        self.mask & voice.bit() != 0
    }

    pub fn is_full(&self) -> bool {
        self.mask == FULL_MASK
    }

    /// `true` if every voice in `self` is also in `other`.
    pub fn is_subset(&self, other: &VoiceSelection) -> bool {
        self.mask & !other.mask == 0
    }

    /// Flip one voice on or off. Switching off the last active voice
    /// re-selects all four.
    pub fn toggle(&mut self, voice: Voice) {
        *self = Self::from_mask(self.mask ^ voice.bit());
    }

    pub fn voices(&self) -> impl Iterator<Item = Voice> + '_ {
        Voice::ALL.into_iter().filter(move |v| self.contains(*v))
    }

    pub fn len(&self) -> usize {
        self.mask.count_ones() as usize
    }

    pub fn is_empty(&self) -> bool {
        false
    }
}

impl Default for VoiceSelection {
    fn default() -> Self {
        Self::full()
    }
}

impl fmt::Display for VoiceSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for voice in self.voices() {
            write!(f, "{}", voice.as_char())?;
        }
        Ok(())
    }
}

/// Filter a notation document down to the selected voices.
///
/// Single pass with one line of lookahead. Staff grouping declarations are
/// rebuilt with only the selected members (empty groups disappear, and a
/// declaration with no surviving group disappears entirely). A `V:` line for a
/// voice outside the selection is dropped together with the content line that
/// follows it. Every other line is emitted unchanged.
///
/// A trailing newline on the input is kept on the output.
pub fn filter_voices(document: &str, selection: &VoiceSelection) -> String {
    let (body, trailing_newline) = match document.strip_suffix('\n') {
        Some(body) => (body, true),
        None => (document, false),
    };

    let lines: Vec<&str> = body.split('\n').collect();
    let mut out: Vec<Cow<str>> = Vec::with_capacity(lines.len());
    let mut i = 0;

    while i < lines.len() {
        let line = lines[i];

        if let Some(declaration) = StaffDeclaration::parse(line) {
            if let Some(kept) = declaration.retain(selection) {
                out.push(kept);
            }
            i += 1;
            continue;
        }

        if let Some(voice) = voice_line(line) {
            if selection.contains(voice) {
                out.push(Cow::Borrowed(line));
                if let Some(content) = lines.get(i + 1) {
                    out.push(Cow::Borrowed(content));
                }
            }
            i += 2;
            continue;
        }

        out.push(Cow::Borrowed(line));
        i += 1;
    }

    let mut filtered = out.join("\n");
    if trailing_newline {
        filtered.push('\n');
    }
    filtered
}

/// Voices a document introduces through `V:` lines, in canonical order.
///
/// Returns `None` when the document names none of S/A/T/B, i.e. it is not a
/// part-song and the voice toggles do not apply to it.
pub fn declared_voices(document: &str) -> Option<VoiceSelection> {
    let mask = document
        .lines()
        .filter_map(voice_line)
        .fold(0, |mask, v| mask | v.bit());
    if mask == 0 {
        None
    } else {
        Some(VoiceSelection::from_mask(mask))
    }
}

/// Recognize a `V:<id>` line whose id is one of S/A/T/B.
///
/// The id is the first token after `V:`; attributes such as `clef=bass` may follow.
fn voice_line(line: &str) -> Option<Voice> {
    let rest = line.trim_end_matches('\r').strip_prefix("V:")?;
    let id = rest.split_whitespace().next()?;
    Voice::from_id(id)
}

const STAFF_DIRECTIVES: [&str; 2] = ["%%staves", "%%score"];

/// A parsed staff grouping line, e.g. `%%staves [(S A) (T B)]`.
///
/// `prefix` holds everything up to and including the opening bracket and
/// `suffix` everything from the closing bracket on, so a rebuilt line keeps
/// the original directive, bracket style and trailing comment.
#[derive(Debug, PartialEq)]
struct StaffDeclaration<'a> {
    line: &'a str,
    prefix: &'a str,
    groups: Vec<Vec<&'a str>>,
    suffix: &'a str,
}

impl<'a> StaffDeclaration<'a> {
    fn parse(line: &'a str) -> Option<Self> {
        let trimmed = line.trim_start();
        let directive = STAFF_DIRECTIVES
            .iter()
            .find(|d| trimmed.starts_with(*d))?;
        let after = &trimmed[directive.len()..];
        // `%%scorefoo` is some other directive
        if !after.is_empty() && !after.starts_with(char::is_whitespace) {
            return None;
        }

        let rest = after.trim_start();
        let content_start = line.len() - rest.len();

        let (open, close) = match rest.chars().next()? {
            '[' => (1, rest.rfind(']')?),
            '{' => (1, rest.rfind('}')?),
            '(' => (0, rest.rfind(')')? + 1),
            _ => return None,
        };
        if close < open {
            return None;
        }

        let groups = parse_groups(&rest[open..close])?;
        Some(StaffDeclaration {
            line,
            prefix: &line[..content_start + open],
            groups,
            suffix: &rest[close..],
        })
    }

    /// Rebuild the line keeping only selected voices, or `None` if no group survives.
    ///
    /// A declaration that loses no member is returned as written.
    fn retain(&self, selection: &VoiceSelection) -> Option<Cow<'a, str>> {
        let selected = |id: &str| Voice::from_id(id).is_some_and(|v| selection.contains(v));

        if self.groups.iter().flatten().all(|id| selected(id)) {
            return Some(Cow::Borrowed(self.line));
        }

        let surviving: Vec<String> = self
            .groups
            .iter()
            .map(|group| group.iter().copied().filter(|id| selected(id)).collect::<Vec<_>>())
            .filter(|group| !group.is_empty())
            .map(|group| format!("({})", group.join(" ")))
            .collect();

        if surviving.is_empty() {
            return None;
        }
        Some(Cow::Owned(format!(
            "{}{}{}",
            self.prefix,
            surviving.join(" "),
            self.suffix
        )))
    }
}

/// Split `(S A) (T B)` into `[["S", "A"], ["T", "B"]]`.
///
/// Anything other than whitespace-separated parenthesized groups makes the
/// whole content unparseable.
fn parse_groups(content: &str) -> Option<Vec<Vec<&str>>> {
    let mut groups = Vec::new();
    let mut rest = content.trim();

    if rest.is_empty() {
        return None;
    }

    while !rest.is_empty() {
        let inner = rest.strip_prefix('(')?;
        let end = inner.find(')')?;
        let members = &inner[..end];
        if members.contains('(') {
            return None;
        }
        groups.push(members.split_whitespace().collect());
        rest = inner[end + 1..].trim_start();
    }

    Some(groups)
}
