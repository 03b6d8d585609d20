//! Inline text styling for psalm texts and header anchors.
//!
//! `stylize` turns a plain text file into an HTML fragment:
//! `**bold**`, `*italic*`, line breaks, and `keep-all` spans around CJK runs so
//! the browser does not break lines inside a word.

use quick_xml::escape::escape;

const KEEP_ALL_OPEN: &str = "<span class=\"keep-all\">";
const KEEP_ALL_CLOSE: &str = "</span>";

/// Render a psalm text file as an HTML fragment.
///
/// ```
/// use psalter::stylize;
///
/// assert_eq!(
///     stylize("The **Lord** is my *shepherd*"),
///     "The <strong>Lord</strong> is my <em>shepherd</em>"
/// );
/// ```
pub fn stylize(text: &str) -> String {
    let escaped = escape(text.trim_end_matches('\n'));
    let bold = replace_delimited(&escaped, "**", "<strong>", "</strong>");
    let italic = replace_delimited(&bold, "*", "<em>", "</em>");
    let lines = italic.replace("\r\n", "\n").replace('\n', "<br>\n");
    protect_word_breaks(&lines)
}

/// Header anchor id: lowercase, every run outside `[a-z0-9]` becomes `-`.
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut in_gap = false;
    for c in title.chars().flat_map(char::to_lowercase) {
        if c.is_ascii_lowercase() || c.is_ascii_digit() {
            slug.push(c);
            in_gap = false;
        } else if !in_gap {
            slug.push('-');
            in_gap = true;
        }
    }
    slug
}

/// Wrap `delim`-enclosed spans. An unmatched or empty pair stays literal.
fn replace_delimited(text: &str, delim: &str, open: &str, close: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(start) = rest.find(delim) {
        let after = &rest[start + delim.len()..];
        match after.find(delim) {
            Some(end) if end > 0 && !after[..end].contains('\n') => {
                out.push_str(&rest[..start]);
                out.push_str(open);
                out.push_str(&after[..end]);
                out.push_str(close);
                rest = &after[end + delim.len()..];
            }
            _ => {
                out.push_str(&rest[..start + delim.len()]);
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

fn is_cjk(c: char) -> bool {
    matches!(c,
        '\u{3000}'..='\u{303F}'
        | '\u{3040}'..='\u{30FF}'
        | '\u{3400}'..='\u{4DBF}'
        | '\u{4E00}'..='\u{9FFF}'
        | '\u{AC00}'..='\u{D7AF}'
        | '\u{F900}'..='\u{FAFF}'
        | '\u{FF00}'..='\u{FFEF}')
}

fn protect_word_breaks(html: &str) -> String {
    let mut out = String::with_capacity(html.len());
    let mut in_run = false;
    for c in html.chars() {
        let cjk = is_cjk(c);
        if cjk && !in_run {
            out.push_str(KEEP_ALL_OPEN);
        } else if !cjk && in_run {
            out.push_str(KEEP_ALL_CLOSE);
        }
        in_run = cjk;
        out.push(c);
    }
    if in_run {
        out.push_str(KEEP_ALL_CLOSE);
    }
    out
}
