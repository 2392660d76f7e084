//! Link extraction
//!
//! Finds the hyperlink under a cursor on a single line of text. Three link
//! forms are recognized, tried in this order at every scan position:
//!
//! 1. Markdown links, `[label](target)`
//! 2. Autolinks, `<scheme:target>` and `<user@host>`
//! 3. Bare `http://` and `https://` URLs
//!
//! Offsets are UTF-16 code units, as LSP positions are.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use crate::types::{LinkSpan, Position, Range};

static LINK_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"\[(?P<label>[^\]]+)\]\((?P<target>[^)]+?)\)",
        r"|<(?P<auto>[A-Za-z][A-Za-z0-9+.\-]{1,31}:[^<>\s]+)>",
        r"|<(?P<email>[^<>\s@]+@[^<>\s@]+\.[^<>\s@]+)>",
        r"|(?P<bare>https?://[^\s<>]+)",
    ))
    .expect("link pattern is valid")
});

/// Extract the link whose span contains `character` (UTF-16 offset) on `line`.
///
/// The returned span is on line 0; use [`LinkSpan::on_line`] to place it.
pub fn extract_link(line: &str, character: u32) -> Option<LinkSpan> {
    find_links(line)
        .into_iter()
        .find(|span| span.contains(character))
}

/// Every link on `line`, in order of appearance
pub fn find_links(line: &str) -> Vec<LinkSpan> {
    LINK_PATTERN
        .captures_iter(line)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let (url, end) = resolve_target(&caps, whole.end())?;
            Some(LinkSpan {
                url,
                range: Range::new(
                    Position::new(0, utf16_offset(line, whole.start())),
                    Position::new(0, utf16_offset(line, end)),
                ),
            })
        })
        .collect()
}

/// Resolved URL and byte end of the span for one match
fn resolve_target(caps: &Captures<'_>, end: usize) -> Option<(String, usize)> {
    if let Some(target) = caps.name("target") {
        let url = bracket_target(target.as_str());
        return (!url.is_empty()).then_some((url, end));
    }
    if let Some(auto) = caps.name("auto") {
        return Some((auto.as_str().to_string(), end));
    }
    if let Some(email) = caps.name("email") {
        return Some((format!("mailto:{}", email.as_str()), end));
    }
    let bare = caps.name("bare")?;
    let trimmed = trim_bare_url(bare.as_str());
    let trimmed_end = bare.start() + trimmed.len();
    Some((trimmed.to_string(), trimmed_end))
}

/// Strip an optional `<...>` wrapper and link title, then backslash escapes
fn bracket_target(raw: &str) -> String {
    let raw = raw.trim();
    let destination = if let Some(inner) = raw.strip_prefix('<') {
        inner.split('>').next().unwrap_or(inner)
    } else {
        raw.split_whitespace().next().unwrap_or(raw)
    };
    unescape(destination)
}

fn unescape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(&next) = chars.peek() {
                if next.is_ascii_punctuation() {
                    out.push(next);
                    chars.next();
                    continue;
                }
            }
        }
        out.push(c);
    }
    out
}

/// Drop trailing sentence punctuation and an unbalanced closing parenthesis
fn trim_bare_url(url: &str) -> &str {
    let mut trimmed = url;
    loop {
        let before = trimmed.len();
        trimmed = trimmed.trim_end_matches(['.', ',', ';', ':', '!', '?', '\'', '"', '*', '_']);
        if trimmed.ends_with(')') && trimmed.matches(')').count() > trimmed.matches('(').count() {
            trimmed = &trimmed[..trimmed.len() - 1];
        }
        if trimmed.len() == before {
            return trimmed;
        }
    }
}

fn utf16_offset(line: &str, byte_offset: usize) -> u32 {
    line[..byte_offset].encode_utf16().count() as u32
}
