//! Live-reload snippet injection for served HTML.

use std::sync::LazyLock;

use regex::bytes::Regex;

/// Script that reloads the page on every rebuild event.
pub const SCRIPT: &str = include_str!("reload.html");

/// Whitespace, comments and processing instructions allowed before a tag.
static IGNORED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)^(?:\s+|<!--.*?-->|<\?.*?\?>)*").expect("Invalid ignored prefix regex")
});

/// Opening tags the snippet is placed after, in document order.
static TAGS: LazyLock<[Regex; 3]> = LazyLock::new(|| {
    [
        Regex::new(r"(?is)^<!doctype\s[^>]*>").expect("Invalid doctype regex"),
        Regex::new(r"(?is)^<html(?:\s[^>]*)?>").expect("Invalid html regex"),
        Regex::new(r"(?is)^<head(?:\s[^>]*)?>").expect("Invalid head regex"),
    ]
});

/// Insert [`SCRIPT`] after the leading doctype, `<html>` and `<head>` tags.
///
/// Each tag is optional. Without any of them the snippet goes right after the
/// leading whitespace and comments.
pub fn inject(html: &[u8]) -> Vec<u8> {
    let mut index = 0;
    for tag in TAGS.iter() {
        index += match_len(&IGNORED, &html[index..]);
        index += match_len(tag, &html[index..]);
    }

    let mut output = Vec::with_capacity(html.len() + SCRIPT.len());
    output.extend_from_slice(&html[..index]);
    output.extend_from_slice(SCRIPT.as_bytes());
    output.extend_from_slice(&html[index..]);
    output
}

fn match_len(re: &Regex, haystack: &[u8]) -> usize {
    re.find(haystack).map_or(0, |m| m.end())
}
