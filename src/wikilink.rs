//! Wikilink extraction.
//!
//! A valid occurrence is `[[`, one or more characters other than `]` and `|`, optionally a `|`
//! followed by one or more characters other than `]`, then `]]`. Matches never nest and never
//! overlap; an unterminated `[[` is simply not a match.
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use url::Url;

static WIKILINK_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\[\[([^\]|]+)(?:\|([^\]]+))?\]\]").expect("wikilink pattern is valid")
});

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WikiLink {
    /// Reference text, trimmed. May be empty for degenerate input such as `[[ ]]`.
    pub target: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
}

impl WikiLink {
    fn from_captures(caps: &Captures<'_>) -> WikiLink {
        WikiLink {
            target: caps[1].trim().to_string(),
            alias: caps.get(2).map(|m| m.as_str().trim().to_string()),
        }
    }

    /// Alias when present, target otherwise.
    pub fn display_text(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.target)
    }
}

/// Extract every wikilink in `text`, ordered by offset.
pub fn extract(text: &str) -> Vec<WikiLink> {
    WIKILINK_RE
        .captures_iter(text)
        .map(|caps| WikiLink::from_captures(&caps))
        .collect()
}

/// Rewrite wikilinks into plain markdown links pointing at `/note/<target>`, with the target
/// percent-encoded as a single path segment.
pub fn to_markdown_links(text: &str) -> String {
    WIKILINK_RE
        .replace_all(text, |caps: &Captures<'_>| {
            let link = WikiLink::from_captures(caps);
            format!("[{}]({})", link.display_text(), note_href(&link.target))
        })
        .into_owned()
}

fn note_href(target: &str) -> String {
    let mut url = Url::parse("vault://notes/note").expect("static base url is valid");
    if let Ok(mut segments) = url.path_segments_mut() {
        segments.push(target);
    }
    url.path().to_string()
}
