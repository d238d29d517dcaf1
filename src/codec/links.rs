//! Wiki-style link extraction.
//!
//! A link is `[[` followed by its target text and `]]`. The target may not contain `[`, `]` or a
//! line break; anything that fails those rules (an unclosed `[[`, a stray `]` inside, a marker
//! broken across lines) is ordinary text. Scanning never fails.

use serde::{Deserialize, Serialize};
use std::ops::Range;

pub const LINK_PREFIX: &str = "[[";
pub const LINK_POSTFIX: &str = "]]";

/// A raw link target found in note text, not yet resolved against any note.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LinkToken {
    /// The trimmed text between the markers.
    pub raw: String,
    /// Byte range of the whole marker, `[[` through `]]`, in the scanned text.
    pub span: Range<usize>,
}

impl LinkToken {
    /// The link target without an `|alias` or `#anchor` suffix.
    ///
    /// Falls back to the raw text when stripping would leave nothing (e.g. `[[#heading]]`).
    pub fn target(&self) -> &str {
        let without_alias = self.raw.split('|').next().unwrap_or_default();
        let without_anchor = without_alias.split('#').next().unwrap_or_default().trim();
        if without_anchor.is_empty() {
            &self.raw
        } else {
            without_anchor
        }
    }

    /// Whether the raw text carries a suffix that [`LinkToken::target`] strips.
    pub fn has_suffix(&self) -> bool {
        self.target() != self.raw
    }
}

/// Lazy scanner over the links of a text, in order of appearance.
///
/// Creating a new scanner over the same text yields the same tokens.
#[derive(Debug, Clone)]
pub struct LinkScanner<'a> {
    text: &'a str,
    pos: usize,
}

impl<'a> LinkScanner<'a> {
    pub fn new(text: &'a str) -> Self {
        LinkScanner { text, pos: 0 }
    }
}

impl Iterator for LinkScanner<'_> {
    type Item = LinkToken;

    fn next(&mut self) -> Option<LinkToken> {
        let bytes = self.text.as_bytes();
        loop {
            let start = self.pos + self.text.get(self.pos..)?.find(LINK_PREFIX)?;
            let inner_start = start + LINK_PREFIX.len();
            let mut idx = inner_start;
            let mut close = None;
            while idx < bytes.len() {
                match bytes[idx] {
                    b']' if bytes.get(idx + 1) == Some(&b']') => {
                        close = Some(idx);
                        break;
                    }
                    b'[' | b']' | b'\n' | b'\r' => break,
                    _ => idx += 1,
                }
            }
            let Some(inner_end) = close else {
                if idx >= bytes.len() {
                    // Unclosed marker: nothing after it can close it either.
                    self.pos = bytes.len();
                    return None;
                }
                // A `[` may belong to the next marker (`[[[x]]` links `x`), so resume just after
                // this marker's first bracket. Otherwise skip past the offending byte.
                self.pos = if bytes[idx] == b'[' { start + 1 } else { idx + 1 };
                continue;
            };
            let end = inner_end + LINK_POSTFIX.len();
            self.pos = end;
            let raw = self.text[inner_start..inner_end].trim();
            if raw.is_empty() {
                continue;
            }
            return Some(LinkToken {
                raw: raw.to_string(),
                span: start..end,
            });
        }
    }
}

/// Collects every link token of `text`, duplicates included.
pub fn extract_links(text: &str) -> Vec<LinkToken> {
    LinkScanner::new(text).collect()
}

/// Formats a link to `target`.
pub fn create_link(target: &str) -> String {
    format!("{LINK_PREFIX}{target}{LINK_POSTFIX}")
}
