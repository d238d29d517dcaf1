//! Note identity: id, file name and title.
//!
//! The id is looked up in the file name first and then in the note body. The body search skips
//! the generated backlink section and ids written as links (`[[20201020113715]]` refers to
//! another note). A match touching another digit is not an id, so a 15 digit number never yields
//! a 14 digit id.
//!
//! The title is the first level-1 heading (`# Title`). Without one, the file stem with its id
//! removed stands in, e.g. `20201020093536 Some random thoughts.md` → `Some random thoughts`.

use crate::{
    codec::{links::LinkScanner, section::user_content},
    config::{BacklinkConfig, DEFAULT_ID_PATTERN},
    error::BacklinkError,
};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::{ops::Range, path::Path};

static DEFAULT_ID_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(DEFAULT_ID_PATTERN).expect("default id pattern is valid"));

/// Characters trimmed from a file stem used as a title.
const TITLE_SEPARATORS: &[char] = &[' ', '\t', '-', '_', '.'];

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NoteIdentity {
    /// Canonical id, if the file name or body carries one.
    pub id: Option<String>,
    /// File name including extension.
    pub file_name: String,
    /// File name without extension.
    pub stem: String,
    /// Level-1 heading, or the file stem without its id.
    pub title: Option<String>,
    /// Further distinct ids found in the note and not used.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ignored_ids: Vec<String>,
}

impl NoteIdentity {
    /// Text used inside `[[...]]` to refer to this note: the id, else the file stem.
    pub fn reference(&self) -> &str {
        self.id.as_deref().unwrap_or(&self.stem)
    }

    pub fn display_title(&self) -> Option<&str> {
        self.title.as_deref()
    }
}

#[derive(Debug, Clone)]
pub struct IdentityResolver {
    id_regex: Regex,
}

impl Default for IdentityResolver {
    fn default() -> Self {
        IdentityResolver::new(DEFAULT_ID_REGEX.clone())
    }
}

impl IdentityResolver {
    pub fn new(id_regex: Regex) -> Self {
        IdentityResolver { id_regex }
    }

    pub fn from_config(config: &BacklinkConfig) -> Result<Self, BacklinkError> {
        Ok(IdentityResolver::new(config.id_regex()?))
    }

    /// Byte ranges of id matches in `text` that are not flanked by other digits.
    fn id_matches<'a>(&'a self, text: &'a str) -> impl Iterator<Item = Range<usize>> + 'a {
        self.id_regex.find_iter(text).filter_map(move |m| {
            let before = text[..m.start()].chars().next_back();
            let after = text[m.end()..].chars().next();
            let flanked = before.is_some_and(|c| c.is_ascii_digit())
                || after.is_some_and(|c| c.is_ascii_digit());
            (!flanked).then(|| m.range())
        })
    }

    /// First id in a file name, if any.
    pub fn id_in_name(&self, name: &str) -> Option<String> {
        self.id_matches(name)
            .next()
            .map(|range| name[range].to_string())
    }

    /// Distinct ids of a note body in order of appearance, skipping the generated section and ids
    /// inside links.
    pub fn ids_in_body(&self, content: &str) -> Vec<String> {
        let body = user_content(content);
        let link_spans: Vec<Range<usize>> = LinkScanner::new(body).map(|t| t.span).collect();
        let mut ids: Vec<String> = Vec::new();
        for range in self.id_matches(body) {
            if link_spans
                .iter()
                .any(|span| span.start < range.end && range.start < span.end)
            {
                continue;
            }
            let id = &body[range];
            if !ids.iter().any(|known| known == id) {
                ids.push(id.to_string());
            }
        }
        ids
    }

    /// Resolves the identity of the note stored as `file_name` with text `content`.
    pub fn resolve(&self, file_name: &str, content: &str) -> NoteIdentity {
        let stem = Path::new(file_name)
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| file_name.to_string());

        let name_id = self.id_in_name(file_name);
        let body_ids = self.ids_in_body(content);
        let id = name_id.or_else(|| body_ids.first().cloned());
        let ignored_ids = body_ids
            .into_iter()
            .filter(|body_id| Some(body_id) != id.as_ref())
            .collect::<Vec<String>>();

        let title = heading_title(user_content(content)).or_else(|| self.stem_title(&stem));

        NoteIdentity {
            id,
            file_name: file_name.to_string(),
            stem,
            title,
            ignored_ids,
        }
    }

    /// The file stem with its first id removed and separators trimmed.
    pub fn stem_title(&self, stem: &str) -> Option<String> {
        let without_id = match self.id_matches(stem).next() {
            Some(range) => format!("{}{}", &stem[..range.start], &stem[range.end..]),
            None => stem.to_string(),
        };
        let title = without_id.trim_matches(TITLE_SEPARATORS);
        (!title.is_empty()).then(|| title.to_string())
    }
}

/// Text of the first level-1 heading line (`# Title`).
pub fn heading_title(text: &str) -> Option<String> {
    text.lines().find_map(|line| {
        let rest = line.strip_prefix('#')?;
        if !rest.starts_with(|c: char| c == ' ' || c == '\t') {
            return None;
        }
        let title = rest.trim();
        (!title.is_empty()).then(|| title.to_string())
    })
}
