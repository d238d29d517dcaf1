//! The generated backlink section at the end of a note.
//!
//! A section starts with a horizontal rule line immediately followed by a bold header line:
//!
//! ```text
//! -----------------
//! **Links to this note**
//!
//! - [[20201020093536]] Some random thoughts
//! - [[Orphan]] Orphan
//! ```
//!
//! Everything from the rule to the end of the file belongs to the section and is replaced as a
//! whole. Everything before the rule is user content and is never modified, except that removing
//! a section also removes the blank lines that separated it from the content.
//!
//! Detection also accepts the section written by earlier versions of the tool: a `---` rule, one
//! blank line, then `**Backlinks** <!-- generated on ... -->`. In both forms every non-blank line
//! after the header must be a `- ` or `* ` bullet; anything else means the rule and header are
//! the user's own text. Rendering always produces the canonical rule and header.

use crate::codec::links::create_link;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Rule line opening a rendered section.
pub const SECTION_RULE: &str = "-----------------";

/// Header line following [`SECTION_RULE`].
pub const SECTION_HEADER: &str = "**Links to this note**";

const LEGACY_RULE: &str = "---";
const LEGACY_HEADER: &str = "**Backlinks**";
const LEGACY_STAMP: &str = "<!-- generated on ";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineEnding {
    #[default]
    Lf,
    CrLf,
}

impl LineEnding {
    /// CRLF if the text uses it anywhere, LF otherwise.
    pub fn detect(text: &str) -> Self {
        if text.contains("\r\n") {
            LineEnding::CrLf
        } else {
            LineEnding::Lf
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LineEnding::Lf => "\n",
            LineEnding::CrLf => "\r\n",
        }
    }
}

/// One bullet of a backlink section: a link to the referring note and its title.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BacklinkEntry {
    pub reference: String,
    pub title: Option<String>,
}

impl BacklinkEntry {
    /// A blank title counts as no title.
    pub fn new(reference: impl Into<String>, title: Option<&str>) -> Self {
        let title = title
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string);
        BacklinkEntry {
            reference: reference.into(),
            title,
        }
    }
}

impl fmt::Display for BacklinkEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.title {
            Some(title) => write!(f, "{} {}", create_link(&self.reference), title),
            None => write!(f, "{}", create_link(&self.reference)),
        }
    }
}

/// A backlink section located in a note's text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedSection<'a> {
    /// Byte offset of the rule line; the user content is `text[..start]`.
    pub start: usize,
    /// Bullet texts of the section, without the `- ` marker.
    pub entries: Vec<&'a str>,
}

/// Lines of `text` with their byte offsets, line endings stripped.
fn lines_with_offsets(text: &str) -> impl Iterator<Item = (usize, &str)> {
    let mut offset = 0;
    text.split_inclusive('\n').map(move |raw| {
        let start = offset;
        offset += raw.len();
        let line = raw.strip_suffix('\n').unwrap_or(raw);
        (start, line.strip_suffix('\r').unwrap_or(line))
    })
}

fn is_legacy_header(line: &str) -> bool {
    line.strip_prefix(LEGACY_HEADER)
        .map(str::trim_start)
        .is_some_and(|stamp| stamp.starts_with(LEGACY_STAMP) && stamp.ends_with("-->"))
}

/// Index of the header line when the line at `idx` opens a section marker.
fn marker_header(lines: &[(usize, &str)], idx: usize) -> Option<usize> {
    let line = |i: usize| lines.get(i).map(|(_, l)| l.trim_end());
    let rule = line(idx)?;
    if rule == SECTION_RULE && line(idx + 1) == Some(SECTION_HEADER) {
        return Some(idx + 1);
    }
    if rule == LEGACY_RULE
        && line(idx + 1) == Some("")
        && line(idx + 2).is_some_and(is_legacy_header)
    {
        return Some(idx + 2);
    }
    None
}

fn entry_text(line: &str) -> Option<&str> {
    line.strip_prefix("- ")
        .or_else(|| line.strip_prefix("* "))
        .map(str::trim_end)
}

/// Finds the first backlink section in `text`.
///
/// A marker followed by anything but blank lines and bullets is user text, and the search moves
/// on past it.
pub fn find_section(text: &str) -> Option<GeneratedSection<'_>> {
    let lines: Vec<(usize, &str)> = lines_with_offsets(text).collect();
    for (idx, (start, _)) in lines.iter().enumerate() {
        let Some(header_idx) = marker_header(&lines, idx) else {
            continue;
        };
        let entries: Option<Vec<&str>> = lines[header_idx + 1..]
            .iter()
            .filter(|(_, l)| !l.trim().is_empty())
            .map(|(_, l)| entry_text(l))
            .collect();
        if let Some(entries) = entries {
            return Some(GeneratedSection {
                start: *start,
                entries,
            });
        }
        tracing::trace!("[Section] marker at byte {start} is followed by user text");
    }
    None
}

/// The part of `text` the tool never touches: everything before the first section.
pub fn user_content(text: &str) -> &str {
    match find_section(text) {
        Some(section) => &text[..section.start],
        None => text,
    }
}

/// Renders the canonical section for `entries`, or an empty string when there are none.
pub fn render_section(entries: &[BacklinkEntry], eol: LineEnding) -> String {
    if entries.is_empty() {
        return String::new();
    }
    let eol = eol.as_str();
    let mut out = format!("{SECTION_RULE}{eol}{SECTION_HEADER}{eol}{eol}");
    for entry in entries {
        out.push_str("- ");
        out.push_str(&entry.to_string());
        out.push_str(eol);
    }
    out
}

/// Whether the last line of `text` (which ends with a line break) is blank.
fn ends_with_blank_line(text: &str) -> bool {
    let Some(body) = text.strip_suffix('\n') else {
        return false;
    };
    let body = body.strip_suffix('\r').unwrap_or(body);
    let line_start = body.rfind('\n').map_or(0, |i| i + 1);
    body[line_start..].trim().is_empty()
}

/// Drops whitespace-only lines at the end of `text`, keeping the line break of the last
/// non-blank line.
fn trim_trailing_blank_lines(text: &str) -> &str {
    let mut kept = text;
    while let Some(body) = kept.strip_suffix('\n') {
        let body = body.strip_suffix('\r').unwrap_or(body);
        let line_start = body.rfind('\n').map_or(0, |i| i + 1);
        if line_start == 0 || !body[line_start..].trim().is_empty() {
            break;
        }
        kept = &body[..line_start];
    }
    kept
}

/// Replaces any existing section of `text` with `rendered` (which may be empty).
pub fn apply_section(text: &str, rendered: &str) -> String {
    let eol = LineEnding::detect(text).as_str();
    match find_section(text) {
        Some(section) => {
            let prefix = &text[..section.start];
            if rendered.is_empty() {
                trim_trailing_blank_lines(prefix).to_string()
            } else {
                format!("{prefix}{rendered}")
            }
        }
        None if rendered.is_empty() => text.to_string(),
        None => {
            let mut out = String::with_capacity(text.len() + rendered.len() + 4);
            out.push_str(text);
            if !out.is_empty() {
                if !out.ends_with('\n') {
                    out.push_str(eol);
                }
                if !ends_with_blank_line(&out) {
                    out.push_str(eol);
                }
            }
            out.push_str(rendered);
            out
        }
    }
}

/// Computes the new text of a note whose backlinks are `entries`.
///
/// Returns `None` when the note should be left alone. Unless `overwrite` is set, a note whose
/// section already lists the same entries, in any order and under any recognized header, is
/// left alone. A section is always removed when there are no entries.
pub fn rewrite(text: &str, entries: &[BacklinkEntry], overwrite: bool) -> Option<String> {
    let existing = find_section(text);
    if !overwrite {
        let mut current: Vec<String> = existing
            .as_ref()
            .map(|s| s.entries.iter().map(|e| e.to_string()).collect())
            .unwrap_or_default();
        let mut wanted: Vec<String> = entries.iter().map(|e| e.to_string()).collect();
        current.sort();
        wanted.sort();
        let stale_empty_section = existing.is_some() && entries.is_empty();
        if current == wanted && !stale_empty_section {
            return None;
        }
    }
    let rendered = render_section(entries, LineEnding::detect(text));
    let new_text = apply_section(text, &rendered);
    (new_text != text).then_some(new_text)
}
