use crate::{
    codec::{diagnostic::Diagnostic, links::LinkToken},
    note::Note,
};
use serde::{Deserialize, Serialize};
use std::{
    collections::{BTreeMap, BTreeSet},
    fmt,
};
use unicode_normalization::UnicodeNormalization;

/// Position of a note within a [`NoteIndex`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NoteKey(pub usize);

impl fmt::Display for NoteKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Which index a link resolved through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchKind {
    Id,
    Name,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Resolved { key: NoteKey, by: MatchKind },
    Unresolved,
    Ambiguous(Vec<NoteKey>),
}

impl Resolution {
    pub fn key(&self) -> Option<NoteKey> {
        match self {
            Resolution::Resolved { key, .. } => Some(*key),
            _ => None,
        }
    }

    fn from_candidates(keys: &BTreeSet<NoteKey>, by: MatchKind) -> Self {
        let mut candidates = keys.iter().copied();
        match (candidates.next(), candidates.next()) {
            (None, _) => Resolution::Unresolved,
            (Some(key), None) => Resolution::Resolved { key, by },
            _ => Resolution::Ambiguous(keys.iter().copied().collect()),
        }
    }
}

/// Canonical form of a name used as an index key: NFC, with whitespace runs collapsed to one
/// space and outer whitespace removed.
pub fn normalize_name(name: &str) -> String {
    name.nfc()
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<&str>>()
        .join(" ")
}

fn fold_case(name: &str) -> String {
    name.to_lowercase()
}

/// Immutable lookup structure over every note of one run.
///
/// Notes are addressed by [`NoteKey`]. A link is resolved in this order:
///
/// 1. the link text equals a note id;
/// 2. the link text equals a note title, file stem or file name;
/// 3. when built case-insensitive and step 2 found nothing, the same with case folded;
/// 4. when steps 1-3 found nothing and the link has an `|alias` or `#anchor` suffix, steps 1-3
///    again with the bare target.
///
/// The first step with any candidate decides: one candidate resolves the link, several make it
/// ambiguous. Ids shared by several notes are therefore always ambiguous.
#[derive(Debug, Clone, Default)]
pub struct NoteIndex {
    notes: Vec<Note>,
    case_sensitive: bool,
    by_id: BTreeMap<String, BTreeSet<NoteKey>>,
    by_name: BTreeMap<String, BTreeSet<NoteKey>>,
    by_folded_name: BTreeMap<String, BTreeSet<NoteKey>>,
}

impl NoteIndex {
    pub fn new(notes: Vec<Note>, case_sensitive: bool) -> Self {
        let mut by_id: BTreeMap<String, BTreeSet<NoteKey>> = BTreeMap::new();
        let mut by_name: BTreeMap<String, BTreeSet<NoteKey>> = BTreeMap::new();
        let mut by_folded_name: BTreeMap<String, BTreeSet<NoteKey>> = BTreeMap::new();

        for (idx, note) in notes.iter().enumerate() {
            let key = NoteKey(idx);
            if let Some(id) = note.id() {
                by_id.entry(normalize_name(id)).or_default().insert(key);
            }
            let names = [
                note.title(),
                Some(note.identity.stem.as_str()),
                Some(note.identity.file_name.as_str()),
            ];
            for name in names.into_iter().flatten() {
                let name = normalize_name(name);
                if name.is_empty() {
                    continue;
                }
                if !case_sensitive {
                    by_folded_name
                        .entry(fold_case(&name))
                        .or_default()
                        .insert(key);
                }
                by_name.entry(name).or_default().insert(key);
            }
        }

        tracing::debug!(
            "[NoteIndex] Indexed {} notes: {} ids, {} names",
            notes.len(),
            by_id.len(),
            by_name.len()
        );

        NoteIndex {
            notes,
            case_sensitive,
            by_id,
            by_name,
            by_folded_name,
        }
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    pub fn is_case_sensitive(&self) -> bool {
        self.case_sensitive
    }

    pub fn get(&self, key: NoteKey) -> Option<&Note> {
        self.notes.get(key.0)
    }

    pub fn notes(&self) -> impl Iterator<Item = (NoteKey, &Note)> {
        self.notes
            .iter()
            .enumerate()
            .map(|(idx, note)| (NoteKey(idx), note))
    }

    pub fn keys(&self) -> impl Iterator<Item = NoteKey> {
        (0..self.notes.len()).map(NoteKey)
    }

    /// Every id in use.
    pub fn ids(&self) -> BTreeSet<String> {
        self.by_id.keys().cloned().collect()
    }

    /// Ids carried by more than one note, with the notes carrying them.
    pub fn duplicate_ids(&self) -> Vec<(&str, Vec<NoteKey>)> {
        self.by_id
            .iter()
            .filter(|(_, keys)| keys.len() > 1)
            .map(|(id, keys)| (id.as_str(), keys.iter().copied().collect()))
            .collect()
    }

    /// Warnings about the index itself: duplicate ids, and notes naming several ids.
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        let mut diagnostics: Vec<Diagnostic> = self
            .duplicate_ids()
            .into_iter()
            .map(|(id, keys)| Diagnostic::DuplicateId {
                id: id.to_string(),
                paths: keys
                    .iter()
                    .filter_map(|k| self.get(*k))
                    .map(|n| n.path.clone())
                    .collect(),
            })
            .collect();
        for (_, note) in self.notes() {
            if let (Some(used), false) = (note.id(), note.identity.ignored_ids.is_empty()) {
                diagnostics.push(Diagnostic::MultipleIds {
                    path: note.path.clone(),
                    used: used.to_string(),
                    ignored: note.identity.ignored_ids.clone(),
                });
            }
        }
        diagnostics
    }

    fn resolve_text(&self, text: &str) -> Resolution {
        let text = normalize_name(text);
        if text.is_empty() {
            return Resolution::Unresolved;
        }
        if let Some(keys) = self.by_id.get(&text) {
            return Resolution::from_candidates(keys, MatchKind::Id);
        }
        if let Some(keys) = self.by_name.get(&text) {
            return Resolution::from_candidates(keys, MatchKind::Name);
        }
        if !self.case_sensitive {
            if let Some(keys) = self.by_folded_name.get(&fold_case(&text)) {
                return Resolution::from_candidates(keys, MatchKind::Name);
            }
        }
        Resolution::Unresolved
    }

    /// Resolves a link token to the note it refers to.
    pub fn resolve(&self, token: &LinkToken) -> Resolution {
        match self.resolve_text(&token.raw) {
            Resolution::Unresolved if token.has_suffix() => self.resolve_text(token.target()),
            resolution => resolution,
        }
    }

    /// Ordering of notes inside a backlink section: by reference, then title, then path.
    pub fn sort_key(&self, key: NoteKey) -> (&str, &str, &std::path::Path) {
        match self.get(key) {
            Some(note) => (note.reference(), note.title().unwrap_or(""), note.path()),
            None => ("", "", std::path::Path::new("")),
        }
    }
}
