//! A note as read from disk: its path, identity, text and outgoing links.

use crate::codec::{
    identity::{IdentityResolver, NoteIdentity},
    links::{LinkScanner, LinkToken},
    section::{user_content, BacklinkEntry},
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    pub path: PathBuf,
    pub identity: NoteIdentity,
    /// Full text as read, generated section included.
    pub content: String,
    /// Outgoing links of the user content, in order, duplicates included.
    pub links: Vec<LinkToken>,
}

impl Note {
    /// Builds a note from its stored text. Links inside the generated section are not outgoing
    /// links of the note.
    pub fn parse(path: impl Into<PathBuf>, content: String, resolver: &IdentityResolver) -> Self {
        let path = path.into();
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        let identity = resolver.resolve(&file_name, &content);
        let links = LinkScanner::new(user_content(&content)).collect();
        Note {
            path,
            identity,
            content,
            links,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn id(&self) -> Option<&str> {
        self.identity.id.as_deref()
    }

    pub fn title(&self) -> Option<&str> {
        self.identity.display_title()
    }

    pub fn reference(&self) -> &str {
        self.identity.reference()
    }

    /// The bullet other notes list when this note links to them.
    pub fn backlink_entry(&self) -> BacklinkEntry {
        BacklinkEntry::new(self.reference(), self.title())
    }
}
