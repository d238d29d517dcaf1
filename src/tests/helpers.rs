//! Shared test utilities for note and link graph testing

use crate::{
    codec::{identity::IdentityResolver, links::LinkToken},
    linkbase::NoteIndex,
    note::Note,
};
use std::path::Path;

/// Initialize logging for tests
pub fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init()
        .ok();
}

/// Builds an index from `(file name, content)` pairs, parsed with the default id pattern.
pub fn index_of(files: &[(&str, &str)], case_sensitive: bool) -> NoteIndex {
    init_logging();
    let resolver = IdentityResolver::default();
    let notes = files
        .iter()
        .map(|(name, content)| Note::parse(*name, content.to_string(), &resolver))
        .collect();
    NoteIndex::new(notes, case_sensitive)
}

/// A link token as the scanner would produce it, without a meaningful span.
pub fn token(raw: &str) -> LinkToken {
    LinkToken {
        raw: raw.to_string(),
        span: 0..0,
    }
}

/// Writes `(relative path, content)` pairs below `root`, creating directories as needed.
pub fn write_corpus(root: &Path, files: &[(&str, &str)]) {
    for (name, content) in files {
        let path = root.join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(path, content).unwrap();
    }
}
