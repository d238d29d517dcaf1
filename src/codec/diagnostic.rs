//! Diagnostic types for a backlink run.
//!
//! Diagnostics are findings that do not stop the run: links that point nowhere or to more than
//! one note, ids shared between notes, and files that could not be read or written. They are
//! collected into the [`RunReport`](crate::codec::compiler::RunReport) and logged as they occur.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Severity {
    Info,
    Warning,
}

/// Non-fatal information produced while building the link graph or rewriting notes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum Diagnostic {
    /// A link whose target matches no note. Expected for notes not written yet.
    UnresolvedLink { source: PathBuf, token: String },

    /// A link matching several notes equally well. The link is dropped.
    AmbiguousLink {
        source: PathBuf,
        token: String,
        candidates: Vec<PathBuf>,
    },

    /// Several notes carry the same id. Links to that id are ambiguous.
    DuplicateId { id: String, paths: Vec<PathBuf> },

    /// A note mentions more than one id; the first one is its id.
    MultipleIds {
        path: PathBuf,
        used: String,
        ignored: Vec<String>,
    },

    /// A note file that could not be read or written. The file is skipped.
    FileError { path: PathBuf, message: String },
}

impl Diagnostic {
    pub fn file_error(path: impl Into<PathBuf>, message: impl ToString) -> Self {
        Self::FileError {
            path: path.into(),
            message: message.to_string(),
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            Self::UnresolvedLink { .. } | Self::MultipleIds { .. } => Severity::Info,
            Self::AmbiguousLink { .. } | Self::DuplicateId { .. } | Self::FileError { .. } => {
                Severity::Warning
            }
        }
    }

    pub fn is_warning(&self) -> bool {
        self.severity() == Severity::Warning
    }

    pub fn is_file_error(&self) -> bool {
        matches!(self, Self::FileError { .. })
    }

    /// Emits this diagnostic through `tracing` at its severity.
    pub fn log(&self) {
        match self.severity() {
            Severity::Warning => tracing::warn!("{self}"),
            Severity::Info => tracing::debug!("{self}"),
        }
    }
}

fn join_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<String>>()
        .join(", ")
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnresolvedLink { source, token } => {
                write!(f, "Unresolved link [[{token}]] in {}", source.display())
            }
            Self::AmbiguousLink {
                source,
                token,
                candidates,
            } => write!(
                f,
                "Ambiguous link [[{token}]] in {} matches {}",
                source.display(),
                join_paths(candidates)
            ),
            Self::DuplicateId { id, paths } => {
                write!(f, "Duplicate id {id} in {}", join_paths(paths))
            }
            Self::MultipleIds {
                path,
                used,
                ignored,
            } => write!(
                f,
                "Several ids in {}: using {used}, ignoring {}",
                path.display(),
                ignored.join(", ")
            ),
            Self::FileError { path, message } => {
                write!(f, "Skipped {}: {message}", path.display())
            }
        }
    }
}
