use std::{fmt, io};

use regex::Error as RegexError;
use serde::{Deserialize, Serialize};
use serde_json::Error as JsonError;
use tempfile::PersistError;
use thiserror::Error;
use walkdir::Error as WalkDirError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
pub enum BacklinkError {
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Custom error: {0}")]
    Custom(String),
    #[error("Invalid date: {0}")]
    InvalidDate(String),
    #[error("File System error: {0}")]
    Io(String),
    #[error("Item Not Found: {0}")]
    NotFound(String),
    #[error("You do not have permission to access this resource")]
    PermissionDenied,
    #[error("(De)Serialization error: {0}")]
    Serialization(String),
}

impl BacklinkError {
    /// Process exit code used by the command line tool for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            BacklinkError::Config(_) => 2,
            BacklinkError::InvalidDate(_) => 2,
            BacklinkError::NotFound(_) => 1,
            BacklinkError::PermissionDenied => 1,
            BacklinkError::Io(_) => 1,
            BacklinkError::Custom(_) => 1,
            BacklinkError::Serialization(_) => 1,
        }
    }
}

impl From<toml::de::Error> for BacklinkError {
    fn from(src: toml::de::Error) -> BacklinkError {
        BacklinkError::Config(format!("Toml deserialization error: {src}"))
    }
}

impl From<toml::ser::Error> for BacklinkError {
    fn from(src: toml::ser::Error) -> BacklinkError {
        BacklinkError::Serialization(format!("Toml serialization error: {src}"))
    }
}

impl From<JsonError> for BacklinkError {
    fn from(src: JsonError) -> BacklinkError {
        BacklinkError::Serialization(format!("JSON (de)serialization error: {src}"))
    }
}

impl From<io::Error> for BacklinkError {
    fn from(x: io::Error) -> Self {
        match x.kind() {
            io::ErrorKind::NotFound => BacklinkError::NotFound(format!("{x}")),
            io::ErrorKind::PermissionDenied => BacklinkError::PermissionDenied,
            io::ErrorKind::InvalidData => BacklinkError::Io(format!("Invalid UTF-8 content: {x}")),
            _ => BacklinkError::Io(format!("IOError: {}: {x}", x.kind())),
        }
    }
}

impl From<fmt::Error> for BacklinkError {
    fn from(x: fmt::Error) -> Self {
        BacklinkError::Custom(format!("{x}"))
    }
}

impl From<RegexError> for BacklinkError {
    fn from(x: RegexError) -> Self {
        BacklinkError::Config(format!("Regex parse failed: {x}"))
    }
}

impl From<WalkDirError> for BacklinkError {
    fn from(x: WalkDirError) -> Self {
        let path = x.path().map(|p| p.display().to_string()).unwrap_or_default();
        match x.into_io_error() {
            Some(io_error) => match io_error.kind() {
                io::ErrorKind::NotFound => BacklinkError::NotFound(format!("{path}: {io_error}")),
                io::ErrorKind::PermissionDenied => BacklinkError::PermissionDenied,
                _ => BacklinkError::Io(format!(
                    "Directory traversal failed at {path}: {io_error}"
                )),
            },
            None => BacklinkError::Io(format!(
                "Directory traversal failed at {path}: loop detected"
            )),
        }
    }
}

impl From<getrandom::Error> for BacklinkError {
    fn from(x: getrandom::Error) -> Self {
        BacklinkError::Custom(format!("No randomness available: {x}"))
    }
}

impl From<PersistError> for BacklinkError {
    fn from(x: PersistError) -> Self {
        BacklinkError::Io(format!(
            "Could not move temporary file into place at {}: {}",
            x.file.path().display(),
            x.error
        ))
    }
}
