use crate::error::BacklinkError;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::{
    fs::read_to_string,
    io::Write,
    path::{Path, PathBuf},
};
use tempfile::NamedTempFile;

/// File name looked up in the notes root when no explicit configuration path is given.
pub const CONFIG_FILE_NAME: &str = ".backlinkz.toml";

/// Default id pattern: a 14 digit timestamp such as `20201020093536`.
pub const DEFAULT_ID_PATTERN: &str = r"\d{14}";

/// Default note file extension, without the leading dot.
pub const DEFAULT_EXTENSION: &str = "md";

/// Settings for one backlink run.
///
/// Every field has a default, so a configuration file only needs to name what it changes:
///
/// ```toml
/// extension = "txt"
/// case_sensitive = false
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BacklinkConfig {
    /// Extension of note files, with or without a leading dot.
    pub extension: String,
    /// Regular expression matching a note id.
    pub id_pattern: String,
    /// Whether `[[name]]` links must match titles and file names with exact case.
    pub case_sensitive: bool,
    /// List a note in its own backlink section when it links to itself.
    pub include_self_links: bool,
    /// Regenerate backlink sections even when their entries did not change.
    pub overwrite: bool,
    /// Descend into hidden (dot-prefixed) files and directories.
    pub include_hidden: bool,
}

impl Default for BacklinkConfig {
    fn default() -> Self {
        BacklinkConfig {
            extension: DEFAULT_EXTENSION.to_string(),
            id_pattern: DEFAULT_ID_PATTERN.to_string(),
            case_sensitive: true,
            include_self_links: false,
            overwrite: false,
            include_hidden: false,
        }
    }
}

impl BacklinkConfig {
    /// The configured extension without a leading dot.
    pub fn extension(&self) -> &str {
        self.extension.trim_start_matches('.')
    }

    /// Compiles the configured id pattern.
    pub fn id_regex(&self) -> Result<Regex, BacklinkError> {
        if self.id_pattern.trim().is_empty() {
            return Err(BacklinkError::Config("id_pattern may not be empty".to_string()));
        }
        let regex = Regex::new(&self.id_pattern)?;
        if regex.is_match("") {
            return Err(BacklinkError::Config(format!(
                "id_pattern '{}' matches the empty string",
                self.id_pattern
            )));
        }
        Ok(regex)
    }

    /// Checks every field that can be invalid without touching the file system.
    pub fn validate(&self) -> Result<(), BacklinkError> {
        if self.extension().is_empty() {
            return Err(BacklinkError::Config("extension may not be empty".to_string()));
        }
        self.id_regex()?;
        Ok(())
    }
}

pub trait ConfigProvider {
    fn get_config(&self) -> Result<BacklinkConfig, BacklinkError>;
    fn set_config(&self, config: &BacklinkConfig) -> Result<(), BacklinkError>;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TomlConfigProvider {
    path: PathBuf,
}

impl TomlConfigProvider {
    pub fn new(path: PathBuf) -> Self {
        TomlConfigProvider { path }
    }

    /// Provider for the conventional configuration file inside a notes directory.
    pub fn in_dir<P: AsRef<Path>>(root: P) -> Self {
        TomlConfigProvider::new(root.as_ref().join(CONFIG_FILE_NAME))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ConfigProvider for TomlConfigProvider {
    fn get_config(&self) -> Result<BacklinkConfig, BacklinkError> {
        tracing::debug!("Attempting to read config from: {:?}", &self.path);
        if !self.path.exists() {
            tracing::debug!("Config file not found, using defaults.");
            return Ok(BacklinkConfig::default());
        }
        let content = read_to_string(&self.path)?;
        let config: BacklinkConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    fn set_config(&self, config: &BacklinkConfig) -> Result<(), BacklinkError> {
        tracing::debug!("Attempting to write config to: {:?}", &self.path);
        config.validate()?;
        let toml_string = toml::to_string(config)?;
        set_content(&self.path, &toml_string)
    }
}

pub fn get_content<P: AsRef<Path>>(path: P) -> Result<String, BacklinkError> {
    tracing::debug!("Reading {:?}", path.as_ref());
    Ok(read_to_string(path)?)
}

/// Replaces the file at `path` with `text`.
///
/// The content is written to a temporary file in the same directory, which is then renamed over
/// the target, so readers never observe a partially written file. A symlink is resolved first,
/// so the file it points to is replaced and the link itself stays in place.
pub fn set_content<P: AsRef<Path>>(path: P, text: &str) -> Result<(), BacklinkError> {
    let path = match std::fs::canonicalize(path.as_ref()) {
        Ok(resolved) => resolved,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => path.as_ref().to_path_buf(),
        Err(err) => return Err(err.into()),
    };
    let path = path.as_path();
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let mut temp = NamedTempFile::new_in(&dir)?;
    temp.write_all(text.as_bytes())?;
    if let Ok(metadata) = std::fs::metadata(path) {
        // Keep the permissions of the file being replaced rather than the temp file's 0600.
        temp.as_file().set_permissions(metadata.permissions())?;
    }
    temp.as_file().sync_all()?;
    temp.persist(path)?;
    tracing::debug!("Wrote {:?}", path);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;
    use test_log::test;

    #[test]
    fn test_missing_config_file_yields_defaults() {
        let dir = tempdir().unwrap();
        let provider = TomlConfigProvider::in_dir(dir.path());
        assert_eq!(provider.get_config().unwrap(), BacklinkConfig::default());
    }

    #[test]
    fn test_partial_config_keeps_other_defaults() {
        let dir = tempdir().unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILE_NAME),
            "extension = \".txt\"\ncase_sensitive = false\n",
        )
        .unwrap();
        let config = TomlConfigProvider::in_dir(dir.path()).get_config().unwrap();
        assert_eq!(config.extension(), "txt");
        assert!(!config.case_sensitive);
        assert_eq!(config.id_pattern, DEFAULT_ID_PATTERN);
        assert!(!config.include_self_links);
    }

    #[test]
    fn test_config_round_trips_through_file() {
        let dir = tempdir().unwrap();
        let provider = TomlConfigProvider::in_dir(dir.path());
        let config = BacklinkConfig {
            include_self_links: true,
            overwrite: true,
            ..Default::default()
        };
        provider.set_config(&config).unwrap();
        assert_eq!(provider.get_config().unwrap(), config);
    }

    #[test]
    fn test_invalid_id_pattern_is_rejected() {
        let config = BacklinkConfig {
            id_pattern: "[0-9".to_string(),
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(BacklinkError::Config(_))));

        let config = BacklinkConfig {
            id_pattern: r"\d*".to_string(),
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(BacklinkError::Config(_))));
    }

    #[test]
    fn test_set_content_replaces_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("note.md");
        std::fs::write(&path, "old").unwrap();
        set_content(&path, "new").unwrap();
        assert_eq!(get_content(&path).unwrap(), "new");
        // Only the note itself remains; the temporary file was renamed away.
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_set_content_creates_missing_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("new.md");
        set_content(&path, "fresh").unwrap();
        assert_eq!(get_content(&path).unwrap(), "fresh");
    }

    #[cfg(unix)]
    #[test]
    fn test_set_content_writes_through_symlink() {
        let notes = tempdir().unwrap();
        let elsewhere = tempdir().unwrap();
        let target = elsewhere.path().join("real.md");
        let link = notes.path().join("note.md");
        std::fs::write(&target, "old").unwrap();
        std::os::unix::fs::symlink(&target, &link).unwrap();

        set_content(&link, "new").unwrap();
        assert!(std::fs::symlink_metadata(&link)
            .unwrap()
            .file_type()
            .is_symlink());
        assert_eq!(get_content(&target).unwrap(), "new");
        assert_eq!(get_content(&link).unwrap(), "new");
    }
}
