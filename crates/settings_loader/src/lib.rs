//! # Settings Loader
//!
//! Loads the extractor configuration (`ExtractorSettings`) from JSON files.
//! Every field of the file is optional and falls back to the engine defaults,
//! so an empty object `{}` is a valid settings file.
//!
//! ## Features
//!
//! - Load settings from specified file paths
//! - Load settings from the default location (`extractor_settings.json`)
//! - Handle optional settings gracefully
//! - Fall back to the default file, then to built-in defaults
//!
//! ## Usage Examples
//!
//! ```rust,no_run
//! use std::path::PathBuf;
//!
//! // Load settings from a specific path
//! let settings = settings_loader::load_settings("config/extractor_settings.json")?;
//!
//! // Load from default location
//! let settings = settings_loader::load_default_settings()?;
//!
//! // Load optional settings (returns None if no path is given)
//! let path = Some(PathBuf::from("extractor_settings.json"));
//! let settings = settings_loader::load_optional_settings(path.as_ref())?;
//! # Ok::<(), anyhow::Error>(())
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use models::ExtractorSettings;

pub const DEFAULT_SETTINGS_FILE: &str = "extractor_settings.json";

/// Loads extractor settings from a JSON file. Missing fields take their defaults.
pub fn load_settings<P: AsRef<Path>>(path: P) -> Result<ExtractorSettings> {
    let path = path.as_ref();
    let bytes =
        fs::read(path).with_context(|| format!("Cannot read extractor settings {}", path.display()))?;
    let settings = serde_json::from_slice::<ExtractorSettings>(&bytes)
        .with_context(|| format!("Invalid extractor settings JSON in {}", path.display()))?;
    tracing::debug!(path = %path.display(), "Loaded extractor settings");
    Ok(settings)
}

/// Loads settings from the default location in the current directory
pub fn load_default_settings() -> Result<ExtractorSettings> {
    load_settings(DEFAULT_SETTINGS_FILE)
}

/// Loads settings from an optional path, returning None if no path is provided
pub fn load_optional_settings(path: Option<&PathBuf>) -> Result<Option<ExtractorSettings>> {
    path.map(load_settings).transpose()
}

/// Tries the provided path, then the default location. Returns None only if no
/// settings file could be loaded anywhere.
pub fn load_settings_with_fallback(path: Option<&PathBuf>) -> Result<Option<ExtractorSettings>> {
    if let Some(settings_path) = path {
        match load_settings(settings_path) {
            Ok(settings) => return Ok(Some(settings)),
            Err(e) => {
                tracing::warn!(path = %settings_path.display(), error = %format!("{:#}", e), "Falling back to default settings file");
            }
        }
    }

    if !default_settings_exist() {
        return Ok(None);
    }
    match load_default_settings() {
        Ok(settings) => Ok(Some(settings)),
        Err(e) => {
            tracing::warn!(error = %format!("{:#}", e), "Ignoring unreadable default settings file");
            Ok(None)
        }
    }
}

/// Whether `path` names a regular file; directories do not count.
pub fn settings_file_exists<P: AsRef<Path>>(path: P) -> bool {
    path.as_ref().is_file()
}

/// Checks if the default settings file exists
pub fn default_settings_exist() -> bool {
    settings_file_exists(DEFAULT_SETTINGS_FILE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use models::TableEnd;
    use serde_json::json;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn settings_file(value: serde_json::Value) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}", value).unwrap();
        file
    }

    #[test]
    fn test_load_settings() {
        let file = settings_file(json!({
            "data_row_offset": 3,
            "footer_mode": "inclusive",
            "log_filter": "debug"
        }));
        let settings = load_settings(file.path()).unwrap();
        assert_eq!(settings.data_row_offset, 3);
        assert_eq!(settings.log_filter, "debug");
        assert_eq!(settings.anchor_match, ExtractorSettings::default().anchor_match);
    }

    #[test]
    fn test_empty_object_is_default() {
        let file = settings_file(json!({}));
        assert_eq!(load_settings(file.path()).unwrap(), ExtractorSettings::default());
    }

    #[test]
    fn test_malformed_settings_mention_path() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{{ not json").unwrap();
        let err = load_settings(file.path()).unwrap_err();
        assert!(format!("{:#}", err).contains(&file.path().display().to_string()));
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_settings(dir.path().join("missing.json")).is_err());
    }

    #[test]
    fn test_settings_file_exists_rejects_directories() {
        let dir = tempfile::tempdir().unwrap();
        assert!(!settings_file_exists(dir.path()));
        let file = settings_file(json!({}));
        assert!(settings_file_exists(file.path()));
    }

    #[test]
    fn test_optional_settings() {
        assert!(load_optional_settings(None).unwrap().is_none());

        let file = settings_file(json!({ "table_end": "first_blank_row" }));
        let path = file.path().to_path_buf();
        let settings = load_optional_settings(Some(&path)).unwrap().unwrap();
        assert_eq!(settings.table_end, TableEnd::FirstBlankRow);
    }

    #[test]
    fn test_provided_path_wins_over_fallback() {
        let file = settings_file(json!({ "data_row_offset": 4 }));
        let path = file.path().to_path_buf();
        let settings = load_settings_with_fallback(Some(&path)).unwrap().unwrap();
        assert_eq!(settings.data_row_offset, 4);
    }
}
