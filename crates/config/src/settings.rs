// Application settings
// Loaded from ~/.config/cellgrid/settings.json

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Out-of-range write handling for new grids
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CapacitySetting {
    /// Reject writes outside the declared extent
    #[default]
    Strict,
    /// Grow the declared extent to fit
    Grow,
}

/// Default field delimiter for import/export
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DelimiterSetting {
    /// File extension, then content sniffing
    #[default]
    Auto,
    Comma,
    Tab,
    Semicolon,
    Pipe,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // Grid
    #[serde(rename = "grid.rows")]
    pub rows: usize,

    #[serde(rename = "grid.cols")]
    pub cols: usize,

    #[serde(rename = "grid.capacityPolicy")]
    pub capacity_policy: CapacitySetting,

    // Undo
    /// 0 = unbounded
    #[serde(rename = "history.maxEntries")]
    pub history_max_entries: usize,

    // Import/export
    #[serde(rename = "csv.delimiter")]
    pub delimiter: DelimiterSetting,

    #[serde(rename = "csv.legacyEncoding")]
    pub legacy_encoding: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            // Grid
            rows: 10_000,
            cols: 10_000,
            capacity_policy: CapacitySetting::Strict,
            // Undo
            history_max_entries: 0,
            // Import/export
            delimiter: DelimiterSetting::Auto,
            legacy_encoding: false,
        }
    }
}

const DEFAULT_CONFIG: &str = r#"{
    // Declared extent of a new, empty grid
    "grid.rows": 10000,
    "grid.cols": 10000,

    // Writes outside the extent: "strict" rejects them, "grow" enlarges the grid
    "grid.capacityPolicy": "strict",

    // Undo batches kept (0 = unbounded)
    "history.maxEntries": 0,

    // Import/export delimiter: "auto", "comma", "tab", "semicolon", "pipe"
    "csv.delimiter": "auto",

    // Read non-UTF-8 files as Windows-1252 instead of rejecting them
    "csv.legacyEncoding": false
}
"#;

impl Settings {
    /// Get the settings file path
    pub fn config_path() -> PathBuf {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("cellgrid");
        config_dir.join("settings.json")
    }

    /// Load settings from the default location, creating it on first run.
    /// Never fails: problems are logged and defaults are used.
    pub fn load() -> Self {
        let path = Self::config_path();

        if !path.exists() {
            Self::create_default_file(&path);
            return Self::default();
        }

        Self::load_from(&path).unwrap_or_else(|e| {
            log::warn!("{e}; using default settings");
            Self::default()
        })
    }

    /// Load settings from an explicit file.
    pub fn load_from(path: &Path) -> Result<Self, String> {
        let contents = fs::read_to_string(path)
            .map_err(|e| format!("Error reading {}: {}", path.display(), e))?;
        Self::parse(&contents).map_err(|e| format!("Error parsing {}: {}", path.display(), e))
    }

    /// Parse settings JSON. Lines starting with // are comments.
    pub fn parse(contents: &str) -> Result<Self, serde_json::Error> {
        let cleaned: String = contents
            .lines()
            .filter(|line| !line.trim().starts_with("//"))
            .collect::<Vec<_>>()
            .join("\n");
        serde_json::from_str(&cleaned)
    }

    /// Save current settings to disk
    pub fn save_to(&self, path: &Path) -> Result<(), String> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| e.to_string())?;
        }

        let json = serde_json::to_string_pretty(self)
            .map_err(|e| e.to_string())?;

        fs::write(path, json).map_err(|e| e.to_string())
    }

    /// Create default settings file with comments
    fn create_default_file(path: &Path) {
        if let Some(parent) = path.parent() {
            if let Err(e) = fs::create_dir_all(parent) {
                log::warn!("Error creating config directory: {}", e);
                return;
            }
        }

        if let Err(e) = fs::write(path, DEFAULT_CONFIG) {
            log::warn!("Error writing default settings.json: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_file_matches_defaults() {
        let parsed = Settings::parse(DEFAULT_CONFIG).unwrap();
        assert_eq!(parsed, Settings::default());
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let parsed = Settings::parse(r#"{ "grid.capacityPolicy": "grow", "csv.delimiter": "tab" }"#).unwrap();
        assert_eq!(parsed.capacity_policy, CapacitySetting::Grow);
        assert_eq!(parsed.delimiter, DelimiterSetting::Tab);
        assert_eq!(parsed.rows, 10_000);
        assert_eq!(parsed.history_max_entries, 0);
    }

    #[test]
    fn test_bad_value_is_an_error() {
        assert!(Settings::parse(r#"{ "grid.capacityPolicy": "sometimes" }"#).is_err());
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("settings.json");
        let settings = Settings {
            rows: 50,
            cols: 8,
            history_max_entries: 25,
            legacy_encoding: true,
            ..Settings::default()
        };

        settings.save_to(&path).unwrap();
        assert_eq!(Settings::load_from(&path).unwrap(), settings);
    }

    #[test]
    fn test_load_from_missing_file() {
        let dir = tempdir().unwrap();
        let err = Settings::load_from(&dir.path().join("absent.json")).unwrap_err();
        assert!(err.contains("Error reading"));
    }
}
