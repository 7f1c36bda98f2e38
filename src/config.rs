//! Editor configuration
//!
//! Loaded from a TOML file. Every field has a default, so a partial file
//! (or no file at all) is fine; a malformed file is an error.

use crate::error::{EditorError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Editor session configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditorConfig {
    /// Spaces per nesting level
    #[serde(default = "default_indent_width")]
    pub indent_width: usize,

    /// Maximum number of undo snapshots kept
    #[serde(default = "default_max_undo_depth")]
    pub max_undo_depth: usize,

    /// Commit an exactly matching autocomplete token when the cursor leaves it
    #[serde(default = "default_true")]
    pub commit_autocomplete_on_navigation: bool,

    /// Offer the suggestion menu while typing
    #[serde(default = "default_true")]
    pub show_suggestion_menu: bool,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            indent_width: default_indent_width(),
            max_undo_depth: default_max_undo_depth(),
            commit_autocomplete_on_navigation: true,
            show_suggestion_menu: true,
        }
    }
}

fn default_indent_width() -> usize {
    4
}

fn default_max_undo_depth() -> usize {
    100
}

fn default_true() -> bool {
    true
}

impl EditorConfig {
    /// Load configuration from file
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::info!("Config file not found, using defaults: {:?}", path);
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| {
            EditorError::Io(std::io::Error::new(
                e.kind(),
                format!("Failed to read config file: {}", e),
            ))
        })?;

        let config: EditorConfig = toml::from_str(&content)
            .map_err(|e| EditorError::Config(format!("Failed to parse config file: {}", e)))?;
        config.validate()?;

        tracing::info!("Loaded configuration from {:?}", path);
        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| EditorError::Config(format!("Failed to serialize config: {}", e)))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                EditorError::Io(std::io::Error::new(
                    e.kind(),
                    format!("Failed to create config directory: {}", e),
                ))
            })?;
        }

        std::fs::write(path, content).map_err(|e| {
            EditorError::Io(std::io::Error::new(
                e.kind(),
                format!("Failed to write config file: {}", e),
            ))
        })?;

        tracing::info!("Saved configuration to {:?}", path);
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if self.indent_width == 0 {
            return Err(EditorError::Config("indent_width must be at least 1".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = TempDir::new().unwrap();
        let config = EditorConfig::load(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config, EditorConfig::default());
        assert_eq!(config.indent_width, 4);
        assert_eq!(config.max_undo_depth, 100);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("arbor.toml");
        std::fs::write(&path, "indent_width = 2\nshow_suggestion_menu = false\n").unwrap();

        let config = EditorConfig::load(&path).unwrap();
        assert_eq!(config.indent_width, 2);
        assert!(!config.show_suggestion_menu);
        assert!(config.commit_autocomplete_on_navigation);
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("arbor.toml");
        std::fs::write(&path, "indent_width = \"wide\"").unwrap();
        assert!(matches!(EditorConfig::load(&path), Err(EditorError::Config(_))));

        std::fs::write(&path, "indent_width = 0").unwrap();
        assert!(EditorConfig::load(&path).is_err());
    }

    #[test]
    fn test_save_then_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("arbor.toml");
        let config = EditorConfig {
            max_undo_depth: 7,
            ..EditorConfig::default()
        };
        config.save(&path).unwrap();
        assert_eq!(EditorConfig::load(&path).unwrap(), config);
    }
}
