//! Configuration
//!
//! Settings come from a TOML file and are then overridden by command-line
//! flags. Every section and field is optional.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::annotation::Tool;

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub dataset: DatasetConfig,

    #[serde(default)]
    pub image: ImageConfig,

    #[serde(default)]
    pub window: WindowConfig,

    #[serde(default)]
    pub annotation: AnnotationConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Where the table comes from and how it is grouped
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct DatasetConfig {
    /// CSV, JSON or Parquet file; the bundled solar dataset when unset.
    #[serde(default)]
    pub path: Option<PathBuf>,

    #[serde(default = "default_grouping_field")]
    pub grouping_field: String,
}

fn default_grouping_field() -> String {
    "State".to_string()
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            path: None,
            grouping_field: default_grouping_field(),
        }
    }
}

/// Image shown in the annotation viewer; a generated sample when unset.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct ImageConfig {
    #[serde(default)]
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct WindowConfig {
    #[serde(default = "default_width")]
    pub width: f32,

    #[serde(default = "default_height")]
    pub height: f32,
}

fn default_width() -> f32 {
    1200.0
}

fn default_height() -> f32 {
    900.0
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct AnnotationConfig {
    #[serde(default)]
    pub default_tool: Tool,

    #[serde(default = "default_stroke_width")]
    pub stroke_width: f32,

    /// Erase hit distance in image pixels.
    #[serde(default = "default_erase_tolerance")]
    pub erase_tolerance: f32,
}

fn default_stroke_width() -> f32 {
    2.0
}

fn default_erase_tolerance() -> f32 {
    4.0
}

impl Default for AnnotationConfig {
    fn default() -> Self {
        Self {
            default_tool: Tool::default(),
            stroke_width: default_stroke_width(),
            erase_tolerance: default_erase_tolerance(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct LoggingConfig {
    /// `env_logger` filter used when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// Command-line overrides, applied on top of the file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub dataset: Option<PathBuf>,
    pub image: Option<PathBuf>,
    pub grouping_field: Option<String>,
    pub log_level: Option<String>,
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        Self::parse(&content).map_err(|error| ConfigError::Parse {
            path: path.to_path_buf(),
            error,
        })
    }

    /// Parse TOML text.
    pub fn parse(content: &str) -> Result<Self, String> {
        toml::from_str(content).map_err(|e| e.to_string())
    }

    /// Per-user config file location.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("solar-board").join("config.toml"))
    }

    /// Resolve the config to use: an explicit path must load, the per-user
    /// file is used only if it exists, otherwise defaults. Returns the file
    /// that was read, if any.
    pub fn resolve(explicit: Option<&Path>) -> Result<(Self, Option<PathBuf>), ConfigError> {
        if let Some(path) = explicit {
            return Ok((Self::load(path)?, Some(path.to_path_buf())));
        }
        match Self::default_path() {
            Some(path) if path.exists() => Ok((Self::load(&path)?, Some(path))),
            _ => Ok((Self::default(), None)),
        }
    }

    pub fn apply_overrides(&mut self, overrides: Overrides) {
        if let Some(path) = overrides.dataset {
            self.dataset.path = Some(path);
        }
        if let Some(path) = overrides.image {
            self.image.path = Some(path);
        }
        if let Some(field) = overrides.grouping_field {
            self.dataset.grouping_field = field;
        }
        if let Some(level) = overrides.log_level {
            self.logging.level = level;
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {error}")]
    Io { path: PathBuf, error: String },

    #[error("Failed to parse config file {path:?}: {error}")]
    Parse { path: PathBuf, error: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let config = Config::parse("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.dataset.grouping_field, "State");
        assert_eq!(config.annotation.default_tool, Tool::Rect);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn partial_sections_keep_remaining_defaults() {
        let config = Config::parse(
            r#"
            [dataset]
            path = "data/solar.csv"

            [annotation]
            default_tool = "closed_path"
            "#,
        )
        .unwrap();
        assert_eq!(config.dataset.path, Some(PathBuf::from("data/solar.csv")));
        assert_eq!(config.dataset.grouping_field, "State");
        assert_eq!(config.annotation.default_tool, Tool::ClosedPath);
        assert_eq!(config.annotation.stroke_width, 2.0);
        assert_eq!(config.window.width, 1200.0);
    }

    #[test]
    fn unknown_tool_is_a_parse_error() {
        assert!(Config::parse("[annotation]\ndefault_tool = \"lasso\"").is_err());
    }

    #[test]
    fn overrides_win_over_file_values() {
        let mut config = Config::parse("[dataset]\ngrouping_field = \"Region\"").unwrap();
        config.apply_overrides(Overrides {
            grouping_field: Some("State".to_string()),
            image: Some(PathBuf::from("cat.jpg")),
            ..Default::default()
        });
        assert_eq!(config.dataset.grouping_field, "State");
        assert_eq!(config.image.path, Some(PathBuf::from("cat.jpg")));
        assert_eq!(config.dataset.path, None);
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let err = Config::resolve(Some(Path::new("no/such/config.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
