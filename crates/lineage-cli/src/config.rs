//! CLI configuration loaded from TOML.
//!
//! Resolution order for the file: `--config`, then
//! `$CONFIG_DIR/lineage/config.toml`. A missing file yields defaults; every
//! field has a serde default so partial files are fine.

use lineage::{Error, LayoutConfig, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Directory and file name under the platform config dir.
const CONFIG_DIR_NAME: &str = "lineage";
const CONFIG_FILE_NAME: &str = "config.toml";

/// Top-level configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LineageConfig {
    /// Directory holding the persisted JSON documents.
    pub data_dir: PathBuf,
    /// Project used when `--project` is not given.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_project: Option<String>,
    /// Default log filter when `RUST_LOG` is unset.
    pub log_level: String,
    /// Layout presets.
    pub layout: LayoutPresets,
}

/// Spacing presets for the two views.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutPresets {
    /// Main lineage view.
    pub detail: LayoutConfig,
    /// Overview minimap.
    pub miniature: LayoutConfig,
}

impl Default for LayoutPresets {
    fn default() -> Self {
        Self {
            detail: LayoutConfig::detail(),
            miniature: LayoutConfig::miniature(),
        }
    }
}

impl Default for LineageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            default_project: None,
            log_level: "warn".to_string(),
            layout: LayoutPresets::default(),
        }
    }
}

/// Config error for a file that is not valid TOML.
pub(crate) fn parse_failure(path: &Path, err: impl std::fmt::Display) -> Error {
    Error::config(format!("Failed to parse {}: {err}", path.display()))
}

fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .map(|d| d.join(CONFIG_DIR_NAME))
        .unwrap_or_else(|| PathBuf::from(".lineage"))
}

impl LineageConfig {
    /// `$CONFIG_DIR/lineage/config.toml`, if the platform has a config dir.
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    /// The explicit path if given, else the default one.
    pub fn resolve_config_path(explicit: Option<&str>) -> Option<PathBuf> {
        explicit.map(PathBuf::from).or_else(Self::default_config_path)
    }

    /// Loads the resolved config file, or defaults when it does not exist.
    pub fn load(explicit: Option<&str>) -> Result<Self> {
        match Self::resolve_config_path(explicit) {
            Some(path) if path.exists() => Self::from_file(&path),
            Some(path) => {
                log::debug!("no config at {}; using defaults", path.display());
                Ok(Self::default())
            }
            None => Ok(Self::default()),
        }
    }

    /// Parses a config file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::io_with_path(e, path))?;
        toml::from_str(&content).map_err(|e| parse_failure(path, e))
    }

    /// Serializes to pretty TOML.
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| Error::config(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = LineageConfig::default();
        assert_eq!(config.log_level, "warn");
        assert!(config.default_project.is_none());
        assert_eq!(config.layout.detail, LayoutConfig::detail());
        assert_eq!(config.layout.miniature, LayoutConfig::miniature());
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("absent.toml");
        let config = LineageConfig::load(Some(path.to_str().unwrap())).unwrap();
        assert_eq!(config, LineageConfig::default());
    }

    #[test]
    fn test_partial_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "default_project = \"bracket\"\n\n[layout.miniature]\nhorizontal_spacing = 25.0\n",
        )
        .unwrap();

        let config = LineageConfig::load(Some(path.to_str().unwrap())).unwrap();
        assert_eq!(config.default_project.as_deref(), Some("bracket"));
        assert_eq!(config.layout.miniature.horizontal_spacing, 25.0);
        // unspecified fields fall back to the detail defaults
        let detail = LayoutConfig::detail();
        assert_eq!(config.layout.miniature.vertical_spacing, detail.vertical_spacing);
        assert_eq!(config.layout.detail, LayoutConfig::detail());
    }

    #[test]
    fn test_invalid_file_is_config_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "log_level = [").unwrap();

        let err = LineageConfig::load(Some(path.to_str().unwrap())).unwrap_err();
        assert!(err.to_string().contains("Failed to parse"));
    }

    #[test]
    fn test_toml_round_trip() {
        let mut config = LineageConfig::default();
        config.default_project = Some("p".into());
        let text = config.to_toml_string().unwrap();
        let back: LineageConfig = toml::from_str(&text).unwrap();
        assert_eq!(back, config);
    }
}
