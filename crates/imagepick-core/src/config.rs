//! Picker configuration.
//!
//! Every field has a default, so an empty TOML document is a valid config:
//!
//! ```toml
//! execution = "background"
//! chooser_title = "Select source"
//!
//! [normalize]
//! jpeg_quality = 80
//! write_mode = "store_then_compress"
//!
//! [normalize.bound]
//! max_width = 612
//! max_height = 816
//!
//! [normalize.budget]
//! pixel_factor = 2
//! max_alloc = 268435456
//!
//! [storage]
//! capture_dir = "/data/app/images"
//! stored_dir = "/data/app/Files"
//! compressed_dir = "/data/app/Pictures"
//! ```

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::normalize::NormalizeConfig;
use crate::storage::StorageLayout;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),

    #[error("failed to start normalize worker: {0}")]
    Worker(#[source] io::Error),
}

/// Where normalization runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Execution {
    /// On the calling thread, before the activity result returns.
    Inline,
    /// On a dedicated worker; results surface via `dispatch_completions`.
    #[default]
    Background,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PickerConfig {
    pub normalize: NormalizeConfig,
    pub storage: StorageLayout,
    pub execution: Execution,
    /// Title shown on the source chooser.
    pub chooser_title: String,
}

impl Default for PickerConfig {
    fn default() -> Self {
        Self {
            normalize: NormalizeConfig::default(),
            storage: StorageLayout::default(),
            execution: Execution::default(),
            chooser_title: "Select source".to_string(),
        }
    }
}

impl PickerConfig {
    /// Defaults with every transient directory placed below `base`.
    pub fn with_storage_root(base: &Path) -> Self {
        Self {
            storage: StorageLayout::under(base),
            ..Self::default()
        }
    }

    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let source = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&source)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let bound = self.normalize.bound;
        if bound.max_width == 0 || bound.max_height == 0 {
            return Err(ConfigError::Invalid(format!(
                "bound box must be non-empty, got {}x{}",
                bound.max_width, bound.max_height
            )));
        }

        let quality = self.normalize.jpeg_quality;
        if !(1..=100).contains(&quality) {
            return Err(ConfigError::Invalid(format!(
                "jpeg_quality must be in 1..=100, got {}",
                quality
            )));
        }

        if self.normalize.budget.pixel_factor == 0 {
            return Err(ConfigError::Invalid(
                "budget.pixel_factor must be at least 1".to_string(),
            ));
        }

        if !self.storage.is_disjoint() {
            return Err(ConfigError::Invalid(
                "capture, stored and compressed directories must differ".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::WriteMode;
    use tempfile::TempDir;

    #[test]
    fn test_default_is_valid() {
        let config = PickerConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.normalize.bound.max_width, 612);
        assert_eq!(config.normalize.bound.max_height, 816);
        assert_eq!(config.normalize.jpeg_quality, 80);
        assert_eq!(config.normalize.budget.pixel_factor, 2);
        assert_eq!(config.normalize.write_mode, WriteMode::StoreThenCompress);
        assert_eq!(config.execution, Execution::Background);
    }

    #[test]
    fn test_empty_toml_gives_defaults() {
        let config = PickerConfig::from_toml_str("").unwrap();
        assert_eq!(config, PickerConfig::default());
    }

    #[test]
    fn test_partial_toml_overrides() {
        let config = PickerConfig::from_toml_str(
            r#"
            execution = "inline"

            [normalize]
            jpeg_quality = 70
            write_mode = "single_stage"

            [normalize.bound]
            max_width = 1024
            "#,
        )
        .unwrap();

        assert_eq!(config.execution, Execution::Inline);
        assert_eq!(config.normalize.jpeg_quality, 70);
        assert_eq!(config.normalize.write_mode, WriteMode::SingleStage);
        assert_eq!(config.normalize.bound.max_width, 1024);
        assert_eq!(config.normalize.bound.max_height, 816);
    }

    #[test]
    fn test_rejects_zero_quality() {
        let err = PickerConfig::from_toml_str("[normalize]\njpeg_quality = 0").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_rejects_empty_bound() {
        let err = PickerConfig::from_toml_str("[normalize.bound]\nmax_height = 0").unwrap_err();
        assert!(err.to_string().contains("bound box"));
    }

    #[test]
    fn test_rejects_zero_pixel_factor() {
        let err =
            PickerConfig::from_toml_str("[normalize.budget]\npixel_factor = 0").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_rejects_shared_directories() {
        let err = PickerConfig::from_toml_str(
            r#"
            [storage]
            capture_dir = "/tmp/a"
            stored_dir = "/tmp/b"
            compressed_dir = "/tmp/b"
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_rejects_unknown_write_mode() {
        let err = PickerConfig::from_toml_str("[normalize]\nwrite_mode = \"twice\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_from_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("picker.toml");
        fs::write(&path, "chooser_title = \"Pick one\"").unwrap();

        let config = PickerConfig::from_file(&path).unwrap();
        assert_eq!(config.chooser_title, "Pick one");

        let missing = PickerConfig::from_file(&tmp.path().join("absent.toml")).unwrap_err();
        assert!(matches!(missing, ConfigError::Io { .. }));
    }

    #[test]
    fn test_with_storage_root() {
        let tmp = TempDir::new().unwrap();
        let config = PickerConfig::with_storage_root(tmp.path());
        assert_eq!(config.storage.compressed_dir, tmp.path().join("Pictures"));
        assert!(config.validate().is_ok());
    }
}
