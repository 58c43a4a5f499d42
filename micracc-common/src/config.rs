//! Configuration loading for the MICR accuracy harness
//!
//! TOML file with CLI/env overrides applied by the binary. The TOML file
//! is optional; every key has a built-in default so a bare `micracc`
//! invocation with fixture files in the working directory just works.

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::info;

/// Harness configuration loaded from a TOML file
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlConfig {
    #[serde(default)]
    pub recognition: RecognitionConfig,

    #[serde(default)]
    pub batch: BatchConfig,

    #[serde(default)]
    pub paths: PathsConfig,
}

/// Recognition collaborator selection
#[derive(Debug, Clone, Deserialize)]
pub struct RecognitionConfig {
    /// Base URL of a remote recognition service. When set, requests are
    /// delegated over HTTP instead of served from fixtures.
    #[serde(default)]
    pub endpoint: Option<String>,

    /// JSON document of precomputed recognition outcomes (check id to
    /// per-engine results). Used when no endpoint is configured.
    #[serde(default)]
    pub fixtures: Option<PathBuf>,

    /// HTTP request timeout for the remote service
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

/// Batch range and scheduling
#[derive(Debug, Clone, Deserialize)]
pub struct BatchConfig {
    /// First check id in the run (inclusive)
    #[serde(default = "default_first_check")]
    pub first_check: u32,

    /// Last check id in the run (inclusive)
    #[serde(default = "default_last_check")]
    pub last_check: u32,

    /// Maximum recognition requests outstanding at once
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,

    /// Include matched check ids in the final report
    #[serde(default)]
    pub show_matches: bool,
}

/// Input document locations
#[derive(Debug, Clone, Deserialize)]
pub struct PathsConfig {
    /// Directory holding the check images
    #[serde(default = "default_images_dir")]
    pub images_dir: PathBuf,

    /// Image file extension (bytes are opaque to the harness)
    #[serde(default = "default_image_extension")]
    pub image_extension: String,

    /// Ground-truth JSON document (check id to raw MICR record)
    #[serde(default = "default_ground_truth")]
    pub ground_truth: PathBuf,

    /// Evaluation ledger JSON document; absent file means an empty ledger
    #[serde(default)]
    pub ledger: Option<PathBuf>,
}

fn default_timeout_seconds() -> u64 {
    30
}

fn default_first_check() -> u32 {
    1
}

fn default_last_check() -> u32 {
    100
}

fn default_max_concurrency() -> usize {
    4
}

fn default_images_dir() -> PathBuf {
    PathBuf::from("images")
}

fn default_image_extension() -> String {
    "png".to_string()
}

fn default_ground_truth() -> PathBuf {
    PathBuf::from("ground-truth.json")
}

impl Default for RecognitionConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            fixtures: None,
            timeout_seconds: default_timeout_seconds(),
        }
    }
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            first_check: default_first_check(),
            last_check: default_last_check(),
            max_concurrency: default_max_concurrency(),
            show_matches: false,
        }
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            images_dir: default_images_dir(),
            image_extension: default_image_extension(),
            ground_truth: default_ground_truth(),
            ledger: None,
        }
    }
}

impl TomlConfig {
    /// Load configuration from a TOML file.
    ///
    /// A missing file yields the built-in defaults; an unreadable or
    /// unparseable file is a configuration error (fatal at startup).
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            info!("No config file at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Failed to read config file {}: {}", path.display(), e))
        })?;

        let config: TomlConfig = toml::from_str(&contents)
            .map_err(|e| Error::Config(format!("Failed to parse TOML: {}", e)))?;

        info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Validate cross-field constraints before the run starts
    pub fn validate(&self) -> Result<()> {
        if self.batch.max_concurrency == 0 {
            return Err(Error::Config(
                "batch.max_concurrency must be at least 1".to_string(),
            ));
        }
        if self.batch.first_check > self.batch.last_check {
            return Err(Error::Config(format!(
                "batch range is empty: first_check {} > last_check {}",
                self.batch.first_check, self.batch.last_check
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn missing_file_yields_defaults() {
        let config = TomlConfig::load(Path::new("/nonexistent/micracc.toml")).unwrap();
        assert_eq!(config.batch.max_concurrency, 4);
        assert_eq!(config.batch.first_check, 1);
        assert!(!config.batch.show_matches);
        assert_eq!(config.recognition.timeout_seconds, 30);
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            "[batch]\nfirst_check = 500\nlast_check = 599\n\n[recognition]\nendpoint = \"http://127.0.0.1:5731\"\n"
        )
        .unwrap();

        let config = TomlConfig::load(file.path()).unwrap();
        assert_eq!(config.batch.first_check, 500);
        assert_eq!(config.batch.last_check, 599);
        assert_eq!(config.batch.max_concurrency, 4);
        assert_eq!(
            config.recognition.endpoint.as_deref(),
            Some("http://127.0.0.1:5731")
        );
    }

    #[test]
    fn unparseable_file_is_config_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "[batch\nfirst_check = ").unwrap();

        let err = TomlConfig::load(file.path()).unwrap_err();
        assert!(matches!(err, Error::Config(_)), "got {:?}", err);
    }

    #[test]
    fn zero_concurrency_fails_validation() {
        let mut config = TomlConfig::default();
        config.batch.max_concurrency = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn inverted_range_fails_validation() {
        let mut config = TomlConfig::default();
        config.batch.first_check = 10;
        config.batch.last_check = 5;
        assert!(config.validate().is_err());
    }
}
