//! User settings loaded from a JSON file.

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::crypto::{HashWidth, KeySize};
use crate::encoding::Encoding;

/// Defaults applied when a command-line flag is not given.
///
/// ```json
/// { "key_size": 256, "hash_bits": 512, "encoding": "hex", "log_level": "info" }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub key_size: KeySize,
    pub hash_bits: HashWidth,
    pub encoding: Encoding,
    pub log_level: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            key_size: KeySize::Aes256,
            hash_bits: HashWidth::Sha256,
            encoding: Encoding::Base64,
            log_level: "warn".to_string(),
        }
    }
}

impl Settings {
    /// Reads settings from `path`. A missing file gives the defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read, is not valid
    /// JSON, has unknown fields, or names an unsupported key size or hash
    /// width.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("failed to parse config {}", path.display()))
    }

    /// Like [`Settings::load`], but `None` (no config location could be
    /// determined) gives the defaults instead of failing.
    ///
    /// # Errors
    ///
    /// Same as [`Settings::load`] when a path is given.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => {
                warn!("no config location available, using default settings");
                Ok(Self::default())
            }
        }
    }
}

/// `config.json` in the platform config directory for `hashcrypt`.
///
/// # Errors
///
/// Returns an error if the platform directories cannot be resolved, for
/// example when no home directory is known.
pub fn default_config_path() -> Result<PathBuf> {
    let project_dirs = ProjectDirs::from("", "", "hashcrypt")
        .context("could not determine platform directories")?;

    Ok(project_dirs.config_dir().join("config.json"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempdir().unwrap();
        let settings = Settings::load(&dir.path().join("config.json")).unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn unknown_location_gives_defaults() {
        assert_eq!(Settings::load_or_default(None).unwrap(), Settings::default());
    }

    #[test]
    fn known_location_still_reports_parse_errors() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{ not json").unwrap();
        let err = Settings::load_or_default(Some(&path)).unwrap_err();
        assert!(err.to_string().contains("failed to parse config"));
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{ "key_size": 128, "encoding": "hex" }"#).unwrap();

        let settings = Settings::load(&path).unwrap();
        assert_eq!(settings.key_size, KeySize::Aes128);
        assert_eq!(settings.encoding, Encoding::Hex);
        assert_eq!(settings.hash_bits, HashWidth::Sha256);
        assert_eq!(settings.log_level, "warn");
    }

    #[test]
    fn unsupported_key_size_fails() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{ "key_size": 100 }"#).unwrap();
        assert!(Settings::load(&path).is_err());
    }

    #[test]
    fn unknown_field_fails() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{ "cipher": "des" }"#).unwrap();
        assert!(Settings::load(&path).is_err());
    }

    #[test]
    fn settings_roundtrip_through_json() {
        let settings = Settings {
            key_size: KeySize::Aes192,
            hash_bits: HashWidth::Sha512,
            encoding: Encoding::Hex,
            log_level: "debug".to_string(),
        };
        let json = serde_json::to_string(&settings).unwrap();
        assert!(json.contains("\"key_size\":192"));
        assert!(json.contains("\"hash_bits\":512"));
        let back: Settings = serde_json::from_str(&json).unwrap();
        assert_eq!(back, settings);
    }

    #[test]
    fn default_path_is_config_json() {
        if let Ok(path) = default_config_path() {
            assert_eq!(path.file_name().unwrap(), "config.json");
        }
    }
}
