//! TOML configuration for the `firma` binary
//!
//! Every section is optional; a missing file section falls back to the same
//! defaults the library uses.

use anyhow::Context;
use firma_core::{ExportOptions, FontSourceConfig};
use firma_types::{FieldDefaults, UserProfile};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Directory used for sessions and the signature library when none is configured
pub const DEFAULT_STATE_DIR: &str = ".firma";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Font and date defaults for new fields
    pub defaults: FieldDefaults,
    /// Values used to pre-fill name, email and address fields
    pub profile: UserProfile,
    /// Where embedded fonts are downloaded from
    pub fonts: FontSourceConfig,
    /// Baseline corrections applied when text is flattened
    pub export: ExportOptions,
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub state_dir: Option<PathBuf>,
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or the TOML is malformed
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::from_str(&content)
    }

    /// Parse configuration from a TOML string
    pub fn from_str(s: &str) -> anyhow::Result<Self> {
        toml::from_str(s).context("Failed to parse TOML configuration")
    }

    /// Load `path` when given, defaults otherwise.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => Ok(Self::default()),
        }
    }

    /// State directory: the command-line override, then the file, then `.firma`.
    pub fn state_dir(&self, override_dir: Option<&Path>) -> PathBuf {
        override_dir
            .map(Path::to_path_buf)
            .or_else(|| self.storage.state_dir.clone())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_STATE_DIR))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = Config::from_str("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.defaults.font_family, "Inter");
        assert_eq!(config.export.offset_x, 4.0);
        assert_eq!(config.state_dir(None), PathBuf::from(".firma"));
    }

    #[test]
    fn test_full_config() {
        let toml = r#"
            [defaults]
            font_family = "Roboto"
            font_size = 14
            date_format = "YYYY-MM-DD"

            [profile]
            name = "Ada Lovelace"
            email = "ada@example.com"

            [fonts]
            pinned_family = "Roboto"
            timeout_secs = 5

            [export]
            offset_x = 0.0

            [storage]
            state_dir = "/var/lib/firma"
        "#;

        let config = Config::from_str(toml).unwrap();
        assert_eq!(config.defaults.font_family, "Roboto");
        assert_eq!(config.defaults.font_size, 14.0);
        assert_eq!(config.profile.name, "Ada Lovelace");
        assert_eq!(config.profile.initials, "");
        assert_eq!(config.fonts.timeout_secs, 5);
        assert_eq!(config.fonts.cdn_base_url, FontSourceConfig::default().cdn_base_url);
        assert_eq!(config.export.offset_x, 0.0);
        assert_eq!(config.export.offset_y, 2.0);
        assert_eq!(config.state_dir(None), PathBuf::from("/var/lib/firma"));
        assert_eq!(
            config.state_dir(Some(Path::new("elsewhere"))),
            PathBuf::from("elsewhere")
        );
    }

    #[test]
    fn test_malformed_config_is_an_error() {
        let err = Config::from_str("[defaults]\nfont_size = \"big\"").unwrap_err();
        assert!(err.to_string().contains("Failed to parse TOML configuration"));
    }
}
