//! User configuration for `sigil verify`.
//!
//! Resolution order:
//! 1. `--config <path>` if given (must exist)
//! 2. `sigil/config.toml` in the user config directory, if present
//! 3. Built-in defaults

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use color_eyre::eyre::{Result, WrapErr};
use serde::Deserialize;

/// Defaults applied to `verify` when flags are not given.
#[derive(Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub(crate) struct Config {
    /// Public key path or base64 SPKI.
    pub(crate) key: Option<String>,
    /// Whether to check payload claims.
    pub(crate) check_claims: Option<bool>,
    /// Annotations every trusted payload must assert.
    #[serde(default)]
    pub(crate) annotations: BTreeMap<String, String>,
}

impl Config {
    /// Load configuration, falling back to defaults when no file exists.
    pub(crate) fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }
        match default_path() {
            Some(path) if path.is_file() => Self::from_file(&path),
            _ => Ok(Self::default()),
        }
    }

    fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .wrap_err_with(|| format!("failed to read config {}", path.display()))?;
        let config = toml::from_str(&content)
            .wrap_err_with(|| format!("invalid config {}", path.display()))?;
        tracing::debug!(path = %path.display(), "loaded configuration");
        Ok(config)
    }
}

fn default_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("dev", "sigil", "sigil")
        .map(|dirs| dirs.config_dir().join("config.toml"))
}
