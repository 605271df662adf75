//! Optional settings file (`~/.config/credsync/config.yaml`).
//!
//! Every field is optional; command-line values override whatever is set
//! here, and a missing file means "all defaults".
//!
//! ```yaml
//! source: ~/Downloads/credentials
//! target: ~/.aws/credentials
//! map: ~/.config/credsync/accounts.properties
//! default_region: us-east-1
//! debounce_ms: 250
//! log_level: info
//! log_file: ~/.config/credsync/credsync.log
//! ```

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub source: Option<PathBuf>,
    pub target: Option<PathBuf>,
    pub map: Option<PathBuf>,
    pub default_region: Option<String>,
    pub debounce_ms: Option<u64>,
    pub log_level: Option<String>,
    pub log_file: Option<PathBuf>,
}

impl Settings {
    /// Load settings from `path`; a missing file yields the defaults.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings file {}", path.display()))?;
        if contents.trim().is_empty() {
            return Ok(Self::default());
        }
        let mut settings: Settings = serde_yaml_ng::from_str(&contents)
            .with_context(|| format!("Failed to parse settings file {}", path.display()))?;
        settings.expand_paths();
        Ok(settings)
    }

    /// Settings file path (XDG convention on all platforms): `~/.config/credsync/config.yaml`
    pub fn settings_path() -> PathBuf {
        if let Some(home_dir) = dirs::home_dir() {
            home_dir
                .join(".config")
                .join("credsync")
                .join("config.yaml")
        } else {
            PathBuf::from("config.yaml")
        }
    }

    fn expand_paths(&mut self) {
        for path in [
            &mut self.source,
            &mut self.target,
            &mut self.map,
            &mut self.log_file,
        ]
        .into_iter()
        .flatten()
        {
            *path = expand_home(path);
        }
    }
}

/// Replace a leading `~` with the home directory.
pub fn expand_home(path: &Path) -> PathBuf {
    match (path.strip_prefix("~"), dirs::home_dir()) {
        (Ok(rest), Some(home)) => home.join(rest),
        _ => path.to_path_buf(),
    }
}

/// Default target: `~/.aws/credentials`.
pub fn default_target() -> PathBuf {
    dirs::home_dir()
        .map(|home| home.join(".aws").join("credentials"))
        .unwrap_or_else(|| PathBuf::from("credentials"))
}
