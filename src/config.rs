use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::loader::LoaderType;

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub installer: InstallerPrefs,
    #[serde(default)]
    pub network: NetworkConfig,
}

/// Defaults applied to every new install session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstallerPrefs {
    /// Loader selected when none is given
    #[serde(default)]
    pub loader: LoaderType,
    /// Offer snapshot game versions
    #[serde(default)]
    pub show_snapshots: bool,
    /// Offer beta loader versions
    #[serde(default)]
    pub show_loader_betas: bool,
    /// Create or update a launcher profile after installing
    #[serde(default = "default_true")]
    pub generate_profile: bool,
    /// Launcher directory (platform default if unset)
    #[serde(default)]
    pub install_dir: Option<String>,
    /// Opt-out flags passed to loaders that support them
    #[serde(default)]
    pub opt_out: BTreeMap<String, bool>,
}

impl Default for InstallerPrefs {
    fn default() -> Self {
        Self {
            loader: LoaderType::default(),
            show_snapshots: false,
            show_loader_betas: false,
            generate_profile: true,
            install_dir: None,
            opt_out: BTreeMap::new(),
        }
    }
}

fn default_true() -> bool {
    true
}

/// Network settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// Per-request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout(),
        }
    }
}

fn default_timeout() -> u64 {
    30
}

impl NetworkConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }
}

impl Config {
    /// Get the configuration file path
    pub fn config_path() -> Result<PathBuf> {
        let dirs = directories::ProjectDirs::from("org", "loadstone", "Loadstone")
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;

        let config_dir = dirs.config_dir();
        std::fs::create_dir_all(config_dir)?;

        Ok(config_dir.join("config.toml"))
    }

    /// Load configuration from file
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Config = toml::from_str(&content)?;
            tracing::info!("Loaded configuration from {:?}", path);
            Ok(config)
        } else {
            tracing::info!("No configuration file found, using defaults");
            Ok(Self::default())
        }
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        tracing::info!("Saved configuration to {:?}", path);
        Ok(())
    }
}
