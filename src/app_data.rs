//! Application data embedded from TOML at compile time.
//!
//! This module provides access to installer constants that are:
//! - Embedded at compile time via `include_str!`
//! - Parsed lazily on first access via `OnceLock`
//! - Immutable at runtime (not user-configurable)
//!
//! This is distinct from `config.rs` which handles user preferences.
//! App data defines *where things live* (metadata endpoints, launcher file layout),
//! while config defines *user choices* (default loader, install directory).

use serde::Deserialize;
use std::collections::HashMap;
use std::sync::OnceLock;

use crate::loader::LoaderType;

const INSTALLER_CONFIG_TOML: &str = include_str!("../embedded/installer_config.toml");

/// Installer endpoints and launcher layout
#[derive(Debug, Deserialize)]
pub struct InstallerConfig {
    pub meta: MetaConfig,
    pub loaders: HashMap<String, LoaderEndpoints>,
    pub launcher: LauncherLayout,
    pub profile: ProfileDefaults,
}

#[derive(Debug, Deserialize)]
pub struct MetaConfig {
    /// Vanilla game version manifest
    pub game_manifest: String,
    /// Game versions that have intermediary mappings published
    pub intermediary: String,
}

#[derive(Debug, Deserialize)]
pub struct LoaderEndpoints {
    /// Base URL of the loader's metadata service (no trailing slash)
    pub meta_base: String,
}

#[derive(Debug, Deserialize)]
pub struct LauncherLayout {
    pub versions_dir: String,
    pub profiles_file: String,
    pub write_test_file: String,
    pub temp_extension: String,
}

#[derive(Debug, Deserialize)]
pub struct ProfileDefaults {
    #[serde(rename = "type")]
    pub profile_type: String,
    pub default_icon: String,
}

impl InstallerConfig {
    /// Metadata base URL for a loader type.
    ///
    /// Every `LoaderType` variant has an entry in the embedded file; the test
    /// below keeps that true.
    pub fn meta_base(&self, loader: LoaderType) -> &str {
        self.loaders
            .get(loader.key())
            .map(|l| l.meta_base.as_str())
            .unwrap_or_default()
    }
}

/// Get installer configuration (lazy-loaded)
pub fn installer_config() -> &'static InstallerConfig {
    static CONFIG: OnceLock<InstallerConfig> = OnceLock::new();
    CONFIG.get_or_init(|| {
        toml::from_str(INSTALLER_CONFIG_TOML).unwrap_or_else(|e| {
            panic!("Failed to parse installer_config.toml: {}", e);
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_loader_has_endpoints() {
        let config = installer_config();
        for loader in LoaderType::ALL {
            assert!(
                config.meta_base(loader).starts_with("https://"),
                "missing meta_base for {}",
                loader.key()
            );
        }
    }

    #[test]
    fn test_launcher_layout() {
        let layout = &installer_config().launcher;
        assert_eq!(layout.versions_dir, "versions");
        assert_eq!(layout.profiles_file, "launcher_profiles.json");
        assert!(layout.temp_extension.starts_with('.'));
    }
}
