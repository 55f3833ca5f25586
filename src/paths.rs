//! Default launcher locations per platform.

use std::path::{Path, PathBuf};

use anyhow::Result;
use serde::Serialize;

/// Platforms with a known launcher layout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Platform {
    Windows,
    MacOs,
    Linux,
}

impl Platform {
    pub fn current() -> Self {
        if cfg!(windows) {
            Platform::Windows
        } else if cfg!(target_os = "macos") {
            Platform::MacOs
        } else {
            Platform::Linux
        }
    }
}

/// Where the vanilla launcher keeps its data on `platform`.
///
/// `home` is the user's home directory and `roaming` the roaming application
/// data directory (`%APPDATA%`), which only Windows uses.
pub fn default_install_dir(platform: Platform, home: &Path, roaming: &Path) -> PathBuf {
    match platform {
        Platform::Windows => roaming.join(".minecraft"),
        Platform::MacOs => home.join("Library").join("Application Support").join("minecraft"),
        Platform::Linux => home.join(".minecraft"),
    }
}

/// Default launcher directory for the current user and platform
pub fn resolve_default_install_dir() -> Result<PathBuf> {
    let dirs = directories::BaseDirs::new()
        .ok_or_else(|| anyhow::anyhow!("Could not determine home directory"))?;

    // config_dir() is %APPDATA% (Roaming) on Windows
    Ok(default_install_dir(
        Platform::current(),
        dirs.home_dir(),
        dirs.config_dir(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_install_dir_per_platform() {
        let home = Path::new("/home/steve");
        let roaming = Path::new("C:/Users/steve/AppData/Roaming");

        assert_eq!(
            default_install_dir(Platform::Windows, home, roaming),
            PathBuf::from("C:/Users/steve/AppData/Roaming/.minecraft")
        );
        assert_eq!(
            default_install_dir(Platform::MacOs, home, roaming),
            PathBuf::from("/home/steve/Library/Application Support/minecraft")
        );
        assert_eq!(
            default_install_dir(Platform::Linux, home, roaming),
            PathBuf::from("/home/steve/.minecraft")
        );
    }

    #[test]
    fn test_resolve_for_current_platform() {
        let dir = resolve_default_install_dir().unwrap();
        assert!(dir.ends_with(".minecraft") || dir.ends_with("minecraft"));
    }
}
