//! Supported mod loader types.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A mod loader that can be installed into the launcher
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum LoaderType {
    #[default]
    Quilt,
    Fabric,
}

impl LoaderType {
    /// All loader types, in the order they are offered to the user
    pub const ALL: [LoaderType; 2] = [LoaderType::Quilt, LoaderType::Fabric];

    /// Stable lowercase key used in config files and on the command line
    pub fn key(&self) -> &'static str {
        match self {
            LoaderType::Quilt => "quilt",
            LoaderType::Fabric => "fabric",
        }
    }

    /// Human-readable name
    pub fn display_name(&self) -> &'static str {
        match self {
            LoaderType::Quilt => "Quilt",
            LoaderType::Fabric => "Fabric",
        }
    }

    /// Whether this loader honours the telemetry opt-out flags.
    ///
    /// Front ends use this to decide whether to show the opt-out options, and
    /// profile generation only applies the flags when this is true.
    pub fn supports_opt_out(&self) -> bool {
        match self {
            LoaderType::Quilt => true,
            LoaderType::Fabric => false,
        }
    }

    /// Launcher version id, e.g. `quilt-loader-0.26.0-1.20.1`
    pub fn version_id(&self, game_version: &str, loader_version: &str) -> String {
        format!("{}-loader-{}-{}", self.key(), loader_version, game_version)
    }

    /// Launcher profile key, e.g. `quilt-loader-1.20.1`.
    ///
    /// One profile per loader and game version; reinstalling another loader
    /// version updates the same profile.
    pub fn profile_key(&self, game_version: &str) -> String {
        format!("{}-loader-{}", self.key(), game_version)
    }
}

impl fmt::Display for LoaderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for LoaderType {
    type Err = String;

    /// Accepts the key or the display name, case-insensitively
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|l| l.key().eq_ignore_ascii_case(wanted) || l.display_name().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| {
                let known: Vec<&str> = Self::ALL.iter().map(|l| l.key()).collect();
                format!("Unknown loader type '{}' (expected one of: {})", s, known.join(", "))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_loader_type() {
        assert_eq!("quilt".parse::<LoaderType>().unwrap(), LoaderType::Quilt);
        assert_eq!("Fabric".parse::<LoaderType>().unwrap(), LoaderType::Fabric);
        assert_eq!(" QUILT ".parse::<LoaderType>().unwrap(), LoaderType::Quilt);

        let err = "forge".parse::<LoaderType>().unwrap_err();
        assert!(err.contains("quilt, fabric"));
    }

    #[test]
    fn test_opt_out_capability() {
        assert!(LoaderType::Quilt.supports_opt_out());
        assert!(!LoaderType::Fabric.supports_opt_out());
    }

    #[test]
    fn test_naming() {
        assert_eq!(
            LoaderType::Quilt.version_id("1.20.1", "0.26.0"),
            "quilt-loader-0.26.0-1.20.1"
        );
        assert_eq!(
            LoaderType::Fabric.version_id("1.21", "0.16.5"),
            "fabric-loader-0.16.5-1.21"
        );
        assert_eq!(LoaderType::Quilt.profile_key("1.20.1"), "quilt-loader-1.20.1");
    }

    #[test]
    fn test_serde_uses_key() {
        let json = serde_json::to_string(&LoaderType::Fabric).unwrap();
        assert_eq!(json, "\"fabric\"");
        let parsed: LoaderType = serde_json::from_str("\"quilt\"").unwrap();
        assert_eq!(parsed, LoaderType::Quilt);
    }
}
