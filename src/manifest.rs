//! Game and loader version catalogs, and the filters over them.
//!
//! Both filters are pure: they take the catalog plus a flag and return a
//! fresh list in catalog order, so re-running them after any change is safe.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::loader::LoaderType;

/// Release channel of a game version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReleaseType {
    Release,
    /// Snapshots, pre-releases and the historical `old_beta`/`old_alpha` types
    #[serde(other)]
    Snapshot,
}

/// A game version from the vanilla manifest
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameVersion {
    pub id: String,
    #[serde(rename = "type")]
    pub release_type: ReleaseType,
}

impl GameVersion {
    pub fn is_snapshot(&self) -> bool {
        self.release_type == ReleaseType::Snapshot
    }
}

/// The latest release and snapshot ids as announced by the manifest
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LatestVersions {
    #[serde(default)]
    pub release: Option<String>,
    #[serde(default)]
    pub snapshot: Option<String>,
}

/// Parsed vanilla version manifest, newest first
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionManifest {
    #[serde(default)]
    pub latest: LatestVersions,
    pub versions: Vec<GameVersion>,
}

impl VersionManifest {
    pub fn find(&self, id: &str) -> Option<&GameVersion> {
        self.versions.iter().find(|v| v.id == id)
    }
}

/// Stability channel of a loader version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stability {
    Stable,
    Beta,
}

/// A loader version offered by a loader's metadata service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoaderVersion {
    pub id: String,
    pub stability: Stability,
}

impl LoaderVersion {
    pub fn is_beta(&self) -> bool {
        self.stability == Stability::Beta
    }
}

/// Raw loader version entry as served by the metadata services.
///
/// Fabric reports stability explicitly; Quilt does not, and marks betas with a
/// pre-release suffix instead (`0.19.0-beta.3`).
#[derive(Debug, Clone, Deserialize)]
pub struct LoaderVersionEntry {
    pub version: String,
    #[serde(default)]
    pub stable: Option<bool>,
}

impl From<LoaderVersionEntry> for LoaderVersion {
    fn from(entry: LoaderVersionEntry) -> Self {
        let stable = entry.stable.unwrap_or_else(|| !entry.version.contains('-'));
        LoaderVersion {
            id: entry.version,
            stability: if stable {
                Stability::Stable
            } else {
                Stability::Beta
            },
        }
    }
}

/// All versions of one loader, newest first
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoaderVersionCatalog {
    pub loader: LoaderType,
    pub versions: Vec<LoaderVersion>,
}

impl LoaderVersionCatalog {
    pub fn from_entries(loader: LoaderType, entries: Vec<LoaderVersionEntry>) -> Self {
        Self {
            loader,
            versions: entries.into_iter().map(LoaderVersion::from).collect(),
        }
    }
}

/// Catalogs keyed by loader type
pub type LoaderCatalogs = BTreeMap<LoaderType, LoaderVersionCatalog>;

/// Game versions in manifest order, snapshots only when asked for
pub fn filter_game_versions(manifest: &VersionManifest, include_snapshots: bool) -> Vec<GameVersion> {
    manifest
        .versions
        .iter()
        .filter(|v| include_snapshots || !v.is_snapshot())
        .cloned()
        .collect()
}

/// Loader versions for `loader` in catalog order, betas only when asked for.
///
/// A loader with no catalog yields an empty list.
pub fn filter_loader_versions(
    catalogs: &LoaderCatalogs,
    loader: LoaderType,
    include_betas: bool,
) -> Vec<LoaderVersion> {
    catalogs
        .get(&loader)
        .map(|catalog| {
            catalog
                .versions
                .iter()
                .filter(|v| include_betas || !v.is_beta())
                .cloned()
                .collect()
        })
        .unwrap_or_default()
}
