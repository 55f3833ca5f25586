//! Launcher profile generation.
//!
//! Profiles live in the vanilla launcher's `launcher_profiles.json`. Only the
//! entry for the installed loader is touched; every other profile and every
//! unknown field is written back as it was read.

use std::future::Future;
use std::path::{Path, PathBuf};

use chrono::{SecondsFormat, Utc};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::app_data::installer_config;

/// Errors reading or writing the launcher profiles file
#[derive(Error, Debug)]
pub enum ProfileError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Could not parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("{0} does not contain a profiles table")]
    Malformed(PathBuf),
}

/// A launcher profile pointing at an installed version
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LauncherProfile {
    /// Key of the entry in the `profiles` table
    pub key: String,
    pub name: String,
    pub last_version_id: String,
    /// JVM arguments that must be present in the profile
    pub java_args: Vec<String>,
}

/// Store that can create or update launcher profiles
pub trait ProfileStore: Send + Sync {
    fn upsert_profile(
        &self,
        install_dir: &Path,
        profile: &LauncherProfile,
    ) -> impl Future<Output = Result<(), ProfileError>> + Send;
}

/// `launcher_profiles.json` in the launcher directory
#[derive(Debug, Clone, Copy, Default)]
pub struct LauncherProfilesFile;

impl LauncherProfilesFile {
    pub fn path(install_dir: &Path) -> PathBuf {
        install_dir.join(&installer_config().launcher.profiles_file)
    }
}

impl ProfileStore for LauncherProfilesFile {
    async fn upsert_profile(
        &self,
        install_dir: &Path,
        profile: &LauncherProfile,
    ) -> Result<(), ProfileError> {
        let path = Self::path(install_dir);

        let mut document = match tokio::fs::read(&path).await {
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(|source| ProfileError::Parse {
                path: path.clone(),
                source,
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!("No {} found, creating one", path.display());
                Value::Object(Map::new())
            }
            Err(e) => return Err(e.into()),
        };

        let now = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
        merge_profile(&mut document, profile, &now).ok_or_else(|| ProfileError::Malformed(path.clone()))?;

        let content = serde_json::to_vec_pretty(&document).map_err(|source| ProfileError::Parse {
            path: path.clone(),
            source,
        })?;

        // Write next to the target and rename, so the launcher never sees a half-written file
        let temp_path = path.with_extension(format!(
            "json{}",
            installer_config().launcher.temp_extension
        ));
        tokio::fs::write(&temp_path, content).await?;
        tokio::fs::rename(&temp_path, &path).await?;

        tracing::info!("Updated launcher profile {} in {}", profile.key, path.display());
        Ok(())
    }
}

/// Insert or update `profile` in a launcher profiles document.
///
/// Returns `None` if the document or its `profiles` entry is not a JSON object.
fn merge_profile(document: &mut Value, profile: &LauncherProfile, now: &str) -> Option<()> {
    let profiles = document
        .as_object_mut()?
        .entry("profiles")
        .or_insert_with(|| Value::Object(Map::new()))
        .as_object_mut()?;

    let entry = profiles
        .entry(profile.key.clone())
        .or_insert_with(|| Value::Object(Map::new()))
        .as_object_mut()?;

    let defaults = &installer_config().profile;
    entry.insert("name".into(), profile.name.clone().into());
    entry.insert("type".into(), defaults.profile_type.clone().into());
    entry.insert("lastVersionId".into(), profile.last_version_id.clone().into());
    entry.insert("lastUsed".into(), now.into());
    entry.entry("created").or_insert_with(|| now.into());
    entry
        .entry("icon")
        .or_insert_with(|| defaults.default_icon.clone().into());

    if !profile.java_args.is_empty() {
        let existing = entry.get("javaArgs").and_then(Value::as_str).unwrap_or_default();
        let mut args: Vec<&str> = existing.split_whitespace().collect();
        for arg in &profile.java_args {
            if !args.contains(&arg.as_str()) {
                args.push(arg);
            }
        }
        let joined = args.join(" ");
        entry.insert("javaArgs".into(), joined.into());
    }

    Some(())
}
