//! Selection state for one install session.
//!
//! `SelectionState` is owned by the session controller and mutated only
//! through its setters. Derived lists are recomputed by
//! [`SelectionState::recompute_game_versions`] and
//! [`SelectionState::recompute_loader_versions`] whenever one of their inputs
//! changes, and the chosen values are re-validated against the new lists.

use std::collections::{BTreeMap, HashSet};
use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

use crate::loader::LoaderType;
use crate::manifest::{
    filter_game_versions, filter_loader_versions, GameVersion, LoaderCatalogs, LoaderVersion,
    VersionManifest,
};

/// Lifecycle of a selection session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum SessionPhase {
    #[default]
    Unloaded,
    Loading,
    /// Catalogs loaded and defaults selected
    Ready,
    /// The user changed at least one field since `Ready`
    Mutated,
    /// A request was taken; terminal until `new_request`
    Submitted,
}

/// Errors raised by selection changes and validation on submit
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SelectionError {
    #[error("Selection cannot change while {0:?}")]
    NotEditable(SessionPhase),

    #[error("Cannot submit while {0:?}")]
    NotReady(SessionPhase),

    #[error("No game version available for the current filters")]
    NoGameVersion,

    #[error("No loader version available for the current filters")]
    NoLoaderVersion,

    #[error("Game version {0} is not available for the current filters")]
    UnknownGameVersion(String),

    #[error("Loader version {0} is not available for the current filters")]
    UnknownLoaderVersion(String),

    #[error("No install location given")]
    EmptyInstallPath,
}

/// Immutable snapshot of a selection, handed to the installer
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstallRequest {
    pub game_version: String,
    pub loader_type: LoaderType,
    pub loader_version: String,
    pub install_dir: PathBuf,
    pub generate_profile: bool,
    /// Opaque opt-out flags, passed through as the front end set them
    pub opt_out_flags: BTreeMap<String, bool>,
}

/// Current user choices plus the data they are chosen from
#[derive(Debug, Clone)]
pub struct SelectionState {
    phase: SessionPhase,
    load_error: Option<String>,

    manifest: VersionManifest,
    catalogs: LoaderCatalogs,
    /// Game versions with intermediary mappings; `None` means unrestricted
    intermediary: Option<HashSet<String>>,

    game_versions: Vec<GameVersion>,
    loader_versions: Vec<LoaderVersion>,

    game_version: Option<String>,
    loader_type: LoaderType,
    loader_version: Option<String>,
    show_snapshots: bool,
    show_loader_betas: bool,
    install_path: PathBuf,
    generate_profile: bool,
    opt_out_flags: BTreeMap<String, bool>,
}

impl SelectionState {
    pub fn new(loader_type: LoaderType, install_path: PathBuf) -> Self {
        Self {
            phase: SessionPhase::Unloaded,
            load_error: None,
            manifest: VersionManifest::default(),
            catalogs: LoaderCatalogs::new(),
            intermediary: None,
            game_versions: Vec::new(),
            loader_versions: Vec::new(),
            game_version: None,
            loader_type,
            loader_version: None,
            show_snapshots: false,
            show_loader_betas: false,
            install_path,
            generate_profile: true,
            opt_out_flags: BTreeMap::new(),
        }
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    /// Reason the last load failed, if the session is blocked on a retry
    pub fn load_error(&self) -> Option<&str> {
        self.load_error.as_deref()
    }

    pub fn game_versions(&self) -> &[GameVersion] {
        &self.game_versions
    }

    pub fn loader_versions(&self) -> &[LoaderVersion] {
        &self.loader_versions
    }

    /// Look up a game version in the full manifest, ignoring filters
    pub fn manifest_version(&self, id: &str) -> Option<&GameVersion> {
        self.manifest.find(id)
    }

    pub fn game_version(&self) -> Option<&str> {
        self.game_version.as_deref()
    }

    pub fn loader_type(&self) -> LoaderType {
        self.loader_type
    }

    pub fn loader_version(&self) -> Option<&str> {
        self.loader_version.as_deref()
    }

    pub fn show_snapshots(&self) -> bool {
        self.show_snapshots
    }

    pub fn show_loader_betas(&self) -> bool {
        self.show_loader_betas
    }

    pub fn install_path(&self) -> &PathBuf {
        &self.install_path
    }

    pub fn generate_profile(&self) -> bool {
        self.generate_profile
    }

    pub fn opt_out_flags(&self) -> &BTreeMap<String, bool> {
        &self.opt_out_flags
    }

    /// Whether the loader-specific opt-out options apply to the current loader
    pub fn opt_out_applicable(&self) -> bool {
        self.loader_type.supports_opt_out()
    }

    // ------------------------------------------------------------------
    // Loading
    // ------------------------------------------------------------------

    pub fn begin_loading(&mut self) {
        self.phase = SessionPhase::Loading;
        self.load_error = None;
    }

    /// Record a failed load. Previously loaded data is dropped so a blocked
    /// session never offers stale versions.
    pub fn loading_failed(&mut self, reason: impl Into<String>) {
        self.phase = SessionPhase::Unloaded;
        self.load_error = Some(reason.into());
        self.manifest = VersionManifest::default();
        self.catalogs.clear();
        self.intermediary = None;
        self.game_versions.clear();
        self.loader_versions.clear();
        self.game_version = None;
        self.loader_version = None;
    }

    /// Store freshly fetched catalogs, select defaults and become `Ready`.
    ///
    /// An empty `intermediary_versions` means the loader metadata did not
    /// restrict game versions.
    pub fn on_manifests_loaded(
        &mut self,
        manifest: VersionManifest,
        catalogs: LoaderCatalogs,
        intermediary_versions: impl IntoIterator<Item = String>,
    ) {
        let intermediary: HashSet<String> = intermediary_versions.into_iter().collect();

        self.manifest = manifest;
        self.catalogs = catalogs;
        self.intermediary = (!intermediary.is_empty()).then_some(intermediary);
        self.load_error = None;

        self.recompute_game_versions();
        self.recompute_loader_versions();
        self.phase = SessionPhase::Ready;

        tracing::debug!(
            "Selection ready: {} game versions, {} {} versions",
            self.game_versions.len(),
            self.loader_versions.len(),
            self.loader_type
        );
    }

    // ------------------------------------------------------------------
    // Derived lists
    // ------------------------------------------------------------------

    /// Re-derive the game version list from (manifest, show_snapshots).
    pub fn recompute_game_versions(&mut self) {
        let mut versions = filter_game_versions(&self.manifest, self.show_snapshots);
        if let Some(allowed) = &self.intermediary {
            versions.retain(|v| allowed.contains(&v.id));
        }
        self.game_version = retain_or_first(
            self.game_version.take(),
            versions.iter().map(|v| v.id.as_str()),
        );
        self.game_versions = versions;
    }

    /// Re-derive the loader version list from (catalogs, loader_type, show_loader_betas).
    pub fn recompute_loader_versions(&mut self) {
        let versions =
            filter_loader_versions(&self.catalogs, self.loader_type, self.show_loader_betas);
        self.loader_version = retain_or_first(
            self.loader_version.take(),
            versions.iter().map(|v| v.id.as_str()),
        );
        self.loader_versions = versions;
    }

    // ------------------------------------------------------------------
    // Setters
    // ------------------------------------------------------------------

    fn begin_edit(&mut self) -> Result<(), SelectionError> {
        match self.phase {
            SessionPhase::Ready | SessionPhase::Mutated => {
                self.phase = SessionPhase::Mutated;
                Ok(())
            }
            phase => Err(SelectionError::NotEditable(phase)),
        }
    }

    pub fn set_game_version(&mut self, id: &str) -> Result<(), SelectionError> {
        if self.game_versions.iter().all(|v| v.id != id) {
            return Err(SelectionError::UnknownGameVersion(id.to_string()));
        }
        self.begin_edit()?;
        self.game_version = Some(id.to_string());
        Ok(())
    }

    pub fn set_loader_type(&mut self, loader_type: LoaderType) -> Result<(), SelectionError> {
        self.begin_edit()?;
        self.loader_type = loader_type;
        self.recompute_loader_versions();
        Ok(())
    }

    pub fn set_loader_version(&mut self, id: &str) -> Result<(), SelectionError> {
        if self.loader_versions.iter().all(|v| v.id != id) {
            return Err(SelectionError::UnknownLoaderVersion(id.to_string()));
        }
        self.begin_edit()?;
        self.loader_version = Some(id.to_string());
        Ok(())
    }

    pub fn set_show_snapshots(&mut self, show: bool) -> Result<(), SelectionError> {
        self.begin_edit()?;
        self.show_snapshots = show;
        self.recompute_game_versions();
        Ok(())
    }

    pub fn set_show_loader_betas(&mut self, show: bool) -> Result<(), SelectionError> {
        self.begin_edit()?;
        self.show_loader_betas = show;
        self.recompute_loader_versions();
        Ok(())
    }

    pub fn set_install_path(&mut self, path: impl Into<PathBuf>) -> Result<(), SelectionError> {
        self.begin_edit()?;
        self.install_path = path.into();
        Ok(())
    }

    pub fn set_generate_profile(&mut self, generate: bool) -> Result<(), SelectionError> {
        self.begin_edit()?;
        self.generate_profile = generate;
        Ok(())
    }

    pub fn set_opt_out(&mut self, key: impl Into<String>, value: bool) -> Result<(), SelectionError> {
        self.begin_edit()?;
        self.opt_out_flags.insert(key.into(), value);
        Ok(())
    }

    // ------------------------------------------------------------------
    // Submit
    // ------------------------------------------------------------------

    /// Validate the selection and take an owned snapshot of it.
    ///
    /// On success the session is `Submitted`; on failure it is unchanged.
    pub fn submit(&mut self) -> Result<InstallRequest, SelectionError> {
        if !matches!(self.phase, SessionPhase::Ready | SessionPhase::Mutated) {
            return Err(SelectionError::NotReady(self.phase));
        }

        let game_version = self.game_version.clone().ok_or(SelectionError::NoGameVersion)?;
        let loader_version = self
            .loader_version
            .clone()
            .ok_or(SelectionError::NoLoaderVersion)?;
        if self.install_path.as_os_str().is_empty() {
            return Err(SelectionError::EmptyInstallPath);
        }

        let request = InstallRequest {
            game_version,
            loader_type: self.loader_type,
            loader_version,
            install_dir: self.install_path.clone(),
            generate_profile: self.generate_profile,
            opt_out_flags: self.opt_out_flags.clone(),
        };

        self.phase = SessionPhase::Submitted;
        tracing::info!(
            "Submitted {} {} for {} into {}",
            request.loader_type,
            request.loader_version,
            request.game_version,
            request.install_dir.display()
        );
        Ok(request)
    }

    /// Start a new request after a submit, keeping the current choices
    pub fn new_request(&mut self) {
        if self.phase == SessionPhase::Submitted {
            self.phase = SessionPhase::Ready;
        }
    }
}

/// Keep `current` if it is still offered, otherwise fall back to the first entry.
fn retain_or_first<'a>(
    current: Option<String>,
    mut offered: impl Iterator<Item = &'a str> + Clone,
) -> Option<String> {
    match current {
        Some(id) if offered.clone().any(|o| o == id) => Some(id),
        _ => offered.next().map(str::to_string),
    }
}
