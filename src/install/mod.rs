//! Client installation for a submitted selection.
//!
//! This module handles:
//! - Checking that the launcher directory is writable
//! - Fetching the loader's launch profile for the chosen versions
//! - Writing the launcher version entry, with rollback on failure
//! - Creating or updating the launcher profile (optional)
//!
//! Progress is reported as an ordered stream of [`InstallMessage`]s through a
//! [`MessageSink`]; the run itself is cancellable between stages.

mod access;
mod orchestrator;
pub mod profile;

use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;
use tokio::sync::mpsc;

use crate::meta::FetchError;

pub use orchestrator::InstallOrchestrator;
pub use profile::{LauncherProfilesFile, ProfileError, ProfileStore};

/// Stage of the install process
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum InstallStage {
    CheckingPath,
    FetchingLaunchJson,
    WritingVersion,
    GeneratingProfile,
}

impl InstallStage {
    /// Get a human-readable description of the stage
    pub fn description(&self) -> &'static str {
        match self {
            InstallStage::CheckingPath => "Checking install location...",
            InstallStage::FetchingLaunchJson => "Downloading launch profile...",
            InstallStage::WritingVersion => "Writing version files...",
            InstallStage::GeneratingProfile => "Updating launcher profile...",
        }
    }
}

impl std::fmt::Display for InstallStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            InstallStage::CheckingPath => "checking the install location",
            InstallStage::FetchingLaunchJson => "downloading the launch profile",
            InstallStage::WritingVersion => "writing version files",
            InstallStage::GeneratingProfile => "updating the launcher profile",
        };
        f.write_str(name)
    }
}

/// Status messages emitted during a run, in order.
///
/// Every run emits `Started`, then a `Stage` per stage entered, then exactly
/// one of `Completed`, `Failed` or `Cancelled`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum InstallMessage {
    Started { version_id: String },
    Stage(InstallStage),
    Completed { version_id: String },
    Failed { stage: InstallStage, reason: String },
    Cancelled { stage: InstallStage },
}

impl InstallMessage {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            InstallMessage::Completed { .. }
                | InstallMessage::Failed { .. }
                | InstallMessage::Cancelled { .. }
        )
    }
}

/// Receiver of install status messages
pub trait MessageSink: Send + Sync {
    fn emit(&self, message: InstallMessage);
}

impl MessageSink for mpsc::UnboundedSender<InstallMessage> {
    fn emit(&self, message: InstallMessage) {
        // A dropped receiver only means nobody is listening any more
        let _ = self.send(message);
    }
}

/// Result of a successful install
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstallOutcome {
    pub version_id: String,
    pub version_dir: PathBuf,
    /// Launcher profile key, if a profile was written
    pub profile: Option<String>,
}

/// Errors that can occur during an install run
#[derive(Error, Debug)]
pub enum InstallError {
    #[error("Cannot install to {path}: {reason}")]
    PathNotWritable { path: PathBuf, reason: String },

    #[error("{loader_version} does not support game version {game_version}")]
    UnsupportedCombination {
        game_version: String,
        loader_version: String,
    },

    #[error("Download failed while {stage}: {source}")]
    ArtifactDownload {
        stage: InstallStage,
        #[source]
        source: FetchError,
    },

    #[error("Failed to write version files: {0}")]
    ArtifactWrite(#[source] std::io::Error),

    #[error("Failed to update launcher profile: {0}")]
    ProfileWrite(#[from] ProfileError),

    #[error("Install cancelled while {stage}")]
    Cancelled { stage: InstallStage },
}

impl InstallError {
    /// The stage the run was in when it stopped
    pub fn stage(&self) -> InstallStage {
        match self {
            InstallError::PathNotWritable { .. } => InstallStage::CheckingPath,
            InstallError::UnsupportedCombination { .. } => InstallStage::FetchingLaunchJson,
            InstallError::ArtifactDownload { stage, .. } => *stage,
            InstallError::ArtifactWrite(_) => InstallStage::WritingVersion,
            InstallError::ProfileWrite(_) => InstallStage::GeneratingProfile,
            InstallError::Cancelled { stage } => *stage,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, InstallError::Cancelled { .. })
    }
}
