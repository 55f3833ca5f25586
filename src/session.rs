//! Session plumbing between a front end and the installer.
//!
//! - `load_manifests` drives a `SelectionState` through loading
//! - `submit_install` spawns an install and hands back an `InstallTask`:
//!   an ordered message stream, a cancel switch and the terminal result

use std::sync::Arc;

use futures::future::try_join_all;
use tokio::sync::mpsc;
use tokio::task::{JoinError, JoinHandle};
use tokio_util::sync::CancellationToken;

use crate::install::{InstallError, InstallMessage, InstallOrchestrator, InstallOutcome, ProfileStore};
use crate::loader::LoaderType;
use crate::manifest::LoaderCatalogs;
use crate::meta::{ArtifactSource, FetchError, VersionSource};
use crate::selection::{InstallRequest, SelectionState};

/// Fetch every catalog and hand them to the session.
///
/// Loader catalogs are fetched concurrently with the game manifest. Any
/// failure aborts the whole load and leaves the session blocked in
/// `Unloaded` with the reason recorded.
pub async fn load_manifests<S: VersionSource>(
    source: &S,
    state: &mut SelectionState,
) -> Result<(), FetchError> {
    state.begin_loading();

    let catalogs = try_join_all(
        LoaderType::ALL
            .into_iter()
            .map(|loader| source.fetch_loader_versions(loader)),
    );
    let result = futures::try_join!(
        source.fetch_version_manifest(),
        catalogs,
        source.fetch_intermediary_versions()
    );

    match result {
        Ok((manifest, catalogs, intermediary)) => {
            let catalogs: LoaderCatalogs = catalogs.into_iter().map(|c| (c.loader, c)).collect();
            state.on_manifests_loaded(manifest, catalogs, intermediary);
            Ok(())
        }
        Err(e) => {
            tracing::error!("Failed to load versions: {}", e);
            state.loading_failed(e.to_string());
            Err(e)
        }
    }
}

/// A running install
pub struct InstallTask {
    messages: mpsc::UnboundedReceiver<InstallMessage>,
    cancel: CancellationToken,
    task: JoinHandle<Result<InstallOutcome, InstallError>>,
}

impl InstallTask {
    /// Next status message; `None` once the run has finished and every
    /// message has been received
    pub async fn next_message(&mut self) -> Option<InstallMessage> {
        self.messages.recv().await
    }

    /// Ask the run to stop at its next checkpoint
    pub fn cancel(&self) {
        tracing::info!("Cancellation requested");
        self.cancel.cancel();
    }

    /// Wait for the terminal result. The outer error means the task panicked.
    pub async fn wait(self) -> Result<Result<InstallOutcome, InstallError>, JoinError> {
        self.task.await
    }
}

/// Spawn an install of `request` on the tokio runtime
pub fn submit_install<A, P>(
    orchestrator: Arc<InstallOrchestrator<A, P>>,
    request: InstallRequest,
) -> InstallTask
where
    A: ArtifactSource + 'static,
    P: ProfileStore + 'static,
{
    let (tx, rx) = mpsc::unbounded_channel();
    let cancel = CancellationToken::new();
    let token = cancel.clone();

    let task = tokio::spawn(async move { orchestrator.run(request, &tx, &token).await });

    InstallTask {
        messages: rx,
        cancel,
        task,
    }
}
