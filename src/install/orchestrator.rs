//! Install orchestration: stages, cancellation checkpoints and rollback.

use std::io;
use std::path::{Path, PathBuf};
use std::time::Instant;

use serde_json::Value;
use tokio_util::sync::CancellationToken;

use crate::app_data::installer_config;
use crate::meta::{ArtifactSource, FetchError};
use crate::selection::InstallRequest;

use super::access::check_install_path;
use super::profile::{LauncherProfile, ProfileStore};
use super::{InstallError, InstallMessage, InstallOutcome, InstallStage, MessageSink};

/// Runs install requests against an artifact source and a profile store
pub struct InstallOrchestrator<A, P> {
    artifacts: A,
    profiles: P,
}

impl<A: ArtifactSource, P: ProfileStore> InstallOrchestrator<A, P> {
    pub fn new(artifacts: A, profiles: P) -> Self {
        Self { artifacts, profiles }
    }

    /// Run one install to completion, failure or cancellation.
    ///
    /// `cancel` is checked before every stage and raced against the network
    /// fetch. If the run stops after it touched the launcher directory, the
    /// changes are rolled back before the terminal message is emitted.
    pub async fn run<S: MessageSink + ?Sized>(
        &self,
        request: InstallRequest,
        sink: &S,
        cancel: &CancellationToken,
    ) -> Result<InstallOutcome, InstallError> {
        let install_start = Instant::now();
        let version_id = request
            .loader_type
            .version_id(&request.game_version, &request.loader_version);

        tracing::info!(
            "Installing {} into {}",
            version_id,
            request.install_dir.display()
        );
        sink.emit(InstallMessage::Started {
            version_id: version_id.clone(),
        });

        let mut undo = Rollback::default();
        let result = self
            .execute(&request, &version_id, sink, cancel, &mut undo)
            .await;

        match result {
            Ok(outcome) => {
                tracing::info!(
                    "Install of {} complete in {:.1}s",
                    version_id,
                    install_start.elapsed().as_secs_f32()
                );
                sink.emit(InstallMessage::Completed { version_id });
                Ok(outcome)
            }
            Err(e) => {
                if !undo.is_empty() {
                    match undo.apply().await {
                        Ok(()) => tracing::info!("Rolled back changes for {}", version_id),
                        Err(rollback_err) => {
                            tracing::error!("Rollback also failed: {}", rollback_err)
                        }
                    }
                }

                let stage = e.stage();
                if e.is_cancelled() {
                    tracing::warn!("Install of {} cancelled while {}", version_id, stage);
                    sink.emit(InstallMessage::Cancelled { stage });
                } else {
                    tracing::error!("Install of {} failed: {}", version_id, e);
                    sink.emit(InstallMessage::Failed {
                        stage,
                        reason: e.to_string(),
                    });
                }
                Err(e)
            }
        }
    }

    async fn execute<S: MessageSink + ?Sized>(
        &self,
        request: &InstallRequest,
        version_id: &str,
        sink: &S,
        cancel: &CancellationToken,
        undo: &mut Rollback,
    ) -> Result<InstallOutcome, InstallError> {
        let install_dir = &request.install_dir;

        // Stage 1: pre-flight
        enter_stage(InstallStage::CheckingPath, sink, cancel)?;
        if check_install_path(install_dir).await? {
            undo.created_install_dir = Some(install_dir.clone());
        }

        // Stage 2: launch profile from the loader's metadata service
        enter_stage(InstallStage::FetchingLaunchJson, sink, cancel)?;
        let phase_start = Instant::now();
        let fetch = self.artifacts.fetch_launch_json(
            request.loader_type,
            &request.game_version,
            &request.loader_version,
        );
        let launch_json = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                return Err(InstallError::Cancelled {
                    stage: InstallStage::FetchingLaunchJson,
                });
            }
            result = fetch => result.map_err(|e| match e {
                FetchError::NotFound { .. } => InstallError::UnsupportedCombination {
                    game_version: request.game_version.clone(),
                    loader_version: format!("{} {}", request.loader_type, request.loader_version),
                },
                source => InstallError::ArtifactDownload {
                    stage: InstallStage::FetchingLaunchJson,
                    source,
                },
            })?,
        };
        tracing::info!(
            "Launch profile fetched in {:.1}s",
            phase_start.elapsed().as_secs_f32()
        );

        // Stage 3: version entry
        enter_stage(InstallStage::WritingVersion, sink, cancel)?;
        let version_dir = install_dir
            .join(&installer_config().launcher.versions_dir)
            .join(version_id);
        let backup = VersionBackup::capture(&version_dir, version_id)
            .await
            .map_err(InstallError::ArtifactWrite)?;
        undo.version = Some(backup);
        write_version_files(&version_dir, version_id, launch_json)
            .await
            .map_err(InstallError::ArtifactWrite)?;

        // Stage 4: launcher profile (skipped entirely when not requested)
        let profile = if request.generate_profile {
            enter_stage(InstallStage::GeneratingProfile, sink, cancel)?;
            let profile = build_profile(request, version_id);
            self.profiles.upsert_profile(install_dir, &profile).await?;
            Some(profile.key)
        } else {
            tracing::debug!("Profile generation not requested");
            None
        };

        Ok(InstallOutcome {
            version_id: version_id.to_string(),
            version_dir,
            profile,
        })
    }
}

/// Cancellation checkpoint, then announce the stage
fn enter_stage<S: MessageSink + ?Sized>(
    stage: InstallStage,
    sink: &S,
    cancel: &CancellationToken,
) -> Result<(), InstallError> {
    if cancel.is_cancelled() {
        return Err(InstallError::Cancelled { stage });
    }
    tracing::debug!("{}", stage.description());
    sink.emit(InstallMessage::Stage(stage));
    Ok(())
}

/// Profile entry for a request. Opt-out flags become `-D<key>=true` JVM
/// arguments, but only for loaders that honour them.
fn build_profile(request: &InstallRequest, version_id: &str) -> LauncherProfile {
    let java_args = if request.loader_type.supports_opt_out() {
        request
            .opt_out_flags
            .iter()
            .filter(|(_, enabled)| **enabled)
            .map(|(key, _)| format!("-D{}=true", key))
            .collect()
    } else {
        Vec::new()
    };

    let key = request.loader_type.profile_key(&request.game_version);
    LauncherProfile {
        name: key.clone(),
        key,
        last_version_id: version_id.to_string(),
        java_args,
    }
}

/// Write `<id>.json` and an empty `<id>.jar` into the version directory.
async fn write_version_files(version_dir: &Path, version_id: &str, mut launch_json: Value) -> io::Result<()> {
    // The launcher resolves the entry by directory name, so the ids must match
    if let Some(object) = launch_json.as_object_mut() {
        object.insert("id".into(), version_id.into());
    }

    tokio::fs::create_dir_all(version_dir).await?;

    let json_path = version_dir.join(format!("{}.json", version_id));
    let temp_path = temp_path_for(&json_path);
    let content = serde_json::to_vec_pretty(&launch_json)?;
    tokio::fs::write(&temp_path, content).await?;
    tokio::fs::rename(&temp_path, &json_path).await?;

    // Launchers refuse entries without a jar next to the json
    let jar_path = version_dir.join(format!("{}.jar", version_id));
    tokio::fs::OpenOptions::new()
        .create(true)
        .truncate(false)
        .write(true)
        .open(&jar_path)
        .await?;

    tracing::info!("Wrote version entry {}", version_dir.display());
    Ok(())
}

/// `<id>.json.part` next to `<id>.json`
fn temp_path_for(json_path: &Path) -> PathBuf {
    json_path.with_extension(format!(
        "json{}",
        installer_config().launcher.temp_extension
    ))
}

async fn remove_if_present(path: &Path) -> io::Result<()> {
    match tokio::fs::remove_file(path).await {
        Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e),
        _ => Ok(()),
    }
}

async fn remove_tree(path: PathBuf) -> io::Result<()> {
    if !tokio::fs::try_exists(&path).await? {
        return Ok(());
    }
    tokio::task::spawn_blocking(move || remove_dir_all::remove_dir_all(&path))
        .await
        .map_err(io::Error::other)?
}

/// Everything a stopped run has to undo
#[derive(Default)]
struct Rollback {
    /// Launcher directory created by the pre-flight check
    created_install_dir: Option<PathBuf>,
    version: Option<VersionBackup>,
}

impl Rollback {
    fn is_empty(&self) -> bool {
        self.created_install_dir.is_none() && self.version.is_none()
    }

    async fn apply(self) -> io::Result<()> {
        if let Some(backup) = self.version {
            backup.rollback().await?;
        }
        // Did not exist before this run, so everything inside came from it
        if let Some(install_dir) = self.created_install_dir {
            remove_tree(install_dir).await?;
        }
        Ok(())
    }
}

/// What a version directory looked like before we wrote to it
struct VersionBackup {
    version_dir: PathBuf,
    json_path: PathBuf,
    jar_path: PathBuf,
    created_dir: bool,
    previous_json: Option<Vec<u8>>,
    had_jar: bool,
}

impl VersionBackup {
    async fn capture(version_dir: &Path, version_id: &str) -> io::Result<Self> {
        let json_path = version_dir.join(format!("{}.json", version_id));
        let jar_path = version_dir.join(format!("{}.jar", version_id));
        let created_dir = !tokio::fs::try_exists(version_dir).await?;
        let previous_json = match tokio::fs::read(&json_path).await {
            Ok(bytes) => Some(bytes),
            Err(e) if e.kind() == io::ErrorKind::NotFound => None,
            Err(e) => return Err(e),
        };
        let had_jar = tokio::fs::try_exists(&jar_path).await?;

        Ok(Self {
            version_dir: version_dir.to_path_buf(),
            json_path,
            jar_path,
            created_dir,
            previous_json,
            had_jar,
        })
    }

    /// Put the version directory back the way `capture` found it
    async fn rollback(self) -> io::Result<()> {
        if self.created_dir {
            return remove_tree(self.version_dir).await;
        }

        remove_if_present(&temp_path_for(&self.json_path)).await?;
        match self.previous_json {
            Some(previous) => tokio::fs::write(&self.json_path, previous).await?,
            None => remove_if_present(&self.json_path).await?,
        }
        if !self.had_jar {
            remove_if_present(&self.jar_path).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use std::fs;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use serde_json::json;
    use tempfile::TempDir;
    use tokio::sync::mpsc;

    use crate::install::ProfileError;
    use crate::loader::LoaderType;

    enum FetchMode {
        Ok(Value),
        NotFound,
        Unavailable,
        /// Cancel the given token, then never answer
        CancelAndHang(CancellationToken),
    }

    struct FakeArtifacts {
        mode: FetchMode,
        calls: AtomicUsize,
    }

    impl FakeArtifacts {
        fn new(mode: FetchMode) -> Self {
            Self {
                mode,
                calls: AtomicUsize::new(0),
            }
        }

        fn ok() -> Self {
            Self::new(FetchMode::Ok(json!({
                "id": "placeholder",
                "inheritsFrom": "1.20.1",
                "mainClass": "org.quiltmc.loader.impl.launch.knot.KnotClient"
            })))
        }
    }

    impl ArtifactSource for FakeArtifacts {
        async fn fetch_launch_json(
            &self,
            _loader: LoaderType,
            _game_version: &str,
            _loader_version: &str,
        ) -> Result<Value, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.mode {
                FetchMode::Ok(value) => Ok(value.clone()),
                FetchMode::NotFound => Err(FetchError::NotFound {
                    url: "https://meta.example/profile".into(),
                }),
                FetchMode::Unavailable => Err(FetchError::Status {
                    url: "https://meta.example/profile".into(),
                    status: 503,
                }),
                FetchMode::CancelAndHang(token) => {
                    token.cancel();
                    std::future::pending().await
                }
            }
        }
    }

    #[derive(Default)]
    struct FakeProfiles {
        fail: bool,
        calls: AtomicUsize,
        written: Mutex<Vec<LauncherProfile>>,
    }

    impl ProfileStore for FakeProfiles {
        async fn upsert_profile(
            &self,
            _install_dir: &Path,
            profile: &LauncherProfile,
        ) -> Result<(), ProfileError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(ProfileError::Malformed(PathBuf::from("launcher_profiles.json")));
            }
            self.written.lock().unwrap().push(profile.clone());
            Ok(())
        }
    }

    fn request(install_dir: &Path) -> InstallRequest {
        let mut opt_out_flags = BTreeMap::new();
        opt_out_flags.insert("loader.disable_beacon".to_string(), true);
        opt_out_flags.insert("loader.other".to_string(), false);
        InstallRequest {
            game_version: "1.20.1".into(),
            loader_type: LoaderType::Quilt,
            loader_version: "0.26.0".into(),
            install_dir: install_dir.to_path_buf(),
            generate_profile: true,
            opt_out_flags,
        }
    }

    fn drain(rx: &mut mpsc::UnboundedReceiver<InstallMessage>) -> Vec<InstallMessage> {
        let mut messages = Vec::new();
        while let Ok(message) = rx.try_recv() {
            messages.push(message);
        }
        messages
    }

    fn version_dir(install_dir: &Path) -> PathBuf {
        install_dir.join("versions").join("quilt-loader-0.26.0-1.20.1")
    }

    #[tokio::test]
    async fn test_successful_install_with_profile() {
        let temp_dir = TempDir::new().unwrap();
        let orchestrator = InstallOrchestrator::new(FakeArtifacts::ok(), FakeProfiles::default());
        let (tx, mut rx) = mpsc::unbounded_channel();

        let outcome = orchestrator
            .run(request(temp_dir.path()), &tx, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(outcome.version_id, "quilt-loader-0.26.0-1.20.1");
        assert_eq!(outcome.profile.as_deref(), Some("quilt-loader-1.20.1"));
        assert_eq!(
            drain(&mut rx),
            vec![
                InstallMessage::Started {
                    version_id: "quilt-loader-0.26.0-1.20.1".into()
                },
                InstallMessage::Stage(InstallStage::CheckingPath),
                InstallMessage::Stage(InstallStage::FetchingLaunchJson),
                InstallMessage::Stage(InstallStage::WritingVersion),
                InstallMessage::Stage(InstallStage::GeneratingProfile),
                InstallMessage::Completed {
                    version_id: "quilt-loader-0.26.0-1.20.1".into()
                },
            ]
        );

        let dir = version_dir(temp_dir.path());
        let written: Value =
            serde_json::from_str(&fs::read_to_string(dir.join("quilt-loader-0.26.0-1.20.1.json")).unwrap())
                .unwrap();
        assert_eq!(written["id"], "quilt-loader-0.26.0-1.20.1");
        assert_eq!(written["inheritsFrom"], "1.20.1");
        assert!(dir.join("quilt-loader-0.26.0-1.20.1.jar").exists());
        assert!(!dir.join("quilt-loader-0.26.0-1.20.1.json.part").exists());

        let profiles = orchestrator.profiles.written.lock().unwrap();
        assert_eq!(profiles.len(), 1);
        assert_eq!(profiles[0].last_version_id, "quilt-loader-0.26.0-1.20.1");
        assert_eq!(profiles[0].java_args, vec!["-Dloader.disable_beacon=true"]);
    }

    #[tokio::test]
    async fn test_no_profile_means_no_profile_calls() {
        let temp_dir = TempDir::new().unwrap();
        let orchestrator = InstallOrchestrator::new(FakeArtifacts::ok(), FakeProfiles::default());
        let (tx, mut rx) = mpsc::unbounded_channel();

        let mut req = request(temp_dir.path());
        req.generate_profile = false;
        let outcome = orchestrator
            .run(req, &tx, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(outcome.profile, None);
        assert_eq!(orchestrator.profiles.calls.load(Ordering::SeqCst), 0);
        let messages = drain(&mut rx);
        assert!(!messages.contains(&InstallMessage::Stage(InstallStage::GeneratingProfile)));
        assert!(matches!(messages.last(), Some(InstallMessage::Completed { .. })));
    }

    #[tokio::test]
    async fn test_opt_out_ignored_for_unsupported_loader() {
        let temp_dir = TempDir::new().unwrap();
        let orchestrator = InstallOrchestrator::new(FakeArtifacts::ok(), FakeProfiles::default());
        let (tx, _rx) = mpsc::unbounded_channel();

        let mut req = request(temp_dir.path());
        req.loader_type = LoaderType::Fabric;
        orchestrator
            .run(req, &tx, &CancellationToken::new())
            .await
            .unwrap();

        let profiles = orchestrator.profiles.written.lock().unwrap();
        assert_eq!(profiles[0].key, "fabric-loader-1.20.1");
        assert!(profiles[0].java_args.is_empty());
    }

    #[tokio::test]
    async fn test_unsupported_combination() {
        let temp_dir = TempDir::new().unwrap();
        let orchestrator = InstallOrchestrator::new(
            FakeArtifacts::new(FetchMode::NotFound),
            FakeProfiles::default(),
        );
        let (tx, mut rx) = mpsc::unbounded_channel();

        let err = orchestrator
            .run(request(temp_dir.path()), &tx, &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, InstallError::UnsupportedCombination { .. }));
        assert_eq!(err.stage(), InstallStage::FetchingLaunchJson);
        assert!(!version_dir(temp_dir.path()).exists());
        assert!(matches!(
            drain(&mut rx).last(),
            Some(InstallMessage::Failed {
                stage: InstallStage::FetchingLaunchJson,
                ..
            })
        ));
    }

    #[tokio::test]
    async fn test_network_failure_is_download_error() {
        let temp_dir = TempDir::new().unwrap();
        let orchestrator = InstallOrchestrator::new(
            FakeArtifacts::new(FetchMode::Unavailable),
            FakeProfiles::default(),
        );
        let (tx, _rx) = mpsc::unbounded_channel();

        let err = orchestrator
            .run(request(temp_dir.path()), &tx, &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            InstallError::ArtifactDownload {
                stage: InstallStage::FetchingLaunchJson,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_unwritable_path_stops_before_fetch() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("not-a-dir");
        fs::write(&file, b"x").unwrap();

        let orchestrator = InstallOrchestrator::new(FakeArtifacts::ok(), FakeProfiles::default());
        let (tx, _rx) = mpsc::unbounded_channel();

        let err = orchestrator
            .run(request(&file), &tx, &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, InstallError::PathNotWritable { .. }));
        assert_eq!(orchestrator.artifacts.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_cancel_before_start() {
        let temp_dir = TempDir::new().unwrap();
        let orchestrator = InstallOrchestrator::new(FakeArtifacts::ok(), FakeProfiles::default());
        let (tx, mut rx) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = orchestrator
            .run(request(temp_dir.path()), &tx, &cancel)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            InstallError::Cancelled {
                stage: InstallStage::CheckingPath
            }
        ));
        assert_eq!(orchestrator.artifacts.calls.load(Ordering::SeqCst), 0);
        let messages = drain(&mut rx);
        assert_eq!(
            messages.last(),
            Some(&InstallMessage::Cancelled {
                stage: InstallStage::CheckingPath
            })
        );
        assert!(!messages.iter().any(|m| matches!(m, InstallMessage::Completed { .. })));
    }

    #[tokio::test]
    async fn test_cancel_during_fetch() {
        let temp_dir = TempDir::new().unwrap();
        let cancel = CancellationToken::new();
        let orchestrator = InstallOrchestrator::new(
            FakeArtifacts::new(FetchMode::CancelAndHang(cancel.clone())),
            FakeProfiles::default(),
        );
        let (tx, mut rx) = mpsc::unbounded_channel();

        let err = orchestrator
            .run(request(temp_dir.path()), &tx, &cancel)
            .await
            .unwrap_err();

        assert_eq!(err.stage(), InstallStage::FetchingLaunchJson);
        assert!(err.is_cancelled());
        assert_eq!(orchestrator.profiles.calls.load(Ordering::SeqCst), 0);
        assert!(!version_dir(temp_dir.path()).exists());

        let messages = drain(&mut rx);
        assert_eq!(
            messages.last(),
            Some(&InstallMessage::Cancelled {
                stage: InstallStage::FetchingLaunchJson
            })
        );
        assert_eq!(messages.iter().filter(|m| m.is_terminal()).count(), 1);
    }

    #[tokio::test]
    async fn test_profile_failure_rolls_back_new_version() {
        let temp_dir = TempDir::new().unwrap();
        let profiles = FakeProfiles {
            fail: true,
            ..Default::default()
        };
        let orchestrator = InstallOrchestrator::new(FakeArtifacts::ok(), profiles);
        let (tx, mut rx) = mpsc::unbounded_channel();

        let err = orchestrator
            .run(request(temp_dir.path()), &tx, &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, InstallError::ProfileWrite(_)));
        assert_eq!(err.stage(), InstallStage::GeneratingProfile);
        assert!(!version_dir(temp_dir.path()).exists());
        assert!(matches!(
            drain(&mut rx).last(),
            Some(InstallMessage::Failed {
                stage: InstallStage::GeneratingProfile,
                ..
            })
        ));
    }

    #[tokio::test]
    async fn test_profile_failure_restores_previous_version_json() {
        let temp_dir = TempDir::new().unwrap();
        let dir = version_dir(temp_dir.path());
        fs::create_dir_all(&dir).unwrap();
        let json_path = dir.join("quilt-loader-0.26.0-1.20.1.json");
        fs::write(&json_path, b"{\"id\":\"previous\"}").unwrap();

        let profiles = FakeProfiles {
            fail: true,
            ..Default::default()
        };
        let orchestrator = InstallOrchestrator::new(FakeArtifacts::ok(), profiles);
        let (tx, _rx) = mpsc::unbounded_channel();

        orchestrator
            .run(request(temp_dir.path()), &tx, &CancellationToken::new())
            .await
            .unwrap_err();

        assert_eq!(fs::read_to_string(&json_path).unwrap(), "{\"id\":\"previous\"}");
    }

    #[tokio::test]
    async fn test_failure_in_existing_version_dir_removes_new_files() {
        let temp_dir = TempDir::new().unwrap();
        let dir = version_dir(temp_dir.path());
        fs::create_dir_all(&dir).unwrap();

        let profiles = FakeProfiles {
            fail: true,
            ..Default::default()
        };
        let orchestrator = InstallOrchestrator::new(FakeArtifacts::ok(), profiles);
        let (tx, _rx) = mpsc::unbounded_channel();

        let err = orchestrator
            .run(request(temp_dir.path()), &tx, &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, InstallError::ProfileWrite(_)));

        // The directory predates the run and stays; nothing the run wrote does
        assert!(dir.is_dir());
        let leftover: Vec<_> = fs::read_dir(&dir).unwrap().collect();
        assert!(leftover.is_empty());
    }

    #[tokio::test]
    async fn test_failure_keeps_existing_jar() {
        let temp_dir = TempDir::new().unwrap();
        let dir = version_dir(temp_dir.path());
        fs::create_dir_all(&dir).unwrap();
        let jar_path = dir.join("quilt-loader-0.26.0-1.20.1.jar");
        fs::write(&jar_path, b"").unwrap();

        let profiles = FakeProfiles {
            fail: true,
            ..Default::default()
        };
        let orchestrator = InstallOrchestrator::new(FakeArtifacts::ok(), profiles);
        let (tx, _rx) = mpsc::unbounded_channel();

        orchestrator
            .run(request(temp_dir.path()), &tx, &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(jar_path.exists());
        assert!(!dir.join("quilt-loader-0.26.0-1.20.1.json").exists());
    }

    /// Forwards messages and cancels once the version entry is being written
    struct CancelOnStage {
        stage: InstallStage,
        cancel: CancellationToken,
        tx: mpsc::UnboundedSender<InstallMessage>,
    }

    impl MessageSink for CancelOnStage {
        fn emit(&self, message: InstallMessage) {
            if message == InstallMessage::Stage(self.stage) {
                self.cancel.cancel();
            }
            self.tx.emit(message);
        }
    }

    #[tokio::test]
    async fn test_cancel_after_version_written_rolls_back() {
        let temp_dir = TempDir::new().unwrap();
        let orchestrator = InstallOrchestrator::new(FakeArtifacts::ok(), FakeProfiles::default());
        let (tx, mut rx) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();
        let sink = CancelOnStage {
            stage: InstallStage::WritingVersion,
            cancel: cancel.clone(),
            tx,
        };

        let err = orchestrator
            .run(request(temp_dir.path()), &sink, &cancel)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            InstallError::Cancelled {
                stage: InstallStage::GeneratingProfile
            }
        ));
        assert_eq!(orchestrator.profiles.calls.load(Ordering::SeqCst), 0);
        assert!(!version_dir(temp_dir.path()).exists());

        let messages = drain(&mut rx);
        assert!(messages.contains(&InstallMessage::Stage(InstallStage::WritingVersion)));
        assert_eq!(
            messages.last(),
            Some(&InstallMessage::Cancelled {
                stage: InstallStage::GeneratingProfile
            })
        );
        assert!(!messages.iter().any(|m| matches!(m, InstallMessage::Completed { .. })));
    }

    #[tokio::test]
    async fn test_failure_removes_created_install_dir() {
        let temp_dir = TempDir::new().unwrap();
        let install_dir = temp_dir.path().join(".minecraft");

        let profiles = FakeProfiles {
            fail: true,
            ..Default::default()
        };
        let orchestrator = InstallOrchestrator::new(FakeArtifacts::ok(), profiles);
        let (tx, _rx) = mpsc::unbounded_channel();

        orchestrator
            .run(request(&install_dir), &tx, &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(!install_dir.exists());
    }

    #[tokio::test]
    async fn test_success_keeps_created_install_dir() {
        let temp_dir = TempDir::new().unwrap();
        let install_dir = temp_dir.path().join(".minecraft");
        let orchestrator = InstallOrchestrator::new(FakeArtifacts::ok(), FakeProfiles::default());
        let (tx, _rx) = mpsc::unbounded_channel();

        orchestrator
            .run(request(&install_dir), &tx, &CancellationToken::new())
            .await
            .unwrap();

        assert!(version_dir(&install_dir).join("quilt-loader-0.26.0-1.20.1.jar").exists());
    }
}
