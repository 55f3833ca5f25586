//! Install command
//!
//! Drives one selection session from the command line: load catalogs, apply
//! the requested choices, submit and follow the install until it finishes.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;

use crate::cli::output::{
    is_interactive, print_formatted, print_success, print_warning, should_show_progress,
    OutputFormat,
};
use crate::cli::prompt::{choose_directory, confirm};
use crate::config::Config;
use crate::install::{
    InstallError, InstallMessage, InstallOrchestrator, InstallOutcome, LauncherProfilesFile,
};
use crate::loader::LoaderType;
use crate::meta::MetaClient;
use crate::paths::resolve_default_install_dir;
use crate::selection::{InstallRequest, SelectionError, SelectionState};
use crate::session::{load_manifests, submit_install};

/// Opt-out key set by `--disable-beacon`
const DISABLE_BEACON_KEY: &str = "loader.disable_beacon";

#[derive(Args, Debug)]
pub struct InstallArgs {
    /// Game version (latest available if not specified)
    #[arg(long)]
    pub game: Option<String>,

    /// Loader type (uses configured loader if not specified)
    #[arg(long)]
    pub loader: Option<LoaderType>,

    /// Loader version (latest available if not specified)
    #[arg(long)]
    pub loader_version: Option<String>,

    /// Offer snapshots and pre-releases
    #[arg(long)]
    pub snapshots: bool,

    /// Offer beta loader versions
    #[arg(long)]
    pub betas: bool,

    /// Launcher directory to install into
    #[arg(long)]
    pub dir: Option<PathBuf>,

    /// Ask for the launcher directory interactively
    #[arg(long, conflicts_with = "dir")]
    pub choose_dir: bool,

    /// Do not create or update a launcher profile
    #[arg(long)]
    pub no_profile: bool,

    /// Opt out of the loader's usage beacon
    #[arg(long)]
    pub disable_beacon: bool,

    /// Set a loader opt-out flag (repeatable)
    #[arg(long = "opt-out", value_name = "KEY")]
    pub opt_out: Vec<String>,

    /// Show the request without installing
    #[arg(long)]
    pub dry_run: bool,
}

pub async fn run(args: InstallArgs, format: OutputFormat, quiet: bool) -> Result<()> {
    let config = Config::load()?;

    let configured_dir = config.installer.install_dir.as_ref().map(PathBuf::from);
    let install_dir = match args.dir.clone().or(configured_dir) {
        Some(dir) => dir,
        None => resolve_default_install_dir()?,
    };
    let client = MetaClient::new(config.network.timeout())?;
    let interactive = is_interactive(quiet, format);

    let mut state = SelectionState::new(config.installer.loader, install_dir);
    while let Err(e) = load_manifests(&client, &mut state).await {
        let reason = state.load_error().unwrap_or("unknown error").to_string();
        if interactive && ask(format!("Could not load version lists ({}). Retry?", reason)).await? {
            continue;
        }
        return Err(anyhow::Error::new(e).context("Failed to load version lists"));
    }

    apply_choices(&mut state, &args, &config, quiet)?;

    if args.choose_dir {
        let current = state.install_path().to_string_lossy().to_string();
        let answer = tokio::task::spawn_blocking(move || choose_directory(&current))
            .await
            .context("Directory prompt panicked")??;
        if let Some(dir) = answer {
            state.set_install_path(dir)?;
        }
    }

    tracing::debug!(
        "Selection {:?}: {} {} for {} ({} game versions, {} loader versions offered, profile: {})",
        state.phase(),
        state.loader_type(),
        state.loader_version().unwrap_or("-"),
        state.game_version().unwrap_or("-"),
        state.game_versions().len(),
        state.loader_versions().len(),
        state.generate_profile()
    );

    if args.dry_run {
        let request = state.submit()?;
        print_formatted(&request, format, describe_request);
        return Ok(());
    }

    let orchestrator = Arc::new(InstallOrchestrator::new(client, LauncherProfilesFile));
    let show_progress = should_show_progress(quiet, format);

    let outcome = loop {
        let request = state.submit()?;
        match follow_install(Arc::clone(&orchestrator), request, show_progress, quiet).await? {
            Ok(outcome) => break outcome,
            Err(e) if !e.is_cancelled() && interactive => {
                if !ask(format!("{}. Try again?", e)).await? {
                    return Err(e.into());
                }
                state.new_request();
            }
            Err(e) => return Err(e.into()),
        }
    };

    if format == OutputFormat::Text {
        print_success(&format!("Installed {}", outcome.version_id), quiet);
    }
    if !quiet || format == OutputFormat::Json {
        print_formatted(&outcome, format, |o| {
            let mut lines = vec![format!("Version files: {}", o.version_dir.display())];
            match &o.profile {
                Some(key) => lines.push(format!("Launcher profile: {}", key)),
                None => lines.push("Launcher profile: not written".to_string()),
            }
            lines.join("\n")
        });
    }

    Ok(())
}

/// Run one request, streaming progress until the install finishes.
///
/// The outer error means the install task itself died.
async fn follow_install(
    orchestrator: Arc<InstallOrchestrator<MetaClient, LauncherProfilesFile>>,
    request: InstallRequest,
    show_progress: bool,
    quiet: bool,
) -> Result<Result<InstallOutcome, InstallError>> {
    let mut task = submit_install(orchestrator, request);

    let mut cancel_requested = false;
    loop {
        tokio::select! {
            message = task.next_message() => {
                let Some(message) = message else { break };
                report(&message, show_progress);
                // Past the terminal message Ctrl-C no longer needs intercepting
                cancel_requested |= message.is_terminal();
            }
            signal = tokio::signal::ctrl_c(), if !cancel_requested => {
                if let Err(e) = signal {
                    tracing::warn!("Failed to listen for Ctrl-C: {}", e);
                }
                cancel_requested = true;
                print_warning("Cancelling install...", quiet);
                task.cancel();
            }
        }
    }

    task.wait().await.context("Install task panicked")
}

async fn ask(question: String) -> Result<bool> {
    tokio::task::spawn_blocking(move || confirm(&question))
        .await
        .context("Prompt panicked")?
}

/// Apply command line choices on top of the configured defaults
fn apply_choices(
    state: &mut SelectionState,
    args: &InstallArgs,
    config: &Config,
    quiet: bool,
) -> Result<()> {
    if let Some(loader) = args.loader {
        state.set_loader_type(loader)?;
    }
    state.set_show_snapshots(args.snapshots || config.installer.show_snapshots)?;
    state.set_show_loader_betas(args.betas || config.installer.show_loader_betas)?;

    if let Some(game) = &args.game {
        state.set_game_version(game).map_err(|e| {
            let hint = match state.manifest_version(game) {
                Some(v) if v.is_snapshot() && !state.show_snapshots() => {
                    Some("pass --snapshots to include snapshots")
                }
                Some(_) => Some("no intermediary mappings are published for it"),
                None => None,
            };
            match hint {
                Some(hint) if matches!(e, SelectionError::UnknownGameVersion(_)) => {
                    anyhow::anyhow!("{} ({})", e, hint)
                }
                _ => e.into(),
            }
        })?;
    }
    if let Some(version) = &args.loader_version {
        state.set_loader_version(version).map_err(|e| match e {
            SelectionError::UnknownLoaderVersion(_) if !state.show_loader_betas() => {
                anyhow::anyhow!("{} (pass --betas to include beta versions)", e)
            }
            e => e.into(),
        })?;
    }

    state.set_generate_profile(config.installer.generate_profile && !args.no_profile)?;

    for (key, value) in &config.installer.opt_out {
        state.set_opt_out(key.clone(), *value)?;
    }
    for key in &args.opt_out {
        state.set_opt_out(key.clone(), true)?;
    }
    if args.disable_beacon {
        state.set_opt_out(DISABLE_BEACON_KEY, true)?;
    }

    let any_opt_out = state.opt_out_flags().values().any(|v| *v);
    if any_opt_out && !state.opt_out_applicable() {
        print_warning(
            &format!("{} does not support opt-out flags; they will be ignored", state.loader_type()),
            quiet,
        );
    }

    Ok(())
}

fn report(message: &InstallMessage, show_progress: bool) {
    match message {
        InstallMessage::Started { version_id } => {
            tracing::debug!("Install of {} started", version_id);
        }
        InstallMessage::Stage(stage) => {
            if show_progress {
                eprintln!("{}", stage.description());
            }
        }
        InstallMessage::Completed { version_id } => {
            tracing::debug!("Install of {} completed", version_id);
        }
        InstallMessage::Failed { stage, reason } => {
            tracing::debug!("Install failed while {}: {}", stage, reason);
        }
        InstallMessage::Cancelled { stage } => {
            if show_progress {
                eprintln!("Cancelled while {}", stage);
            }
        }
    }
}

fn describe_request(request: &InstallRequest) -> String {
    let mut lines = vec![
        "Dry run - would install:".to_string(),
        format!("  Loader: {} {}", request.loader_type, request.loader_version),
        format!("  Game version: {}", request.game_version),
        format!("  Install into: {}", request.install_dir.display()),
        format!("  Launcher profile: {}", if request.generate_profile { "yes" } else { "no" }),
    ];
    let flags: Vec<&str> = request
        .opt_out_flags
        .iter()
        .filter(|(_, on)| **on)
        .map(|(key, _)| key.as_str())
        .collect();
    if !flags.is_empty() {
        let note = if request.loader_type.supports_opt_out() { "" } else { " (ignored)" };
        lines.push(format!("  Opt-out: {}{}", flags.join(", "), note));
    }
    lines.join("\n")
}
