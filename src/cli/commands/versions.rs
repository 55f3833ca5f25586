//! Version listing commands

use std::collections::HashSet;

use anyhow::{Context, Result};
use clap::Subcommand;
use serde::Serialize;

use crate::cli::output::{print_formatted, OutputFormat};
use crate::config::Config;
use crate::loader::LoaderType;
use crate::manifest::{filter_game_versions, filter_loader_versions, LoaderCatalogs, Stability};
use crate::meta::{MetaClient, VersionSource};

#[derive(Subcommand, Debug)]
pub enum VersionsCommands {
    /// List game versions that can be installed to
    Game {
        /// Include snapshots and pre-releases
        #[arg(long)]
        snapshots: bool,

        /// Include versions without intermediary mappings
        #[arg(long)]
        all: bool,

        /// Maximum number of versions to show
        #[arg(long, default_value = "20")]
        limit: usize,
    },

    /// List loader versions
    Loader {
        /// Loader type (uses configured loader if not specified)
        #[arg(long)]
        loader: Option<LoaderType>,

        /// Include beta versions
        #[arg(long)]
        betas: bool,

        /// Maximum number of versions to show
        #[arg(long, default_value = "20")]
        limit: usize,
    },
}

#[derive(Serialize)]
struct GameEntry {
    id: String,
    snapshot: bool,
    latest: bool,
}

#[derive(Serialize)]
struct GameVersionsResult {
    latest_release: Option<String>,
    versions: Vec<GameEntry>,
}

#[derive(Serialize)]
struct LoaderVersionsResult {
    loader: LoaderType,
    versions: Vec<LoaderEntry>,
}

#[derive(Serialize)]
struct LoaderEntry {
    id: String,
    stability: Stability,
}

pub async fn run(command: VersionsCommands, format: OutputFormat, _quiet: bool) -> Result<()> {
    match command {
        VersionsCommands::Game {
            snapshots,
            all,
            limit,
        } => game(snapshots, all, limit, format).await,
        VersionsCommands::Loader {
            loader,
            betas,
            limit,
        } => loader_versions(loader, betas, limit, format).await,
    }
}

async fn game(snapshots: bool, all: bool, limit: usize, format: OutputFormat) -> Result<()> {
    let config = Config::load()?;
    let client = MetaClient::new(config.network.timeout())?;

    let manifest = client
        .fetch_version_manifest()
        .await
        .context("Failed to fetch the game version manifest")?;
    let mut versions = filter_game_versions(&manifest, snapshots || config.installer.show_snapshots);

    if !all {
        let allowed: HashSet<String> = client
            .fetch_intermediary_versions()
            .await
            .context("Failed to fetch intermediary versions")?
            .into_iter()
            .collect();
        versions.retain(|v| allowed.contains(&v.id));
    }

    let latest_release = manifest.latest.release.clone();
    let result = GameVersionsResult {
        versions: versions
            .into_iter()
            .take(limit)
            .map(|v| GameEntry {
                latest: latest_release.as_deref() == Some(v.id.as_str()),
                snapshot: v.is_snapshot(),
                id: v.id,
            })
            .collect(),
        latest_release,
    };

    print_formatted(&result, format, |r| {
        if r.versions.is_empty() {
            return "No game versions match the current filters.".to_string();
        }
        let mut lines = vec![format!("{:<24} {}", "VERSION", "TYPE"), "-".repeat(40)];
        for entry in &r.versions {
            let kind = if entry.snapshot { "snapshot" } else { "release" };
            let marker = if entry.latest { " (latest)" } else { "" };
            lines.push(format!("{:<24} {}{}", entry.id, kind, marker));
        }
        lines.join("\n")
    });

    Ok(())
}

async fn loader_versions(
    loader: Option<LoaderType>,
    betas: bool,
    limit: usize,
    format: OutputFormat,
) -> Result<()> {
    let config = Config::load()?;
    let loader = loader.unwrap_or(config.installer.loader);
    let client = MetaClient::new(config.network.timeout())?;

    let catalog = client
        .fetch_loader_versions(loader)
        .await
        .with_context(|| format!("Failed to fetch {} versions", loader))?;
    let mut catalogs = LoaderCatalogs::new();
    catalogs.insert(loader, catalog);

    let versions = filter_loader_versions(&catalogs, loader, betas || config.installer.show_loader_betas);
    let result = LoaderVersionsResult {
        loader,
        versions: versions
            .into_iter()
            .take(limit)
            .map(|v| LoaderEntry {
                id: v.id,
                stability: v.stability,
            })
            .collect(),
    };

    print_formatted(&result, format, |r| {
        if r.versions.is_empty() {
            return format!("No {} versions match the current filters.", r.loader);
        }
        let mut lines = vec![format!("Available {} versions:\n", r.loader)];
        for entry in &r.versions {
            let marker = match entry.stability {
                Stability::Stable => "",
                Stability::Beta => " (beta)",
            };
            lines.push(format!("  {}{}", entry.id, marker));
        }
        lines.join("\n")
    });

    Ok(())
}
