//! Paths command

use std::path::PathBuf;

use anyhow::Result;
use serde::Serialize;

use crate::cli::output::{print_formatted, OutputFormat};
use crate::config::Config;
use crate::install::LauncherProfilesFile;
use crate::paths::resolve_default_install_dir;

#[derive(Serialize)]
struct PathsResult {
    config_file: PathBuf,
    default_install_dir: PathBuf,
    install_dir: PathBuf,
    profiles_file: PathBuf,
}

pub async fn run(format: OutputFormat) -> Result<()> {
    let config = Config::load()?;
    let default_install_dir = resolve_default_install_dir()?;
    let install_dir = config
        .installer
        .install_dir
        .as_ref()
        .map(PathBuf::from)
        .unwrap_or_else(|| default_install_dir.clone());

    let result = PathsResult {
        config_file: Config::config_path()?,
        profiles_file: LauncherProfilesFile::path(&install_dir),
        default_install_dir,
        install_dir,
    };

    print_formatted(&result, format, |r| {
        [
            format!("Config file:      {}", r.config_file.display()),
            format!("Default launcher: {}", r.default_install_dir.display()),
            format!("Install into:     {}", r.install_dir.display()),
            format!("Profiles file:    {}", r.profiles_file.display()),
        ]
        .join("\n")
    });

    Ok(())
}
