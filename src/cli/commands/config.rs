//! Configuration management commands

use anyhow::{Context, Result};
use clap::Subcommand;
use serde::Serialize;

use crate::cli::output::{print_formatted, print_success, OutputFormat};
use crate::config::Config;
use crate::loader::LoaderType;

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show current configuration
    Show,

    /// Get a specific config value
    Get {
        /// Config key (e.g., "installer.loader", "network.timeout_secs")
        key: String,
    },

    /// Set a config value
    Set {
        /// Config key (e.g., "installer.loader", "installer.opt_out.loader.disable_beacon")
        key: String,

        /// Value to set
        value: String,
    },

    /// Show config file path
    Path,
}

#[derive(Serialize)]
struct ConfigPathResult {
    path: String,
    exists: bool,
}

pub async fn run(command: ConfigCommands, format: OutputFormat, quiet: bool) -> Result<()> {
    match command {
        ConfigCommands::Show => show(format).await,
        ConfigCommands::Get { key } => get(&key, format).await,
        ConfigCommands::Set { key, value } => set(&key, &value, quiet).await,
        ConfigCommands::Path => path(format).await,
    }
}

async fn show(format: OutputFormat) -> Result<()> {
    let config = Config::load()?;

    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&config)?;
            println!("{}", json);
        }
        OutputFormat::Text => {
            let toml = toml::to_string_pretty(&config)?;
            println!("{}", toml);
        }
    }

    Ok(())
}

async fn get(key: &str, format: OutputFormat) -> Result<()> {
    let config = Config::load()?;
    let value = get_config_value(&config, key)?;

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string(&value)?);
        }
        OutputFormat::Text => {
            println!("{}", value);
        }
    }

    Ok(())
}

// Opt-out keys may themselves contain dots, so only the first two
// separators are structural.
fn get_config_value(config: &Config, key: &str) -> Result<String> {
    let parts: Vec<&str> = key.splitn(3, '.').collect();

    match parts.as_slice() {
        ["installer", "loader"] => Ok(config.installer.loader.key().to_string()),
        ["installer", "show_snapshots"] => Ok(config.installer.show_snapshots.to_string()),
        ["installer", "show_loader_betas"] => Ok(config.installer.show_loader_betas.to_string()),
        ["installer", "generate_profile"] => Ok(config.installer.generate_profile.to_string()),
        ["installer", "install_dir"] => Ok(config
            .installer
            .install_dir
            .clone()
            .unwrap_or_else(|| "<not set>".to_string())),
        ["installer", "opt_out", flag] => Ok(config
            .installer
            .opt_out
            .get(*flag)
            .map(bool::to_string)
            .unwrap_or_else(|| "<not set>".to_string())),
        ["network", "timeout_secs"] => Ok(config.network.timeout_secs.to_string()),
        _ => anyhow::bail!("Unknown config key: {}", key),
    }
}

async fn set(key: &str, value: &str, quiet: bool) -> Result<()> {
    let mut config = Config::load()?;

    set_config_value(&mut config, key, value)?;
    config.save()?;

    print_success(&format!("Set {} = {}", key, value), quiet);
    Ok(())
}

fn set_config_value(config: &mut Config, key: &str, value: &str) -> Result<()> {
    let parts: Vec<&str> = key.splitn(3, '.').collect();

    match parts.as_slice() {
        ["installer", "loader"] => {
            config.installer.loader = value.parse::<LoaderType>().map_err(anyhow::Error::msg)?;
        }
        ["installer", "show_snapshots"] => {
            config.installer.show_snapshots = parse_bool(key, value)?;
        }
        ["installer", "show_loader_betas"] => {
            config.installer.show_loader_betas = parse_bool(key, value)?;
        }
        ["installer", "generate_profile"] => {
            config.installer.generate_profile = parse_bool(key, value)?;
        }
        ["installer", "install_dir"] => {
            let value = value.trim();
            config.installer.install_dir = (!value.is_empty()).then(|| value.to_string());
        }
        ["installer", "opt_out", flag] if !flag.is_empty() => {
            config
                .installer
                .opt_out
                .insert(flag.to_string(), parse_bool(key, value)?);
        }
        ["network", "timeout_secs"] => {
            config.network.timeout_secs = value
                .parse()
                .with_context(|| format!("{} expects a number of seconds", key))?;
        }
        _ => anyhow::bail!("Unknown or read-only config key: {}", key),
    }

    Ok(())
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    value
        .parse()
        .with_context(|| format!("{} expects true or false, got '{}'", key, value))
}

async fn path(format: OutputFormat) -> Result<()> {
    let path = Config::config_path()?;
    let exists = path.exists();

    let result = ConfigPathResult {
        path: path.to_string_lossy().to_string(),
        exists,
    };

    print_formatted(&result, format, |r| {
        format!("{}{}", r.path, if r.exists { "" } else { " (not found)" })
    });

    Ok(())
}
