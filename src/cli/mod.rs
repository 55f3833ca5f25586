//! CLI module for Loadstone
//!
//! Provides the command-line front end for browsing versions and installing.

mod commands;
mod output;
mod prompt;

use clap::{Parser, Subcommand};

pub use output::OutputFormat;

/// Loadstone - Quilt and Fabric client installer
#[derive(Parser, Debug)]
#[command(name = "loadstone")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Output format
    #[command(flatten)]
    pub output: OutputOptions,

    #[command(subcommand)]
    pub command: Commands,
}

/// Output formatting options
#[derive(Parser, Debug, Clone)]
pub struct OutputOptions {
    /// Output in JSON format (for machine parsing)
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Increase output verbosity
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

impl OutputOptions {
    pub fn format(&self) -> OutputFormat {
        if self.json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List available game and loader versions
    Versions {
        #[command(subcommand)]
        command: commands::versions::VersionsCommands,
    },

    /// Install a mod loader into the launcher
    Install(commands::install::InstallArgs),

    /// Show data paths (config file, launcher directory)
    Paths,

    /// Configuration management
    Config {
        #[command(subcommand)]
        command: commands::config::ConfigCommands,
    },
}

/// Run the CLI with parsed arguments
pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let format = cli.output.format();
    let quiet = cli.output.quiet;

    match cli.command {
        Commands::Versions { command } => commands::versions::run(command, format, quiet).await,
        Commands::Install(args) => commands::install::run(args, format, quiet).await,
        Commands::Paths => commands::paths::run(format).await,
        Commands::Config { command } => commands::config::run(command, format, quiet).await,
    }
}
