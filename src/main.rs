mod app_data;
mod cli;
mod config;
mod install;
mod loader;
mod manifest;
mod meta;
mod paths;
mod selection;
mod session;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = cli::Cli::parse();

    // Logs go to stderr so --json output on stdout stays machine readable
    let default_filter = if cli.output.verbose {
        "loadstone=debug,info"
    } else {
        "loadstone=info,warn"
    };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| default_filter.into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    tracing::debug!("Starting Loadstone {}", env!("CARGO_PKG_VERSION"));

    cli::run(cli).await
}
