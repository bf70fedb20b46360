mod cli;
mod sink;

use std::sync::Arc;

use clap::Parser;
use thiserror::Error;
use tracing::info;
use tracing_subscriber::EnvFilter;

use doorlink_config::{LoadError, RawConfig};
use doorlink_core::{CoreError, DoorController};

use crate::cli::Cli;
use crate::sink::LogSink;

#[derive(Debug, Error)]
enum AppError {
    #[error(transparent)]
    Config(#[from] LoadError),

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("failed waiting for shutdown signal: {0}")]
    Signal(#[from] std::io::Error),
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(err) = run(cli).await {
        eprintln!("{err}");
        std::process::exit(1);
    }
}

fn init_tracing(verbosity: u8) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();
}

async fn run(cli: Cli) -> Result<(), AppError> {
    let device = RawConfig::load(&cli.config)?
        .validate()
        .map_err(LoadError::from)?;

    info!(
        name = %device.name,
        host = %device.endpoint.host,
        polled = device.has_states(),
        "configuration loaded"
    );

    let controller = DoorController::new(device, Arc::new(LogSink))?;
    controller.start().await;

    tokio::signal::ctrl_c().await?;
    info!("shutting down");
    controller.shutdown().await;

    Ok(())
}
