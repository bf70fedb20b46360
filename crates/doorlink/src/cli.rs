use std::path::PathBuf;

use clap::{ArgAction, Parser};

/// Bridge an HTTP-controlled door (and optional light) to a smart-home
/// consumer, reconciling observed device state against requested state.
#[derive(Debug, Parser)]
#[command(name = "doorlink", version, about)]
pub struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long, env = "DOORLINK_CONFIG", default_value = "doorlink.toml")]
    pub config: PathBuf,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}
