//! CLI command definitions.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Guildkeep - failover-aware persistence and rate governance for multi-guild bots
#[derive(Parser, Debug)]
#[command(name = "guildkeep")]
#[command(about = "Failover-aware persistence and rate governance for multi-guild bots", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file to use instead of the standard search path
    #[arg(short, long, global = true, env = "GUILDKEEP_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the effective configuration as TOML
    Config,

    /// Start the services and run maintenance until interrupted
    Serve {
        /// Seconds between health reports in the log (0 disables them)
        #[arg(long, default_value = "300")]
        health_interval: u64,
    },
}
