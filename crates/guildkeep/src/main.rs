//! Guildkeep CLI binary.
//!
//! - `guildkeep config` prints the effective configuration
//! - `guildkeep serve` runs the services until Ctrl-C

use clap::Parser;
use guildkeep::{GuildkeepConfig, GuildkeepResult, init_observability};

mod cli;

#[tokio::main]
async fn main() -> GuildkeepResult<()> {
    use cli::{Cli, Commands, print_config, serve};

    // A missing .env file is fine
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => GuildkeepConfig::from_file(path)?,
        None => GuildkeepConfig::load()?,
    };

    match cli.command {
        Commands::Config => print_config(&config)?,
        Commands::Serve { health_interval } => {
            let mut observability = config.observability.clone();
            if cli.verbose {
                observability = observability.with_log_level("debug");
            }
            init_observability(&observability)?;
            serve(config, health_interval).await?;
        }
    }

    Ok(())
}
