//! Command handlers.

use guildkeep::{Guildkeep, GuildkeepConfig, GuildkeepResult};
use std::time::Duration;
use tracing::{info, instrument, warn};

/// Print `config` as TOML on stdout.
pub fn print_config(config: &GuildkeepConfig) -> GuildkeepResult<()> {
    println!("{}", config.to_toml()?);
    Ok(())
}

/// Run the services until Ctrl-C.
#[instrument(skip(config))]
pub async fn serve(config: GuildkeepConfig, health_interval: u64) -> GuildkeepResult<()> {
    let guildkeep = Guildkeep::builder(config).start().await?;
    log_health(&guildkeep);

    let mut shutdown = std::pin::pin!(tokio::signal::ctrl_c());
    if health_interval == 0 {
        if let Err(e) = shutdown.await {
            warn!(error = %e, "Failed to listen for Ctrl-C, shutting down");
        }
    } else {
        let period = Duration::from_secs(health_interval);
        let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
        loop {
            tokio::select! {
                _ = ticker.tick() => log_health(&guildkeep),
                signal = &mut shutdown => {
                    if let Err(e) = signal {
                        warn!(error = %e, "Failed to listen for Ctrl-C, shutting down");
                    }
                    break;
                }
            }
        }
    }

    info!("Received shutdown signal");
    guildkeep.shutdown();
    Ok(())
}

fn log_health(guildkeep: &Guildkeep) {
    let health = guildkeep.health();
    info!(
        entity = %health.failover.entity.mode,
        cache = %health.failover.cache.mode,
        volatile_guilds = health.volatile.guilds,
        volatile_users = health.volatile.users,
        cache_entries = health.cache_entries,
        "Health"
    );
}
