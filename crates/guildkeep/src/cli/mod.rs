//! Command-line interface for the guildkeep binary.

mod commands;
mod serve;

pub use commands::{Cli, Commands};
pub use serve::{print_config, serve};
