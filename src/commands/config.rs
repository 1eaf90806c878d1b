//! Configuration command definitions.

use crate::commands::params::{COMMAND_CONFIG, COMMAND_GET, COMMAND_PATH};
use clap::Command;

/// Create the configuration command with all its subcommands.
pub fn config_command() -> Command {
    Command::new(COMMAND_CONFIG)
        .about("Configuration operations")
        .subcommand_required(true)
        .subcommand(
            Command::new(COMMAND_GET)
                .about("Get configuration details")
                .subcommand_required(true)
                .subcommand(Command::new(COMMAND_PATH).about("Show the configuration file path")),
        )
}
