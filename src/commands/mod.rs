//! CLI command definitions and argument parsing.
//!
//! This module defines all the CLI commands and their arguments using the clap
//! builder API, split into one file per command group.

use clap::{ArgMatches, Command};

pub mod auth;
pub mod config;
pub mod params;

pub use params::{
    COMMAND_CONFIG, COMMAND_GET, COMMAND_LOGIN, COMMAND_LOGOUT, COMMAND_PATH,
    PARAMETER_NON_INTERACTIVE, PARAMETER_VERBOSE,
};

/// Build the complete command tree without parsing anything.
pub fn build_cli() -> Command {
    Command::new(env!("CARGO_PKG_NAME"))
        .version(env!("CARGO_PKG_VERSION"))
        .author(env!("CARGO_PKG_AUTHORS"))
        .about(env!("CARGO_PKG_DESCRIPTION"))
        .propagate_version(true)
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(params::verbose_parameter())
        .arg(params::non_interactive_parameter())
        .subcommand(auth::login_command())
        .subcommand(auth::logout_command())
        .subcommand(config::config_command())
}

/// Parse the process arguments against the command tree.
pub fn create_cli_commands() -> ArgMatches {
    build_cli().get_matches()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_tree_is_valid() {
        build_cli().debug_assert();
    }

    #[test]
    fn test_non_interactive_flag_is_global() {
        let matches = build_cli()
            .try_get_matches_from(["fbcli", "login", "--non-interactive"])
            .unwrap();
        let (name, sub_matches) = matches.subcommand().unwrap();
        assert_eq!(name, COMMAND_LOGIN);
        assert!(sub_matches.get_flag(PARAMETER_NON_INTERACTIVE));
    }

    #[test]
    fn test_login_defaults_to_interactive() {
        let matches = build_cli().try_get_matches_from(["fbcli", "login"]).unwrap();
        assert!(!matches.get_flag(PARAMETER_NON_INTERACTIVE));
    }

    #[test]
    fn test_config_get_path() {
        let matches = build_cli()
            .try_get_matches_from(["fbcli", "config", "get", "path"])
            .unwrap();
        let (name, sub_matches) = matches.subcommand().unwrap();
        assert_eq!(name, COMMAND_CONFIG);
        let (name, sub_matches) = sub_matches.subcommand().unwrap();
        assert_eq!(name, COMMAND_GET);
        assert_eq!(sub_matches.subcommand_name(), Some(COMMAND_PATH));
    }
}
