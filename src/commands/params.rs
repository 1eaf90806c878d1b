//! Shared command parameters for all CLI commands.

use clap::{Arg, ArgAction};

// Auth commands
pub const COMMAND_LOGIN: &str = "login";
pub const COMMAND_LOGOUT: &str = "logout";

// Config commands
pub const COMMAND_CONFIG: &str = "config";
pub const COMMAND_GET: &str = "get";
pub const COMMAND_PATH: &str = "path";

// Global parameter names
pub const PARAMETER_NON_INTERACTIVE: &str = "non-interactive";
pub const PARAMETER_VERBOSE: &str = "verbose";

pub fn non_interactive_parameter() -> Arg {
    Arg::new(PARAMETER_NON_INTERACTIVE)
        .long(PARAMETER_NON_INTERACTIVE)
        .action(ArgAction::SetTrue)
        .global(true)
        .help("Fail instead of prompting or waiting for user interaction")
}

pub fn verbose_parameter() -> Arg {
    Arg::new(PARAMETER_VERBOSE)
        .short('v')
        .long(PARAMETER_VERBOSE)
        .action(ArgAction::SetTrue)
        .global(true)
        .help("Enable verbose output for debugging")
}
