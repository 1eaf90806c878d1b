//! Authentication command definitions.

use crate::commands::params::{COMMAND_LOGIN, COMMAND_LOGOUT};
use clap::Command;

pub fn login_command() -> Command {
    Command::new(COMMAND_LOGIN)
        .about("Sign in by confirming a one-time link in your browser")
}

pub fn logout_command() -> Command {
    Command::new(COMMAND_LOGOUT).about("Forget the locally stored credentials")
}
