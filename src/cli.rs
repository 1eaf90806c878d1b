use clap::ArgMatches;
use fbcli::actions::auth;
use fbcli::commands::{
    COMMAND_CONFIG, COMMAND_GET, COMMAND_LOGIN, COMMAND_LOGOUT, COMMAND_PATH,
    PARAMETER_NON_INTERACTIVE,
};
use fbcli::configuration::Configuration;
use fbcli::error::CliError;
use tracing::trace;

fn extract_subcommand_name(sub_matches: &ArgMatches) -> String {
    match sub_matches.subcommand() {
        Some(m) => m.0.to_string(),
        None => "unknown".to_string(),
    }
}

pub async fn execute_command(commands: ArgMatches) -> Result<(), CliError> {
    match commands.subcommand() {
        // Login
        Some((COMMAND_LOGIN, sub_matches)) => {
            let interactive = !sub_matches.get_flag(PARAMETER_NON_INTERACTIVE);
            trace!("Executing login (interactive: {})", interactive);
            auth::login(interactive).await?;
            Ok(())
        }
        // Logout
        Some((COMMAND_LOGOUT, _)) => auth::logout(),
        // Configuration
        Some((COMMAND_CONFIG, sub_matches)) => match sub_matches.subcommand() {
            Some((COMMAND_GET, sub_matches)) => match sub_matches.subcommand() {
                Some((COMMAND_PATH, _)) => {
                    let path = Configuration::get_default_configuration_file_path()?;
                    println!("{}", path.display());
                    Ok(())
                }
                _ => Err(CliError::UnsupportedSubcommand(extract_subcommand_name(
                    sub_matches,
                ))),
            },
            _ => Err(CliError::UnsupportedSubcommand(extract_subcommand_name(
                sub_matches,
            ))),
        },
        _ => Err(CliError::UnsupportedSubcommand(extract_subcommand_name(
            &commands,
        ))),
    }
}
