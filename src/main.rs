use fbcli::commands::{create_cli_commands, PARAMETER_VERBOSE};
use fbcli::error::CliError;
use tracing_subscriber::EnvFilter;

mod cli;
use cli::execute_command;

async fn run() -> Result<(), CliError> {
    let commands = create_cli_commands();

    // Intialize the logging subsystem
    let filter = if commands.get_flag(PARAMETER_VERBOSE) {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    execute_command(commands).await
}

/// Main entry point for the program
#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("ERROR: {}", e);
        ::std::process::exit(e.exit_code().code());
    }
}
