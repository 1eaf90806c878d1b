//! Authentication action implementations.

use crate::browser::SystemBrowser;
use crate::configuration::Configuration;
use crate::credentials::{Credential, CredentialStore};
use crate::error::CliError;
use crate::login::{LoginError, LoginFlow};
use crate::realtime::RealtimeClient;
use color_print::cprintln;
use std::sync::Arc;
use tracing::debug;

/// Build a login flow wired to the hosted backend and the local stores
pub fn login_flow(configuration: &Configuration) -> Result<LoginFlow, CliError> {
    let realtime_origin = configuration.realtime_origin()?;
    debug!("Using realtime database at {}", realtime_origin);

    let store = Arc::new(RealtimeClient::new(realtime_origin)?);
    let credentials = CredentialStore::open_default()?;

    Ok(LoginFlow::new(
        store,
        credentials,
        Box::new(SystemBrowser),
        configuration.website_origin()?,
    )
    .with_timeout(configuration.login_timeout()))
}

/// Log in with the default configuration. A non-interactive session is
/// rejected before the configuration or any store is opened.
pub async fn login(interactive: bool) -> Result<Credential, CliError> {
    if !interactive {
        return Err(LoginError::NonInteractive.into());
    }

    let configuration = Configuration::load_or_create_default()?;
    let mut flow = login_flow(&configuration)?;
    Ok(flow.login(interactive).await?)
}

pub fn logout() -> Result<(), CliError> {
    let mut credentials = CredentialStore::open_default()?;
    match credentials.load() {
        Some(credential) => {
            credentials.clear()?;
            cprintln!(
                "<green>✔</green> Logged out from <bold>{}</bold>",
                credential.display_name()
            );
        }
        None => cprintln!("No need to log out, not logged in"),
    }
    Ok(())
}
