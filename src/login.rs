//! Browser pairing login.
//!
//! The CLI cannot authenticate on its own, so it borrows a browser session:
//!
//! 1. a ticket record is created under `sessionTickets/<id>` in the realtime
//!    database, stamped with the server time;
//! 2. the user opens `<website>/login/confirm.html?ticket=<id>` and signs in
//!    there, after which the website writes the session into the ticket's
//!    `result` field;
//! 3. the CLI, subscribed to that field, consumes the result (clearing it and
//!    stamping `consumed`) and stores the credential locally.
//!
//! Tickets expire on the server after five minutes, so the wait is bounded by
//! the same deadline.

use crate::browser::BrowserLauncher;
use crate::configstore::ConfigStoreError;
use crate::configuration::DEFAULT_LOGIN_TIMEOUT_SECS;
use crate::credentials::{Credential, CredentialStore};
use crate::exit_codes::ExitCode;
use crate::realtime::{child_path, RealtimeError, RealtimeStore, ServerValue, Subscription};
use color_print::cprintln;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, trace, warn};
use url::Url;
use uuid::Uuid;

pub const TICKETS_PATH: &str = "sessionTickets";
pub const CONFIRM_PAGE: &str = "login/confirm.html";
pub const TICKET_QUERY_PARAMETER: &str = "ticket";
pub const DEFAULT_LOGIN_TIMEOUT: Duration = Duration::from_secs(DEFAULT_LOGIN_TIMEOUT_SECS);

const FIELD_CREATED: &str = "created";
const FIELD_RESULT: &str = "result";
const FIELD_CONSUMED: &str = "consumed";

#[derive(Debug, Error)]
pub enum LoginError {
    #[error("Cannot run login in non-interactive mode. Use a static token instead.")]
    NonInteractive,
    #[error("There was a problem logging in: {0}")]
    Backend(#[source] RealtimeError),
    #[error("Unexpected error while completing authentication: {0}")]
    Finalize(#[source] RealtimeError),
    #[error("Received an invalid authentication result: {0}")]
    InvalidResult(String),
    #[error("Authentication timed out.")]
    Timeout,
    #[error("Failed to store credentials: {0}")]
    Credentials(#[from] ConfigStoreError),
    #[error("Failed to build the login URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl LoginError {
    pub fn exit_code(&self) -> ExitCode {
        match self {
            LoginError::NonInteractive | LoginError::Backend(_) | LoginError::Timeout => {
                ExitCode::Failure
            }
            LoginError::Finalize(_) | LoginError::InvalidResult(_) => ExitCode::FinalizeError,
            LoginError::Credentials(_) => ExitCode::IoError,
            LoginError::InvalidUrl(_) => ExitCode::ConfigError,
        }
    }
}

/// A ticket created in the realtime database and waiting to be paired
#[derive(Debug, Clone, PartialEq)]
pub struct TicketHandle {
    id: String,
    pairing_url: Url,
}

impl TicketHandle {
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Database path of the ticket record
    pub fn path(&self) -> String {
        child_path(TICKETS_PATH, &self.id)
    }

    /// Database path the website writes the session into
    pub fn result_path(&self) -> String {
        child_path(&self.path(), FIELD_RESULT)
    }

    pub fn pairing_url(&self) -> &Url {
        &self.pairing_url
    }
}

/// Build `<website>/login/confirm.html?ticket=<id>`
pub fn pairing_url(website_origin: &Url, ticket_id: &str) -> Result<Url, url::ParseError> {
    let mut url = website_origin.join(CONFIRM_PAGE)?;
    url.query_pairs_mut()
        .clear()
        .append_pair(TICKET_QUERY_PARAMETER, ticket_id);
    Ok(url)
}

/// What the website writes into the ticket's `result` field
#[derive(Debug, Deserialize)]
struct PairingResult {
    user: Value,
    session: Value,
    #[serde(default)]
    prefs: Option<Preferences>,
}

#[derive(Debug, Default, Deserialize)]
struct Preferences {
    #[serde(default)]
    usage: Option<bool>,
}

impl PairingResult {
    fn parse(payload: Value) -> Result<Self, LoginError> {
        let result: PairingResult = serde_json::from_value(payload)
            .map_err(|e| LoginError::InvalidResult(e.to_string()))?;
        if result.user.is_null() {
            return Err(LoginError::InvalidResult("missing user".to_string()));
        }
        if result.session.is_null() {
            return Err(LoginError::InvalidResult("missing session".to_string()));
        }
        Ok(result)
    }

    fn into_credential(self) -> Credential {
        let usage_preference = self.prefs.and_then(|p| p.usage).unwrap_or(false);
        Credential {
            user: self.user,
            session: self.session,
            usage_preference,
        }
    }
}

/// Drives a single login attempt
pub struct LoginFlow {
    store: Arc<dyn RealtimeStore>,
    credentials: CredentialStore,
    browser: Box<dyn BrowserLauncher>,
    website_origin: Url,
    timeout: Duration,
}

impl LoginFlow {
    pub fn new(
        store: Arc<dyn RealtimeStore>,
        credentials: CredentialStore,
        browser: Box<dyn BrowserLauncher>,
        website_origin: Url,
    ) -> Self {
        Self {
            store,
            credentials,
            browser,
            website_origin,
            timeout: DEFAULT_LOGIN_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Log in, reusing a stored credential when there is one.
    ///
    /// Non-interactive sessions cannot complete the browser step and are
    /// rejected before anything is read or sent.
    pub async fn login(&mut self, interactive: bool) -> Result<Credential, LoginError> {
        if !interactive {
            return Err(LoginError::NonInteractive);
        }

        if let Some(credential) = self.credentials.load() {
            cprintln!(
                "Already logged in as <bold>{}</bold>",
                credential.display_name()
            );
            return Ok(credential);
        }

        let ticket = self.create_ticket().await?;
        self.await_result(&ticket).await
    }

    /// Register a fresh ticket and point the user at its pairing URL
    pub async fn create_ticket(&self) -> Result<TicketHandle, LoginError> {
        let id = Uuid::new_v4().to_string();
        let ticket = TicketHandle {
            pairing_url: pairing_url(&self.website_origin, &id)?,
            id,
        };

        debug!("Creating login ticket {}", ticket.id);
        self.store
            .set(
                &ticket.path(),
                json!({ FIELD_CREATED: ServerValue::Timestamp.to_value() }),
            )
            .await
            .map_err(LoginError::Backend)?;

        cprintln!("Visit this URL on any device to log in:");
        cprintln!("<bold><underline>{}</underline></bold>", ticket.pairing_url);
        println!();
        cprintln!("Waiting for authentication...");
        println!();

        // the printed URL is enough if no browser can be launched
        if let Err(e) = self.browser.open(&ticket.pairing_url) {
            warn!("Failed to open a browser: {}", e);
        }

        Ok(ticket)
    }

    /// Wait for the website to fill in the ticket, then consume it.
    ///
    /// Whichever comes first, the result or the deadline, decides the
    /// outcome; the other branch is cancelled and has no effect. The deadline
    /// also covers the subscription handshake. A result that is already
    /// available when the deadline expires still wins.
    pub async fn await_result(&mut self, ticket: &TicketHandle) -> Result<Credential, LoginError> {
        let deadline = tokio::time::sleep(self.timeout);
        tokio::pin!(deadline);

        let mut subscription = None;
        let outcome = {
            let result_path = ticket.result_path();
            let first = first_result(self.store.as_ref(), &result_path, &mut subscription);
            tokio::select! {
                biased;
                result = first => Some(result),
                _ = &mut deadline => None,
            }
        };

        let payload = match outcome {
            None => {
                warn!("Login ticket {} timed out", ticket.id);
                if let Some(subscription) = subscription {
                    subscription.unsubscribe();
                }
                return Err(LoginError::Timeout);
            }
            Some(Err(e)) => {
                if let Some(subscription) = subscription {
                    subscription.unsubscribe();
                }
                return Err(LoginError::Backend(e));
            }
            Some(Ok(payload)) => payload,
        };

        debug!("Received result for login ticket {}", ticket.id);
        let mut fields = Map::new();
        fields.insert(FIELD_RESULT.to_string(), Value::Null);
        fields.insert(FIELD_CONSUMED.to_string(), ServerValue::Timestamp.to_value());
        let consumed = self.store.update(&ticket.path(), fields).await;
        if let Some(subscription) = subscription {
            subscription.unsubscribe();
        }
        consumed.map_err(LoginError::Finalize)?;

        let credential = PairingResult::parse(payload)?.into_credential();
        self.credentials.store(&credential)?;

        cprintln!(
            "<green>✔</green> Success! Logged in as <bold>{}</bold>",
            credential.display_name()
        );
        Ok(credential)
    }
}

/// Subscribe to `path` and wait for its first non-empty value. The
/// subscription is left in `slot` so the caller can tear it down.
async fn first_result(
    store: &dyn RealtimeStore,
    path: &str,
    slot: &mut Option<Subscription>,
) -> Result<Value, RealtimeError> {
    let subscription = slot.insert(store.subscribe(path).await?);
    next_result(subscription).await
}

/// First non-empty value delivered by the subscription
async fn next_result(subscription: &mut Subscription) -> Result<Value, RealtimeError> {
    loop {
        match subscription.next_value().await {
            Some(Ok(Some(value))) => return Ok(value),
            Some(Ok(None)) => trace!("No result yet on {}", subscription.path()),
            Some(Err(e)) => return Err(e),
            None => {
                return Err(RealtimeError::SubscriptionClosed(
                    subscription.path().to_string(),
                ))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pairing_url() {
        let origin = Url::parse("https://www.firebase.com").unwrap();
        let url = pairing_url(&origin, "abc-123").unwrap();
        assert_eq!(
            url.as_str(),
            "https://www.firebase.com/login/confirm.html?ticket=abc-123"
        );
    }

    #[test]
    fn test_ticket_paths() {
        let ticket = TicketHandle {
            id: "t1".to_string(),
            pairing_url: Url::parse("https://example.com/login/confirm.html?ticket=t1").unwrap(),
        };
        assert_eq!(ticket.path(), "sessionTickets/t1");
        assert_eq!(ticket.result_path(), "sessionTickets/t1/result");
    }

    #[test]
    fn test_pairing_result_with_usage() {
        let credential = PairingResult::parse(json!({
            "user": { "email": "a@b.com" },
            "session": { "token": "x" },
            "prefs": { "usage": true }
        }))
        .unwrap()
        .into_credential();

        assert_eq!(credential.email(), Some("a@b.com"));
        assert_eq!(credential.session, json!({ "token": "x" }));
        assert!(credential.usage_preference);
    }

    #[test]
    fn test_pairing_result_defaults_usage_to_false() {
        let credential = PairingResult::parse(json!({
            "user": { "email": "a@b.com" },
            "session": { "token": "x" },
            "prefs": {}
        }))
        .unwrap()
        .into_credential();
        assert!(!credential.usage_preference);
    }

    #[test]
    fn test_pairing_result_requires_user_and_session() {
        assert!(PairingResult::parse(json!({ "session": { "token": "x" } })).is_err());
        assert!(PairingResult::parse(json!({ "user": {}, "session": null })).is_err());
        assert!(PairingResult::parse(json!("done")).is_err());
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(LoginError::NonInteractive.exit_code().code(), 1);
        assert_eq!(LoginError::Timeout.exit_code().code(), 1);
        assert_eq!(
            LoginError::Finalize(RealtimeError::Unavailable("down".to_string()))
                .exit_code()
                .code(),
            2
        );
    }
}
