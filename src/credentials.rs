//! Locally persisted login credentials.

use crate::configstore::{ConfigStore, ConfigStoreError};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

pub const KEY_USER: &str = "user";
pub const KEY_SESSION: &str = "session";
pub const KEY_USAGE: &str = "usage";

/// The identity and session obtained from a successful pairing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Credential {
    /// Identity object; carries at least an `email`
    pub user: Value,
    /// Opaque session object handed back by the backend
    pub session: Value,
    /// Whether the user agreed to usage collection
    #[serde(rename = "usage", default)]
    pub usage_preference: bool,
}

impl Credential {
    /// Email address of the signed in user, if the identity carries one
    pub fn email(&self) -> Option<&str> {
        self.user.get("email").and_then(Value::as_str)
    }

    /// Something printable that identifies the user
    pub fn display_name(&self) -> String {
        match self.email() {
            Some(email) => email.to_string(),
            None => self.user.to_string(),
        }
    }
}

/// Reads and writes the credential in the local configuration store
#[derive(Debug)]
pub struct CredentialStore {
    store: ConfigStore,
}

impl CredentialStore {
    pub fn new(store: ConfigStore) -> Self {
        Self { store }
    }

    pub fn open_default() -> Result<Self, ConfigStoreError> {
        Ok(Self::new(ConfigStore::open_default()?))
    }

    /// Returns the stored credential, only if both a user and a session exist
    pub fn load(&self) -> Option<Credential> {
        let user = self.store.get(KEY_USER)?;
        let session = self.store.get(KEY_SESSION)?;
        let usage_preference = self
            .store
            .get(KEY_USAGE)
            .and_then(Value::as_bool)
            .unwrap_or(false);

        Some(Credential {
            user: user.clone(),
            session: session.clone(),
            usage_preference,
        })
    }

    /// Overwrites any previously stored credential
    pub fn store(&mut self, credential: &Credential) -> Result<(), ConfigStoreError> {
        debug!("Persisting credential for {}", credential.display_name());
        self.store.set_all([
            (KEY_USER, credential.user.clone()),
            (KEY_SESSION, credential.session.clone()),
            (KEY_USAGE, Value::Bool(credential.usage_preference)),
        ])
    }

    pub fn clear(&mut self) -> Result<(), ConfigStoreError> {
        self.store.delete_all([KEY_USER, KEY_SESSION, KEY_USAGE])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn credential_store(temp_dir: &TempDir) -> CredentialStore {
        let path = temp_dir.path().join("configstore.json");
        CredentialStore::new(ConfigStore::open(path).unwrap())
    }

    #[test]
    fn test_load_requires_user_and_session() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("configstore.json");
        let mut store = ConfigStore::open(path).unwrap();
        store.set(KEY_USER, json!({"email": "a@b.com"})).unwrap();

        let credentials = CredentialStore::new(store);
        assert!(credentials.load().is_none());
    }

    #[test]
    fn test_store_then_load() {
        let temp_dir = TempDir::new().unwrap();
        let mut credentials = credential_store(&temp_dir);
        let credential = Credential {
            user: json!({"email": "a@b.com"}),
            session: json!({"token": "x"}),
            usage_preference: true,
        };

        credentials.store(&credential).unwrap();

        assert_eq!(credential_store(&temp_dir).load(), Some(credential));
    }

    #[test]
    fn test_missing_usage_defaults_to_false() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("configstore.json");
        let mut store = ConfigStore::open(path).unwrap();
        store.set(KEY_USER, json!({"email": "a@b.com"})).unwrap();
        store.set(KEY_SESSION, json!({"token": "x"})).unwrap();

        let credential = CredentialStore::new(store).load().unwrap();
        assert!(!credential.usage_preference);
    }

    #[test]
    fn test_clear_removes_credential() {
        let temp_dir = TempDir::new().unwrap();
        let mut credentials = credential_store(&temp_dir);
        credentials
            .store(&Credential {
                user: json!({"email": "a@b.com"}),
                session: json!({"token": "x"}),
                usage_preference: false,
            })
            .unwrap();

        credentials.clear().unwrap();
        assert!(credentials.load().is_none());
        assert!(credential_store(&temp_dir).load().is_none());
    }

    #[test]
    fn test_display_name_falls_back_to_user_json() {
        let credential = Credential {
            user: json!({"uid": "123"}),
            session: json!({}),
            usage_preference: false,
        };
        assert_eq!(credential.email(), None);
        assert_eq!(credential.display_name(), r#"{"uid":"123"}"#);
    }

    #[test]
    fn test_failed_store_leaves_previous_credential() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("configstore.json");
        let mut credentials = credential_store(&temp_dir);
        let previous = Credential {
            user: json!({"email": "old@b.com"}),
            session: json!({"token": "old"}),
            usage_preference: true,
        };
        credentials.store(&previous).unwrap();

        // a directory in place of the staging file makes the next write fail
        std::fs::create_dir(path.with_extension("json.tmp")).unwrap();
        let result = credentials.store(&Credential {
            user: json!({"email": "new@b.com"}),
            session: json!({"token": "new"}),
            usage_preference: false,
        });

        assert!(result.is_err());
        assert_eq!(credentials.load(), Some(previous.clone()));
        assert_eq!(credential_store(&temp_dir).load(), Some(previous));
    }
}
