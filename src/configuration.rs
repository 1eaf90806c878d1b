use dirs::config_dir;
use serde::{Deserialize, Serialize};
use serde_yaml;
use std::{
    fs::{self, File},
    io::Write,
    path::PathBuf,
    time::Duration,
};
use tracing::debug;
use url::Url;

pub const DEFAULT_APPLICATION_ID: &str = "fbcli";
pub const DEFAULT_CONFIGURATION_FILE_NAME: &str = "config.yml";
pub const CONFIG_DIR_ENV: &str = "FBCLI_CONFIG_DIR";
pub const REALTIME_ORIGIN_ENV: &str = "FBCLI_REALTIME_ORIGIN";
pub const WEBSITE_ORIGIN_ENV: &str = "FBCLI_WEBSITE_ORIGIN";

pub const DEFAULT_REALTIME_ORIGIN: &str = "https://firebase.firebaseio.com";
pub const DEFAULT_WEBSITE_ORIGIN: &str = "https://www.firebase.com";
/// Tickets expire on the server after five minutes
pub const DEFAULT_LOGIN_TIMEOUT_SECS: u64 = 300;

#[derive(Debug, thiserror::Error)]
pub enum ConfigurationError {
    #[error("failed to resolve the configuration directory")]
    FailedToFindConfigurationDirectory,
    #[error("failed to load configuration data, because of: {cause:?}")]
    FailedToLoadData {
        cause: Box<dyn std::error::Error + Send + Sync>,
    },
    #[error("failed to write configuration data to file, because of: {cause:?}")]
    FailedToWriteData {
        cause: Box<dyn std::error::Error + Send + Sync>,
    },
    #[error("invalid URL for property {name:?}: {cause}")]
    InvalidUrl {
        name: String,
        cause: url::ParseError,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Configuration {
    #[serde(skip_serializing_if = "Option::is_none")]
    realtime_origin: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    website_origin: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    login_timeout_secs: Option<u64>,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            realtime_origin: None,
            website_origin: None,
            login_timeout_secs: None,
        }
    }
}

impl Configuration {
    /// Origin of the realtime database holding the session tickets.
    ///
    /// The `FBCLI_REALTIME_ORIGIN` environment variable wins over the file.
    pub fn realtime_origin(&self) -> Result<Url, ConfigurationError> {
        let origin = std::env::var(REALTIME_ORIGIN_ENV)
            .ok()
            .or_else(|| self.realtime_origin.clone())
            .unwrap_or_else(|| DEFAULT_REALTIME_ORIGIN.to_string());
        parse_origin("realtime_origin", &origin)
    }

    /// Origin of the website serving the pairing confirmation page.
    pub fn website_origin(&self) -> Result<Url, ConfigurationError> {
        let origin = std::env::var(WEBSITE_ORIGIN_ENV)
            .ok()
            .or_else(|| self.website_origin.clone())
            .unwrap_or_else(|| DEFAULT_WEBSITE_ORIGIN.to_string());
        parse_origin("website_origin", &origin)
    }

    pub fn login_timeout(&self) -> Duration {
        Duration::from_secs(
            self.login_timeout_secs
                .unwrap_or(DEFAULT_LOGIN_TIMEOUT_SECS),
        )
    }

    /// Directory holding all of the application's local state
    pub fn get_default_configuration_directory() -> Result<PathBuf, ConfigurationError> {
        // Check for FBCLI_CONFIG_DIR environment variable first
        if let Ok(config_dir_str) = std::env::var(CONFIG_DIR_ENV) {
            return Ok(PathBuf::from(config_dir_str));
        }

        match config_dir() {
            Some(mut configuration_directory) => {
                configuration_directory.push(DEFAULT_APPLICATION_ID);
                Ok(configuration_directory)
            }
            None => Err(ConfigurationError::FailedToFindConfigurationDirectory),
        }
    }

    pub fn get_default_configuration_file_path() -> Result<PathBuf, ConfigurationError> {
        let mut path = Self::get_default_configuration_directory()?;
        path.push(DEFAULT_CONFIGURATION_FILE_NAME);
        Ok(path)
    }

    /// Load default configuration, creating a default one if none exists
    pub fn load_or_create_default() -> Result<Configuration, ConfigurationError> {
        let default_file_path = Configuration::get_default_configuration_file_path()?;
        debug!(
            "Loading or creating configuration from {}...",
            default_file_path.display()
        );

        match Configuration::load_from_file(default_file_path.clone()) {
            Ok(config) => Ok(config),
            Err(ConfigurationError::FailedToLoadData { cause })
                if cause
                    .downcast_ref::<std::io::Error>()
                    .map(|e| e.kind() == std::io::ErrorKind::NotFound)
                    .unwrap_or(false) =>
            {
                debug!("Configuration file not found, creating default configuration");
                let default_config = Configuration::default();
                default_config.save(&default_file_path)?;
                Ok(default_config)
            }
            Err(e) => Err(e),
        }
    }

    pub fn load_from_file(path: PathBuf) -> Result<Configuration, ConfigurationError> {
        match fs::read_to_string(path) {
            Ok(configuration) => match serde_yaml::from_str(&configuration) {
                Ok(configuration) => Ok(configuration),
                Err(cause) => Err(ConfigurationError::FailedToLoadData {
                    cause: Box::new(cause),
                }),
            },
            Err(cause) => Err(ConfigurationError::FailedToLoadData {
                cause: Box::new(cause),
            }),
        }
    }

    pub fn write(&self, writer: Box<dyn Write>) -> Result<(), ConfigurationError> {
        match serde_yaml::to_writer(writer, self) {
            Ok(()) => Ok(()),
            Err(e) => Err(ConfigurationError::FailedToWriteData { cause: Box::new(e) }),
        }
    }

    pub fn save(&self, path: &PathBuf) -> Result<(), ConfigurationError> {
        // first check if the parent directory exists and try to create it if not
        match path.parent() {
            Some(directory) => {
                if fs::create_dir_all(directory).is_err() {
                    return Err(ConfigurationError::FailedToFindConfigurationDirectory);
                }
            }
            None => return Err(ConfigurationError::FailedToFindConfigurationDirectory),
        }

        match File::create(path) {
            Ok(file) => {
                let writer: Box<dyn Write> = Box::new(file);
                self.write(writer)
            }
            Err(e) => Err(ConfigurationError::FailedToWriteData { cause: Box::new(e) }),
        }
    }
}

/// Parse an origin so that relative paths resolve beneath it, keeping any
/// path prefix such as a database namespace
fn parse_origin(name: &str, origin: &str) -> Result<Url, ConfigurationError> {
    let mut url = Url::parse(origin).map_err(|cause| ConfigurationError::InvalidUrl {
        name: name.to_string(),
        cause,
    })?;
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_login_timeout_is_five_minutes() {
        let configuration = Configuration::default();
        assert_eq!(configuration.login_timeout(), Duration::from_secs(300));
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("config.yml");

        let configuration = Configuration {
            realtime_origin: None,
            website_origin: Some("http://localhost:5000".to_string()),
            login_timeout_secs: Some(42),
        };
        configuration.save(&path).unwrap();

        let loaded = Configuration::load_from_file(path).unwrap();
        assert_eq!(loaded, configuration);
        assert_eq!(loaded.login_timeout(), Duration::from_secs(42));
    }

    #[test]
    fn test_load_missing_file_fails() {
        let temp_dir = TempDir::new().unwrap();
        let result = Configuration::load_from_file(temp_dir.path().join("missing.yml"));
        assert!(matches!(
            result,
            Err(ConfigurationError::FailedToLoadData { .. })
        ));
    }

    #[test]
    fn test_invalid_origin_is_reported() {
        let configuration = Configuration {
            realtime_origin: None,
            website_origin: Some("not a url".to_string()),
            login_timeout_secs: None,
        };
        if std::env::var(WEBSITE_ORIGIN_ENV).is_err() {
            assert!(matches!(
                configuration.website_origin(),
                Err(ConfigurationError::InvalidUrl { .. })
            ));
        }
    }

    #[test]
    fn test_origin_keeps_path_prefix() {
        let url = parse_origin("realtime_origin", "https://host.example/ns").unwrap();
        assert_eq!(url.as_str(), "https://host.example/ns/");
        assert_eq!(
            url.join("sessionTickets/abc.json").unwrap().as_str(),
            "https://host.example/ns/sessionTickets/abc.json"
        );

        let url = parse_origin("website_origin", "https://www.firebase.com").unwrap();
        assert_eq!(url.as_str(), "https://www.firebase.com/");
    }
}
