//! Deployment configuration: realm, credentials and the protected resource.
//!
//! ```toml
//! realm = "Please enter your username and password"
//! resource = "./genpw.html"
//! required_markers = ["rstr2b64"]
//!
//! [users]
//! user1 = "pwd1"
//! user2 = "pwd2"
//! ```

use crate::digest_verifier::CredentialStore;
use serde::Deserialize;
use std::{fmt, fs, io, path::Path, path::PathBuf};

pub const DEFAULT_REALM: &str = "Please enter your username and password";

#[derive(Debug)]
pub enum ConfigError {
    Io(io::Error),
    Parse(toml::de::Error),
    NoCredentials,
    EmptyRealm,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "Failed to read config file: {}", e),
            ConfigError::Parse(e) => write!(f, "Failed to parse config file: {}", e),
            ConfigError::NoCredentials => "No users configured.".fmt(f),
            ConfigError::EmptyRealm => "Realm must not be empty.".fmt(f),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io(e) => Some(e),
            ConfigError::Parse(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for ConfigError {
    fn from(e: io::Error) -> Self {
        ConfigError::Io(e)
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(e: toml::de::Error) -> Self {
        ConfigError::Parse(e)
    }
}

fn default_realm() -> String {
    DEFAULT_REALM.to_owned()
}

#[derive(Debug, Clone, Deserialize)]
pub struct GateConfig {
    #[serde(default = "default_realm")]
    pub realm: String,
    /// File released after a successful login.
    pub resource: PathBuf,
    /// Strings the resource must contain before it is served.
    #[serde(default)]
    pub required_markers: Vec<String>,
    #[serde(default)]
    pub users: CredentialStore,
}

impl GateConfig {
    pub fn new<P: Into<PathBuf>>(resource: P, users: CredentialStore) -> Self {
        Self {
            realm: default_realm(),
            resource: resource.into(),
            required_markers: Vec::new(),
            users,
        }
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(contents)?)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Reject configurations that can never authenticate anybody.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.realm.is_empty() {
            return Err(ConfigError::EmptyRealm);
        }
        if self.users.is_empty() {
            return Err(ConfigError::NoCredentials);
        }
        Ok(())
    }
}
