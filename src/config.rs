//! Configuration: store credentials from the environment, defaults from `iskonawa.toml`

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use url::Url;
use crate::loader::{DEFAULT_REFERENCES_PATH, DEFAULT_VERBS_PATH};
use crate::storage::DEFAULT_DATABASE;
use crate::{Error, Result};

pub const USERNAME_VAR: &str = "MONGO_USERNAME";
pub const PASSWORD_VAR: &str = "MONGO_PASSWORD";
pub const CLUSTER_URL_VAR: &str = "MONGO_CLUSTER_URL";

/// Optional project file with defaults for the CLI
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    pub database: Option<String>,
    pub references: Option<PathBuf>,
    pub verbs: Option<PathBuf>,
}

impl AppConfig {
    pub fn database(&self) -> &str {
        self.database.as_deref().unwrap_or(DEFAULT_DATABASE)
    }

    pub fn references_path(&self) -> PathBuf {
        self.references
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_REFERENCES_PATH))
    }

    pub fn verbs_path(&self) -> PathBuf {
        self.verbs.clone().unwrap_or_else(|| PathBuf::from(DEFAULT_VERBS_PATH))
    }
}

pub fn default_config_path() -> PathBuf {
    PathBuf::from("iskonawa.toml")
}

pub fn load_config(path: Option<&Path>) -> Result<Option<AppConfig>> {
    let path = path.map(Path::to_path_buf).unwrap_or_else(default_config_path);
    if !path.exists() {
        return Ok(None);
    }

    let contents = std::fs::read_to_string(&path).map_err(|source| Error::File {
        path: path.clone(),
        source,
    })?;
    let config: AppConfig = toml::from_str(&contents)
        .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;
    Ok(Some(config))
}

/// Credentials and location of the hosted database
#[derive(Clone)]
pub struct StoreConfig {
    pub username: String,
    pub password: String,
    pub cluster_url: String,
    pub database: String,
}

impl StoreConfig {
    /// Read the settings from the process environment
    pub fn from_env(database: &str) -> Result<Self> {
        Self::from_lookup(database, |name| std::env::var(name).ok())
    }

    /// Read the settings through `lookup`; empty values count as missing
    pub fn from_lookup(database: &str, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let require = |name: &'static str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .ok_or(Error::MissingSetting(name))
        };

        Ok(Self {
            username: require(USERNAME_VAR)?,
            password: require(PASSWORD_VAR)?,
            cluster_url: require(CLUSTER_URL_VAR)?,
            database: database.to_string(),
        })
    }

    /// SRV connection string with percent-encoded credentials
    pub fn connection_uri(&self) -> Result<Url> {
        let host = self.cluster_url.trim_end_matches('/');
        let mut uri = Url::parse(&format!("mongodb+srv://{}/{}", host, self.database))
            .map_err(|e| Error::Config(format!("invalid cluster address {:?}: {}", self.cluster_url, e)))?;

        uri.set_username(&self.username)
            .and_then(|_| uri.set_password(Some(&self.password)))
            .map_err(|_| Error::Config(format!("cluster address {:?} has no host", self.cluster_url)))?;
        uri.set_query(Some("retryWrites=true&w=majority"));
        Ok(uri)
    }
}

impl fmt::Display for StoreConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "mongodb+srv://{}:***@{}/{}", self.username, self.cluster_url, self.database)
    }
}

impl fmt::Debug for StoreConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreConfig")
            .field("username", &self.username)
            .field("password", &"***")
            .field("cluster_url", &self.cluster_url)
            .field("database", &self.database)
            .finish()
    }
}
