use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

const DEFAULT_CONFIG: &str = include_str!("../../../config/default.toml");

pub const DEFAULT_HOST: &str = "localhost";
pub const DEFAULT_NAME: &str = "PlexATV";
pub const DEFAULT_PORT: u16 = 32400;
pub const DEFAULT_POLL_INTERVAL: u64 = 60;

/// Top-level application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Minimum seconds between two completed polls.
    pub poll_interval: u64,
    /// Directory for rolling log files. Logs go to stderr only when unset.
    pub log_dir: Option<PathBuf>,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            log_dir: None,
        }
    }
}

/// Media server connection settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Display name of the published sensor.
    pub name: String,
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    pub token: Option<String>,
    /// Named server on the account; only used with username/password.
    pub server: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            name: DEFAULT_NAME.into(),
            host: DEFAULT_HOST.into(),
            port: DEFAULT_PORT,
            username: None,
            password: None,
            token: None,
            server: None,
        }
    }
}

/// How the session fetcher authenticates against the media server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthMode {
    /// Direct server address plus an access token.
    Token { base_url: String, token: String },
    /// plex.tv account login; `server` picks a named server resource,
    /// otherwise the first one on the account is used.
    Account {
        username: String,
        password: String,
        server: Option<String>,
    },
    /// Direct server address, no credentials.
    Anonymous { base_url: String },
}

impl AuthMode {
    pub fn describe(&self) -> &'static str {
        match self {
            Self::Token { .. } => "token",
            Self::Account { .. } => "account",
            Self::Anonymous { .. } => "anonymous",
        }
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.is_empty())
}

impl ServerConfig {
    /// `http://<host>:<port>`
    pub fn base_url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }

    /// Token wins over account credentials; with neither, connect anonymously.
    pub fn auth_mode(&self) -> AuthMode {
        if let Some(token) = non_empty(&self.token) {
            return AuthMode::Token {
                base_url: self.base_url(),
                token: token.to_string(),
            };
        }
        if let (Some(username), Some(password)) =
            (non_empty(&self.username), non_empty(&self.password))
        {
            return AuthMode::Account {
                username: username.to_string(),
                password: password.to_string(),
                server: non_empty(&self.server).map(String::from),
            };
        }
        AuthMode::Anonymous {
            base_url: self.base_url(),
        }
    }
}

impl AppConfig {
    /// Load config: user file (if exists) merged over built-in defaults.
    pub fn load() -> Result<Self, CoreError> {
        let user_path = Self::config_path();
        if user_path.exists() {
            Self::load_from(&user_path)
        } else {
            Self::parse(DEFAULT_CONFIG)
        }
    }

    /// Load config from an explicit file.
    pub fn load_from(path: &Path) -> Result<Self, CoreError> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self, CoreError> {
        toml::from_str(content).map_err(|e| CoreError::Config(e.to_string()))
    }

    /// Minimum time between two completed polls, never below one second.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.general.poll_interval.max(1))
    }

    /// Path to user config file (XDG on Linux, AppData on Windows).
    pub fn config_path() -> PathBuf {
        Self::project_dirs()
            .map(|d| d.config_dir().join("config.toml"))
            .unwrap_or_else(|| PathBuf::from("config.toml"))
    }

    fn project_dirs() -> Option<ProjectDirs> {
        ProjectDirs::from("", "", "plexatv")
    }
}
