//! Configuration management for termify.
//!
//! Values come from environment variables, which are seeded from a `.env` file
//! in the local data directory. The environment is read exactly once, into a
//! [`Config`] that gets handed to every component that needs it. Nothing else
//! in the crate looks at the process environment.
//!
//! Lookup order:
//! 1. Environment variables (highest priority)
//! 2. `.env` file in the local data directory
//! 3. Application defaults

use std::{env, net::SocketAddr, path::PathBuf, str::FromStr, time::Duration};

use thiserror::Error;

pub const APP_DIR: &str = "termify";

pub const DEFAULT_SERVER_ADDRESS: &str = "127.0.0.1:8888";
pub const DEFAULT_AUTH_URL: &str = "https://accounts.spotify.com/authorize";
pub const DEFAULT_TOKEN_URL: &str = "https://accounts.spotify.com/api/token";
pub const DEFAULT_API_URL: &str = "https://api.spotify.com/v1";
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 10;

/// Scopes requested by `/login`. Playback control needs the last two.
pub const SCOPES: [&str; 4] = [
    "user-read-private",
    "user-read-email",
    "user-read-playback-state",
    "user-modify-playback-state",
];

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{name} is not a valid socket address: {value}")]
    InvalidAddress { name: &'static str, value: String },
    #[error("{name} must be a positive number of seconds, got {value}")]
    InvalidTimeout { name: &'static str, value: String },
}

/// Explicit runtime configuration.
///
/// Client id and secret are optional on purpose: a missing pair is reported
/// inside the running UI instead of refusing to start.
#[derive(Debug, Clone)]
pub struct Config {
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub server_addr: SocketAddr,
    pub redirect_uri: String,
    pub auth_url: String,
    pub token_url: String,
    pub api_url: String,
    pub db_path: PathBuf,
    pub env_path: PathBuf,
    pub http_timeout: Duration,
}

impl Config {
    /// Builds the configuration from the current process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds the configuration from any key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let raw_addr = get("SERVER_ADDRESS").unwrap_or_else(|| DEFAULT_SERVER_ADDRESS.to_string());
        let server_addr =
            SocketAddr::from_str(&raw_addr).map_err(|_| ConfigError::InvalidAddress {
                name: "SERVER_ADDRESS",
                value: raw_addr.clone(),
            })?;

        let http_timeout = match get("TERMIFY_HTTP_TIMEOUT_SECS") {
            Some(raw) => match raw.parse::<u64>() {
                Ok(secs) if secs > 0 => Duration::from_secs(secs),
                _ => {
                    return Err(ConfigError::InvalidTimeout {
                        name: "TERMIFY_HTTP_TIMEOUT_SECS",
                        value: raw,
                    });
                }
            },
            None => Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
        };

        Ok(Config {
            client_id: get("SPOTIFY_API_AUTH_CLIENT_ID"),
            client_secret: get("SPOTIFY_API_AUTH_CLIENT_SECRET"),
            redirect_uri: get("SPOTIFY_API_REDIRECT_URI")
                .unwrap_or_else(|| format!("http://{server_addr}/callback")),
            server_addr,
            auth_url: get("SPOTIFY_API_AUTH_URL").unwrap_or_else(|| DEFAULT_AUTH_URL.to_string()),
            token_url: get("SPOTIFY_API_TOKEN_URL")
                .unwrap_or_else(|| DEFAULT_TOKEN_URL.to_string()),
            api_url: get("SPOTIFY_API_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            db_path: get("TERMIFY_DB_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| data_dir().join("termify.db")),
            env_path: env_file_path(),
            http_timeout,
        })
    }

    /// Local URL that starts the browser login.
    pub fn login_url(&self) -> String {
        format!("http://{}/login", self.server_addr)
    }

    pub fn scope(&self) -> String {
        SCOPES.join(" ")
    }
}

/// Platform-specific data directory for termify.
///
/// - Linux: `~/.local/share/termify`
/// - macOS: `~/Library/Application Support/termify`
/// - Windows: `%LOCALAPPDATA%/termify`
pub fn data_dir() -> PathBuf {
    let mut path = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push(APP_DIR);
    path
}

pub fn env_file_path() -> PathBuf {
    data_dir().join(".env")
}

/// Loads environment variables from the `.env` file in the local data directory.
///
/// The directory is created when missing. A missing `.env` file is fine: every
/// setting has a default or is reported later by the UI.
///
/// # Errors
///
/// Returns an error string if the directory cannot be created or the file
/// exists but cannot be parsed.
pub async fn load_env() -> Result<(), String> {
    let path = env_file_path();
    if let Some(parent) = path.parent() {
        async_fs::create_dir_all(parent)
            .await
            .map_err(|e| e.to_string())?;
    }

    if !path.is_file() {
        return Ok(());
    }

    dotenv::from_path(&path).map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_nothing_is_set() {
        let config = Config::from_lookup(lookup(&[])).unwrap();

        assert_eq!(config.server_addr.to_string(), DEFAULT_SERVER_ADDRESS);
        assert_eq!(config.redirect_uri, "http://127.0.0.1:8888/callback");
        assert_eq!(config.token_url, DEFAULT_TOKEN_URL);
        assert_eq!(config.http_timeout, Duration::from_secs(10));
        assert!(config.client_id.is_none());
        assert!(config.client_secret.is_none());
    }

    #[test]
    fn blank_values_count_as_unset() {
        let config = Config::from_lookup(lookup(&[
            ("SPOTIFY_API_AUTH_CLIENT_ID", "  "),
            ("SPOTIFY_API_AUTH_CLIENT_SECRET", "secret"),
        ]))
        .unwrap();

        assert!(config.client_id.is_none());
        assert_eq!(config.client_secret.as_deref(), Some("secret"));
    }

    #[test]
    fn api_url_loses_trailing_slash() {
        let config =
            Config::from_lookup(lookup(&[("SPOTIFY_API_URL", "http://localhost:9000/v1/")])).unwrap();
        assert_eq!(config.api_url, "http://localhost:9000/v1");
    }

    #[test]
    fn invalid_server_address_is_rejected() {
        let err = Config::from_lookup(lookup(&[("SERVER_ADDRESS", "localhost")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidAddress { .. }));
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let err =
            Config::from_lookup(lookup(&[("TERMIFY_HTTP_TIMEOUT_SECS", "0")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidTimeout { .. }));
    }

    #[test]
    fn scope_joins_with_spaces() {
        let config = Config::from_lookup(lookup(&[])).unwrap();
        assert_eq!(
            config.scope(),
            "user-read-private user-read-email user-read-playback-state user-modify-playback-state"
        );
    }
}
