//! # CLI Module
//!
//! User-facing entry points. Each subcommand builds its collaborators from an
//! explicit [`Config`] and hands them over; nothing below this layer reads the
//! environment.
//!
//! - [`run`] - the interactive terminal client (default)
//! - [`login`] - browser login without the interface, for first-time setup
//! - [`logout`] - forget the stored tokens, keep the client id and secret
//!
//! Startup failures that leave nothing useful to do (the credential store
//! cannot be opened, the HTTP client cannot be built) end the process with a
//! non-zero exit code through [`crate::error!`].

use std::sync::Arc;

use reqwest::Client;

use crate::{
    config::Config,
    error,
    management::{CredentialStore, SqliteStore},
    spotify::{self, SpotifyAuth},
    types::Credentials,
};

mod login;
mod logout;
mod run;

pub use login::login;
pub use logout::logout;
pub use run::run;

/// Opens the credential store or exits.
pub(crate) fn open_store(config: &Config) -> Arc<SqliteStore> {
    match SqliteStore::open(&config.db_path) {
        Ok(store) => Arc::new(store.with_env_mirror(config.env_path.clone())),
        Err(e) => error!(
            "Cannot open credential store at {}: {}",
            config.db_path.display(),
            e
        ),
    }
}

/// Loads the stored row or exits.
pub(crate) fn load_stored(store: &dyn CredentialStore) -> Option<Credentials> {
    match store.load() {
        Ok(stored) => stored,
        Err(e) => error!("Cannot read credential store: {}", e),
    }
}

/// Client id and secret: configuration first, then whatever the store holds.
pub fn resolve_client(config: &Config, stored: Option<&Credentials>) -> Credentials {
    let stored_id = stored.map(|c| c.client_id.clone()).filter(|v| !v.is_empty());
    let stored_secret = stored
        .map(|c| c.client_secret.clone())
        .filter(|v| !v.is_empty());

    Credentials::new(
        config.client_id.clone().or(stored_id).unwrap_or_default(),
        config.client_secret.clone().or(stored_secret).unwrap_or_default(),
    )
}

pub(crate) fn http_client(config: &Config) -> Client {
    match spotify::http_client(config.http_timeout) {
        Ok(client) => client,
        Err(e) => error!("Cannot build HTTP client: {}", e),
    }
}

pub(crate) fn spotify_auth(http: Client, config: &Config, client: &Credentials) -> SpotifyAuth {
    SpotifyAuth::new(
        http,
        config,
        Some(client.client_id.clone()),
        Some(client.client_secret.clone()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(pairs: &[(&str, &str)]) -> Config {
        let pairs: Vec<(String, String)> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(move |key| {
            pairs
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.clone())
        })
        .unwrap()
    }

    #[test]
    fn configured_client_wins_over_stored() {
        let config = config(&[
            ("SPOTIFY_API_AUTH_CLIENT_ID", "env-id"),
            ("SPOTIFY_API_AUTH_CLIENT_SECRET", "env-secret"),
        ]);
        let stored = Credentials::new("db-id", "db-secret");

        assert_eq!(
            resolve_client(&config, Some(&stored)),
            Credentials::new("env-id", "env-secret")
        );
    }

    #[test]
    fn stored_client_fills_gaps() {
        let config = config(&[("SPOTIFY_API_AUTH_CLIENT_ID", "env-id")]);
        let stored = Credentials::new("db-id", "db-secret");

        assert_eq!(
            resolve_client(&config, Some(&stored)),
            Credentials::new("env-id", "db-secret")
        );
    }

    #[test]
    fn nothing_configured_gives_empty_client() {
        let client = resolve_client(&config(&[]), None);
        assert!(!client.has_client());
    }
}
