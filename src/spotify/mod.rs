//! # Spotify Integration Module
//!
//! Everything that talks to Spotify over HTTP lives here, split by concern:
//!
//! ```text
//! Controller / callback server
//!          ↓
//! Spotify Integration Layer
//!     ├── Authentication (authorization-code and client-credentials grants)
//!     └── Player (profile, currently playing, skip)
//!          ↓
//! HTTP Layer (reqwest, JSON)
//! ```
//!
//! Both halves sit behind a trait ([`auth::TokenProvider`] and
//! [`player::ServiceClient`]) so the controller can be driven by fakes in tests.
//!
//! ## Error classification
//!
//! Every player call resolves to exactly one of success, [`ServiceError::Unauthorized`],
//! [`ServiceError::Transport`] or [`ServiceError::Decode`]. A 401 is the only
//! status that means "the token is no longer accepted"; everything else that is
//! not a success, including timeouts, is a transport problem. Nothing here
//! retries.

use std::time::Duration;

use reqwest::{Client, Response, StatusCode};
use thiserror::Error;

pub mod auth;
pub mod player;

pub use auth::{AuthError, SpotifyAuth, TokenProvider};
pub use player::{ServiceClient, SpotifyClient};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServiceError {
    #[error("Spotify rejected the access token")]
    Unauthorized,
    #[error("request failed: {0}")]
    Transport(String),
    #[error("unexpected response from Spotify: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for ServiceError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ServiceError::Transport("request timed out".to_string())
        } else {
            ServiceError::Transport(err.to_string())
        }
    }
}

/// Builds the shared HTTP client. Every request inherits `timeout`.
pub fn http_client(timeout: Duration) -> Result<Client, reqwest::Error> {
    Client::builder()
        .timeout(timeout)
        .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
        .build()
}

/// Maps a response status onto the service error taxonomy.
pub(crate) fn check_status(response: Response) -> Result<Response, ServiceError> {
    match response.status() {
        StatusCode::UNAUTHORIZED => Err(ServiceError::Unauthorized),
        status if status.is_success() => Ok(response),
        status => Err(ServiceError::Transport(format!("Spotify answered {status}"))),
    }
}
