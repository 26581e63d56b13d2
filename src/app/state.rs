use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::{
    management::StorageError,
    spotify::{AuthError, ServiceError},
    types::{Grant, PlaybackInfo, Profile},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthState {
    Unauthenticated,
    Authenticated,
    Expired,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Home,
    Player,
}

/// Everything that can end up in [`Session::last_error`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error(transparent)]
    Service(#[from] ServiceError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error("not authenticated")]
    NotAuthenticated,
    #[error("this needs a Spotify account login")]
    LoginRequired,
    #[error("your Spotify session has expired")]
    ReauthRequired,
    #[error("login server stopped: {0}")]
    Server(String),
}

impl SessionError {
    /// What the user can do about it, if anything.
    pub fn guidance(&self) -> Option<&'static str> {
        match self {
            SessionError::Auth(AuthError::MissingCredentials) => Some(
                "Set SPOTIFY_API_AUTH_CLIENT_ID and SPOTIFY_API_AUTH_CLIENT_SECRET, then press ` to log in through the browser.",
            ),
            SessionError::Auth(AuthError::InvalidGrant(_)) => Some("Press ` to log in again."),
            SessionError::NotAuthenticated
            | SessionError::LoginRequired
            | SessionError::ReauthRequired => Some("Press ` to log in through the browser."),
            _ => None,
        }
    }
}

/// Authentication state. Owned and mutated by the controller only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub auth: AuthState,
    pub access_token: Option<String>,
    pub grant: Option<Grant>,
    pub expiry: Option<DateTime<Utc>>,
    pub last_error: Option<SessionError>,
}

impl Session {
    pub fn unauthenticated() -> Self {
        Self {
            auth: AuthState::Unauthenticated,
            access_token: None,
            grant: None,
            expiry: None,
            last_error: None,
        }
    }

    /// Token usable for the profile and player endpoints.
    pub fn user_token(&self) -> Option<&str> {
        match (self.auth, self.grant) {
            (AuthState::Authenticated, Some(Grant::User)) => self.access_token.as_deref(),
            _ => None,
        }
    }

    /// Why a user-scoped command cannot be issued right now.
    pub fn user_token_error(&self) -> SessionError {
        match (self.auth, self.grant) {
            (AuthState::Authenticated, _) => SessionError::LoginRequired,
            (AuthState::Expired, _) => SessionError::ReauthRequired,
            (AuthState::Unauthenticated, _) => SessionError::NotAuthenticated,
        }
    }
}

/// Presentation state derived from fetch results and navigation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewState {
    pub view: View,
    pub profile: Option<Profile>,
    pub now_playing: Option<PlaybackInfo>,
    /// Set once a now-playing fetch has answered, so "nothing playing" and
    /// "not asked yet" render differently.
    pub now_playing_known: bool,
    pub notice: Option<String>,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            view: View::Home,
            profile: None,
            now_playing: None,
            now_playing_known: false,
            notice: None,
        }
    }
}
