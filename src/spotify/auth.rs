use async_trait::async_trait;
use chrono::Utc;
use reqwest::{Client, StatusCode, Url};
use serde_json::Value;
use thiserror::Error;

use crate::{
    config::Config,
    types::{Grant, MAX_TOKEN_LIFETIME_SECS, TokenResponse, TokenSet},
};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("Spotify rejected the grant: {0}")]
    InvalidGrant(String),
    #[error("client id and secret are not configured")]
    MissingCredentials,
    #[error("token request failed: {0}")]
    Transport(String),
}

impl From<reqwest::Error> for AuthError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            AuthError::Transport("request timed out".to_string())
        } else {
            AuthError::Transport(err.to_string())
        }
    }
}

/// The two OAuth grant exchanges.
///
/// Implementations hold no session state; whatever they return is persisted
/// by the caller.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    /// Redeems a one-time authorization code for a user-scoped token.
    async fn exchange_authorization_code(&self, code: &str) -> Result<TokenSet, AuthError>;

    /// App-only token. Carries no refresh token and no user scopes.
    async fn exchange_client_credentials(
        &self,
        client_id: &str,
        client_secret: &str,
    ) -> Result<TokenSet, AuthError>;
}

/// [`TokenProvider`] against the Spotify accounts service.
pub struct SpotifyAuth {
    http: Client,
    auth_url: String,
    token_url: String,
    redirect_uri: String,
    scope: String,
    client_id: Option<String>,
    client_secret: Option<String>,
}

impl SpotifyAuth {
    pub fn new(
        http: Client,
        config: &Config,
        client_id: Option<String>,
        client_secret: Option<String>,
    ) -> Self {
        Self {
            http,
            auth_url: config.auth_url.clone(),
            token_url: config.token_url.clone(),
            redirect_uri: config.redirect_uri.clone(),
            scope: config.scope(),
            client_id: client_id.filter(|v| !v.trim().is_empty()),
            client_secret: client_secret.filter(|v| !v.trim().is_empty()),
        }
    }

    /// Builds the URL the browser is sent to by `/login`.
    pub fn authorize_url(&self, state: &str) -> Result<String, AuthError> {
        let client_id = self.client_id.as_deref().ok_or(AuthError::MissingCredentials)?;
        let url = Url::parse_with_params(
            &self.auth_url,
            &[
                ("response_type", "code"),
                ("client_id", client_id),
                ("scope", self.scope.as_str()),
                ("redirect_uri", self.redirect_uri.as_str()),
                ("state", state),
            ],
        )
        .map_err(|e| AuthError::Transport(format!("invalid authorize url: {e}")))?;

        Ok(url.into())
    }

    async fn request_token(
        &self,
        client_id: &str,
        client_secret: &str,
        form: &[(&str, &str)],
        grant: Grant,
    ) -> Result<TokenSet, AuthError> {
        let res = self
            .http
            .post(&self.token_url)
            .basic_auth(client_id, Some(client_secret))
            .form(form)
            .send()
            .await?;

        let status = res.status();
        let body = res.text().await?;

        if status == StatusCode::BAD_REQUEST || status == StatusCode::UNAUTHORIZED {
            return Err(AuthError::InvalidGrant(describe_error(&body, status)));
        }
        if !status.is_success() {
            return Err(AuthError::Transport(describe_error(&body, status)));
        }

        let token: TokenResponse = serde_json::from_str(&body)
            .map_err(|e| AuthError::Transport(format!("unreadable token response: {e}")))?;
        if token.expires_in > MAX_TOKEN_LIFETIME_SECS {
            return Err(AuthError::Transport(format!(
                "token lifetime out of range: {}s",
                token.expires_in
            )));
        }

        Ok(TokenSet {
            access_token: token.access_token,
            refresh_token: token.refresh_token.filter(|t| !t.is_empty()),
            expires_in: token.expires_in,
            obtained_at: Utc::now(),
            grant,
        })
    }
}

#[async_trait]
impl TokenProvider for SpotifyAuth {
    async fn exchange_authorization_code(&self, code: &str) -> Result<TokenSet, AuthError> {
        let (Some(client_id), Some(client_secret)) = (&self.client_id, &self.client_secret) else {
            return Err(AuthError::MissingCredentials);
        };

        self.request_token(
            client_id,
            client_secret,
            &[
                ("grant_type", "authorization_code"),
                ("code", code),
                ("redirect_uri", self.redirect_uri.as_str()),
            ],
            Grant::User,
        )
        .await
    }

    async fn exchange_client_credentials(
        &self,
        client_id: &str,
        client_secret: &str,
    ) -> Result<TokenSet, AuthError> {
        if client_id.trim().is_empty() || client_secret.trim().is_empty() {
            return Err(AuthError::MissingCredentials);
        }

        self.request_token(
            client_id,
            client_secret,
            &[("grant_type", "client_credentials")],
            Grant::App,
        )
        .await
    }
}

/// Pulls `error_description` (or `error`) out of an OAuth error body.
fn describe_error(body: &str, status: StatusCode) -> String {
    let json: Value = serde_json::from_str(body).unwrap_or(Value::Null);
    json["error_description"]
        .as_str()
        .or_else(|| json["error"].as_str())
        .map(str::to_string)
        .unwrap_or_else(|| format!("token endpoint answered {status}"))
}
