use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;

use crate::{
    spotify::{ServiceError, check_status},
    types::{CurrentlyPlayingResponse, Direction, PlaybackInfo, Profile, UserResponse},
};

/// Outbound calls that need a user-scoped access token.
#[async_trait]
pub trait ServiceClient: Send + Sync {
    async fn fetch_profile(&self, token: &str) -> Result<Profile, ServiceError>;

    /// `Ok(None)` means nothing is playing right now.
    async fn fetch_currently_playing(
        &self,
        token: &str,
    ) -> Result<Option<PlaybackInfo>, ServiceError>;

    async fn skip_track(&self, token: &str, direction: Direction) -> Result<(), ServiceError>;
}

pub struct SpotifyClient {
    http: Client,
    api_url: String,
}

impl SpotifyClient {
    pub fn new(http: Client, api_url: impl Into<String>) -> Self {
        Self {
            http,
            api_url: api_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{uri}{path}", uri = self.api_url)
    }
}

fn decode<T: DeserializeOwned>(body: &str) -> Result<T, ServiceError> {
    serde_json::from_str(body).map_err(|e| ServiceError::Decode(e.to_string()))
}

#[async_trait]
impl ServiceClient for SpotifyClient {
    async fn fetch_profile(&self, token: &str) -> Result<Profile, ServiceError> {
        let response = self
            .http
            .get(self.url("/me"))
            .bearer_auth(token)
            .header("Accept", "application/json")
            .send()
            .await?;

        let body = check_status(response)?.text().await?;
        let user: UserResponse = decode(&body)?;
        Ok(user.into())
    }

    async fn fetch_currently_playing(
        &self,
        token: &str,
    ) -> Result<Option<PlaybackInfo>, ServiceError> {
        let response = self
            .http
            .get(self.url("/me/player/currently-playing"))
            .bearer_auth(token)
            .header("Accept", "application/json")
            .send()
            .await?;

        let response = check_status(response)?;
        if response.status() == StatusCode::NO_CONTENT {
            return Ok(None);
        }

        let body = response.text().await?;
        if body.trim().is_empty() {
            return Ok(None);
        }

        let playing: CurrentlyPlayingResponse = decode(&body)?;
        Ok(playing.into_playback())
    }

    async fn skip_track(&self, token: &str, direction: Direction) -> Result<(), ServiceError> {
        let response = self
            .http
            .post(self.url(&format!("/me/player/{}", direction.endpoint())))
            .bearer_auth(token)
            .body("")
            .send()
            .await?;

        check_status(response)?;
        Ok(())
    }
}
