use std::fmt;

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

/// Which OAuth grant produced an access token.
///
/// Only [`Grant::User`] tokens carry the user scopes needed for the profile
/// and player endpoints. [`Grant::App`] tokens come from the client-credentials
/// flow and prove nothing beyond "the app is registered".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Grant {
    User,
    App,
}

impl Grant {
    pub fn as_str(&self) -> &'static str {
        match self {
            Grant::User => "user",
            Grant::App => "app",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "user" => Some(Grant::User),
            "app" => Some(Grant::App),
            _ => None,
        }
    }
}

/// The single persisted credential row.
///
/// `client_id` and `client_secret` are set once; the token fields are replaced
/// as a whole every time a token exchange succeeds.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Credentials {
    pub client_id: String,
    pub client_secret: String,
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub expiry: Option<DateTime<Utc>>,
    pub grant: Option<Grant>,
}

impl Credentials {
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            ..Default::default()
        }
    }

    pub fn has_client(&self) -> bool {
        !self.client_id.trim().is_empty() && !self.client_secret.trim().is_empty()
    }

    pub fn has_token(&self) -> bool {
        self.access_token.as_deref().is_some_and(|t| !t.is_empty())
    }

    /// Returns a copy with every token field replaced by `tokens`.
    pub fn with_tokens(&self, tokens: &TokenSet) -> Self {
        Self {
            client_id: self.client_id.clone(),
            client_secret: self.client_secret.clone(),
            access_token: Some(tokens.access_token.clone()),
            refresh_token: tokens.refresh_token.clone(),
            expiry: Some(tokens.expiry()),
            grant: Some(tokens.grant),
        }
    }

    pub fn without_tokens(&self) -> Self {
        Self::new(self.client_id.clone(), self.client_secret.clone())
    }
}

/// Longest token lifetime the accounts service is trusted with. Spotify
/// hands out one hour.
pub const MAX_TOKEN_LIFETIME_SECS: u64 = 365 * 24 * 60 * 60;

/// Result of a successful token exchange.
#[derive(Clone, PartialEq, Eq)]
pub struct TokenSet {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_in: u64,
    pub obtained_at: DateTime<Utc>,
    pub grant: Grant,
}

impl TokenSet {
    /// `obtained_at + expires_in`, with the lifetime capped at
    /// [`MAX_TOKEN_LIFETIME_SECS`].
    pub fn expiry(&self) -> DateTime<Utc> {
        let secs = self.expires_in.min(MAX_TOKEN_LIFETIME_SECS) as i64;
        TimeDelta::try_seconds(secs)
            .and_then(|ttl| self.obtained_at.checked_add_signed(ttl))
            .unwrap_or(self.obtained_at)
    }
}

// Tokens never show up in debug output.
impl fmt::Debug for TokenSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenSet")
            .field("access_token", &"<redacted>")
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| "<redacted>"))
            .field("expires_in", &self.expires_in)
            .field("obtained_at", &self.obtained_at)
            .field("grant", &self.grant)
            .finish()
    }
}

/// Raw body of the accounts service token endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: Option<String>,
    pub scope: Option<String>,
    pub expires_in: u64,
    pub refresh_token: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Profile {
    pub display_name: String,
    pub followers: u64,
    pub profile_url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlaybackInfo {
    pub track: Option<String>,
    pub artist: Option<String>,
    pub album: Option<String>,
    pub is_playing: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Next,
    Previous,
}

impl Direction {
    pub fn endpoint(&self) -> &'static str {
        match self {
            Direction::Next => "next",
            Direction::Previous => "previous",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserResponse {
    pub display_name: Option<String>,
    pub id: String,
    pub followers: Option<Followers>,
    pub external_urls: Option<ExternalUrls>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Followers {
    pub total: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExternalUrls {
    pub spotify: Option<String>,
}

impl From<UserResponse> for Profile {
    fn from(user: UserResponse) -> Self {
        Profile {
            display_name: user.display_name.unwrap_or(user.id),
            followers: user.followers.map(|f| f.total).unwrap_or_default(),
            profile_url: user.external_urls.and_then(|u| u.spotify),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentlyPlayingResponse {
    pub is_playing: bool,
    pub item: Option<PlayingItem>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayingItem {
    pub name: String,
    #[serde(default)]
    pub artists: Vec<ItemArtist>,
    pub album: Option<ItemAlbum>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemArtist {
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemAlbum {
    pub name: String,
}

impl CurrentlyPlayingResponse {
    /// `None` when the player reports no item at all.
    pub fn into_playback(self) -> Option<PlaybackInfo> {
        let item = self.item?;
        let artist = (!item.artists.is_empty()).then(|| {
            item.artists
                .iter()
                .map(|a| a.name.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        });

        Some(PlaybackInfo {
            track: Some(item.name),
            artist,
            album: item.album.map(|a| a.name),
            is_playing: self.is_playing,
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn tokens(expires_in: u64) -> TokenSet {
        TokenSet {
            access_token: "T1".into(),
            refresh_token: Some("R1".into()),
            expires_in,
            obtained_at: Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap(),
            grant: Grant::User,
        }
    }

    #[test]
    fn expiry_adds_lifetime() {
        assert_eq!(
            tokens(3600).expiry(),
            Utc.with_ymd_and_hms(2025, 3, 1, 13, 0, 0).unwrap()
        );
    }

    #[test]
    fn oversized_lifetime_is_capped_in_the_future() {
        let capped = tokens(MAX_TOKEN_LIFETIME_SECS).expiry();
        for expires_in in [10_000_000_000_000_000, u64::MAX] {
            let set = tokens(expires_in);
            assert!(set.expiry() > set.obtained_at);
            assert_eq!(set.expiry(), capped);
        }
    }

    #[test]
    fn debug_hides_tokens() {
        let debug = format!("{:?}", tokens(3600));
        assert!(!debug.contains("T1"));
        assert!(!debug.contains("R1"));
        assert!(debug.contains("<redacted>"));
    }
}
