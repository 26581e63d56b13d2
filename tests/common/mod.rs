#![allow(dead_code)]

use std::{
    collections::VecDeque,
    net::SocketAddr,
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
};

use async_trait::async_trait;
use axum::Router;
use chrono::{Duration, Utc};
use tokio::sync::mpsc;

use termify::{
    app::{Command, Controller, Dispatcher},
    config::Config,
    management::{CredentialStore, SqliteStore},
    spotify::{AuthError, ServiceClient, ServiceError, TokenProvider},
    types::{Credentials, Direction, Grant, PlaybackInfo, Profile, TokenSet},
};

pub const LOGIN_URL: &str = "http://127.0.0.1:8888/login";

pub fn song(track: &str) -> PlaybackInfo {
    PlaybackInfo {
        track: Some(track.to_string()),
        artist: Some("Artist X".to_string()),
        album: Some("Album Y".to_string()),
        is_playing: true,
    }
}

pub fn profile() -> Profile {
    Profile {
        display_name: "Ada".to_string(),
        followers: 3,
        profile_url: Some("https://open.spotify.com/user/ada".to_string()),
    }
}

pub fn user_tokens(access: &str) -> TokenSet {
    TokenSet {
        access_token: access.to_string(),
        refresh_token: Some(format!("refresh-{access}")),
        expires_in: 3600,
        obtained_at: Utc::now(),
        grant: Grant::User,
    }
}

pub fn app_tokens(access: &str) -> TokenSet {
    TokenSet {
        access_token: access.to_string(),
        refresh_token: None,
        expires_in: 3600,
        obtained_at: Utc::now(),
        grant: Grant::App,
    }
}

pub fn client() -> Credentials {
    Credentials::new("client-id", "client-secret")
}

/// A stored row holding a user token valid for another hour.
pub fn stored_user(access: &str) -> Credentials {
    client().with_tokens(&user_tokens(access))
}

pub fn stored_expired_user(access: &str) -> Credentials {
    let mut tokens = user_tokens(access);
    tokens.obtained_at = Utc::now() - Duration::hours(2);
    client().with_tokens(&tokens)
}

/// Config with every network endpoint pointed at `base`.
pub fn config_for(base: &str, db_path: &str) -> Config {
    let pairs = vec![
        ("SPOTIFY_API_AUTH_CLIENT_ID".to_string(), "client-id".to_string()),
        ("SPOTIFY_API_AUTH_CLIENT_SECRET".to_string(), "client-secret".to_string()),
        ("SPOTIFY_API_AUTH_URL".to_string(), format!("{base}/authorize")),
        ("SPOTIFY_API_TOKEN_URL".to_string(), format!("{base}/api/token")),
        ("SPOTIFY_API_URL".to_string(), format!("{base}/v1")),
        ("TERMIFY_DB_PATH".to_string(), db_path.to_string()),
    ];
    Config::from_lookup(move |key| {
        pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.clone())
    })
    .unwrap()
}

/// Serves `router` on an ephemeral local port.
pub async fn serve(router: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    addr
}

/// In-process player that accepts exactly one access token at a time.
pub struct FakeService {
    accepted: Mutex<Option<String>>,
    playing: Mutex<Option<PlaybackInfo>>,
    pub profile_calls: AtomicUsize,
    pub playing_calls: AtomicUsize,
    pub skip_calls: AtomicUsize,
}

impl FakeService {
    pub fn accepting(token: &str) -> Arc<Self> {
        Arc::new(Self {
            accepted: Mutex::new(Some(token.to_string())),
            playing: Mutex::new(Some(song("Song A"))),
            profile_calls: AtomicUsize::new(0),
            playing_calls: AtomicUsize::new(0),
            skip_calls: AtomicUsize::new(0),
        })
    }

    /// Every token is rejected from now on.
    pub fn revoke(&self) {
        *self.accepted.lock().unwrap() = None;
    }

    pub fn accept(&self, token: &str) {
        *self.accepted.lock().unwrap() = Some(token.to_string());
    }

    pub fn skips(&self) -> usize {
        self.skip_calls.load(Ordering::SeqCst)
    }

    pub fn total_calls(&self) -> usize {
        self.profile_calls.load(Ordering::SeqCst)
            + self.playing_calls.load(Ordering::SeqCst)
            + self.skip_calls.load(Ordering::SeqCst)
    }

    fn check(&self, token: &str) -> Result<(), ServiceError> {
        match self.accepted.lock().unwrap().as_deref() {
            Some(accepted) if accepted == token => Ok(()),
            _ => Err(ServiceError::Unauthorized),
        }
    }
}

#[async_trait]
impl ServiceClient for FakeService {
    async fn fetch_profile(&self, token: &str) -> Result<Profile, ServiceError> {
        self.profile_calls.fetch_add(1, Ordering::SeqCst);
        self.check(token)?;
        Ok(profile())
    }

    async fn fetch_currently_playing(
        &self,
        token: &str,
    ) -> Result<Option<PlaybackInfo>, ServiceError> {
        self.playing_calls.fetch_add(1, Ordering::SeqCst);
        self.check(token)?;
        Ok(self.playing.lock().unwrap().clone())
    }

    async fn skip_track(&self, token: &str, direction: Direction) -> Result<(), ServiceError> {
        self.skip_calls.fetch_add(1, Ordering::SeqCst);
        self.check(token)?;
        let track = match direction {
            Direction::Next => "Song B",
            Direction::Previous => "Song Z",
        };
        *self.playing.lock().unwrap() = Some(song(track));
        Ok(())
    }
}

/// Token provider that hands out app tokens named after the call count.
pub struct FakeTokens {
    pub calls: AtomicUsize,
}

impl FakeTokens {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl TokenProvider for FakeTokens {
    async fn exchange_authorization_code(&self, code: &str) -> Result<TokenSet, AuthError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(user_tokens(&format!("user-{code}")))
    }

    async fn exchange_client_credentials(
        &self,
        client_id: &str,
        client_secret: &str,
    ) -> Result<TokenSet, AuthError> {
        if client_id.is_empty() || client_secret.is_empty() {
            return Err(AuthError::MissingCredentials);
        }
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(app_tokens(&format!("app-{n}")))
    }
}

/// Controller plus real dispatcher over fakes, driven synchronously.
pub struct Harness {
    pub controller: Controller,
    pub dispatcher: Dispatcher,
    pub service: Arc<FakeService>,
    pub tokens: Arc<FakeTokens>,
    pub store: Arc<SqliteStore>,
}

impl Harness {
    pub fn new(stored: Option<Credentials>, client: Credentials, service: Arc<FakeService>) -> Self {
        let store = Arc::new(SqliteStore::open_in_memory().unwrap());
        if let Some(stored) = &stored {
            store.save(stored).unwrap();
        }
        let tokens = FakeTokens::new();
        let (tx, _rx) = mpsc::unbounded_channel();
        let dispatcher = Dispatcher::new(
            service.clone(),
            tokens.clone(),
            store.clone() as Arc<dyn CredentialStore>,
            tx,
        );

        Self {
            controller: Controller::new(client, stored, LOGIN_URL),
            dispatcher,
            service,
            tokens,
            store,
        }
    }

    pub async fn start(&mut self) {
        let commands = self.controller.start(Utc::now());
        self.drain(commands).await;
    }

    pub async fn send(&mut self, event: termify::app::Event) {
        let commands = self.controller.handle(event);
        self.drain(commands).await;
    }

    /// Runs commands and feeds their results back until nothing is left.
    /// Browser commands are skipped.
    pub async fn drain(&mut self, commands: Vec<Command>) {
        let mut queue: VecDeque<Command> = commands.into();
        while let Some(command) = queue.pop_front() {
            if matches!(command, Command::OpenBrowser { .. }) {
                continue;
            }
            if let Some(event) = self.dispatcher.execute(command).await {
                queue.extend(self.controller.handle(event));
            }
        }
    }
}
