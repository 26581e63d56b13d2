use std::{net::SocketAddr, sync::Arc};

use axum::{Extension, Router, routing::get};
use tokio::sync::{Mutex, mpsc::UnboundedSender};

use crate::{
    api,
    app::Event,
    management::CredentialStore,
    spotify::SpotifyAuth,
    types::{Credentials, TokenSet},
};

/// Progress of the current browser login.
#[derive(Debug, Default)]
pub struct LoginState {
    /// `state` handed out by the last `/login`, consumed by `/callback`.
    pub csrf_state: Option<String>,
    pub outcome: Option<Result<TokenSet, String>>,
}

/// Everything the login endpoints share with the rest of the process.
#[derive(Clone)]
pub struct ServerState {
    pub auth: Arc<SpotifyAuth>,
    pub store: Arc<dyn CredentialStore>,
    pub client: Credentials,
    pub login: Arc<Mutex<LoginState>>,
    pub events: Option<UnboundedSender<Event>>,
}

impl ServerState {
    pub fn new(auth: Arc<SpotifyAuth>, store: Arc<dyn CredentialStore>, client: Credentials) -> Self {
        Self {
            auth,
            store,
            client: client.without_tokens(),
            login: Arc::new(Mutex::new(LoginState::default())),
            events: None,
        }
    }

    /// Also report login results to the controller loop.
    pub fn with_events(mut self, events: UnboundedSender<Event>) -> Self {
        self.events = Some(events);
        self
    }

    pub(crate) fn notify(&self, event: Event) {
        if let Some(events) = &self.events {
            let _ = events.send(event);
        }
    }
}

pub fn router(state: ServerState) -> Router {
    Router::new()
        .route("/health", get(api::health))
        .route("/login", get(api::login))
        .route("/callback", get(api::callback))
        .layer(Extension(state))
}

/// Serves the login endpoints until the process exits.
pub async fn start_api_server(state: ServerState, addr: SocketAddr) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, router(state)).await
}
