use std::sync::Arc;

use tokio::sync::mpsc::UnboundedSender;

use crate::{
    app::event::{Command, Event},
    management::{CredentialStore, StorageError},
    spotify::{ServiceClient, TokenProvider},
    types::{Credentials, TokenSet},
};

/// Runs [`Command`]s as independent tasks and posts each result back to the
/// controller as exactly one [`Event`].
#[derive(Clone)]
pub struct Dispatcher {
    service: Arc<dyn ServiceClient>,
    tokens: Arc<dyn TokenProvider>,
    store: Arc<dyn CredentialStore>,
    events: UnboundedSender<Event>,
}

impl Dispatcher {
    pub fn new(
        service: Arc<dyn ServiceClient>,
        tokens: Arc<dyn TokenProvider>,
        store: Arc<dyn CredentialStore>,
        events: UnboundedSender<Event>,
    ) -> Self {
        Self {
            service,
            tokens,
            store,
            events,
        }
    }

    /// Spawns `command` without waiting for it.
    pub fn dispatch(&self, command: Command) {
        let this = self.clone();
        tokio::spawn(async move {
            if let Some(event) = this.execute(command).await {
                // The loop is gone once the user quit; nothing left to tell.
                let _ = this.events.send(event);
            }
        });
    }

    /// Runs `command` to completion and returns the event it resolves to.
    pub async fn execute(&self, command: Command) -> Option<Event> {
        match command {
            Command::FetchProfile { seq, token } => Some(Event::ProfileFetched {
                seq,
                result: self.service.fetch_profile(&token).await,
            }),
            Command::FetchCurrentlyPlaying { seq, token } => Some(Event::NowPlayingFetched {
                seq,
                result: self.service.fetch_currently_playing(&token).await,
            }),
            Command::SkipTrack {
                seq,
                token,
                direction,
            } => Some(Event::Skipped {
                seq,
                direction,
                result: self.service.skip_track(&token, direction).await,
            }),
            Command::ExchangeClientCredentials {
                seq,
                client_id,
                client_secret,
            } => {
                let event = match self
                    .tokens
                    .exchange_client_credentials(&client_id, &client_secret)
                    .await
                {
                    Ok(tokens) => {
                        let client = Credentials::new(client_id, client_secret);
                        let persisted = persist(Arc::clone(&self.store), client, tokens.clone()).await;
                        Event::TokenAcquired {
                            seq: Some(seq),
                            tokens,
                            persisted,
                        }
                    }
                    Err(error) => Event::TokenFailed {
                        seq: Some(seq),
                        error,
                    },
                };
                Some(event)
            }
            Command::OpenBrowser { url } => {
                let target = url.clone();
                let opened = tokio::task::spawn_blocking(move || webbrowser::open(&target))
                    .await
                    .map(|res| res.is_ok())
                    .unwrap_or(false);
                (!opened).then_some(Event::BrowserFailed { url })
            }
        }
    }
}

/// Writes a token set through the store on the blocking pool.
pub async fn persist(
    store: Arc<dyn CredentialStore>,
    client: Credentials,
    tokens: TokenSet,
) -> Result<(), StorageError> {
    tokio::task::spawn_blocking(move || store.save_tokens(&client, &tokens))
        .await
        .map_err(|e| StorageError::IoFailure(e.to_string()))?
}
