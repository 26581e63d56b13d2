use chrono::{DateTime, Utc};

use crate::{
    app::{
        event::{Command, CommandKind, Event, Key},
        pending::PendingCommands,
        state::{AuthState, Session, SessionError, View, ViewState},
    },
    spotify::{AuthError, ServiceError},
    types::{Credentials, Direction, Grant, TokenSet},
};

/// Single-consumer state reducer for the session and the view.
///
/// Every key press and every command result goes through [`handle`](Self::handle)
/// one at a time. The controller never performs I/O itself; it returns the
/// [`Command`]s the dispatcher should run.
#[derive(Debug, Clone)]
pub struct Controller {
    session: Session,
    view: ViewState,
    pending: PendingCommands,
    client: Credentials,
    login_url: String,
    running: bool,
}

impl Controller {
    /// `client` carries the configured client id and secret (possibly empty),
    /// `stored` whatever the credential store held at startup.
    pub fn new(client: Credentials, stored: Option<Credentials>, login_url: impl Into<String>) -> Self {
        let mut session = Session::unauthenticated();
        if let Some(stored) = stored.filter(Credentials::has_token) {
            session.access_token = stored.access_token;
            session.grant = Some(stored.grant.unwrap_or(if stored.refresh_token.is_some() {
                Grant::User
            } else {
                Grant::App
            }));
            session.expiry = stored.expiry;
            session.auth = AuthState::Authenticated;
        }

        Self {
            session,
            view: ViewState::default(),
            pending: PendingCommands::new(),
            client: client.without_tokens(),
            login_url: login_url.into(),
            running: true,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn view(&self) -> &ViewState {
        &self.view
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn is_loading(&self, kind: CommandKind) -> bool {
        self.pending.in_flight(kind)
    }

    /// Startup transition. Call once before feeding events.
    pub fn start(&mut self, now: DateTime<Utc>) -> Vec<Command> {
        let mut commands = Vec::new();

        let stored_expired = self.session.auth == AuthState::Authenticated
            && self.session.expiry.is_some_and(|expiry| now >= expiry);

        match (self.session.auth, self.session.grant) {
            (AuthState::Authenticated, Some(Grant::User)) if stored_expired => {
                self.session.auth = AuthState::Expired;
                self.session.last_error = Some(SessionError::ReauthRequired);
            }
            (AuthState::Authenticated, Some(Grant::User)) => {
                self.issue_profile(&mut commands);
            }
            (AuthState::Authenticated, _) if stored_expired => {
                // An app-only token can be minted again without the user.
                self.session.auth = AuthState::Expired;
                self.exchange_client_credentials(&mut commands);
            }
            (AuthState::Authenticated, _) => {}
            _ => self.exchange_client_credentials(&mut commands),
        }

        commands
    }

    pub fn handle(&mut self, event: Event) -> Vec<Command> {
        let mut commands = Vec::new();

        match event {
            Event::Key(key) => self.on_key(key, &mut commands),
            Event::ProfileFetched { seq, result } => {
                if !self.pending.complete(CommandKind::Profile, seq) {
                    return commands;
                }
                match result {
                    Ok(profile) => self.view.profile = Some(profile),
                    Err(e) => self.on_service_error(e),
                }
            }
            Event::NowPlayingFetched { seq, result } => {
                if !self.pending.complete(CommandKind::NowPlaying, seq) {
                    return commands;
                }
                match result {
                    Ok(playing) => {
                        self.view.now_playing = playing;
                        self.view.now_playing_known = true;
                    }
                    Err(e) => self.on_service_error(e),
                }
            }
            Event::Skipped {
                seq,
                direction,
                result,
            } => {
                if !self.pending.complete(CommandKind::Skip, seq) {
                    return commands;
                }
                match result {
                    Ok(()) => {
                        self.view.notice =
                            Some(format!("Skipped to the {} track.", direction.endpoint()));
                        if let Some(token) = self.session.user_token().map(str::to_string) {
                            let seq = self.pending.issue(CommandKind::NowPlaying);
                            commands.push(Command::FetchCurrentlyPlaying { seq, token });
                        }
                    }
                    Err(e) => self.on_service_error(e),
                }
            }
            Event::TokenAcquired {
                seq,
                tokens,
                persisted,
            } => self.on_token(seq, tokens, persisted, &mut commands),
            Event::TokenFailed { seq, error } => {
                if let Some(seq) = seq {
                    if !self.pending.complete(CommandKind::TokenExchange, seq) {
                        return commands;
                    }
                }
                self.session.last_error = Some(error.into());
            }
            Event::BrowserFailed { url } => {
                self.view.notice = Some(format!("Could not open a browser. Visit {url} to log in."));
            }
            Event::ServerFailed(reason) => {
                self.session.last_error = Some(SessionError::Server(reason));
            }
        }

        commands
    }

    fn on_key(&mut self, key: Key, commands: &mut Vec<Command>) {
        match key {
            Key::Char('q') | Key::CtrlC => self.running = false,
            Key::Char('p') if self.view.view == View::Home => {
                self.view.view = View::Player;
                match self.session.user_token().map(str::to_string) {
                    Some(token) => {
                        self.session.last_error = None;
                        let seq = self.pending.issue(CommandKind::NowPlaying);
                        commands.push(Command::FetchCurrentlyPlaying { seq, token });
                    }
                    None => self.session.last_error = Some(self.session.user_token_error()),
                }
            }
            Key::Esc if self.view.view == View::Player => self.view.view = View::Home,
            Key::Left if self.view.view == View::Player => self.skip(Direction::Previous, commands),
            Key::Right if self.view.view == View::Player => self.skip(Direction::Next, commands),
            Key::Char('`') => {
                self.view.notice = Some(format!(
                    "Complete the login in your browser ({}).",
                    self.login_url
                ));
                commands.push(Command::OpenBrowser {
                    url: self.login_url.clone(),
                });
            }
            _ => {}
        }
    }

    fn skip(&mut self, direction: Direction, commands: &mut Vec<Command>) {
        let Some(token) = self.session.user_token().map(str::to_string) else {
            self.session.last_error = Some(self.session.user_token_error());
            return;
        };

        // One skip at a time; extra presses while it runs are dropped.
        let Some(seq) = self.pending.try_issue(CommandKind::Skip) else {
            return;
        };

        // Whatever the player reported before this skip is stale now.
        self.pending.invalidate(CommandKind::NowPlaying);
        self.session.last_error = None;
        commands.push(Command::SkipTrack {
            seq,
            token,
            direction,
        });
    }

    fn on_service_error(&mut self, error: ServiceError) {
        match error {
            ServiceError::Unauthorized => {
                if self.session.auth != AuthState::Unauthenticated {
                    self.session.auth = AuthState::Expired;
                }
                self.session.last_error = Some(SessionError::ReauthRequired);
            }
            other => self.session.last_error = Some(other.into()),
        }
    }

    fn on_token(
        &mut self,
        seq: Option<u64>,
        tokens: TokenSet,
        persisted: Result<(), crate::management::StorageError>,
        commands: &mut Vec<Command>,
    ) {
        match seq {
            Some(seq) => {
                if !self.pending.complete(CommandKind::TokenExchange, seq) {
                    return;
                }
                // A late app-only token never replaces a live user session.
                if tokens.grant == Grant::App
                    && self.session.auth == AuthState::Authenticated
                    && self.session.grant == Some(Grant::User)
                {
                    return;
                }
            }
            // Browser login wins over any bootstrap exchange still running.
            None => self.pending.invalidate(CommandKind::TokenExchange),
        }

        // Anything still running was issued with the old token.
        for kind in [CommandKind::Profile, CommandKind::NowPlaying, CommandKind::Skip] {
            self.pending.invalidate(kind);
        }

        self.session.access_token = Some(tokens.access_token.clone());
        self.session.grant = Some(tokens.grant);
        self.session.expiry = Some(tokens.expiry());
        self.session.auth = AuthState::Authenticated;
        self.session.last_error = persisted.err().map(SessionError::from);

        if tokens.grant == Grant::User {
            self.view.notice = None;
            self.issue_profile(commands);
            if self.view.view == View::Player {
                let seq = self.pending.issue(CommandKind::NowPlaying);
                commands.push(Command::FetchCurrentlyPlaying {
                    seq,
                    token: tokens.access_token,
                });
            }
        }
    }

    fn issue_profile(&mut self, commands: &mut Vec<Command>) {
        if let Some(token) = self.session.user_token().map(str::to_string) {
            let seq = self.pending.issue(CommandKind::Profile);
            commands.push(Command::FetchProfile { seq, token });
        }
    }

    fn exchange_client_credentials(&mut self, commands: &mut Vec<Command>) {
        if !self.client.has_client() {
            self.session.last_error = Some(AuthError::MissingCredentials.into());
            return;
        }

        if let Some(seq) = self.pending.try_issue(CommandKind::TokenExchange) {
            commands.push(Command::ExchangeClientCredentials {
                seq,
                client_id: self.client.client_id.clone(),
                client_secret: self.client.client_secret.clone(),
            });
        }
    }
}
