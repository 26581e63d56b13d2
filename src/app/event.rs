use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::{
    management::StorageError,
    spotify::{AuthError, ServiceError},
    types::{Direction, PlaybackInfo, Profile, TokenSet},
};

/// Keys the controller cares about. Everything else maps to [`Key::Other`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Char(char),
    Esc,
    Left,
    Right,
    CtrlC,
    Other,
}

impl From<KeyEvent> for Key {
    fn from(key: KeyEvent) -> Self {
        match key.code {
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => Key::CtrlC,
            KeyCode::Char(c) => Key::Char(c),
            KeyCode::Esc => Key::Esc,
            KeyCode::Left => Key::Left,
            KeyCode::Right => Key::Right,
            _ => Key::Other,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandKind {
    Profile,
    NowPlaying,
    Skip,
    TokenExchange,
}

impl CommandKind {
    pub const ALL: [CommandKind; 4] = [
        CommandKind::Profile,
        CommandKind::NowPlaying,
        CommandKind::Skip,
        CommandKind::TokenExchange,
    ];

    pub(crate) fn index(self) -> usize {
        match self {
            CommandKind::Profile => 0,
            CommandKind::NowPlaying => 1,
            CommandKind::Skip => 2,
            CommandKind::TokenExchange => 3,
        }
    }
}

/// Work the controller asks the dispatcher to do off the event loop.
///
/// Every network command carries the sequence number its result must echo.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    ExchangeClientCredentials {
        seq: u64,
        client_id: String,
        client_secret: String,
    },
    FetchProfile {
        seq: u64,
        token: String,
    },
    FetchCurrentlyPlaying {
        seq: u64,
        token: String,
    },
    SkipTrack {
        seq: u64,
        token: String,
        direction: Direction,
    },
    OpenBrowser {
        url: String,
    },
}

impl Command {
    pub fn kind(&self) -> Option<CommandKind> {
        match self {
            Command::ExchangeClientCredentials { .. } => Some(CommandKind::TokenExchange),
            Command::FetchProfile { .. } => Some(CommandKind::Profile),
            Command::FetchCurrentlyPlaying { .. } => Some(CommandKind::NowPlaying),
            Command::SkipTrack { .. } => Some(CommandKind::Skip),
            Command::OpenBrowser { .. } => None,
        }
    }
}

/// Input to the controller. Results are immutable values posted back by
/// dispatched tasks or by the login server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Key(Key),
    ProfileFetched {
        seq: u64,
        result: Result<Profile, ServiceError>,
    },
    NowPlayingFetched {
        seq: u64,
        result: Result<Option<PlaybackInfo>, ServiceError>,
    },
    Skipped {
        seq: u64,
        direction: Direction,
        result: Result<(), ServiceError>,
    },
    /// `seq` is `None` when the token came through the browser login.
    /// `persisted` reports whether the durable write succeeded.
    TokenAcquired {
        seq: Option<u64>,
        tokens: TokenSet,
        persisted: Result<(), StorageError>,
    },
    TokenFailed {
        seq: Option<u64>,
        error: AuthError,
    },
    BrowserFailed {
        url: String,
    },
    ServerFailed(String),
}
