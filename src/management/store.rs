use std::{
    fs, io,
    path::{Path, PathBuf},
    sync::Mutex,
};

use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, params};
use thiserror::Error;

use crate::types::{Credentials, Grant, TokenSet};

pub const ENV_ACCESS_TOKEN: &str = "SPOTIFY_ACCESS_TOKEN";
pub const ENV_REFRESH_TOKEN: &str = "SPOTIFY_REFRESH_TOKEN";
pub const ENV_TOKEN_EXPIRY: &str = "SPOTIFY_TOKEN_EXPIRY";

const CREATE_TABLE: &str = "CREATE TABLE IF NOT EXISTS user (
    user_id INTEGER PRIMARY KEY,
    client_id TEXT NOT NULL,
    client_secret TEXT NOT NULL,
    spotify_token TEXT,
    spotify_refresh_token TEXT,
    spotify_token_expiry TEXT,
    token_grant TEXT
)";

const SINGLE_ROW_ID: i64 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StorageError {
    #[error("credential storage failed: {0}")]
    IoFailure(String),
}

impl From<rusqlite::Error> for StorageError {
    fn from(err: rusqlite::Error) -> Self {
        StorageError::IoFailure(err.to_string())
    }
}

impl From<io::Error> for StorageError {
    fn from(err: io::Error) -> Self {
        StorageError::IoFailure(err.to_string())
    }
}

/// Persistence for the single credential row.
///
/// Writes are whole-row upserts, so concurrent writers resolve as last write
/// wins.
pub trait CredentialStore: Send + Sync {
    /// `Ok(None)` means there has never been a session.
    fn load(&self) -> Result<Option<Credentials>, StorageError>;

    fn save(&self, credentials: &Credentials) -> Result<(), StorageError>;

    /// Persists a freshly exchanged token set on top of the client pair.
    fn save_tokens(&self, client: &Credentials, tokens: &TokenSet) -> Result<(), StorageError> {
        self.save(&client.with_tokens(tokens))
    }

    /// Drops every token field but keeps the client id and secret.
    fn clear_tokens(&self) -> Result<(), StorageError> {
        match self.load()? {
            Some(credentials) => self.save(&credentials.without_tokens()),
            None => Ok(()),
        }
    }
}

/// SQLite-backed [`CredentialStore`].
///
/// Optionally mirrors the token fields into a dotenv file after each save.
pub struct SqliteStore {
    conn: Mutex<Connection>,
    env_mirror: Option<PathBuf>,
}

impl SqliteStore {
    /// Opens (and if needed creates) the database at `path`.
    pub fn open(path: &Path) -> Result<Self, StorageError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        Self::init(Connection::open(path)?)
    }

    pub fn open_in_memory() -> Result<Self, StorageError> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, StorageError> {
        conn.execute(CREATE_TABLE, [])?;
        Ok(Self {
            conn: Mutex::new(conn),
            env_mirror: None,
        })
    }

    pub fn with_env_mirror(mut self, path: impl Into<PathBuf>) -> Self {
        self.env_mirror = Some(path.into());
        self
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>, StorageError> {
        self.conn
            .lock()
            .map_err(|_| StorageError::IoFailure("credential store lock poisoned".to_string()))
    }
}

impl CredentialStore for SqliteStore {
    fn load(&self) -> Result<Option<Credentials>, StorageError> {
        let conn = self.lock()?;
        let row = conn
            .query_row(
                "SELECT client_id, client_secret, spotify_token, spotify_refresh_token,
                        spotify_token_expiry, token_grant
                 FROM user WHERE user_id = ?1",
                params![SINGLE_ROW_ID],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, Option<String>>(2)?,
                        row.get::<_, Option<String>>(3)?,
                        row.get::<_, Option<String>>(4)?,
                        row.get::<_, Option<String>>(5)?,
                    ))
                },
            )
            .optional()?;

        let Some((client_id, client_secret, access_token, refresh_token, expiry, grant)) = row
        else {
            return Ok(None);
        };

        let expiry = match expiry.filter(|e| !e.is_empty()) {
            Some(raw) => Some(
                DateTime::parse_from_rfc3339(&raw)
                    .map_err(|e| StorageError::IoFailure(format!("bad token expiry {raw:?}: {e}")))?
                    .with_timezone(&Utc),
            ),
            None => None,
        };

        Ok(Some(Credentials {
            client_id,
            client_secret,
            access_token: access_token.filter(|t| !t.is_empty()),
            refresh_token: refresh_token.filter(|t| !t.is_empty()),
            expiry,
            grant: grant.as_deref().and_then(Grant::parse),
        }))
    }

    fn save(&self, credentials: &Credentials) -> Result<(), StorageError> {
        // Held across the mirror write so both copies agree on the last writer.
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO user (user_id, client_id, client_secret, spotify_token,
                               spotify_refresh_token, spotify_token_expiry, token_grant)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
             ON CONFLICT(user_id) DO UPDATE SET
                client_id = excluded.client_id,
                client_secret = excluded.client_secret,
                spotify_token = excluded.spotify_token,
                spotify_refresh_token = excluded.spotify_refresh_token,
                spotify_token_expiry = excluded.spotify_token_expiry,
                token_grant = excluded.token_grant",
            params![
                SINGLE_ROW_ID,
                credentials.client_id,
                credentials.client_secret,
                credentials.access_token,
                credentials.refresh_token,
                credentials.expiry.map(|e| e.to_rfc3339()),
                credentials.grant.map(|g| g.as_str()),
            ],
        )?;

        if let Some(path) = &self.env_mirror {
            mirror_tokens(path, credentials)?;
        }
        Ok(())
    }
}

/// Rewrites the token keys of a dotenv file, leaving every other line alone.
pub fn mirror_tokens(path: &Path, credentials: &Credentials) -> Result<(), StorageError> {
    let existing = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == io::ErrorKind::NotFound => String::new(),
        Err(e) => return Err(e.into()),
    };

    let managed = [ENV_ACCESS_TOKEN, ENV_REFRESH_TOKEN, ENV_TOKEN_EXPIRY];
    let mut lines: Vec<String> = existing
        .lines()
        .filter(|line| {
            let key = line.split('=').next().unwrap_or_default().trim();
            !managed.contains(&key)
        })
        .map(str::to_string)
        .collect();

    let values = [
        (ENV_ACCESS_TOKEN, credentials.access_token.clone()),
        (ENV_REFRESH_TOKEN, credentials.refresh_token.clone()),
        (ENV_TOKEN_EXPIRY, credentials.expiry.map(|e| e.to_rfc3339())),
    ];
    for (key, value) in values {
        if let Some(value) = value {
            lines.push(format!("{key}={value}"));
        }
    }

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut content = lines.join("\n");
    content.push('\n');
    fs::write(path, content)?;
    Ok(())
}
