//! termify - a terminal client for the Spotify Web API
//!
//! Shows the logged-in account and the currently playing track, and skips
//! tracks from the keyboard. The interesting part is the session handling:
//! tokens come from two OAuth grants, are persisted in a local SQLite store,
//! and expire or get revoked while the client is running.
//!
//! # Modules
//!
//! - `api` - HTTP endpoints of the local login server
//! - `app` - the session & view controller and its command dispatcher
//! - `cli` - subcommand entry points
//! - `config` - configuration from the environment and `.env`
//! - `management` - the credential store
//! - `server` - the local login server
//! - `spotify` - Spotify accounts and Web API clients
//! - `types` - data structures shared across modules
//! - `ui` - terminal rendering
//! - `utils` - small helpers

pub mod api;
pub mod app;
pub mod cli;
pub mod config;
pub mod management;
pub mod server;
pub mod spotify;
pub mod types;
pub mod ui;
pub mod utils;

/// Boxed error for startup plumbing, where any failure ends the command.
pub type Res<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

// The output macros below write straight to stdout. They are meant for the
// subcommands and for startup, never while the interactive client owns the
// terminal.

/// `[o] message` in blue.
///
/// ```
/// info!("Opening {} in your browser...", url);
/// ```
#[macro_export]
macro_rules! info {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "o".blue().bold(), std::format_args!($($arg)*));
  })
}

/// `[✓] message` in green.
#[macro_export]
macro_rules! success {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "✓".green().bold(), std::format_args!($($arg)*));
  })
}

/// `[!] message` in red, then exits with status 1.
///
/// Evaluates to `!`, so it can end a `match` arm:
///
/// ```
/// let store = match SqliteStore::open(&path) {
///     Ok(store) => store,
///     Err(e) => error!("Cannot open credential store: {}", e),
/// };
/// ```
#[macro_export]
macro_rules! error {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    eprintln!("[{}] {}", "!".red().bold(), std::format_args!($($arg)*));
    std::process::exit(1);
  })
}

/// `[!] message` in yellow. Does not exit.
#[macro_export]
macro_rules! warning {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "!".yellow().bold(), std::format_args!($($arg)*));
  })
}
