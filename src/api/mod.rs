//! # API Module
//!
//! HTTP endpoints of the local login server. They exist only to carry the
//! browser through the Spotify authorization-code flow:
//!
//! - [`login`] - redirects to the Spotify consent page with a fresh anti-CSRF `state`
//! - [`callback`] - checks `state`, redeems the code, persists the token set and
//!   notifies the running controller
//! - [`health`] - liveness probe reporting the version and whether a login is pending
//!
//! All handlers receive the shared [`crate::server::ServerState`] through an
//! axum `Extension`.

mod callback;
mod health;
mod login;

pub use callback::callback;
pub use health::health;
pub use login::login;
