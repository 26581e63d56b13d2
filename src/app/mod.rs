//! # Session & View Controller
//!
//! The interactive core of termify. Key presses and the results of network
//! work arrive as [`Event`]s and are folded, one at a time, into the
//! [`Session`] (who we are to Spotify) and the [`ViewState`] (what the user
//! sees). Network work is described as [`Command`]s that the [`Dispatcher`]
//! runs as separate tasks.
//!
//! ```text
//! keys ─────────┐
//!               ├─► Controller::handle ─► Vec<Command> ─► Dispatcher ─┐
//! results ◄─────┘                                                     │
//!    ▲                                                                │
//!    └──────────────────────── Event ◄────────────────────────────────┘
//! ```
//!
//! Results carry the sequence number of the command that produced them; the
//! [`PendingCommands`] table drops anything that has been superseded.

mod controller;
mod dispatch;
mod event;
mod pending;
mod state;

pub use controller::Controller;
pub use dispatch::{Dispatcher, persist};
pub use event::{Command, CommandKind, Event, Key};
pub use pending::PendingCommands;
pub use state::{AuthState, Session, SessionError, View, ViewState};
