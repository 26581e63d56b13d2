use chrono::{DateTime, Utc};
use ratatui::{
    Frame,
    layout::{Constraint, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
};

use crate::{
    app::{AuthState, CommandKind, Controller, View},
    types::Grant,
    utils,
};

const APP_NAME: &str = " Termify ";

pub fn draw(frame: &mut Frame, controller: &Controller) {
    let [header, body, footer] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(3),
        Constraint::Length(1),
    ])
    .areas(frame.area());

    let faint = Style::default().fg(Color::Gray).add_modifier(Modifier::DIM);

    let title = Line::from(vec![
        Span::styled(
            APP_NAME,
            Style::default()
                .bg(Color::Indexed(99))
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw(" "),
        Span::styled(status_text(controller, Utc::now()), faint),
    ]);
    frame.render_widget(Paragraph::new(title), header);

    let has_error = controller.session().last_error.is_some();
    let lines: Vec<Line> = body_text(controller)
        .into_iter()
        .enumerate()
        .map(|(i, text)| {
            if has_error && i == 0 {
                Line::styled(text, Style::default().fg(Color::Red))
            } else {
                Line::raw(text)
            }
        })
        .collect();

    let block_title = match controller.view().view {
        View::Home => " Home ",
        View::Player => " Player ",
    };
    frame.render_widget(
        Paragraph::new(lines)
            .wrap(Wrap { trim: false })
            .block(Block::default().borders(Borders::ALL).title(block_title)),
        body,
    );

    frame.render_widget(
        Paragraph::new(Line::styled(footer_text(controller.view().view), faint)),
        footer,
    );
}

/// One-line authentication summary for the header.
pub fn status_text(controller: &Controller, now: DateTime<Utc>) -> String {
    let session = controller.session();
    match (session.auth, session.grant) {
        (AuthState::Authenticated, grant) => {
            let who = match grant {
                Some(Grant::App) => "app-only",
                _ => "logged in",
            };
            match session.expiry {
                Some(expiry) => format!("{who} · token {}", utils::describe_expiry(expiry, now)),
                None => who.to_string(),
            }
        }
        (AuthState::Expired, _) => "session expired".to_string(),
        (AuthState::Unauthenticated, _) => "not logged in".to_string(),
    }
}

pub fn footer_text(view: View) -> &'static str {
    match view {
        View::Home => "'p' player · '`' log in · 'q' | 'ctrl+c' quit",
        View::Player => "'←' previous · '→' next · 'esc' back · 'q' | 'ctrl+c' quit",
    }
}

/// Body content as plain lines. Errors replace the normal content.
pub fn body_text(controller: &Controller) -> Vec<String> {
    let session = controller.session();
    let view = controller.view();
    let mut lines = Vec::new();

    if let Some(error) = &session.last_error {
        lines.push(format!("Error: {error}"));
        if let Some(guidance) = error.guidance() {
            lines.push(String::new());
            lines.push(guidance.to_string());
        }
        if let Some(notice) = &view.notice {
            lines.push(String::new());
            lines.push(notice.clone());
        }
        return lines;
    }

    if let Some(notice) = &view.notice {
        lines.push(notice.clone());
        lines.push(String::new());
    }

    match view.view {
        View::Home => {
            lines.push("Press 'p' to enter player.".to_string());
            lines.push(String::new());
            if let Some(profile) = &view.profile {
                lines.push(format!("User: {}", profile.display_name));
                lines.push(format!("Followers: {}", profile.followers));
                if let Some(url) = &profile.profile_url {
                    lines.push(format!("Spotify Profile: {url}"));
                }
            } else if controller.is_loading(CommandKind::Profile) {
                lines.push("Loading user data...".to_string());
            } else if controller.is_loading(CommandKind::TokenExchange) {
                lines.push("Connecting to Spotify...".to_string());
            } else if session.grant == Some(Grant::App) {
                lines.push(
                    "Connected with an app-only token. Press ` to log in with your Spotify account."
                        .to_string(),
                );
            } else {
                lines.push("Not logged in. Press ` to log in.".to_string());
            }
        }
        View::Player => {
            if controller.is_loading(CommandKind::Skip) {
                lines.push("Skipping...".to_string());
            } else if controller.is_loading(CommandKind::NowPlaying) {
                lines.push("Fetching what's playing...".to_string());
            } else if let Some(playing) = &view.now_playing {
                let state = if playing.is_playing { "▶" } else { "⏸" };
                lines.push(format!(
                    "{state} {}",
                    playing.track.as_deref().unwrap_or("Unknown track")
                ));
                if let Some(artist) = &playing.artist {
                    lines.push(format!("Artist: {artist}"));
                }
                if let Some(album) = &playing.album {
                    lines.push(format!("Album: {album}"));
                }
            } else if view.now_playing_known {
                lines.push("Nothing is playing right now.".to_string());
            }
        }
    }

    lines
}
