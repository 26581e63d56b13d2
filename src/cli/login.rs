use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::Mutex;

use crate::{
    cli,
    config::Config,
    error, info,
    management::CredentialStore,
    server::{LoginState, ServerState, start_api_server},
    success,
    types::TokenSet,
    utils, warning,
};

const LOGIN_TIMEOUT: Duration = Duration::from_secs(120);

/// Browser login without the interactive client.
///
/// 1. Starts the local login server
/// 2. Opens `/login` in the default browser, which forwards to Spotify
/// 3. Waits for `/callback` to redeem and store the token
pub async fn login(config: Config) {
    let store = cli::open_store(&config);
    let stored = cli::load_stored(store.as_ref());
    let client = cli::resolve_client(&config, stored.as_ref());
    if !client.has_client() {
        error!(
            "SPOTIFY_API_AUTH_CLIENT_ID and SPOTIFY_API_AUTH_CLIENT_SECRET must be set in {}",
            config.env_path.display()
        );
    }

    let http = cli::http_client(&config);
    let auth = Arc::new(cli::spotify_auth(http, &config, &client));
    let store: Arc<dyn CredentialStore> = store;
    let state = ServerState::new(auth, store, client);
    let login_state = Arc::clone(&state.login);

    let addr = config.server_addr;
    tokio::spawn(async move {
        if let Err(e) = start_api_server(state, addr).await {
            error!("Cannot start login server on {}: {}", addr, e);
        }
    });

    let url = config.login_url();
    info!("Opening {} in your browser...", url);
    if webbrowser::open(&url).is_err() {
        warning!(
            "Failed to open browser. Please navigate to the following URL manually:\n{}",
            url
        )
    }

    let pb = ProgressBar::new_spinner();
    pb.set_message("Waiting for Spotify to call back...");
    pb.enable_steady_tick(Duration::from_millis(100));
    if let Ok(style) = ProgressStyle::with_template("{spinner:.blue} {msg}") {
        pb.set_style(style.tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"));
    }

    let outcome = wait_for_outcome(login_state, LOGIN_TIMEOUT).await;
    pb.finish_and_clear();

    match outcome {
        Some(Ok(tokens)) => success!(
            "Authentication successful! Token valid for {}.",
            utils::describe_expiry(tokens.expiry(), chrono::Utc::now())
        ),
        Some(Err(e)) => error!("Authentication failed: {}", e),
        None => error!("Authentication timed out."),
    }
}

async fn wait_for_outcome(
    login: Arc<Mutex<LoginState>>,
    max_wait: Duration,
) -> Option<Result<TokenSet, String>> {
    let start = Instant::now();

    while start.elapsed() < max_wait {
        if let Some(outcome) = login.lock().await.outcome.take() {
            return Some(outcome);
        }
        tokio::time::sleep(Duration::from_millis(500)).await;
    }

    None
}
