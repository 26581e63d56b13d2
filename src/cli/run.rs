use std::{io, sync::Arc};

use chrono::Utc;
use crossterm::{
    event::{Event as TermEvent, EventStream, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use futures_util::StreamExt;
use ratatui::{Terminal, backend::CrosstermBackend};
use tokio::sync::mpsc;

use crate::{
    Res,
    app::{Controller, Dispatcher, Event, Key},
    cli,
    config::Config,
    management::CredentialStore,
    server::{ServerState, start_api_server},
    spotify::SpotifyClient,
    ui,
};

type Term = Terminal<CrosstermBackend<io::Stdout>>;

/// Runs the interactive client until the user quits.
pub async fn run(config: Config) -> Res<()> {
    let store = cli::open_store(&config);
    let stored = cli::load_stored(store.as_ref());
    let client = cli::resolve_client(&config, stored.as_ref());

    let http = cli::http_client(&config);
    let auth = Arc::new(cli::spotify_auth(http.clone(), &config, &client));
    let service = Arc::new(SpotifyClient::new(http, config.api_url.clone()));
    let store: Arc<dyn CredentialStore> = store;

    let (tx, mut rx) = mpsc::unbounded_channel::<Event>();

    let server_state =
        ServerState::new(Arc::clone(&auth), Arc::clone(&store), client.clone()).with_events(tx.clone());
    let server_events = tx.clone();
    let addr = config.server_addr;
    tokio::spawn(async move {
        if let Err(e) = start_api_server(server_state, addr).await {
            let _ = server_events.send(Event::ServerFailed(format!("{addr}: {e}")));
        }
    });

    let dispatcher = Dispatcher::new(service, auth, store, tx);
    let mut controller = Controller::new(client, stored, config.login_url());

    let mut terminal = setup_terminal()?;
    let result = event_loop(&mut terminal, &mut controller, &dispatcher, &mut rx).await;
    restore_terminal(&mut terminal)?;
    result
}

async fn event_loop(
    terminal: &mut Term,
    controller: &mut Controller,
    dispatcher: &Dispatcher,
    rx: &mut mpsc::UnboundedReceiver<Event>,
) -> Res<()> {
    let mut keys = EventStream::new();

    for command in controller.start(Utc::now()) {
        dispatcher.dispatch(command);
    }

    while controller.is_running() {
        terminal.draw(|frame| ui::draw(frame, controller))?;

        let event = tokio::select! {
            Some(term_event) = keys.next() => match term_event? {
                TermEvent::Key(key) if key.kind == KeyEventKind::Press => Event::Key(Key::from(key)),
                // Resize and friends only need a redraw.
                _ => continue,
            },
            Some(event) = rx.recv() => event,
            else => break,
        };

        for command in controller.handle(event) {
            dispatcher.dispatch(command);
        }
    }

    Ok(())
}

fn setup_terminal() -> Res<Term> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    Ok(Terminal::new(CrosstermBackend::new(stdout))?)
}

fn restore_terminal(terminal: &mut Term) -> Res<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}
