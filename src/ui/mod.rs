//! Terminal client for the repo2resume API.
//!
//! Startup order: panic hook, terminal, event task, initial fetches. The loop
//! exits only via `break` so the terminal is always restored.

mod api;
mod app;
mod clipboard;
mod event;
mod keys;
mod render;
mod tui;

use api::BackendClient;
use app::{App, Command, Response};
use event::{AppEvent, EventHandler, EventSender};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Run the UI against the API at `api_url` until the user quits
pub async fn run(api_url: &str, timeout: Duration) -> anyhow::Result<()> {
    let backend = Arc::new(BackendClient::new(api_url, timeout)?);
    info!(api = %backend.base_url(), "starting ui");

    tui::install_panic_hook();
    let mut terminal = tui::init_tui()?;

    let handler = EventHandler::new();
    event::spawn_event_task(handler.tx.clone());
    let tx = handler.tx;
    let mut rx = handler.rx;

    let mut app = App::default();
    let initial = app.start();
    dispatch(&mut app, initial, &backend, &tx);

    let outcome: anyhow::Result<()> = loop {
        let Some(event) = rx.recv().await else {
            break Ok(());
        };

        match event {
            AppEvent::Render => {
                if let Err(e) = terminal.draw(|frame| render::render(frame, &app)) {
                    break Err(e.into());
                }
            }
            AppEvent::Key(key) => {
                let commands = keys::handle_key(&mut app, key);
                dispatch(&mut app, commands, &backend, &tx);
            }
            AppEvent::Response(response) => {
                if !app.apply(response) {
                    debug!("dropped stale response");
                }
            }
        }

        if app.should_quit {
            break Ok(());
        }
    };

    tui::restore_tui()?;
    info!("ui stopped");
    outcome
}

/// Run commands: network calls on spawned tasks, clipboard inline
fn dispatch(app: &mut App, commands: Vec<Command>, backend: &Arc<BackendClient>, tx: &EventSender) {
    for command in commands {
        match command {
            Command::Copy(text) => match clipboard::copy(&text) {
                Ok(()) => app.status = Some("Copied to clipboard".to_string()),
                Err(e) => {
                    warn!(error = %e, "clipboard write failed");
                    app.status = Some("Copy failed".to_string());
                }
            },
            command => spawn_request(command, Arc::clone(backend), tx.clone()),
        }
    }
}

fn spawn_request(command: Command, backend: Arc<BackendClient>, tx: EventSender) {
    tokio::spawn(async move {
        let response = match command {
            Command::FetchRepos(ticket) => {
                Response::Repos(ticket, backend.list_repositories().await.map_err(|e| e.to_string()))
            }
            Command::FetchDefaultPrompt(ticket) => {
                Response::DefaultPrompt(ticket, backend.default_prompt().await.map_err(|e| e.to_string()))
            }
            Command::FetchPullRequests {
                ticket,
                repo,
                page,
                per_page,
            } => {
                let result = backend.list_pull_requests(&repo, page, per_page).await;
                Response::PullRequests(ticket, result.map_err(|e| e.to_string()))
            }
            Command::Generate { ticket, body } => {
                let result = backend.generate_summary(&body).await;
                if let Err(e) = &result {
                    warn!(repo = %body.repo_name, error = %e, "summary generation failed");
                }
                Response::Summary(ticket, result.map_err(|e| e.to_string()))
            }
            Command::Copy(_) => return,
        };

        let _ = tx.send(AppEvent::Response(response));
    });
}
