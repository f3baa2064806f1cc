use crate::api::ApiClient;
use crate::app::App;
use crate::ui;
use anyhow::Result;
use crossterm::event::{self, Event};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io;
use std::time::Duration;

use super::action_queue::channel;
use super::actions::{enqueue_call, run_action};
use super::views::handle_key_event;

pub async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    client: &ApiClient,
) -> Result<()> {
    let (action_tx, mut action_rx) = channel();

    enqueue_call(&action_tx, Some(app.model.list()));

    loop {
        terminal.draw(|f| ui::render(f, app))?;

        if app.model.is_loading() {
            app.throbber_state.calc_next();
        }

        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                handle_key_event(key, app, &action_tx);
            }
        }

        while let Ok(action) = action_rx.try_recv() {
            run_action(action, app, client, &action_tx);
        }

        if !app.running {
            break;
        }
    }

    if app.model.has_pending_calls() {
        tracing::info!("exiting with task calls still in flight");
    }

    Ok(())
}
