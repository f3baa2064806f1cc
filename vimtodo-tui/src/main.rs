mod api;
mod app;
mod bootstrap;
mod cli;
mod config;
mod login;
mod runtime;
mod session_store;
mod types;
mod ui;
mod vim;

use anyhow::{Context, Result};
use api::ApiClient;
use clap::Parser;
use cli::{Cli, Commands};
use config::VimtodoConfig;
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io;
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = VimtodoConfig::load()?;

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => {
            let _log_guard = init_logging(&config.log_level, &config.log_path()?);
            let client = bootstrap::connect(&config)?;
            run_tui(client).await
        }
        Commands::Dev => {
            let _log_guard = init_logging(&config.log_level, &config.log_path()?);
            println!("Running in dev mode with in-memory tasks.");
            run_tui(ApiClient::dev()?).await
        }
        Commands::Login { password, email } => {
            if password {
                login::run_password_login(&config.api_url, email).await?;
            } else {
                login::run_oauth_login(&config.api_url).await?;
            }
            Ok(())
        }
        Commands::Logout => {
            if let Some(session_id) = session_store::load_session()? {
                let client = ApiClient::new(&config.api_url, &session_id)?;
                if let Err(e) = client.logout().await {
                    eprintln!("Warning: server logout failed: {}", e);
                }
            }
            session_store::clear_session()?;
            println!("Logged out.");
            Ok(())
        }
        Commands::ConfigPath => {
            let path = VimtodoConfig::ensure_config_file()?;
            println!("{}", path.display());
            Ok(())
        }
    }
}

async fn run_tui(client: ApiClient) -> Result<()> {
    let mut app = bootstrap::initialize_app(&client).await?;
    tracing::info!(dev = client.is_dev(), "vimtodo starting");

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = runtime::run_app(&mut terminal, &mut app, &client).await;

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    tracing::info!("vimtodo exiting");
    res.context("Terminal UI failed")
}

/// Logs go to a file; stdout belongs to the terminal UI.
fn init_logging(level: &str, log_path: &Path) -> Option<WorkerGuard> {
    let log_dir = log_path.parent()?;
    let file_name = log_path.file_name()?.to_str()?;
    std::fs::create_dir_all(log_dir).ok()?;

    let file_appender = tracing_appender::rolling::never(log_dir, file_name);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_env_filter(env_filter)
        .with_ansi(false)
        .init();

    Some(guard)
}
