use anyhow::Context;
use axum_login::tower_sessions::{CachingSessionStore, ExpiredDeletion};
use clap::Parser;
use sqlx::postgres::PgPoolOptions;
use tokio::net::TcpListener;
use tower_sessions::MemoryStore;
use tower_sessions_moka_store::MokaStore;
use tower_sessions_sqlx_store::PostgresStore;
use tracing_subscriber::{fmt::time::LocalTime, EnvFilter};
use url::Url;

use crate::{
    app_state::AppState,
    auth::{AuthBackend, OAuthProvider},
    config::read_config,
};

mod app_state;
mod auth;
mod config;
mod domain;
mod repositories;
mod router;
mod routes;

#[derive(Debug, Parser)]
#[command(name = "vimtodo-api", about = "Task API for the vimtodo client")]
struct Cli {
    /// Keep users, tasks and sessions in process memory instead of PostgreSQL
    #[arg(long)]
    in_memory: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_timer(LocalTime::rfc_3339())
        .init();

    let config = read_config().context("Failed to read configuration")?;
    let app_url = Url::parse(&config.application.app_url).context("Invalid app_url")?;
    let oauth = config
        .auth
        .oauth
        .as_ref()
        .map(OAuthProvider::from_settings)
        .transpose()
        .context("Invalid OAuth configuration")?;
    if oauth.is_none() {
        tracing::info!("no OAuth provider configured, password login only");
    }
    let secure_cookies = config.application.secure_cookies;

    let app = if cli.in_memory {
        tracing::warn!("running with in-memory storage, nothing will be persisted");
        let app_state = AppState::in_memory(app_url);
        let backend = AuthBackend::new(app_state.users.clone(), oauth);
        router::create(app_state, backend, MemoryStore::default(), secure_cookies)
    } else {
        let pool = PgPoolOptions::new()
            .connect_with(config.database.with_db())
            .await
            .context("Failed to connect to Postgres")?;
        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .context("Failed to run database migrations")?;

        // DB-backed sessions survive restarts; Moka keeps hot ones off the DB.
        let db_store = PostgresStore::new(pool.clone());
        db_store
            .migrate()
            .await
            .context("Failed to run session store migration")?;
        tokio::task::spawn(
            db_store
                .clone()
                .continuously_delete_expired(tokio::time::Duration::from_secs(60)),
        );
        let session_store = CachingSessionStore::new(MokaStore::new(Some(2_000)), db_store);

        let app_state = AppState::new(app_url, pool);
        let backend = AuthBackend::new(app_state.users.clone(), oauth);
        router::create(app_state, backend, session_store, secure_cookies)
    };

    let addr = format!("{}:{}", config.application.host, config.application.port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    tracing::info!(%addr, "listening");

    axum::serve(listener, app).await?;
    Ok(())
}
