use std::sync::Arc;

use sqlx::PgPool;
use url::Url;

use crate::repositories::{
    InMemoryTaskRepository, InMemoryUserRepository, PgTaskRepository, PgUserRepository,
    TaskRepository, UserRepository,
};

#[derive(Clone)]
pub struct AppState {
    pub app_url: Url,
    pub tasks: Arc<dyn TaskRepository>,
    pub users: Arc<dyn UserRepository>,
}

impl AppState {
    pub fn new(app_url: Url, db_pool: PgPool) -> Self {
        Self {
            app_url,
            tasks: Arc::new(PgTaskRepository::new(db_pool.clone())),
            users: Arc::new(PgUserRepository::new(db_pool)),
        }
    }

    /// State backed by process memory. Nothing survives a restart.
    pub fn in_memory(app_url: Url) -> Self {
        Self {
            app_url,
            tasks: Arc::new(InMemoryTaskRepository::new()),
            users: Arc::new(InMemoryUserRepository::new()),
        }
    }
}
