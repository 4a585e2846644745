use std::sync::Arc;

use sqlx::PgPool;

use crate::config::Config;
use crate::mailer::Mailer;

/// Shared by every handler. Cloning is cheap: the pool and both `Arc`s are
/// reference counted.
#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub mailer: Arc<dyn Mailer>,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(pool: PgPool, mailer: Arc<dyn Mailer>, config: Config) -> Self {
        Self {
            pool,
            mailer,
            config: Arc::new(config),
        }
    }
}
