use std::sync::Arc;

use sqlx::SqlitePool;

use crate::auth::{AuthState, TokenCodec};
use crate::config::ServerConfig;
use crate::storage::{RecordStore, UserStore};

/// Main server state shared across all handlers
pub struct ServerState {
    pub config: ServerConfig,
    pub user_store: Arc<dyn UserStore>,
    pub record_store: Arc<dyn RecordStore>,
    pub auth_state: AuthState,
    pub db_pool: SqlitePool,
}

impl ServerState {
    pub fn new(
        config: ServerConfig,
        user_store: Arc<dyn UserStore>,
        record_store: Arc<dyn RecordStore>,
        codec: TokenCodec,
        db_pool: SqlitePool,
    ) -> Self {
        Self {
            config,
            user_store,
            record_store,
            auth_state: AuthState { codec },
            db_pool,
        }
    }
}
