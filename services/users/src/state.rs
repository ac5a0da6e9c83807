//! Application state shared across REST handlers

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use sqlx::PgPool;

use crate::grpc::UserApi;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    /// Handlers call the same adapter the gRPC server exposes.
    pub api: Arc<UserApi>,
    pub ready: Arc<AtomicBool>,
}

impl AppState {
    pub fn new(db_pool: PgPool, api: Arc<UserApi>) -> Self {
        Self {
            db_pool,
            api,
            ready: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }

    pub fn set_ready(&self, ready: bool) {
        self.ready.store(ready, Ordering::SeqCst);
    }
}
