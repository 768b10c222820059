//! Application state shared across handlers

use std::sync::Arc;

use openbanking_core::OpenBankingService;
use openbanking_db::Database;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Service for the configured profile
    pub service: Arc<dyn OpenBankingService>,
    /// PostgreSQL pool, absent when running on the in-memory store
    pub db: Option<Arc<Database>>,
}

impl AppState {
    pub fn new(service: Arc<dyn OpenBankingService>, db: Option<Arc<Database>>) -> Self {
        Self { service, db }
    }
}
