//! API Routes

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use crate::handlers;
use crate::state::AppState;

/// Create API v1 routes
pub fn api_v1_routes() -> Router<Arc<AppState>> {
    Router::new().nest("/open-banking", open_banking_routes())
}

/// Open banking routes
fn open_banking_routes() -> Router<Arc<AppState>> {
    Router::new()
        // Linkage handshake
        .route("/linkages", post(handlers::linkage::begin_linkage))
        .route("/callback", get(handlers::linkage::callback))
        // Transfers
        .route("/deposit", post(handlers::transfer::deposit))
        .route("/withdraw", post(handlers::transfer::withdraw))
        .route("/inquiry-receive", post(handlers::transfer::inquiry_receive))
        // Remote user info
        .route("/users/me", get(handlers::transfer::user_me))
}
