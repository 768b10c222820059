//! Open Banking HTTP Server
//!
//! ```text
//! /health                              - liveness
//! /ready                               - credential store reachability
//! /api/v1/open-banking/
//! ├── POST /linkages                   - begin linkage { member_id, state } (caller-authenticated)
//! ├── GET  /callback?state=&code=      - OAuth redirect target
//! ├── POST /deposit                    - credit a linked account (Bearer)
//! ├── POST /withdraw                   - debit a linked account (Bearer)
//! ├── POST /inquiry-receive            - receiving account holder lookup (Bearer)
//! └── GET  /users/me?user_seq_no=      - remote user info (Bearer)
//! ```
//!
//! Errors are returned as `{ code, msg, stage }`.

pub mod config;
pub mod dto;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod routes;
pub mod state;

use axum::http::HeaderName;
use axum::Router;
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

pub use crate::config::{ApiSettings, ServerConfig, StoreKind};
pub use error::{ApiError, ApiResult};
pub use state::AppState;

/// Create the main router with all middleware
pub fn create_router(state: Arc<AppState>, config: &ApiSettings) -> Router {
    let mut router = base_router(state);

    if config.enable_tracing {
        router = router.layer(TraceLayer::new_for_http().make_span_with(
            |request: &axum::http::Request<_>| {
                let request_id = request
                    .headers()
                    .get("x-request-id")
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or("unknown");

                // Path only: the callback query carries the OAuth code
                tracing::info_span!(
                    "http_request",
                    method = %request.method(),
                    path = %request.uri().path(),
                    request_id = %request_id,
                )
            },
        ));
    }

    // Wraps tracing so the span sees the generated id
    let x_request_id = HeaderName::from_static("x-request-id");
    router = router
        .layer(PropagateRequestIdLayer::new(x_request_id.clone()))
        .layer(SetRequestIdLayer::new(x_request_id, MakeRequestUuid));

    if config.enable_cors {
        let cors = if config.cors_origins.iter().any(|o| o == "*") {
            CorsLayer::permissive()
        } else {
            CorsLayer::new()
                .allow_origin(
                    config
                        .cors_origins
                        .iter()
                        .filter_map(|o| o.parse().ok())
                        .collect::<Vec<_>>(),
                )
                .allow_methods([axum::http::Method::GET, axum::http::Method::POST])
                .allow_headers(Any)
        };
        router = router.layer(cors);
    }

    router
}

/// Create a minimal router for testing
pub fn create_test_router(state: Arc<AppState>) -> Router {
    base_router(state)
}

fn base_router(state: Arc<AppState>) -> Router {
    Router::new()
        .nest("/api/v1", routes::api_v1_routes())
        .route("/health", axum::routing::get(handlers::health::health_check))
        .route("/ready", axum::routing::get(handlers::health::readiness_check))
        .with_state(state)
}
