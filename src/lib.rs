pub mod api;
pub mod config;
pub mod database;
pub mod error;
pub mod handlers;

use axum::{routing::any, Router};
use tower_http::trace::TraceLayer;

use handlers::catalog::AppState;

/// Single route at `/`. All methods reach the handler; non-POST is rejected
/// there with an error envelope rather than a 405, matching the wire contract.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/", any(handlers::catalog::feed))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
