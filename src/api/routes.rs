use axum::Router;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use super::handlers;
use crate::AppState;

/// Every path is an object key, so the whole surface is one fallback handler.
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .fallback(handlers::handle_object)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
