pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::dashboard::handlers;
use crate::lead_history::handle_lead_history;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Dashboard API
        .route("/api/v1/dashboard", get(handlers::handle_dashboard))
        .route(
            "/api/v1/dashboard/navigate",
            post(handlers::handle_navigate),
        )
        // Lead history
        .route(
            "/api/v1/valuations/:id/lead-history",
            get(handle_lead_history),
        )
        .with_state(state)
}
