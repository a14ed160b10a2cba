// libs/session-cell/src/router.rs
use std::sync::Arc;

use axum::{
    routing::{get, patch, post},
    Router,
};

use crate::handlers;
use crate::services::lifecycle::SessionService;

pub fn session_routes(service: Arc<SessionService>) -> Router {
    Router::new()
        .route("/start", post(handlers::start_session))
        .route("/{session_id}/progress", patch(handlers::record_progress))
        .route("/{session_id}/complete", post(handlers::complete_session))
        .route("/{session_id}/live", get(handlers::get_live_data))
        .route(
            "/status/{appointment_id}",
            get(handlers::get_session_status),
        )
        .with_state(service)
}
