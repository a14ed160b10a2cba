// libs/scheduling-cell/src/router.rs
use std::sync::Arc;

use axum::{
    routing::{get, patch, post},
    Router,
};

use crate::handlers;
use crate::services::booking::BookingCoordinator;

pub fn scheduling_routes(coordinator: Arc<BookingCoordinator>) -> Router {
    Router::new()
        .route("/", post(handlers::book_appointment))
        .route("/availability", get(handlers::query_availability))
        .route("/{appointment_id}", get(handlers::get_appointment))
        .route("/{appointment_id}/confirm", post(handlers::confirm_appointment))
        .route(
            "/{appointment_id}/reschedule",
            patch(handlers::reschedule_appointment),
        )
        .route("/{appointment_id}/cancel", post(handlers::cancel_appointment))
        .route(
            "/providers/{provider_id}",
            get(handlers::list_provider_appointments),
        )
        .with_state(coordinator)
}
