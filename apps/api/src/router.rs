use std::sync::Arc;

use axum::{routing::get, Router};

use realtime_cell::{realtime_routes, RoomBroker};
use scheduling_cell::{scheduling_routes, BookingCoordinator};
use session_cell::{session_routes, SessionService};

pub fn create_router(
    coordinator: Arc<BookingCoordinator>,
    sessions: Arc<SessionService>,
    broker: Arc<RoomBroker>,
) -> Router {
    Router::new()
        .route("/", get(|| async { "Treatment session API is running!" }))
        .nest("/appointments", scheduling_routes(coordinator))
        .nest("/sessions", session_routes(sessions))
        .nest("/realtime", realtime_routes(broker))
}
