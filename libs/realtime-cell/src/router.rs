// libs/realtime-cell/src/router.rs
use std::sync::Arc;

use axum::{routing::get, Router};

use crate::handlers;
use crate::services::broker::RoomBroker;

pub fn realtime_routes(broker: Arc<RoomBroker>) -> Router {
    Router::new()
        .route("/ws", get(handlers::ws_handler))
        .with_state(broker)
}
