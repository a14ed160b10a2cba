use std::sync::Arc;

use axum::{
    extract::{Path, State},
    response::Json,
};
use tracing::info;
use uuid::Uuid;

use shared_models::AppError;

use crate::models::{
    CompleteSessionRequest, RecordProgressRequest, Session, SessionStatusSnapshot,
    StartSessionRequest,
};
use crate::services::lifecycle::SessionService;

pub async fn start_session(
    State(service): State<Arc<SessionService>>,
    Json(request): Json<StartSessionRequest>,
) -> Result<Json<Session>, AppError> {
    info!("Start session request for appointment {}", request.appointment_id);

    let session = service.start(request).await?;
    Ok(Json(session))
}

pub async fn record_progress(
    State(service): State<Arc<SessionService>>,
    Path(session_id): Path<Uuid>,
    Json(request): Json<RecordProgressRequest>,
) -> Result<Json<Session>, AppError> {
    let session = service.record_progress(session_id, request).await?;
    Ok(Json(session))
}

pub async fn complete_session(
    State(service): State<Arc<SessionService>>,
    Path(session_id): Path<Uuid>,
    Json(request): Json<CompleteSessionRequest>,
) -> Result<Json<Session>, AppError> {
    info!("Complete session request for session {}", session_id);

    let session = service.complete(session_id, request).await?;
    Ok(Json(session))
}

pub async fn get_session_status(
    State(service): State<Arc<SessionService>>,
    Path(appointment_id): Path<Uuid>,
) -> Result<Json<SessionStatusSnapshot>, AppError> {
    let snapshot = service.get_status(appointment_id).await?;
    Ok(Json(snapshot))
}

pub async fn get_live_data(
    State(service): State<Arc<SessionService>>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<Session>, AppError> {
    let session = service.get_live_data(session_id).await?;
    Ok(Json(session))
}
