use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    response::Json,
};
use serde_json::{json, Value};
use tracing::info;
use uuid::Uuid;

use shared_models::AppError;

use crate::models::{
    Appointment, AvailabilityQuery, BookAppointmentRequest, CancelAppointmentRequest,
    RescheduleAppointmentRequest, TimeSlot,
};
use crate::services::booking::BookingCoordinator;

pub async fn book_appointment(
    State(coordinator): State<Arc<BookingCoordinator>>,
    Json(request): Json<BookAppointmentRequest>,
) -> Result<Json<Appointment>, AppError> {
    info!(
        "Booking request for client {} with provider {}",
        request.client_id, request.provider_id
    );

    let appointment = coordinator.book(request).await?;
    Ok(Json(appointment))
}

pub async fn get_appointment(
    State(coordinator): State<Arc<BookingCoordinator>>,
    Path(appointment_id): Path<Uuid>,
) -> Result<Json<Appointment>, AppError> {
    let appointment = coordinator.get(appointment_id).await?;
    Ok(Json(appointment))
}

pub async fn confirm_appointment(
    State(coordinator): State<Arc<BookingCoordinator>>,
    Path(appointment_id): Path<Uuid>,
) -> Result<Json<Appointment>, AppError> {
    info!("Confirm request for appointment {}", appointment_id);

    let appointment = coordinator.confirm(appointment_id).await?;
    Ok(Json(appointment))
}

pub async fn reschedule_appointment(
    State(coordinator): State<Arc<BookingCoordinator>>,
    Path(appointment_id): Path<Uuid>,
    Json(request): Json<RescheduleAppointmentRequest>,
) -> Result<Json<Appointment>, AppError> {
    info!(
        "Reschedule request for appointment {} to {}",
        appointment_id, request.new_start_time
    );

    let appointment = coordinator
        .reschedule(
            appointment_id,
            request.new_start_time,
            request.new_duration_minutes,
        )
        .await?;
    Ok(Json(appointment))
}

pub async fn cancel_appointment(
    State(coordinator): State<Arc<BookingCoordinator>>,
    Path(appointment_id): Path<Uuid>,
    Json(request): Json<CancelAppointmentRequest>,
) -> Result<Json<Value>, AppError> {
    info!("Cancel request for appointment {}", appointment_id);

    let appointment = coordinator.cancel(appointment_id, request.reason).await?;

    Ok(Json(json!({
        "success": true,
        "appointment_id": appointment.id,
        "status": appointment.status,
    })))
}

pub async fn query_availability(
    State(coordinator): State<Arc<BookingCoordinator>>,
    Query(query): Query<AvailabilityQuery>,
) -> Result<Json<Value>, AppError> {
    let free: Vec<TimeSlot> = coordinator
        .availability()
        .query_free(query.provider_id, query.date)
        .await
        .collect();

    Ok(Json(json!({
        "provider_id": query.provider_id,
        "date": query.date,
        "free_intervals": free,
    })))
}

pub async fn list_provider_appointments(
    State(coordinator): State<Arc<BookingCoordinator>>,
    Path(provider_id): Path<Uuid>,
    Query(query): Query<ProviderDayQuery>,
) -> Result<Json<Vec<Appointment>>, AppError> {
    let appointments = coordinator.list_for_provider(provider_id, query.date).await;
    Ok(Json(appointments))
}

#[derive(Debug, serde::Deserialize)]
pub struct ProviderDayQuery {
    pub date: chrono::NaiveDate,
}
