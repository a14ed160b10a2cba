use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::models::{
    Appointment, AppointmentStatus, BookAppointmentRequest, SchedulingError, TimeSlot,
};
use crate::services::availability::AvailabilityIndex;

const MIN_DURATION_MINUTES: i64 = 15;
const MAX_DURATION_MINUTES: i64 = 480;

/// Orchestrates appointment creation and modification against the
/// availability index. Invariant: no committed non-cancelled appointment
/// exists without a corresponding successful reservation.
pub struct BookingCoordinator {
    appointments: RwLock<HashMap<Uuid, Appointment>>,
    availability: Arc<AvailabilityIndex>,
}

impl BookingCoordinator {
    pub fn new(availability: Arc<AvailabilityIndex>) -> Self {
        Self {
            appointments: RwLock::new(HashMap::new()),
            availability,
        }
    }

    pub fn availability(&self) -> &AvailabilityIndex {
        &self.availability
    }

    pub async fn book(
        &self,
        request: BookAppointmentRequest,
    ) -> Result<Appointment, SchedulingError> {
        debug!(
            "Booking request: provider {} / resource {} at {}",
            request.provider_id, request.resource_id, request.start_time
        );

        Self::validate_booking(&request)?;

        let id = Uuid::new_v4();
        let interval = TimeSlot::new(
            request.start_time,
            request.start_time + Duration::minutes(request.duration_minutes),
        );

        // Reserve first: the appointment is only persisted once the
        // reservation is held.
        self.availability
            .reserve(id, request.provider_id, request.resource_id, interval)
            .await?;

        let now = Utc::now();
        let appointment = Appointment {
            id,
            client_id: request.client_id,
            provider_id: request.provider_id,
            resource_id: request.resource_id,
            treatment_type: request.treatment_type,
            start_time: request.start_time,
            duration_minutes: request.duration_minutes,
            status: AppointmentStatus::Scheduled,
            cancellation_reason: None,
            created_at: now,
            updated_at: now,
        };

        let mut appointments = self.appointments.write().await;
        appointments.insert(id, appointment.clone());

        info!("Appointment {} booked at {}", id, request.start_time);
        Ok(appointment)
    }

    pub async fn confirm(&self, appointment_id: Uuid) -> Result<Appointment, SchedulingError> {
        let mut appointments = self.appointments.write().await;
        let appointment = appointments
            .get_mut(&appointment_id)
            .ok_or(SchedulingError::NotFound)?;

        match appointment.status {
            AppointmentStatus::Scheduled | AppointmentStatus::Rescheduled => {
                appointment.status = AppointmentStatus::Confirmed;
                appointment.updated_at = Utc::now();
                info!("Appointment {} confirmed", appointment_id);
                Ok(appointment.clone())
            }
            other => Err(SchedulingError::InvalidState(other)),
        }
    }

    /// Atomically move the appointment to a new interval. If the new
    /// reservation cannot be acquired the old one is left intact.
    pub async fn reschedule(
        &self,
        appointment_id: Uuid,
        new_start_time: DateTime<Utc>,
        new_duration_minutes: Option<i64>,
    ) -> Result<Appointment, SchedulingError> {
        let mut appointments = self.appointments.write().await;
        let appointment = appointments
            .get_mut(&appointment_id)
            .ok_or(SchedulingError::NotFound)?;

        match appointment.status {
            AppointmentStatus::Scheduled
            | AppointmentStatus::Confirmed
            | AppointmentStatus::Rescheduled => {}
            other => return Err(SchedulingError::InvalidState(other)),
        }

        let duration = new_duration_minutes.unwrap_or(appointment.duration_minutes);
        if !(MIN_DURATION_MINUTES..=MAX_DURATION_MINUTES).contains(&duration) {
            return Err(SchedulingError::InvalidRequest(format!(
                "duration must be between {} and {} minutes",
                MIN_DURATION_MINUTES, MAX_DURATION_MINUTES
            )));
        }

        let new_interval =
            TimeSlot::new(new_start_time, new_start_time + Duration::minutes(duration));

        if new_interval == appointment.interval() {
            debug!(
                "Reschedule of appointment {} to identical interval - no-op",
                appointment_id
            );
            return Ok(appointment.clone());
        }

        self.availability
            .swap(
                appointment_id,
                appointment.provider_id,
                appointment.resource_id,
                new_interval,
            )
            .await?;

        appointment.start_time = new_start_time;
        appointment.duration_minutes = duration;
        appointment.status = AppointmentStatus::Rescheduled;
        appointment.updated_at = Utc::now();

        info!(
            "Appointment {} rescheduled to {}",
            appointment_id, new_start_time
        );
        Ok(appointment.clone())
    }

    /// Soft-delete: releases the reservation and flags the appointment
    /// cancelled. Disallowed once the session has started or finished.
    pub async fn cancel(
        &self,
        appointment_id: Uuid,
        reason: String,
    ) -> Result<Appointment, SchedulingError> {
        let mut appointments = self.appointments.write().await;
        let appointment = appointments
            .get_mut(&appointment_id)
            .ok_or(SchedulingError::NotFound)?;

        match appointment.status {
            AppointmentStatus::InProgress
            | AppointmentStatus::Completed
            | AppointmentStatus::Cancelled => {
                warn!(
                    "Cancel rejected for appointment {} in status {}",
                    appointment_id, appointment.status
                );
                return Err(SchedulingError::InvalidState(appointment.status));
            }
            _ => {}
        }

        self.availability.release(appointment_id).await;

        appointment.status = AppointmentStatus::Cancelled;
        appointment.cancellation_reason = Some(reason);
        appointment.updated_at = Utc::now();

        info!("Appointment {} cancelled", appointment_id);
        Ok(appointment.clone())
    }

    pub async fn get(&self, appointment_id: Uuid) -> Result<Appointment, SchedulingError> {
        self.appointments
            .read()
            .await
            .get(&appointment_id)
            .cloned()
            .ok_or(SchedulingError::NotFound)
    }

    pub async fn list_for_provider(
        &self,
        provider_id: Uuid,
        date: NaiveDate,
    ) -> Vec<Appointment> {
        let mut result: Vec<Appointment> = self
            .appointments
            .read()
            .await
            .values()
            .filter(|a| a.provider_id == provider_id && a.start_time.date_naive() == date)
            .cloned()
            .collect();
        result.sort_by_key(|a| a.start_time);
        result
    }

    /// Transition invoked by the session state machine when a session
    /// starts. Requires a confirmed appointment.
    pub async fn mark_in_progress(
        &self,
        appointment_id: Uuid,
    ) -> Result<Appointment, SchedulingError> {
        self.transition(
            appointment_id,
            AppointmentStatus::Confirmed,
            AppointmentStatus::InProgress,
        )
        .await
    }

    /// Transition invoked by the session state machine on completion.
    pub async fn mark_completed(
        &self,
        appointment_id: Uuid,
    ) -> Result<Appointment, SchedulingError> {
        self.transition(
            appointment_id,
            AppointmentStatus::InProgress,
            AppointmentStatus::Completed,
        )
        .await
    }

    async fn transition(
        &self,
        appointment_id: Uuid,
        from: AppointmentStatus,
        to: AppointmentStatus,
    ) -> Result<Appointment, SchedulingError> {
        let mut appointments = self.appointments.write().await;
        let appointment = appointments
            .get_mut(&appointment_id)
            .ok_or(SchedulingError::NotFound)?;

        if appointment.status != from {
            warn!(
                "Invalid transition for appointment {}: {} -> {}",
                appointment_id, appointment.status, to
            );
            return Err(SchedulingError::InvalidState(appointment.status));
        }

        appointment.status = to;
        appointment.updated_at = Utc::now();
        debug!("Appointment {} transitioned {} -> {}", appointment_id, from, to);
        Ok(appointment.clone())
    }

    fn validate_booking(request: &BookAppointmentRequest) -> Result<(), SchedulingError> {
        if !(MIN_DURATION_MINUTES..=MAX_DURATION_MINUTES).contains(&request.duration_minutes) {
            return Err(SchedulingError::InvalidRequest(format!(
                "duration must be between {} and {} minutes",
                MIN_DURATION_MINUTES, MAX_DURATION_MINUTES
            )));
        }

        if request.client_id == request.provider_id {
            return Err(SchedulingError::InvalidRequest(
                "client and provider must be distinct".to_string(),
            ));
        }

        Ok(())
    }
}
