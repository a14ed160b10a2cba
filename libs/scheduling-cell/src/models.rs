// libs/scheduling-cell/src/models.rs
use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use shared_models::AppError;

// ==============================================================================
// CORE APPOINTMENT MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Appointment {
    pub id: Uuid,
    pub client_id: Uuid,
    pub provider_id: Uuid,
    pub resource_id: Uuid,
    pub treatment_type: TreatmentType,
    pub start_time: DateTime<Utc>,
    pub duration_minutes: i64,
    pub status: AppointmentStatus,
    pub cancellation_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Appointment {
    pub fn end_time(&self) -> DateTime<Utc> {
        self.start_time + Duration::minutes(self.duration_minutes)
    }

    pub fn interval(&self) -> TimeSlot {
        TimeSlot {
            start: self.start_time,
            end: self.end_time(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    Scheduled,
    Confirmed,
    Rescheduled,
    InProgress,
    Completed,
    Cancelled,
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppointmentStatus::Scheduled => write!(f, "scheduled"),
            AppointmentStatus::Confirmed => write!(f, "confirmed"),
            AppointmentStatus::Rescheduled => write!(f, "rescheduled"),
            AppointmentStatus::InProgress => write!(f, "in_progress"),
            AppointmentStatus::Completed => write!(f, "completed"),
            AppointmentStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

impl AppointmentStatus {
    /// Statuses that hold a reservation in the availability index.
    pub fn holds_reservation(&self) -> bool {
        !matches!(self, AppointmentStatus::Cancelled)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TreatmentType {
    #[serde(alias = "initial", alias = "assessment")]
    InitialAssessment,

    #[serde(alias = "follow_up", alias = "followup")]
    FollowUpTreatment,

    #[serde(alias = "rehab")]
    Rehabilitation,

    #[serde(alias = "manual")]
    ManualTherapy,

    #[serde(alias = "group")]
    GroupTherapy,
}

impl fmt::Display for TreatmentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TreatmentType::InitialAssessment => write!(f, "initial_assessment"),
            TreatmentType::FollowUpTreatment => write!(f, "follow_up_treatment"),
            TreatmentType::Rehabilitation => write!(f, "rehabilitation"),
            TreatmentType::ManualTherapy => write!(f, "manual_therapy"),
            TreatmentType::GroupTherapy => write!(f, "group_therapy"),
        }
    }
}

/// Half-open interval [start, end).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct TimeSlot {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeSlot {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    /// Two slots overlap when they share any instant. A slot ending exactly
    /// when another begins does not conflict.
    pub fn overlaps(&self, other: &TimeSlot) -> bool {
        self.start < other.end && other.start < self.end
    }

    pub fn duration_minutes(&self) -> i64 {
        (self.end - self.start).num_minutes()
    }
}

// ==============================================================================
// REQUEST MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookAppointmentRequest {
    pub client_id: Uuid,
    pub provider_id: Uuid,
    pub resource_id: Uuid,
    pub treatment_type: TreatmentType,
    pub start_time: DateTime<Utc>,
    pub duration_minutes: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RescheduleAppointmentRequest {
    pub new_start_time: DateTime<Utc>,
    pub new_duration_minutes: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CancelAppointmentRequest {
    pub reason: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AvailabilityQuery {
    pub provider_id: Uuid,
    pub date: chrono::NaiveDate,
}

// ==============================================================================
// ERROR TYPES
// ==============================================================================

#[derive(Debug, Clone, thiserror::Error)]
pub enum SchedulingError {
    #[error("Appointment not found")]
    NotFound,

    #[error("Requested slot conflicts with appointment {conflicting_appointment_id}")]
    SlotConflict { conflicting_appointment_id: Uuid },

    #[error("Appointment cannot be modified in current status: {0}")]
    InvalidState(AppointmentStatus),

    #[error("Invalid booking request: {0}")]
    InvalidRequest(String),
}

impl From<SchedulingError> for AppError {
    fn from(err: SchedulingError) -> Self {
        match &err {
            SchedulingError::NotFound => AppError::NotFound(err.to_string()),
            SchedulingError::SlotConflict { .. } => AppError::Conflict(err.to_string()),
            SchedulingError::InvalidState(_) => AppError::Conflict(err.to_string()),
            SchedulingError::InvalidRequest(_) => AppError::BadRequest(err.to_string()),
        }
    }
}
