// libs/session-cell/src/models.rs
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use scheduling_cell::models::{Appointment, SchedulingError};
use shared_models::AppError;

// ==============================================================================
// CORE SESSION MODELS
// ==============================================================================

/// Live-execution record for a started appointment. Frozen once completed:
/// no field, milestone or vital reading mutates after `completed_at` is set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: Uuid,
    pub appointment_id: Uuid,
    pub status: SessionStatus,
    pub started_at: DateTime<Utc>,
    pub completion_percentage: u8,
    pub observations: String,
    pub patient_response: PatientResponse,
    pub complications: Option<String>,
    pub milestones: Vec<Milestone>,
    pub vital_readings: Vec<VitalReading>,
    pub completed_at: Option<DateTime<Utc>>,
    pub satisfaction_rating: Option<u8>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Active,
    Completed,
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionStatus::Active => write!(f, "active"),
            SessionStatus::Completed => write!(f, "completed"),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PatientResponse {
    Excellent,
    Good,
    Fair,
    Poor,
}

/// Timestamped, append-only progress marker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Milestone {
    pub description: String,
    pub notes: Option<String>,
    pub recorded_at: DateTime<Utc>,
}

/// Timestamped, append-only physiological measurement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VitalReading {
    pub parameter: String,
    pub value: f64,
    pub unit: String,
    pub within_normal_range: bool,
    pub note: Option<String>,
    pub recorded_at: DateTime<Utc>,
}

// ==============================================================================
// REQUEST MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StartSessionRequest {
    pub appointment_id: Uuid,
    pub initial_observations: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MilestoneInput {
    pub description: String,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VitalReadingInput {
    pub parameter: String,
    pub value: f64,
    pub unit: String,
    pub within_normal_range: bool,
    pub note: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordProgressRequest {
    pub completion_percentage: u8,
    pub observations: Option<String>,
    pub patient_response: Option<PatientResponse>,
    pub complications: Option<String>,
    pub milestone: Option<MilestoneInput>,
    pub vital_readings: Option<Vec<VitalReadingInput>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompleteSessionRequest {
    pub final_observations: Option<String>,
    pub satisfaction_rating: Option<u8>,
}

// ==============================================================================
// QUERY SNAPSHOTS
// ==============================================================================

/// Polling-fallback view keyed by appointment id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionStatusSnapshot {
    pub appointment: Appointment,
    pub session: Option<SessionSummary>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSummary {
    pub session_id: Uuid,
    pub status: SessionStatus,
    pub completion_percentage: u8,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub milestone_count: usize,
    pub vital_reading_count: usize,
}

impl From<&Session> for SessionSummary {
    fn from(session: &Session) -> Self {
        Self {
            session_id: session.id,
            status: session.status,
            completion_percentage: session.completion_percentage,
            started_at: session.started_at,
            completed_at: session.completed_at,
            milestone_count: session.milestones.len(),
            vital_reading_count: session.vital_readings.len(),
        }
    }
}

// ==============================================================================
// ERROR TYPES
// ==============================================================================

#[derive(Debug, Clone, thiserror::Error)]
pub enum SessionError {
    #[error("Session not found")]
    NotFound,

    #[error("Appointment not found")]
    AppointmentNotFound,

    #[error("Operation not valid in session status: {0}")]
    InvalidState(SessionStatus),

    #[error("Appointment cannot start a session in its current status")]
    AppointmentNotConfirmed,

    #[error("Value out of range: {0}")]
    OutOfRange(String),
}

impl From<SessionError> for AppError {
    fn from(err: SessionError) -> Self {
        match &err {
            SessionError::NotFound | SessionError::AppointmentNotFound => {
                AppError::NotFound(err.to_string())
            }
            SessionError::InvalidState(_) | SessionError::AppointmentNotConfirmed => {
                AppError::Conflict(err.to_string())
            }
            SessionError::OutOfRange(_) => AppError::BadRequest(err.to_string()),
        }
    }
}

impl From<SchedulingError> for SessionError {
    fn from(err: SchedulingError) -> Self {
        match err {
            SchedulingError::NotFound => SessionError::AppointmentNotFound,
            // Only lifecycle transitions cross this boundary, so any other
            // coordinator error means the appointment is not in a startable
            // or completable state.
            _ => SessionError::AppointmentNotConfirmed,
        }
    }
}
