use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};
use uuid::Uuid;

use realtime_cell::models::{SessionEvent, SessionEventKind};
use realtime_cell::services::broker::RoomBroker;
use scheduling_cell::services::booking::BookingCoordinator;

use crate::models::{
    CompleteSessionRequest, Milestone, PatientResponse, RecordProgressRequest, Session,
    SessionError, SessionStatus, StartSessionRequest, VitalReading,
};

/// Arena of live sessions. The outer map is only touched to create or look
/// up a session; all mutation happens under the per-session mutex, so
/// concurrent progress updates on one session apply in arrival order and
/// every milestone/vitals append is atomic.
#[derive(Default)]
struct SessionArena {
    sessions: HashMap<Uuid, Arc<Mutex<Session>>>,
    by_appointment: HashMap<Uuid, Uuid>,
}

pub struct SessionService {
    arena: RwLock<SessionArena>,
    coordinator: Arc<BookingCoordinator>,
    broker: Arc<RoomBroker>,
}

impl SessionService {
    pub fn new(coordinator: Arc<BookingCoordinator>, broker: Arc<RoomBroker>) -> Self {
        Self {
            arena: RwLock::new(SessionArena::default()),
            coordinator,
            broker,
        }
    }

    /// Start the live session for a confirmed appointment. Marks the
    /// appointment in-progress, creates the Active session and announces
    /// `SessionStarted` to the room.
    pub async fn start(&self, request: StartSessionRequest) -> Result<Session, SessionError> {
        let appointment_id = request.appointment_id;
        debug!("Start request for appointment {}", appointment_id);

        {
            let arena = self.arena.read().await;
            if arena.by_appointment.contains_key(&appointment_id) {
                warn!("Appointment {} already has a session", appointment_id);
                return Err(SessionError::AppointmentNotConfirmed);
            }
        }

        // The coordinator enforces Confirmed -> InProgress; this is the
        // single commit point for the whole operation.
        self.coordinator.mark_in_progress(appointment_id).await?;

        let now = Utc::now();
        let session = Session {
            id: Uuid::new_v4(),
            appointment_id,
            status: SessionStatus::Active,
            started_at: now,
            completion_percentage: 0,
            observations: request.initial_observations.unwrap_or_default(),
            patient_response: PatientResponse::Good,
            complications: None,
            milestones: Vec::new(),
            vital_readings: Vec::new(),
            completed_at: None,
            satisfaction_rating: None,
            updated_at: now,
        };

        {
            let mut arena = self.arena.write().await;
            arena
                .sessions
                .insert(session.id, Arc::new(Mutex::new(session.clone())));
            arena.by_appointment.insert(appointment_id, session.id);
        }

        info!(
            "Session {} started for appointment {}",
            session.id, appointment_id
        );
        self.announce(SessionEventKind::SessionStarted, &session).await;

        Ok(session)
    }

    /// Record a progress update on an active session. Completion must stay
    /// within [0, 100] and never decrease; resubmitting the current value is
    /// accepted as a no-op refresh.
    pub async fn record_progress(
        &self,
        session_id: Uuid,
        request: RecordProgressRequest,
    ) -> Result<Session, SessionError> {
        let handle = self.lookup(session_id).await?;
        let mut session = handle.lock().await;

        if session.status != SessionStatus::Active {
            return Err(SessionError::InvalidState(session.status));
        }

        if request.completion_percentage > 100 {
            return Err(SessionError::OutOfRange(format!(
                "completion {} exceeds 100",
                request.completion_percentage
            )));
        }

        if request.completion_percentage < session.completion_percentage {
            warn!(
                "Rejected regressing completion {} -> {} on session {}",
                session.completion_percentage, request.completion_percentage, session_id
            );
            return Err(SessionError::OutOfRange(format!(
                "completion {} is below previously recorded {}",
                request.completion_percentage, session.completion_percentage
            )));
        }

        let now = Utc::now();
        session.completion_percentage = request.completion_percentage;
        if let Some(observations) = request.observations {
            session.observations = observations;
        }
        if let Some(patient_response) = request.patient_response {
            session.patient_response = patient_response;
        }
        if let Some(complications) = request.complications {
            session.complications = Some(complications);
        }

        if let Some(milestone) = request.milestone {
            session.milestones.push(Milestone {
                description: milestone.description,
                notes: milestone.notes,
                recorded_at: now,
            });
        }

        if let Some(readings) = request.vital_readings {
            for reading in readings {
                session.vital_readings.push(VitalReading {
                    parameter: reading.parameter,
                    value: reading.value,
                    unit: reading.unit,
                    within_normal_range: reading.within_normal_range,
                    note: reading.note,
                    recorded_at: now,
                });
            }
        }

        session.updated_at = now;
        let snapshot = session.clone();
        drop(session);

        debug!(
            "Session {} progressed to {}%",
            session_id, snapshot.completion_percentage
        );
        self.announce(SessionEventKind::SessionProgressUpdated, &snapshot)
            .await;

        Ok(snapshot)
    }

    /// Finalize an active session. The session is frozen, the appointment
    /// marked completed and `SessionCompleted` announced.
    pub async fn complete(
        &self,
        session_id: Uuid,
        request: CompleteSessionRequest,
    ) -> Result<Session, SessionError> {
        let handle = self.lookup(session_id).await?;
        let mut session = handle.lock().await;

        if session.status != SessionStatus::Active {
            return Err(SessionError::InvalidState(session.status));
        }

        if let Some(rating) = request.satisfaction_rating {
            if !(1..=5).contains(&rating) {
                return Err(SessionError::OutOfRange(format!(
                    "satisfaction rating {} outside 1-5",
                    rating
                )));
            }
        }

        self.coordinator
            .mark_completed(session.appointment_id)
            .await?;

        let now = Utc::now();
        session.status = SessionStatus::Completed;
        session.completed_at = Some(now);
        session.satisfaction_rating = request.satisfaction_rating;
        if let Some(observations) = request.final_observations {
            session.observations = observations;
        }
        session.updated_at = now;

        let snapshot = session.clone();
        drop(session);

        info!(
            "Session {} completed for appointment {}",
            session_id, snapshot.appointment_id
        );
        self.announce(SessionEventKind::SessionCompleted, &snapshot)
            .await;

        Ok(snapshot)
    }

    pub(crate) async fn lookup(
        &self,
        session_id: Uuid,
    ) -> Result<Arc<Mutex<Session>>, SessionError> {
        let arena = self.arena.read().await;
        arena
            .sessions
            .get(&session_id)
            .cloned()
            .ok_or(SessionError::NotFound)
    }

    pub(crate) async fn lookup_by_appointment(
        &self,
        appointment_id: Uuid,
    ) -> Option<Arc<Mutex<Session>>> {
        let arena = self.arena.read().await;
        let session_id = arena.by_appointment.get(&appointment_id)?;
        arena.sessions.get(session_id).cloned()
    }

    pub(crate) fn coordinator(&self) -> &BookingCoordinator {
        &self.coordinator
    }

    /// Fire-and-forget: a delivery problem never fails the state transition.
    async fn announce(&self, kind: SessionEventKind, session: &Session) {
        match serde_json::to_value(session) {
            Ok(snapshot) => {
                self.broker
                    .publish(session.id, SessionEvent::new(kind, session.id, snapshot))
                    .await;
            }
            Err(e) => {
                warn!("Failed to serialize session {} snapshot: {}", session.id, e);
            }
        }
    }
}
