use uuid::Uuid;

use crate::models::{Session, SessionError, SessionStatusSnapshot, SessionSummary};
use crate::services::lifecycle::SessionService;

/// Read-only projections for polling clients and late-joining subscribers.
/// Snapshots always reflect the latest committed state; observers joining a
/// room mid-session bootstrap from here before relying on incremental
/// events.
impl SessionService {
    pub async fn get_status(
        &self,
        appointment_id: Uuid,
    ) -> Result<SessionStatusSnapshot, SessionError> {
        let appointment = self
            .coordinator()
            .get(appointment_id)
            .await
            .map_err(|_| SessionError::AppointmentNotFound)?;

        let session = match self.lookup_by_appointment(appointment_id).await {
            Some(handle) => {
                let session = handle.lock().await;
                Some(SessionSummary::from(&*session))
            }
            None => None,
        };

        Ok(SessionStatusSnapshot {
            appointment,
            session,
        })
    }

    pub async fn get_live_data(&self, session_id: Uuid) -> Result<Session, SessionError> {
        let handle = self.lookup(session_id).await?;
        let session = handle.lock().await;
        Ok(session.clone())
    }
}
