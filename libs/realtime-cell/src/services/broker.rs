use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tokio::sync::{broadcast, RwLock};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::models::SessionEvent;

pub type SessionEventReceiver = broadcast::Receiver<SessionEvent>;

struct Room {
    sender: broadcast::Sender<SessionEvent>,
    members: HashSet<Uuid>,
}

/// Per-session subscriber groups. Each room fans one session's events out to
/// every current subscriber over a `broadcast` channel: delivery is FIFO per
/// room, and a receiver only ever sees events sent after it subscribed, so
/// late joiners get no replay.
///
/// Join, leave and publish on a room are linearizable with respect to each
/// other: membership changes happen under the write lock and the broadcast
/// send is the publish point.
pub struct RoomBroker {
    rooms: Arc<RwLock<HashMap<Uuid, Room>>>,
    channel_capacity: usize,
}

impl RoomBroker {
    pub fn new(channel_capacity: usize) -> Self {
        Self {
            rooms: Arc::new(RwLock::new(HashMap::new())),
            channel_capacity,
        }
    }

    /// Add an observer to the session's room, creating the room on first
    /// join. Idempotent on membership; re-joining returns a fresh receiver.
    pub async fn join(&self, observer_id: Uuid, session_id: Uuid) -> SessionEventReceiver {
        let mut rooms = self.rooms.write().await;

        let room = rooms.entry(session_id).or_insert_with(|| {
            debug!("Creating room for session {}", session_id);
            let (sender, _) = broadcast::channel(self.channel_capacity);
            Room {
                sender,
                members: HashSet::new(),
            }
        });

        room.members.insert(observer_id);
        debug!(
            "Observer {} joined room {} ({} members)",
            observer_id,
            session_id,
            room.members.len()
        );
        room.sender.subscribe()
    }

    /// Remove an observer from the room. Also invoked automatically when an
    /// observer's connection closes. Empty rooms are dropped.
    pub async fn leave(&self, observer_id: Uuid, session_id: Uuid) {
        let mut rooms = self.rooms.write().await;

        if let Some(room) = rooms.get_mut(&session_id) {
            if room.members.remove(&observer_id) {
                debug!("Observer {} left room {}", observer_id, session_id);
            }
            if room.members.is_empty() {
                rooms.remove(&session_id);
                debug!("Removed empty room for session {}", session_id);
            }
        }
    }

    /// Best-effort fan-out to every current subscriber of the session.
    /// Delivery failures are logged and dropped, never surfaced to the
    /// publisher.
    pub async fn publish(&self, session_id: Uuid, event: SessionEvent) {
        let rooms = self.rooms.read().await;

        match rooms.get(&session_id) {
            Some(room) => {
                if let Err(e) = room.sender.send(event) {
                    // All receivers gone between membership check and send.
                    warn!("No live receivers for session {}: {}", session_id, e);
                }
            }
            None => {
                debug!(
                    "Dropping event for session {} with no subscribers",
                    session_id
                );
            }
        }
    }

    /// Current observer ids subscribed to the session.
    pub async fn room_members(&self, session_id: Uuid) -> Vec<Uuid> {
        let rooms = self.rooms.read().await;
        rooms
            .get(&session_id)
            .map(|room| room.members.iter().copied().collect())
            .unwrap_or_default()
    }

    pub async fn active_rooms(&self) -> Vec<Uuid> {
        let rooms = self.rooms.read().await;
        rooms.keys().copied().collect()
    }
}

impl Clone for RoomBroker {
    fn clone(&self) -> Self {
        Self {
            rooms: Arc::clone(&self.rooms),
            channel_capacity: self.channel_capacity,
        }
    }
}
