use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::IntoResponse,
};
use futures::{sink::SinkExt, stream::StreamExt};
use serde_json::json;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::models::ClientCommand;
use crate::services::broker::RoomBroker;

pub async fn ws_handler(
    State(broker): State<Arc<RoomBroker>>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, broker))
}

/// One connection, one observer id. Each joined room gets a forwarder task
/// pumping broadcast events into the connection's outbound queue; leaving a
/// room aborts its forwarder, and disconnecting leaves every room.
async fn handle_socket(socket: WebSocket, broker: Arc<RoomBroker>) {
    let observer_id = Uuid::new_v4();
    info!("Observer {} connected", observer_id);

    let (mut socket_tx, mut socket_rx) = socket.split();
    let (out_tx, mut out_rx) = mpsc::channel::<String>(64);

    let writer = tokio::spawn(async move {
        while let Some(payload) = out_rx.recv().await {
            if socket_tx.send(Message::Text(payload.into())).await.is_err() {
                break;
            }
        }
    });

    let mut forwarders: HashMap<Uuid, JoinHandle<()>> = HashMap::new();

    while let Some(Ok(message)) = socket_rx.next().await {
        let text = match message {
            Message::Text(text) => text,
            Message::Close(_) => break,
            _ => continue,
        };

        match serde_json::from_str::<ClientCommand>(text.as_str()) {
            Ok(ClientCommand::Join { session_id }) => {
                if forwarders.contains_key(&session_id) {
                    debug!(
                        "Observer {} already joined session {}",
                        observer_id, session_id
                    );
                    continue;
                }

                let receiver = broker.join(observer_id, session_id).await;
                forwarders.insert(
                    session_id,
                    spawn_forwarder(receiver, out_tx.clone(), observer_id, session_id),
                );

                let ack = json!({ "joined": session_id }).to_string();
                if out_tx.send(ack).await.is_err() {
                    break;
                }
            }
            Ok(ClientCommand::Leave { session_id }) => {
                if let Some(handle) = forwarders.remove(&session_id) {
                    handle.abort();
                }
                broker.leave(observer_id, session_id).await;

                let ack = json!({ "left": session_id }).to_string();
                if out_tx.send(ack).await.is_err() {
                    break;
                }
            }
            Err(e) => {
                // Malformed frames do not cost the observer its connection.
                warn!("Observer {} sent malformed command: {}", observer_id, e);
                let reply = json!({ "error": "unrecognized command" }).to_string();
                if out_tx.send(reply).await.is_err() {
                    break;
                }
            }
        }
    }

    for (session_id, handle) in forwarders {
        handle.abort();
        broker.leave(observer_id, session_id).await;
    }
    writer.abort();

    info!("Observer {} disconnected", observer_id);
}

fn spawn_forwarder(
    mut receiver: broadcast::Receiver<crate::models::SessionEvent>,
    out_tx: mpsc::Sender<String>,
    observer_id: Uuid,
    session_id: Uuid,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            match receiver.recv().await {
                Ok(event) => match serde_json::to_string(&event) {
                    Ok(payload) => {
                        if out_tx.send(payload).await.is_err() {
                            break;
                        }
                    }
                    Err(e) => warn!("Failed to serialize event for {}: {}", session_id, e),
                },
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    // Slow observer: drop what it missed, keep streaming.
                    warn!(
                        "Observer {} lagged on session {}, skipped {} events",
                        observer_id, session_id, skipped
                    );
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    })
}
