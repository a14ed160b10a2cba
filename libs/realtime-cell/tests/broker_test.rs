use std::time::Duration;

use serde_json::json;
use tokio::time::timeout;
use uuid::Uuid;

use realtime_cell::{RoomBroker, SessionEvent, SessionEventKind};

fn event(session_id: Uuid, kind: SessionEventKind, completion: u8) -> SessionEvent {
    SessionEvent::new(kind, session_id, json!({ "completion_percentage": completion }))
}

#[tokio::test]
async fn test_subscriber_receives_events_in_publish_order() {
    let broker = RoomBroker::new(16);
    let session = Uuid::new_v4();
    let observer = Uuid::new_v4();

    let mut receiver = broker.join(observer, session).await;

    for completion in [10u8, 20, 30] {
        broker
            .publish(session, event(session, SessionEventKind::SessionProgressUpdated, completion))
            .await;
    }

    for expected in [10u8, 20, 30] {
        let received = timeout(Duration::from_secs(1), receiver.recv())
            .await
            .expect("Event should arrive within timeout")
            .expect("Receiver should stay open");
        assert_eq!(received.snapshot["completion_percentage"], expected, "FIFO per room");
    }
}

#[tokio::test]
async fn test_late_joiner_gets_no_replay() {
    let broker = RoomBroker::new(16);
    let session = Uuid::new_v4();

    let mut early = broker.join(Uuid::new_v4(), session).await;
    broker
        .publish(session, event(session, SessionEventKind::SessionStarted, 0))
        .await;

    // Joining after the publish must not see the earlier event
    let mut late = broker.join(Uuid::new_v4(), session).await;
    broker
        .publish(session, event(session, SessionEventKind::SessionProgressUpdated, 50))
        .await;

    let first_for_early = early.recv().await.expect("Early subscriber gets both events");
    assert_eq!(first_for_early.kind, SessionEventKind::SessionStarted);
    let second_for_early = early.recv().await.unwrap();
    assert_eq!(second_for_early.kind, SessionEventKind::SessionProgressUpdated);

    let only_for_late = timeout(Duration::from_secs(1), late.recv())
        .await
        .expect("Late subscriber should still get the later event")
        .unwrap();
    assert_eq!(
        only_for_late.kind,
        SessionEventKind::SessionProgressUpdated,
        "Events published before join are never redelivered"
    );

    let nothing_more = timeout(Duration::from_millis(100), late.recv()).await;
    assert!(nothing_more.is_err(), "No further events pending for the late joiner");
}

#[tokio::test]
async fn test_rooms_are_isolated() {
    let broker = RoomBroker::new(16);
    let session_a = Uuid::new_v4();
    let session_b = Uuid::new_v4();

    let mut receiver_a = broker.join(Uuid::new_v4(), session_a).await;
    let mut receiver_b = broker.join(Uuid::new_v4(), session_b).await;

    broker
        .publish(session_a, event(session_a, SessionEventKind::SessionStarted, 0))
        .await;

    let received = timeout(Duration::from_secs(1), receiver_a.recv())
        .await
        .expect("Room A subscriber should receive the event")
        .unwrap();
    assert_eq!(received.session_id, session_a);

    let leaked = timeout(Duration::from_millis(100), receiver_b.recv()).await;
    assert!(leaked.is_err(), "Room B must not see room A's events");
}

#[tokio::test]
async fn test_join_is_idempotent_on_membership() {
    let broker = RoomBroker::new(16);
    let session = Uuid::new_v4();
    let observer = Uuid::new_v4();

    let _first = broker.join(observer, session).await;
    let _second = broker.join(observer, session).await;

    let members = broker.room_members(session).await;
    assert_eq!(members, vec![observer], "Re-joining must not duplicate membership");
}

#[tokio::test]
async fn test_leave_removes_membership_and_empty_room() {
    let broker = RoomBroker::new(16);
    let session = Uuid::new_v4();
    let observer_a = Uuid::new_v4();
    let observer_b = Uuid::new_v4();

    let _receiver_a = broker.join(observer_a, session).await;
    let _receiver_b = broker.join(observer_b, session).await;
    assert_eq!(broker.room_members(session).await.len(), 2);

    broker.leave(observer_a, session).await;
    assert_eq!(broker.room_members(session).await, vec![observer_b]);

    broker.leave(observer_b, session).await;
    assert!(broker.active_rooms().await.is_empty(), "Empty rooms are dropped");

    // Leaving a room that no longer exists is a no-op
    broker.leave(observer_b, session).await;
}

#[tokio::test]
async fn test_publish_without_subscribers_is_dropped() {
    let broker = RoomBroker::new(16);
    let session = Uuid::new_v4();

    // No room exists; publish must not panic or error
    broker
        .publish(session, event(session, SessionEventKind::SessionCompleted, 100))
        .await;

    assert!(broker.active_rooms().await.is_empty());
}

#[tokio::test]
async fn test_dropped_receiver_does_not_fail_publish() {
    let broker = RoomBroker::new(16);
    let session = Uuid::new_v4();
    let observer = Uuid::new_v4();

    let receiver = broker.join(observer, session).await;
    drop(receiver);

    // Delivery failure to a gone receiver is logged and dropped
    broker
        .publish(session, event(session, SessionEventKind::SessionStarted, 0))
        .await;

    // Membership bookkeeping is untouched until an explicit leave
    assert_eq!(broker.room_members(session).await, vec![observer]);
}

#[tokio::test]
async fn test_concurrent_joins_and_publishes() {
    let broker = std::sync::Arc::new(RoomBroker::new(64));
    let session = Uuid::new_v4();

    let mut receivers = Vec::new();
    for _ in 0..10 {
        receivers.push(broker.join(Uuid::new_v4(), session).await);
    }

    let mut publishers = Vec::new();
    for completion in 0..10u8 {
        let broker = std::sync::Arc::clone(&broker);
        publishers.push(tokio::spawn(async move {
            broker
                .publish(
                    session,
                    event(session, SessionEventKind::SessionProgressUpdated, completion),
                )
                .await;
        }));
    }
    for publisher in publishers {
        publisher.await.expect("Publisher task should not panic");
    }

    // Every subscriber sees all ten events, in one consistent room order
    let mut reference: Option<Vec<u8>> = None;
    for mut receiver in receivers {
        let mut seen = Vec::new();
        for _ in 0..10 {
            let received = timeout(Duration::from_secs(1), receiver.recv())
                .await
                .expect("All events should be delivered")
                .unwrap();
            seen.push(received.snapshot["completion_percentage"].as_u64().unwrap() as u8);
        }
        match &reference {
            Some(reference) => assert_eq!(&seen, reference, "Delivery order matches for every subscriber"),
            None => reference = Some(seen),
        }
    }
}
