use assert_matches::assert_matches;
use chrono::{NaiveDate, TimeZone, Utc};
use uuid::Uuid;

use scheduling_cell::{AvailabilityIndex, SchedulingError, TimeSlot};
use shared_config::AppConfig;

fn index() -> AvailabilityIndex {
    AvailabilityIndex::new(&AppConfig::default())
}

fn slot(h0: u32, m0: u32, h1: u32, m1: u32) -> TimeSlot {
    TimeSlot::new(
        Utc.with_ymd_and_hms(2025, 6, 2, h0, m0, 0).unwrap(),
        Utc.with_ymd_and_hms(2025, 6, 2, h1, m1, 0).unwrap(),
    )
}

fn day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 6, 2).unwrap()
}

#[tokio::test]
async fn test_reserve_conflicts_on_same_provider() {
    let index = index();
    let provider = Uuid::new_v4();
    let first = Uuid::new_v4();

    index
        .reserve(first, provider, Uuid::new_v4(), slot(10, 0, 11, 0))
        .await
        .expect("First reservation should succeed");

    // Different resource, same provider, overlapping interval
    let result = index
        .reserve(Uuid::new_v4(), provider, Uuid::new_v4(), slot(10, 30, 11, 30))
        .await;

    assert_matches!(
        result,
        Err(SchedulingError::SlotConflict { conflicting_appointment_id }) if conflicting_appointment_id == first
    );
}

#[tokio::test]
async fn test_reserve_conflicts_on_same_resource() {
    let index = index();
    let resource = Uuid::new_v4();
    let first = Uuid::new_v4();

    index
        .reserve(first, Uuid::new_v4(), resource, slot(10, 0, 11, 0))
        .await
        .expect("First reservation should succeed");

    // Different provider, same resource
    let result = index
        .reserve(Uuid::new_v4(), Uuid::new_v4(), resource, slot(10, 59, 12, 0))
        .await;

    assert_matches!(
        result,
        Err(SchedulingError::SlotConflict { conflicting_appointment_id }) if conflicting_appointment_id == first
    );
}

#[tokio::test]
async fn test_adjacent_slots_do_not_conflict() {
    let index = index();
    let provider = Uuid::new_v4();
    let resource = Uuid::new_v4();

    index
        .reserve(Uuid::new_v4(), provider, resource, slot(10, 0, 11, 0))
        .await
        .expect("First reservation should succeed");

    // Half-open semantics: [11:00, 12:00) does not touch [10:00, 11:00)
    index
        .reserve(Uuid::new_v4(), provider, resource, slot(11, 0, 12, 0))
        .await
        .expect("Slot starting exactly at previous end must not conflict");
}

#[tokio::test]
async fn test_disjoint_providers_and_resources_do_not_conflict() {
    let index = index();

    index
        .reserve(Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4(), slot(10, 0, 11, 0))
        .await
        .expect("First reservation should succeed");

    index
        .reserve(Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4(), slot(10, 0, 11, 0))
        .await
        .expect("Unrelated provider and resource should not conflict");
}

#[tokio::test]
async fn test_release_is_idempotent() {
    let index = index();
    let appointment = Uuid::new_v4();
    let provider = Uuid::new_v4();
    let resource = Uuid::new_v4();

    index
        .reserve(appointment, provider, resource, slot(10, 0, 11, 0))
        .await
        .expect("Reservation should succeed");

    index.release(appointment).await;
    assert!(!index.is_reserved(appointment).await);

    // Releasing again (and releasing something unknown) is a no-op
    index.release(appointment).await;
    index.release(Uuid::new_v4()).await;

    // Interval is actually free again
    index
        .reserve(Uuid::new_v4(), provider, resource, slot(10, 0, 11, 0))
        .await
        .expect("Released interval should be reservable again");
}

#[tokio::test]
async fn test_swap_restores_reservation_on_conflict() {
    let index = index();
    let provider = Uuid::new_v4();
    let resource = Uuid::new_v4();
    let moving = Uuid::new_v4();
    let blocker = Uuid::new_v4();

    index
        .reserve(moving, provider, resource, slot(10, 0, 11, 0))
        .await
        .expect("Reservation should succeed");
    index
        .reserve(blocker, provider, resource, slot(14, 0, 15, 0))
        .await
        .expect("Blocking reservation should succeed");

    let result = index.swap(moving, provider, resource, slot(14, 30, 15, 30)).await;
    assert_matches!(
        result,
        Err(SchedulingError::SlotConflict { conflicting_appointment_id }) if conflicting_appointment_id == blocker
    );

    // The failed swap must leave the original reservation in place
    assert!(index.is_reserved(moving).await, "Original reservation must survive a failed swap");
    let result = index
        .reserve(Uuid::new_v4(), provider, resource, slot(10, 30, 11, 30))
        .await;
    assert_matches!(result, Err(SchedulingError::SlotConflict { .. }));
}

#[tokio::test]
async fn test_swap_to_overlapping_self_succeeds() {
    let index = index();
    let provider = Uuid::new_v4();
    let resource = Uuid::new_v4();
    let appointment = Uuid::new_v4();

    index
        .reserve(appointment, provider, resource, slot(10, 0, 11, 0))
        .await
        .expect("Reservation should succeed");

    // The appointment's own reservation never blocks its move
    index
        .swap(appointment, provider, resource, slot(10, 30, 11, 30))
        .await
        .expect("Swap overlapping only the old interval should succeed");
}

#[tokio::test]
async fn test_query_free_subtracts_reservations_in_order() {
    let index = index();
    let provider = Uuid::new_v4();

    index
        .reserve(Uuid::new_v4(), provider, Uuid::new_v4(), slot(10, 0, 11, 0))
        .await
        .unwrap();
    index
        .reserve(Uuid::new_v4(), provider, Uuid::new_v4(), slot(14, 0, 15, 30))
        .await
        .unwrap();

    let free: Vec<TimeSlot> = index.query_free(provider, day()).await.collect();

    // Operating hours default to 08:00-20:00
    assert_eq!(
        free,
        vec![slot(8, 0, 10, 0), slot(11, 0, 14, 0), slot(15, 30, 20, 0)],
        "Free intervals should be the operating window minus reservations, ascending"
    );
}

#[tokio::test]
async fn test_query_free_ignores_other_providers() {
    let index = index();
    let provider = Uuid::new_v4();

    index
        .reserve(Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4(), slot(10, 0, 11, 0))
        .await
        .unwrap();

    let free: Vec<TimeSlot> = index.query_free(provider, day()).await.collect();
    assert_eq!(free, vec![slot(8, 0, 20, 0)], "Other providers' bookings must not appear");
}

#[tokio::test]
async fn test_query_free_iterator_is_restartable() {
    let index = index();
    let provider = Uuid::new_v4();

    index
        .reserve(Uuid::new_v4(), provider, Uuid::new_v4(), slot(9, 0, 9, 30))
        .await
        .unwrap();

    let iter = index.query_free(provider, day()).await;
    let first_pass: Vec<TimeSlot> = iter.clone().collect();
    let second_pass: Vec<TimeSlot> = iter.collect();

    assert_eq!(first_pass, second_pass, "A cloned iterator must yield the same sequence");
    assert_eq!(first_pass.len(), 2);
}

#[tokio::test]
async fn test_query_free_with_back_to_back_reservations() {
    let index = index();
    let provider = Uuid::new_v4();

    index
        .reserve(Uuid::new_v4(), provider, Uuid::new_v4(), slot(8, 0, 12, 0))
        .await
        .unwrap();
    index
        .reserve(Uuid::new_v4(), provider, Uuid::new_v4(), slot(12, 0, 20, 0))
        .await
        .unwrap();

    let free: Vec<TimeSlot> = index.query_free(provider, day()).await.collect();
    assert!(free.is_empty(), "A fully booked day has no free intervals");
}
