use std::collections::HashMap;

use chrono::{NaiveDate, NaiveTime, TimeZone, Utc};
use tokio::sync::RwLock;
use tracing::{debug, warn};
use uuid::Uuid;

use shared_config::AppConfig;

use crate::models::{SchedulingError, TimeSlot};

#[derive(Debug, Clone)]
struct Reservation {
    provider_id: Uuid,
    resource_id: Uuid,
    interval: TimeSlot,
}

/// In-memory reservation table answering booking-conflict queries.
///
/// The whole table sits behind one `RwLock` so check-and-insert is a single
/// atomic step: two concurrent `reserve` calls for the same provider or
/// resource can never both succeed on overlapping intervals.
pub struct AvailabilityIndex {
    reservations: RwLock<HashMap<Uuid, Reservation>>,
    operating_day_start: NaiveTime,
    operating_day_end: NaiveTime,
}

impl AvailabilityIndex {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            reservations: RwLock::new(HashMap::new()),
            operating_day_start: config.operating_day_start,
            operating_day_end: config.operating_day_end,
        }
    }

    /// Record a busy interval for a provider/resource pair, keyed by
    /// appointment id. Fails with `SlotConflict` when the interval overlaps
    /// an existing reservation sharing the provider or the resource.
    pub async fn reserve(
        &self,
        appointment_id: Uuid,
        provider_id: Uuid,
        resource_id: Uuid,
        interval: TimeSlot,
    ) -> Result<(), SchedulingError> {
        let mut reservations = self.reservations.write().await;

        if let Some(conflicting_id) =
            Self::find_conflict(&reservations, provider_id, resource_id, &interval, None)
        {
            warn!(
                "Reservation conflict for provider {} / resource {}: appointment {}",
                provider_id, resource_id, conflicting_id
            );
            return Err(SchedulingError::SlotConflict {
                conflicting_appointment_id: conflicting_id,
            });
        }

        reservations.insert(
            appointment_id,
            Reservation {
                provider_id,
                resource_id,
                interval,
            },
        );

        debug!("Reserved {:?} for appointment {}", interval, appointment_id);
        Ok(())
    }

    /// Idempotent: releasing a reservation that does not exist is a no-op.
    pub async fn release(&self, appointment_id: Uuid) {
        let mut reservations = self.reservations.write().await;
        if reservations.remove(&appointment_id).is_some() {
            debug!("Released reservation for appointment {}", appointment_id);
        }
    }

    /// Atomically move an existing reservation to a new interval. On
    /// conflict the original reservation is restored before returning, so a
    /// failed swap never leaves the appointment without a reservation.
    pub async fn swap(
        &self,
        appointment_id: Uuid,
        provider_id: Uuid,
        resource_id: Uuid,
        new_interval: TimeSlot,
    ) -> Result<(), SchedulingError> {
        let mut reservations = self.reservations.write().await;

        let previous = reservations.remove(&appointment_id);

        if let Some(conflicting_id) = Self::find_conflict(
            &reservations,
            provider_id,
            resource_id,
            &new_interval,
            Some(appointment_id),
        ) {
            if let Some(previous) = previous {
                reservations.insert(appointment_id, previous);
            }
            warn!(
                "Swap conflict for appointment {}: blocked by {}",
                appointment_id, conflicting_id
            );
            return Err(SchedulingError::SlotConflict {
                conflicting_appointment_id: conflicting_id,
            });
        }

        reservations.insert(
            appointment_id,
            Reservation {
                provider_id,
                resource_id,
                interval: new_interval,
            },
        );

        debug!(
            "Moved reservation for appointment {} to {:?}",
            appointment_id, new_interval
        );
        Ok(())
    }

    /// Whether the appointment currently holds a reservation.
    pub async fn is_reserved(&self, appointment_id: Uuid) -> bool {
        self.reservations.read().await.contains_key(&appointment_id)
    }

    /// Free intervals for a provider on a given date: the operating-hours
    /// window minus that provider's reservations, in ascending order. The
    /// returned iterator is lazy and restartable (`Clone`).
    pub async fn query_free(&self, provider_id: Uuid, date: NaiveDate) -> FreeSlotIter {
        let day_start = Utc
            .from_utc_datetime(&date.and_time(self.operating_day_start));
        let day_end = Utc.from_utc_datetime(&date.and_time(self.operating_day_end));

        let mut busy: Vec<TimeSlot> = {
            let reservations = self.reservations.read().await;
            reservations
                .values()
                .filter(|r| r.provider_id == provider_id)
                .map(|r| r.interval)
                .filter(|slot| slot.start < day_end && slot.end > day_start)
                .collect()
        };

        busy.sort_by_key(|slot| slot.start);

        FreeSlotIter {
            busy,
            cursor: day_start,
            day_end,
            next_busy: 0,
        }
    }

    fn find_conflict(
        reservations: &HashMap<Uuid, Reservation>,
        provider_id: Uuid,
        resource_id: Uuid,
        interval: &TimeSlot,
        exclude: Option<Uuid>,
    ) -> Option<Uuid> {
        reservations
            .iter()
            .filter(|(id, _)| Some(**id) != exclude)
            .find(|(_, r)| {
                (r.provider_id == provider_id || r.resource_id == resource_id)
                    && r.interval.overlaps(interval)
            })
            .map(|(id, _)| *id)
    }
}

/// Lazy subtraction of sorted busy intervals from the operating window.
#[derive(Debug, Clone)]
pub struct FreeSlotIter {
    busy: Vec<TimeSlot>,
    cursor: chrono::DateTime<Utc>,
    day_end: chrono::DateTime<Utc>,
    next_busy: usize,
}

impl Iterator for FreeSlotIter {
    type Item = TimeSlot;

    fn next(&mut self) -> Option<TimeSlot> {
        while self.cursor < self.day_end {
            match self.busy.get(self.next_busy) {
                Some(busy) if busy.start <= self.cursor => {
                    // Busy intervals may overlap each other; only ever move
                    // the cursor forward.
                    if busy.end > self.cursor {
                        self.cursor = busy.end;
                    }
                    self.next_busy += 1;
                }
                Some(busy) => {
                    let gap_end = busy.start.min(self.day_end);
                    let free = TimeSlot::new(self.cursor, gap_end);
                    self.cursor = busy.end.max(gap_end);
                    self.next_busy += 1;
                    if free.start < free.end {
                        return Some(free);
                    }
                }
                None => {
                    let free = TimeSlot::new(self.cursor, self.day_end);
                    self.cursor = self.day_end;
                    return Some(free);
                }
            }
        }
        None
    }
}
