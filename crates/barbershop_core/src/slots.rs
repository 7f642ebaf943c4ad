//! crates/barbershop_core/src/slots.rs
//!
//! Bookable start times for a day and whether each one is still free.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use std::collections::HashSet;
use std::sync::Arc;

use crate::domain::{Appointment, AppointmentStatus, Slot};
use crate::ports::{AppointmentStore, PortResult};

/// First bookable hour (inclusive).
pub const SLOT_OPENING_HOUR: u32 = 9;
/// End of the bookable window (exclusive).
pub const SLOT_CLOSING_HOUR: u32 = 18;
pub const SLOT_MINUTES: u32 = 30;

/// Every slot start of the working window, ascending.
pub fn slot_times() -> impl Iterator<Item = NaiveTime> {
    let first = SLOT_OPENING_HOUR * 60;
    let last = SLOT_CLOSING_HOUR * 60;
    (first..last)
        .step_by(SLOT_MINUTES as usize)
        .filter_map(|minute| NaiveTime::from_hms_opt(minute / 60, minute % 60, 0))
}

/// Whether `time` is one of the slot starts.
pub fn is_slot_start(time: NaiveTime) -> bool {
    time.second() == 0 && slot_times().any(|t| t == time)
}

pub fn slot_label(time: NaiveTime) -> String {
    time.format("%H:%M").to_string()
}

/// Inclusive `[00:00:00, 23:59:59]` window of `date`.
pub fn day_bounds(date: NaiveDate) -> (NaiveDateTime, NaiveDateTime) {
    let start = date.and_time(NaiveTime::MIN);
    let end = date.and_time(NaiveTime::from_hms_opt(23, 59, 59).unwrap_or(NaiveTime::MIN));
    (start, end)
}

/// Marks a slot taken only when a CONFIRMED appointment starts at exactly that
/// `HH:MM`. Durations are not considered and other statuses never block.
pub fn compute_slots(appointments: &[Appointment]) -> Vec<Slot> {
    let taken: HashSet<String> = appointments
        .iter()
        .filter(|a| a.status == AppointmentStatus::Confirmed)
        .map(|a| slot_label(a.scheduled_at.time()))
        .collect();

    slot_times()
        .map(|time| {
            let label = slot_label(time);
            let available = !taken.contains(&label);
            Slot {
                time: label,
                available,
            }
        })
        .collect()
}

/// Reads the day's confirmed appointments from the store and derives the slots.
#[derive(Clone)]
pub struct SlotCalculator {
    store: Arc<dyn AppointmentStore>,
}

impl SlotCalculator {
    pub fn new(store: Arc<dyn AppointmentStore>) -> Self {
        Self { store }
    }

    /// Store failures are propagated; there is no "all available" default.
    pub async fn slots_for(&self, date: NaiveDate) -> PortResult<Vec<Slot>> {
        let (from, to) = day_bounds(date);
        let confirmed = self
            .store
            .list_appointments_between(from, to, Some(AppointmentStatus::Confirmed))
            .await?;
        Ok(compute_slots(&confirmed))
    }

    pub async fn is_available(&self, at: NaiveDateTime) -> PortResult<bool> {
        let label = slot_label(at.time());
        let slots = self.slots_for(at.date()).await?;
        Ok(slots.iter().any(|s| s.time == label && s.available))
    }
}
