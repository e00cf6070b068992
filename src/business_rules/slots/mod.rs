// Slot Generator
//
// Subdivides a resolved day into fixed-size slots and marks each one busy or
// free against the professional's existing bookings.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use serde::Serialize;
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::business_rules::{
    calendar::{BreakWindow, DaySchedule},
    config::RulesConfig,
    types::BookingStatus,
};

const MINUTES_PER_DAY: i64 = 24 * 60;

/// Existing booking projected onto the business wall clock
#[derive(Debug, Clone)]
pub struct BookedInterval {
    pub booking_id: Uuid,
    pub start: NaiveDateTime,
    pub duration_minutes: i64,
    pub status: BookingStatus,
    pub client_name: String,
    pub service_names: Vec<String>,
}

/// Booking details attached to a busy slot in the owner's view
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BookingSummary {
    pub id: Uuid,
    pub client_name: String,
    pub service_names: Vec<String>,
}

/// One candidate appointment window
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeSlot {
    pub time: NaiveTime,
    pub available: bool,
    pub booking: Option<BookingSummary>,
}

/// Who is looking at the schedule
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleView {
    /// Clients: availability only
    Public,
    /// The professional: busy slots carry booking details
    Owner,
}

/// Per-request slot generation options
#[derive(Debug, Clone)]
pub struct SlotOptions {
    /// Length of the requested services; slots that cannot hold it are unavailable
    pub required_minutes: Option<u32>,
    /// Slots starting at or before this local time are unavailable
    pub not_before: Option<NaiveDateTime>,
    pub view: ScheduleView,
}

impl Default for SlotOptions {
    fn default() -> Self {
        Self {
            required_minutes: None,
            not_before: None,
            view: ScheduleView::Public,
        }
    }
}

/// Half-open interval overlap: `[a_start, a_end)` against `[b_start, b_end)`
pub fn overlaps(a_start: i64, a_end: i64, b_start: i64, b_end: i64) -> bool {
    a_start < b_end && b_start < a_end
}

fn minutes_of(time: NaiveTime) -> i64 {
    i64::from(time.num_seconds_from_midnight() / 60)
}

/// Generate the ordered slots of one day
///
/// Slots are `[start, start + slot_size)` from opening time while they fit
/// before closing time. Slots intersecting the break are dropped entirely.
/// A slot is busy when it overlaps a PENDING or CONFIRMED booking; a booking
/// starting mid-slot makes the whole slot busy.
pub fn generate_slots(
    date: NaiveDate,
    day: &DaySchedule,
    bookings: &[BookedInterval],
    slot_size_minutes: u32,
    options: &SlotOptions,
) -> Vec<TimeSlot> {
    let (opens_at, closes_at, break_window) = match day {
        DaySchedule::Closed { .. } => return Vec::new(),
        DaySchedule::Open {
            opens_at,
            closes_at,
            break_window,
        } => (*opens_at, *closes_at, *break_window),
    };

    let size = i64::from(slot_size_minutes);
    if size == 0 {
        return Vec::new();
    }

    let open = minutes_of(opens_at);
    let close = minutes_of(closes_at);
    let break_range = match break_window {
        BreakWindow::NoBreak => None,
        BreakWindow::Break { start, end } => Some((minutes_of(start), minutes_of(end))),
    };
    let required = options
        .required_minutes
        .map(i64::from)
        .unwrap_or(0)
        .max(size);

    let day_start = date.and_time(NaiveTime::default());
    let busy: Vec<(i64, i64, &BookedInterval)> = bookings
        .iter()
        .filter(|b| b.status.blocks_slot())
        .map(|b| {
            let start = (b.start - day_start).num_minutes();
            (start, start + b.duration_minutes, b)
        })
        .collect();
    let not_before = options
        .not_before
        .map(|instant| (instant - day_start).num_minutes());

    let mut slots = Vec::new();
    let mut start = open;
    while start + size <= close && start < MINUTES_PER_DAY {
        let end = start + size;

        let in_break = break_range
            .map(|(b_start, b_end)| overlaps(start, end, b_start, b_end))
            .unwrap_or(false);
        if in_break {
            start += size;
            continue;
        }

        let Some(time) = NaiveTime::from_num_seconds_from_midnight_opt((start * 60) as u32, 0) else {
            break;
        };

        let owner = busy
            .iter()
            .find(|(b_start, b_end, _)| overlaps(start, end, *b_start, *b_end))
            .map(|(_, _, booking)| *booking);

        let window_end = start + required;
        let fits_day = window_end <= close;
        let crosses_break = break_range
            .map(|(b_start, b_end)| overlaps(start, window_end, b_start, b_end))
            .unwrap_or(false);
        let window_busy = busy
            .iter()
            .any(|(b_start, b_end, _)| overlaps(start, window_end, *b_start, *b_end));
        let in_past = not_before.map(|limit| start <= limit).unwrap_or(false);

        let available = owner.is_none() && fits_day && !crosses_break && !window_busy && !in_past;

        let booking = match options.view {
            ScheduleView::Owner => owner.map(|b| BookingSummary {
                id: b.booking_id,
                client_name: b.client_name.clone(),
                service_names: b.service_names.clone(),
            }),
            ScheduleView::Public => None,
        };

        slots.push(TimeSlot {
            time,
            available,
            booking,
        });
        start += size;
    }

    slots
}

/// Slot Generator
///
/// Applies the configured slot size to `generate_slots`.
pub struct SlotGenerator {
    config: Arc<RulesConfig>,
}

impl SlotGenerator {
    /// Create a new SlotGenerator
    pub fn new(config: Arc<RulesConfig>) -> Self {
        Self { config }
    }

    pub fn slot_size_minutes(&self) -> u32 {
        self.config.slot_size_minutes
    }

    pub fn generate(
        &self,
        date: NaiveDate,
        day: &DaySchedule,
        bookings: &[BookedInterval],
        options: &SlotOptions,
    ) -> Vec<TimeSlot> {
        generate_slots(date, day, bookings, self.config.slot_size_minutes, options)
    }
}
