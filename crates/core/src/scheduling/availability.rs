//! # Slot Availability
//!
//! Turns a salon's capacity configuration and its bookings into display slots.
//!
//! For every open day in the requested range the calculator walks slot starts
//! from opening time in steps of the granularity. Each slot counts the active
//! bookings whose buffered window intersects it, compares that against the
//! day's ceiling and overlays administrative blocks and the past-time policy.
//!
//! The result is an [`AvailabilityCalendar`], which owns its inputs and hands
//! out a fresh lazy iterator each time it is iterated.

use std::collections::BTreeMap;

use chrono::{Duration, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::errors::{SalonError, SalonResult};
use crate::models::booking::Booking;
use crate::models::capacity::SalonCapacityConfig;
use crate::models::time_slot::{SlotStatus, TimeSlot};
use crate::scheduling::TimeWindow;

pub const DEFAULT_GRANULARITY_MINUTES: u32 = 60;
/// Longest range a single query may span, in days.
pub const MAX_RANGE_DAYS: i64 = 93;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilityQuery {
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub granularity_minutes: u32,
}

impl AvailabilityQuery {
    pub fn new(from: NaiveDate, to: NaiveDate) -> Self {
        Self {
            from,
            to,
            granularity_minutes: DEFAULT_GRANULARITY_MINUTES,
        }
    }

    pub fn day(date: NaiveDate) -> Self {
        Self::new(date, date)
    }

    pub fn with_granularity(mut self, minutes: u32) -> Self {
        self.granularity_minutes = minutes;
        self
    }

    pub fn validate(&self) -> SalonResult<()> {
        if self.to < self.from {
            return Err(SalonError::Validation(format!(
                "Range end {} is before range start {}",
                self.to, self.from
            )));
        }
        if (self.to - self.from).num_days() >= MAX_RANGE_DAYS {
            return Err(SalonError::Validation(format!(
                "Availability range cannot exceed {} days",
                MAX_RANGE_DAYS
            )));
        }
        if self.granularity_minutes == 0 || self.granularity_minutes > 24 * 60 {
            return Err(SalonError::Validation(
                "Slot granularity must be between 1 and 1440 minutes".to_string(),
            ));
        }
        Ok(())
    }
}

/// Snapshot of everything needed to compute slots for a date range.
#[derive(Debug, Clone)]
pub struct AvailabilityCalendar {
    config: SalonCapacityConfig,
    bookings: BTreeMap<NaiveDate, Vec<Booking>>,
    query: AvailabilityQuery,
    now: NaiveDateTime,
}

impl AvailabilityCalendar {
    /// `now` is salon-local. Inactive bookings are dropped here.
    pub fn new(
        config: SalonCapacityConfig,
        bookings: impl IntoIterator<Item = Booking>,
        query: AvailabilityQuery,
        now: NaiveDateTime,
    ) -> Self {
        let mut by_date: BTreeMap<NaiveDate, Vec<Booking>> = BTreeMap::new();
        for booking in bookings.into_iter().filter(Booking::is_active) {
            by_date
                .entry(booking.appointment_date)
                .or_default()
                .push(booking);
        }

        Self {
            config,
            bookings: by_date,
            query,
            now,
        }
    }

    pub fn query(&self) -> &AvailabilityQuery {
        &self.query
    }

    pub fn slots(&self) -> Slots<'_> {
        Slots {
            calendar: self,
            date: Some(self.query.from).filter(|from| *from <= self.query.to),
            cursor: None,
        }
    }

    /// The slot starting exactly at `start`, if it is one of the calendar's slots.
    pub fn slot_at(&self, start: NaiveDateTime) -> Option<TimeSlot> {
        self.slots()
            .find(|slot| slot.date == start.date() && slot.start_time == start.time())
    }

    fn evaluate(&self, window: TimeWindow) -> TimeSlot {
        let date = window.start.date();
        let buffer = self.config.buffer_minutes;

        let current = self
            .bookings
            .get(&date)
            .map(|bookings| {
                bookings
                    .iter()
                    .filter(|booking| booking.padded_window(buffer).overlaps(&window))
                    .count() as u32
            })
            .unwrap_or(0);
        let max = self.config.effective_ceiling(date);
        let block = self.config.blocking(&window);
        let is_past = window.start < self.now;

        let available = if block.is_some() || is_past {
            0
        } else {
            max.saturating_sub(current)
        };

        let status = if block.is_some() {
            SlotStatus::Blocked
        } else if available == 0 {
            SlotStatus::Full
        } else if current > 0 && current < max {
            SlotStatus::Busy
        } else {
            SlotStatus::Available
        };

        TimeSlot {
            date,
            start_time: window.start.time(),
            end_time: window.end.time(),
            current,
            max,
            available,
            is_blocked: block.is_some(),
            block_reason: block.map(|range| range.reason().to_string()),
            is_past,
            status,
        }
    }
}

impl<'a> IntoIterator for &'a AvailabilityCalendar {
    type Item = TimeSlot;
    type IntoIter = Slots<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.slots()
    }
}

/// Lazy walk over a calendar's slots, date by date.
#[derive(Debug, Clone)]
pub struct Slots<'a> {
    calendar: &'a AvailabilityCalendar,
    date: Option<NaiveDate>,
    cursor: Option<NaiveDateTime>,
}

impl Slots<'_> {
    fn next_date(&mut self) {
        self.cursor = None;
        self.date = self
            .date
            .and_then(|date| date.succ_opt())
            .filter(|date| *date <= self.calendar.query.to);
    }
}

impl Iterator for Slots<'_> {
    type Item = TimeSlot;

    fn next(&mut self) -> Option<TimeSlot> {
        let step = Duration::minutes(i64::from(self.calendar.query.granularity_minutes));

        loop {
            let date = self.date?;
            let Some(hours) = self.calendar.config.operating_hours.for_date(date) else {
                self.next_date();
                continue;
            };

            let close = date.and_time(hours.close);
            let start = self.cursor.unwrap_or_else(|| date.and_time(hours.open));
            if start >= close {
                self.next_date();
                continue;
            }

            let end = (start + step).min(close);
            self.cursor = Some(end);
            return Some(self.calendar.evaluate(TimeWindow::new(start, end)));
        }
    }
}
