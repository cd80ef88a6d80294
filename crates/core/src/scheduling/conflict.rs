use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::Rejection;
use crate::models::booking::Booking;
use crate::models::capacity::SalonCapacityConfig;
use crate::scheduling::TimeWindow;

/// A booking request as the checker sees it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Candidate {
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub duration_minutes: u32,
    /// Booking to leave out of the count, used when rescheduling it.
    pub exclude: Option<Uuid>,
}

impl Candidate {
    pub fn new(date: NaiveDate, time: NaiveTime, duration_minutes: u32) -> Self {
        Self {
            date,
            time,
            duration_minutes,
            exclude: None,
        }
    }

    pub fn excluding(mut self, booking_id: Uuid) -> Self {
        self.exclude = Some(booking_id);
        self
    }

    pub fn window(&self) -> TimeWindow {
        TimeWindow::starting_at(self.date, self.time, self.duration_minutes)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum Admission {
    Accept { overlapping: u32, remaining: u32 },
    Reject { reason: Rejection },
}

impl Admission {
    pub fn is_accept(&self) -> bool {
        matches!(self, Admission::Accept { .. })
    }

    pub fn into_result(self) -> Result<(u32, u32), Rejection> {
        match self {
            Admission::Accept {
                overlapping,
                remaining,
            } => Ok((overlapping, remaining)),
            Admission::Reject { reason } => Err(reason),
        }
    }
}

/// Decides whether a candidate fits into one day's bookings.
///
/// The buffer pads existing bookings only: the candidate's own window is
/// tested un-padded against each existing booking's buffered window.
pub struct ConflictChecker<'a> {
    config: &'a SalonCapacityConfig,
    bookings: &'a [Booking],
    now: NaiveDateTime,
}

impl<'a> ConflictChecker<'a> {
    /// `bookings` are the salon's bookings for the candidate's date, any status.
    /// `now` is salon-local.
    pub fn new(config: &'a SalonCapacityConfig, bookings: &'a [Booking], now: NaiveDateTime) -> Self {
        Self {
            config,
            bookings,
            now,
        }
    }

    /// Active bookings whose buffered window intersects `window`.
    pub fn overlapping(
        &self,
        window: TimeWindow,
        exclude: Option<Uuid>,
    ) -> impl Iterator<Item = &'a Booking> + 'a {
        let buffer = self.config.buffer_minutes;
        self.bookings.iter().filter(move |booking| {
            booking.is_active()
                && Some(booking.id) != exclude
                && booking.appointment_date == window.start.date()
                && booking.padded_window(buffer).overlaps(&window)
        })
    }

    pub fn check(&self, candidate: &Candidate) -> Admission {
        match self.evaluate(candidate) {
            Ok((overlapping, remaining)) => Admission::Accept {
                overlapping,
                remaining,
            },
            Err(reason) => Admission::Reject { reason },
        }
    }

    fn evaluate(&self, candidate: &Candidate) -> Result<(u32, u32), Rejection> {
        let window = candidate.window();

        if window.start < self.now {
            return Err(Rejection::PastSlot);
        }

        if let Some(block) = self.config.blocking(&window) {
            return Err(Rejection::SlotBlocked {
                reason: block.reason().to_string(),
            });
        }

        if !self.config.operating_hours.covers(&window) {
            return Err(Rejection::OutsideOperatingHours);
        }

        let current = self.overlapping(window, candidate.exclude).count() as u32;
        let ceiling = self.config.effective_ceiling(candidate.date);
        if current >= ceiling {
            return Err(Rejection::CapacityExceeded { current, ceiling });
        }

        Ok((current, ceiling - current - 1))
    }
}
