use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

/// Half-open interval `[start, end)` in salon-local time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimeWindow {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl TimeWindow {
    pub fn new(start: NaiveDateTime, end: NaiveDateTime) -> Self {
        Self { start, end }
    }

    /// Window starting at `date` + `time` and lasting `minutes`.
    pub fn starting_at(date: NaiveDate, time: NaiveTime, minutes: u32) -> Self {
        let start = date.and_time(time);
        Self {
            start,
            end: start + Duration::minutes(i64::from(minutes)),
        }
    }

    /// Extends the window by `minutes` on both sides.
    pub fn padded(&self, minutes: u32) -> Self {
        let pad = Duration::minutes(i64::from(minutes));
        Self {
            start: self.start - pad,
            end: self.end + pad,
        }
    }

    pub fn overlaps(&self, other: &TimeWindow) -> bool {
        self.start < other.end && other.start < self.end
    }

    pub fn contains(&self, instant: NaiveDateTime) -> bool {
        self.start <= instant && instant < self.end
    }

    /// True when `other` lies entirely inside this window.
    pub fn covers(&self, other: &TimeWindow) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    pub fn minutes(&self) -> i64 {
        (self.end - self.start).num_minutes()
    }
}
