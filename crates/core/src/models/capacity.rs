use std::collections::BTreeSet;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::{SalonError, SalonResult};
use crate::models::hours::WeeklyHours;
use crate::models::service_style::ServiceStyle;
use crate::scheduling::TimeWindow;

pub const DEFAULT_MAX_CONCURRENT_BOOKINGS: u32 = 3;
pub const DEFAULT_BUFFER_MINUTES: u32 = 30;
pub const DEFAULT_SERVICE_DURATION_MINUTES: u32 = 240;
pub const DEFAULT_BLOCK_REASON: &str = "Administrative block";
pub const MAX_CONCURRENT_BOOKINGS_LIMIT: u32 = 1000;
pub const MINUTES_PER_DAY: u32 = 24 * 60;

/// An administrative block on part of a day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockedRange {
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub reason: Option<String>,
}

impl BlockedRange {
    pub fn window(&self) -> TimeWindow {
        TimeWindow::new(
            self.date.and_time(self.start_time),
            self.date.and_time(self.end_time),
        )
    }

    pub fn reason(&self) -> &str {
        self.reason.as_deref().unwrap_or(DEFAULT_BLOCK_REASON)
    }

    fn same_span(&self, other: &BlockedRange) -> bool {
        self.date == other.date
            && self.start_time == other.start_time
            && self.end_time == other.end_time
    }
}

/// Capacity settings for one salon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalonCapacityConfig {
    pub salon_id: Uuid,
    pub max_concurrent_bookings: u32,
    pub buffer_minutes: u32,
    pub default_service_duration_minutes: u32,
    pub emergency_capacity_enabled: bool,
    /// Dates on which staff switched the emergency override on.
    #[serde(default)]
    pub emergency_dates: BTreeSet<NaiveDate>,
    /// Sorted by date, then start time.
    #[serde(default)]
    pub blocked_ranges: Vec<BlockedRange>,
    #[serde(default)]
    pub operating_hours: WeeklyHours,
    #[serde(default = "default_timezone")]
    pub timezone: Tz,
    pub updated_at: DateTime<Utc>,
}

fn default_timezone() -> Tz {
    Tz::UTC
}

/// Partial update of the owner-editable settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CapacitySettingsUpdate {
    pub max_concurrent_bookings: Option<u32>,
    pub buffer_minutes: Option<u32>,
    pub default_service_duration_minutes: Option<u32>,
    pub emergency_capacity_enabled: Option<bool>,
    pub operating_hours: Option<WeeklyHours>,
    pub timezone: Option<Tz>,
}

impl SalonCapacityConfig {
    /// Onboarding defaults.
    pub fn new(salon_id: Uuid) -> Self {
        Self {
            salon_id,
            max_concurrent_bookings: DEFAULT_MAX_CONCURRENT_BOOKINGS,
            buffer_minutes: DEFAULT_BUFFER_MINUTES,
            default_service_duration_minutes: DEFAULT_SERVICE_DURATION_MINUTES,
            emergency_capacity_enabled: true,
            emergency_dates: BTreeSet::new(),
            blocked_ranges: Vec::new(),
            operating_hours: WeeklyHours::default(),
            timezone: Tz::UTC,
            updated_at: Utc::now(),
        }
    }

    pub fn validate(&self) -> SalonResult<()> {
        if !(1..=MAX_CONCURRENT_BOOKINGS_LIMIT).contains(&self.max_concurrent_bookings) {
            return Err(SalonError::Validation(format!(
                "Maximum concurrent bookings must be between 1 and {}",
                MAX_CONCURRENT_BOOKINGS_LIMIT
            )));
        }
        if self.buffer_minutes > MINUTES_PER_DAY {
            return Err(SalonError::Validation(format!(
                "Buffer must be at most {} minutes",
                MINUTES_PER_DAY
            )));
        }
        if !(1..=MINUTES_PER_DAY).contains(&self.default_service_duration_minutes) {
            return Err(SalonError::Validation(format!(
                "Default service duration must be between 1 and {} minutes",
                MINUTES_PER_DAY
            )));
        }
        for range in &self.blocked_ranges {
            if range.end_time <= range.start_time {
                return Err(SalonError::Validation(format!(
                    "Blocked range on {} ends before it starts",
                    range.date
                )));
            }
        }
        self.operating_hours.validate()
    }

    /// Applies an update, leaving `self` untouched if the result is invalid.
    pub fn apply(&mut self, update: CapacitySettingsUpdate) -> SalonResult<()> {
        let mut next = self.clone();
        if let Some(max) = update.max_concurrent_bookings {
            next.max_concurrent_bookings = max;
        }
        if let Some(buffer) = update.buffer_minutes {
            next.buffer_minutes = buffer;
        }
        if let Some(duration) = update.default_service_duration_minutes {
            next.default_service_duration_minutes = duration;
        }
        if let Some(enabled) = update.emergency_capacity_enabled {
            next.emergency_capacity_enabled = enabled;
        }
        if let Some(hours) = update.operating_hours {
            next.operating_hours = hours;
        }
        if let Some(timezone) = update.timezone {
            next.timezone = timezone;
        }
        next.validate()?;
        next.updated_at = Utc::now();
        *self = next;
        Ok(())
    }

    pub fn emergency_active(&self, date: NaiveDate) -> bool {
        self.emergency_capacity_enabled && self.emergency_dates.contains(&date)
    }

    /// Concurrency ceiling for the date, one higher while the emergency override is active.
    pub fn effective_ceiling(&self, date: NaiveDate) -> u32 {
        if self.emergency_active(date) {
            self.max_concurrent_bookings.saturating_add(1)
        } else {
            self.max_concurrent_bookings
        }
    }

    pub fn blocks_on(&self, date: NaiveDate) -> impl Iterator<Item = &BlockedRange> {
        self.blocked_ranges
            .iter()
            .filter(move |range| range.date == date)
    }

    /// First blocked range on the window's date that overlaps it.
    pub fn blocking(&self, window: &TimeWindow) -> Option<&BlockedRange> {
        self.blocks_on(window.start.date())
            .find(|range| range.window().overlaps(window))
    }

    /// Adds a block, replacing an existing one with the same span.
    pub fn block(&mut self, range: BlockedRange) -> SalonResult<()> {
        if range.end_time <= range.start_time {
            return Err(SalonError::Validation(
                "Blocked range must end after it starts".to_string(),
            ));
        }
        self.blocked_ranges.retain(|existing| !existing.same_span(&range));
        let at = self
            .blocked_ranges
            .partition_point(|existing| (existing.date, existing.start_time) <= (range.date, range.start_time));
        self.blocked_ranges.insert(at, range);
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Removes the block with exactly this span. Returns whether one existed.
    pub fn unblock(&mut self, date: NaiveDate, start_time: NaiveTime, end_time: NaiveTime) -> bool {
        let before = self.blocked_ranges.len();
        self.blocked_ranges.retain(|range| {
            !(range.date == date && range.start_time == start_time && range.end_time == end_time)
        });
        let removed = self.blocked_ranges.len() != before;
        if removed {
            self.updated_at = Utc::now();
        }
        removed
    }

    pub fn set_emergency(&mut self, date: NaiveDate, active: bool) {
        if active {
            self.emergency_dates.insert(date);
        } else {
            self.emergency_dates.remove(&date);
        }
        self.updated_at = Utc::now();
    }

    pub fn duration_for(&self, style: ServiceStyle) -> u32 {
        style
            .standard_duration_minutes()
            .unwrap_or(self.default_service_duration_minutes)
    }

    /// Wall-clock time at the salon.
    pub fn local_now(&self, now: DateTime<Utc>) -> NaiveDateTime {
        now.with_timezone(&self.timezone).naive_local()
    }
}
