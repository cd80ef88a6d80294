use std::collections::BTreeSet;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::{SalonError, SalonResult};
use crate::models::hours::WeeklyHours;
use crate::models::service_style::ServiceStyle;
use crate::scheduling::TimeWindow;

pub const DEFAULT_SPLIT_PERCENTAGE: u8 = 60;

/// A dated exception to a braider's working hours.
///
/// Without a start and end time the whole day is off.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeOff {
    pub date: NaiveDate,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub reason: Option<String>,
}

impl TimeOff {
    pub fn blocks(&self, window: &TimeWindow) -> bool {
        if window.start.date() != self.date {
            return false;
        }
        match (self.start_time, self.end_time) {
            (Some(start), Some(end)) => {
                TimeWindow::new(self.date.and_time(start), self.date.and_time(end)).overlaps(window)
            }
            _ => true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Braider {
    pub id: Uuid,
    pub salon_id: Uuid,
    pub name: String,
    /// Empty means the braider takes every style.
    pub specialties: BTreeSet<ServiceStyle>,
    pub is_active: bool,
    pub working_hours: WeeklyHours,
    pub split_percentage: u8,
    #[serde(default)]
    pub time_off: Vec<TimeOff>,
    pub max_daily_bookings: Option<u32>,
    pub created_at: DateTime<Utc>,
    /// Bumped on every save; a save carrying an older revision is stale.
    #[serde(default)]
    pub revision: u64,
}

impl Braider {
    pub fn new(salon_id: Uuid, name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            salon_id,
            name: name.into(),
            specialties: BTreeSet::new(),
            is_active: true,
            working_hours: WeeklyHours::default(),
            split_percentage: DEFAULT_SPLIT_PERCENTAGE,
            time_off: Vec::new(),
            max_daily_bookings: None,
            created_at: Utc::now(),
            revision: 0,
        }
    }

    pub fn is_qualified_for(&self, style: ServiceStyle) -> bool {
        self.specialties.is_empty() || self.specialties.contains(&style)
    }

    pub fn is_off_during(&self, window: &TimeWindow) -> bool {
        self.time_off.iter().any(|off| off.blocks(window))
    }

    /// Active, on shift for the whole window, and not on time off.
    pub fn works_during(&self, window: &TimeWindow) -> bool {
        self.is_active && self.working_hours.covers(window) && !self.is_off_during(window)
    }
}

/// Registration payload for a new braider.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewBraider {
    pub name: String,
    #[serde(default)]
    pub specialties: BTreeSet<ServiceStyle>,
    pub working_hours: Option<WeeklyHours>,
    pub split_percentage: Option<u8>,
    pub max_daily_bookings: Option<u32>,
}

/// Partial update of a braider's profile.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BraiderUpdate {
    pub name: Option<String>,
    pub specialties: Option<BTreeSet<ServiceStyle>>,
    pub working_hours: Option<WeeklyHours>,
    pub split_percentage: Option<u8>,
    pub max_daily_bookings: Option<Option<u32>>,
    pub is_active: Option<bool>,
}

impl NewBraider {
    pub fn into_braider(self, salon_id: Uuid) -> SalonResult<Braider> {
        let mut braider = Braider::new(salon_id, self.name);
        braider.specialties = self.specialties;
        if let Some(hours) = self.working_hours {
            braider.working_hours = hours;
        }
        if let Some(split) = self.split_percentage {
            braider.split_percentage = split;
        }
        braider.max_daily_bookings = self.max_daily_bookings;
        validate(&braider)?;
        Ok(braider)
    }
}

impl BraiderUpdate {
    pub fn apply_to(self, braider: &mut Braider) -> SalonResult<()> {
        let mut next = braider.clone();
        if let Some(name) = self.name {
            next.name = name;
        }
        if let Some(specialties) = self.specialties {
            next.specialties = specialties;
        }
        if let Some(hours) = self.working_hours {
            next.working_hours = hours;
        }
        if let Some(split) = self.split_percentage {
            next.split_percentage = split;
        }
        if let Some(max) = self.max_daily_bookings {
            next.max_daily_bookings = max;
        }
        if let Some(active) = self.is_active {
            next.is_active = active;
        }
        validate(&next)?;
        *braider = next;
        Ok(())
    }
}

fn validate(braider: &Braider) -> SalonResult<()> {
    if braider.name.trim().is_empty() {
        return Err(SalonError::Validation("Braider name cannot be empty".to_string()));
    }
    if braider.split_percentage > 100 {
        return Err(SalonError::Validation(
            "Split percentage must be between 0 and 100".to_string(),
        ));
    }
    if braider.max_daily_bookings == Some(0) {
        return Err(SalonError::Validation(
            "Daily booking limit must be at least 1 when set".to_string(),
        ));
    }
    braider.working_hours.validate()
}
