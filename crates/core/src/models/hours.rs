use chrono::{Datelike, NaiveDate, NaiveTime, Weekday};
use serde::{Deserialize, Serialize};

use crate::errors::{SalonError, SalonResult};
use crate::scheduling::TimeWindow;

/// Opening and closing time for a single day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayHours {
    pub open: NaiveTime,
    pub close: NaiveTime,
}

impl DayHours {
    pub fn new(open: NaiveTime, close: NaiveTime) -> SalonResult<Self> {
        if close <= open {
            return Err(SalonError::Validation(format!(
                "Closing time {} must be after opening time {}",
                close, open
            )));
        }
        Ok(Self { open, close })
    }

    pub fn window_on(&self, date: NaiveDate) -> TimeWindow {
        TimeWindow::new(date.and_time(self.open), date.and_time(self.close))
    }
}

/// Per-weekday hours, Monday first. `None` means closed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeeklyHours {
    days: [Option<DayHours>; 7],
}

impl WeeklyHours {
    pub fn closed() -> Self {
        Self { days: [None; 7] }
    }

    /// Same hours on every listed weekday, closed on the rest.
    pub fn uniform(open: NaiveTime, close: NaiveTime, weekdays: &[Weekday]) -> SalonResult<Self> {
        let hours = DayHours::new(open, close)?;
        let mut week = Self::closed();
        for weekday in weekdays {
            week.set(*weekday, Some(hours));
        }
        Ok(week)
    }

    pub fn set(&mut self, weekday: Weekday, hours: Option<DayHours>) {
        self.days[weekday.num_days_from_monday() as usize] = hours;
    }

    /// Hours for the weekday. Ranges that close at or before they open count as closed.
    pub fn for_weekday(&self, weekday: Weekday) -> Option<DayHours> {
        self.days[weekday.num_days_from_monday() as usize].filter(|hours| hours.close > hours.open)
    }

    pub fn for_date(&self, date: NaiveDate) -> Option<DayHours> {
        self.for_weekday(date.weekday())
    }

    /// True when the window sits inside the open hours of its start date.
    pub fn covers(&self, window: &TimeWindow) -> bool {
        let date = window.start.date();
        self.for_date(date)
            .is_some_and(|hours| hours.window_on(date).covers(window))
    }

    pub fn validate(&self) -> SalonResult<()> {
        for hours in self.days.iter().flatten() {
            DayHours::new(hours.open, hours.close)?;
        }
        Ok(())
    }
}

impl Default for WeeklyHours {
    /// Monday to Saturday, 09:00 to 18:00.
    fn default() -> Self {
        let hours = DayHours {
            open: NaiveTime::from_hms_opt(9, 0, 0).unwrap_or(NaiveTime::MIN),
            close: NaiveTime::from_hms_opt(18, 0, 0).unwrap_or(NaiveTime::MIN),
        };
        let mut week = Self::closed();
        for weekday in [
            Weekday::Mon,
            Weekday::Tue,
            Weekday::Wed,
            Weekday::Thu,
            Weekday::Fri,
            Weekday::Sat,
        ] {
            week.set(weekday, Some(hours));
        }
        week
    }
}
