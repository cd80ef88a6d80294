use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotStatus {
    Available,
    Busy,
    Full,
    Blocked,
}

/// Availability of one display slot. Computed on demand, never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSlot {
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub current: u32,
    pub max: u32,
    pub available: u32,
    pub is_blocked: bool,
    pub block_reason: Option<String>,
    pub is_past: bool,
    pub status: SlotStatus,
}
