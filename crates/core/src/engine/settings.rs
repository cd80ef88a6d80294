use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::errors::SalonError;

pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(5);

/// What to do with a booking when no braider can take it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnassignedPolicy {
    /// Keep the booking without a braider for staff to assign later.
    #[default]
    AcceptUnassigned,
    /// Refuse the booking with `NoneQualified`.
    Reject,
}

impl FromStr for UnassignedPolicy {
    type Err = SalonError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "accept" | "accept_unassigned" => Ok(UnassignedPolicy::AcceptUnassigned),
            "reject" => Ok(UnassignedPolicy::Reject),
            other => Err(SalonError::Validation(format!(
                "Unknown unassigned policy: {}",
                other
            ))),
        }
    }
}

/// Engine-wide policy knobs.
#[derive(Debug, Clone)]
pub struct EngineSettings {
    /// Upper bound on waiting for a day lock.
    pub lock_timeout: Duration,
    /// Create bookings as confirmed instead of pending.
    pub auto_confirm: bool,
    pub unassigned_policy: UnassignedPolicy,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            lock_timeout: DEFAULT_LOCK_TIMEOUT,
            auto_confirm: false,
            unassigned_policy: UnassignedPolicy::AcceptUnassigned,
        }
    }
}
