use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::models::booking::BookingStatus;
use crate::models::service_style::ServiceStyle;
use crate::scheduling::lifecycle::LifecycleAction;

/// Expected, typed refusals of a scheduling request.
///
/// Callers branch on these; none of them indicate a broken system.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Rejection {
    #[error("Capacity exceeded: {current} overlapping booking(s) against a ceiling of {ceiling}")]
    CapacityExceeded { current: u32, ceiling: u32 },

    #[error("Slot blocked: {reason}")]
    SlotBlocked { reason: String },

    #[error("Requested time has already passed")]
    PastSlot,

    #[error("Requested time is outside the salon's operating hours")]
    OutsideOperatingHours,

    #[error("No braider qualified and available for {style}")]
    NoneQualified { style: ServiceStyle },

    #[error("Braider {braider_id} is not available for this booking")]
    BraiderUnavailable { braider_id: Uuid },

    #[error("Cannot {action} a {from} booking")]
    TransitionInvalid {
        from: BookingStatus,
        action: LifecycleAction,
    },

    #[error("Booking day or braider was modified concurrently, retry the request")]
    ConcurrentModification,
}

impl Rejection {
    /// Stable machine-readable name, used in API error bodies.
    pub fn kind(&self) -> &'static str {
        match self {
            Rejection::CapacityExceeded { .. } => "capacity_exceeded",
            Rejection::SlotBlocked { .. } => "slot_blocked",
            Rejection::PastSlot => "past_slot",
            Rejection::OutsideOperatingHours => "outside_operating_hours",
            Rejection::NoneQualified { .. } => "none_qualified",
            Rejection::BraiderUnavailable { .. } => "braider_unavailable",
            Rejection::TransitionInvalid { .. } => "transition_invalid",
            Rejection::ConcurrentModification => "concurrent_modification",
        }
    }
}

#[derive(Error, Debug)]
pub enum SalonError {
    #[error(transparent)]
    Rejected(#[from] Rejection),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Timed out waiting for {0}")]
    Timeout(String),

    #[error("Database error: {0}")]
    Database(#[from] eyre::Report),

    #[error("Internal server error: {0}")]
    Internal(#[from] Box<dyn std::error::Error + Send + Sync>),
}

impl SalonError {
    pub fn rejection(&self) -> Option<&Rejection> {
        match self {
            SalonError::Rejected(rejection) => Some(rejection),
            _ => None,
        }
    }

    /// True when repeating the same request may succeed without any change.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            SalonError::Timeout(_) | SalonError::Rejected(Rejection::ConcurrentModification)
        )
    }
}

pub type SalonResult<T> = Result<T, SalonError>;
