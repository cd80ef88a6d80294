use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::Rejection;
use crate::models::booking::BookingStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleAction {
    Confirm,
    Cancel,
    Complete,
    NoShow,
    Reschedule,
}

impl fmt::Display for LifecycleAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LifecycleAction::Confirm => "confirm",
            LifecycleAction::Cancel => "cancel",
            LifecycleAction::Complete => "complete",
            LifecycleAction::NoShow => "mark as no-show",
            LifecycleAction::Reschedule => "reschedule",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Apply the action; the booking ends up in this status.
    To(BookingStatus),
    /// Already done. Succeeds without writing.
    NoOp,
}

/// The booking state machine.
///
/// Completed, cancelled and no-show are terminal. Completion and no-show are
/// idempotent from any terminal state, cancellation only from cancelled and
/// confirmation only from confirmed. Everything else from a terminal state is
/// invalid.
pub fn transition(from: BookingStatus, action: LifecycleAction) -> Result<Transition, Rejection> {
    use BookingStatus as S;
    use LifecycleAction as A;

    match (action, from) {
        (A::Confirm, S::Pending) => Ok(Transition::To(S::Confirmed)),
        (A::Confirm, S::Confirmed) => Ok(Transition::NoOp),

        (A::Cancel, S::Pending | S::Confirmed) => Ok(Transition::To(S::Cancelled)),
        (A::Cancel, S::Cancelled) => Ok(Transition::NoOp),

        (A::Complete, S::Confirmed) => Ok(Transition::To(S::Completed)),
        (A::NoShow, S::Confirmed) => Ok(Transition::To(S::NoShow)),
        (A::Complete | A::NoShow, S::Completed | S::Cancelled | S::NoShow) => Ok(Transition::NoOp),

        (A::Reschedule, S::Pending | S::Confirmed) => Ok(Transition::To(from)),

        _ => Err(Rejection::TransitionInvalid { from, action }),
    }
}
