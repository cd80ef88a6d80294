use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::booking::Booking;
use crate::models::braider::Braider;
use crate::models::service_style::ServiceStyle;
use crate::scheduling::TimeWindow;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Assignment {
    Assigned(Uuid),
    NoneQualified,
}

/// A braider free for a window, as listed to staff.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BraiderAvailability {
    pub braider_id: Uuid,
    pub name: String,
    pub is_qualified: bool,
    pub bookings_today: u32,
    pub booked_minutes: u32,
    pub split_percentage: u8,
}

/// Picks a braider for a booking window on one day.
pub struct AssignmentResolver<'a> {
    braiders: &'a [Braider],
    bookings: &'a [Booking],
    buffer_minutes: u32,
}

impl<'a> AssignmentResolver<'a> {
    /// `braiders` in registry order; `bookings` are the salon's bookings for
    /// the window's date, any status.
    pub fn new(braiders: &'a [Braider], bookings: &'a [Booking], buffer_minutes: u32) -> Self {
        Self {
            braiders,
            bookings,
            buffer_minutes,
        }
    }

    /// Qualified braiders first (the preferred one if still eligible), then the
    /// lightest day, then registry order.
    pub fn assign(
        &self,
        window: &TimeWindow,
        style: ServiceStyle,
        preferred: Option<Uuid>,
        exclude: Option<Uuid>,
    ) -> Assignment {
        let eligible: Vec<&Braider> = self
            .braiders
            .iter()
            .filter(|braider| braider.is_qualified_for(style))
            .filter(|braider| self.is_free(braider, window, exclude))
            .collect();

        if let Some(preferred) = preferred.and_then(|id| eligible.iter().find(|b| b.id == id)) {
            return Assignment::Assigned(preferred.id);
        }

        eligible
            .iter()
            .min_by_key(|braider| self.bookings_for(braider.id, exclude).count())
            .map_or(Assignment::NoneQualified, |braider| Assignment::Assigned(braider.id))
    }

    /// On shift, under the daily cap and not double-booked.
    pub fn is_free(&self, braider: &Braider, window: &TimeWindow, exclude: Option<Uuid>) -> bool {
        if !braider.works_during(window) {
            return false;
        }
        if let Some(limit) = braider.max_daily_bookings {
            if self.bookings_for(braider.id, exclude).count() as u32 >= limit {
                return false;
            }
        }
        !self.is_double_booked(braider.id, window, exclude)
    }

    /// True if the braider already holds an active booking whose buffered
    /// window meets `window`.
    pub fn is_double_booked(&self, braider_id: Uuid, window: &TimeWindow, exclude: Option<Uuid>) -> bool {
        self.bookings_for(braider_id, exclude)
            .any(|booking| booking.padded_window(self.buffer_minutes).overlaps(window))
    }

    /// Every braider free for the window, qualified ones first, then by
    /// booked minutes.
    pub fn rank(&self, window: &TimeWindow, style: ServiceStyle) -> Vec<BraiderAvailability> {
        let mut ranked: Vec<BraiderAvailability> = self
            .braiders
            .iter()
            .filter(|braider| self.is_free(braider, window, None))
            .map(|braider| {
                let bookings: Vec<&Booking> = self.bookings_for(braider.id, None).collect();
                BraiderAvailability {
                    braider_id: braider.id,
                    name: braider.name.clone(),
                    is_qualified: braider.is_qualified_for(style),
                    bookings_today: bookings.len() as u32,
                    booked_minutes: bookings.iter().map(|b| b.duration_minutes).sum(),
                    split_percentage: braider.split_percentage,
                }
            })
            .collect();

        ranked.sort_by_key(|entry| (!entry.is_qualified, entry.booked_minutes));
        ranked
    }

    fn bookings_for(&self, braider_id: Uuid, exclude: Option<Uuid>) -> impl Iterator<Item = &'a Booking> + 'a {
        self.bookings.iter().filter(move |booking| {
            booking.is_active()
                && booking.assigned_braider_id == Some(braider_id)
                && Some(booking.id) != exclude
        })
    }
}
