//! # Booking Engine
//!
//! The public operations of the capacity engine. Queries read the store
//! without locking; every command that can change what a day holds runs inside
//! a critical section keyed by `(salon, date)`, re-reads that day, decides, and
//! commits conditionally on the revision it read.
//!
//! Inside one process the day lock serializes competing requests, so the loser
//! of a race sees the winner's booking and is rejected on capacity. Across
//! processes the conditional commit catches the race and the loser gets
//! [`Rejection::ConcurrentModification`].

mod locks;
mod settings;

use std::sync::Arc;

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::clock::{Clock, SystemClock};
use crate::errors::{Rejection, SalonError, SalonResult};
use crate::models::booking::{
    Booking, BookingReceipt, BookingStatus, CreateBooking, TransitionOutcome,
};
use crate::models::braider::{Braider, BraiderUpdate, NewBraider, TimeOff};
use crate::models::capacity::{BlockedRange, CapacitySettingsUpdate, MINUTES_PER_DAY, SalonCapacityConfig};
use crate::models::service_style::ServiceStyle;
use crate::scheduling::TimeWindow;
use crate::scheduling::assignment::{Assignment, AssignmentResolver, BraiderAvailability};
use crate::scheduling::availability::{AvailabilityCalendar, AvailabilityQuery};
use crate::scheduling::conflict::{Admission, Candidate, ConflictChecker};
use crate::scheduling::lifecycle::{self, LifecycleAction, Transition};
use crate::store::{BookingStore, CommitOutcome, DayKey, WriteBatch};

pub use locks::{KeyGuard, KeyedLocks};
pub use settings::{DEFAULT_LOCK_TIMEOUT, EngineSettings, UnassignedPolicy};

/// A braider's bookings and time off over a date range.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BraiderSchedule {
    pub braider: Braider,
    pub bookings: Vec<Booking>,
    pub time_off: Vec<TimeOff>,
    pub total_bookings: u32,
    pub total_minutes: u32,
}

pub struct BookingEngine {
    store: Arc<dyn BookingStore>,
    clock: Arc<dyn Clock>,
    settings: EngineSettings,
    day_locks: KeyedLocks<DayKey>,
    salon_locks: KeyedLocks<Uuid>,
}

impl BookingEngine {
    pub fn new(store: Arc<dyn BookingStore>, settings: EngineSettings) -> Self {
        Self::with_clock(store, Arc::new(SystemClock), settings)
    }

    pub fn with_clock(
        store: Arc<dyn BookingStore>,
        clock: Arc<dyn Clock>,
        settings: EngineSettings,
    ) -> Self {
        Self {
            store,
            clock,
            day_locks: KeyedLocks::new(settings.lock_timeout),
            salon_locks: KeyedLocks::new(settings.lock_timeout),
            settings,
        }
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    // ---- salon capacity configuration ----

    /// Creates the salon's configuration with onboarding defaults if it has none.
    pub async fn onboard_salon(&self, salon_id: Uuid) -> SalonResult<SalonCapacityConfig> {
        let _guard = self.salon_locks.acquire(salon_id).await?;
        if let Some(config) = self.store.salon_config(salon_id).await? {
            return Ok(config);
        }

        let mut config = SalonCapacityConfig::new(salon_id);
        config.updated_at = self.clock.now();
        self.store.save_salon_config(&config).await?;
        info!(%salon_id, "Onboarded salon with default capacity settings");
        Ok(config)
    }

    pub async fn capacity_settings(&self, salon_id: Uuid) -> SalonResult<SalonCapacityConfig> {
        self.config(salon_id).await
    }

    pub async fn update_capacity_settings(
        &self,
        salon_id: Uuid,
        update: CapacitySettingsUpdate,
    ) -> SalonResult<SalonCapacityConfig> {
        self.edit_config(salon_id, |config| config.apply(update)).await
    }

    pub async fn block_range(&self, salon_id: Uuid, range: BlockedRange) -> SalonResult<SalonCapacityConfig> {
        self.edit_config(salon_id, |config| config.block(range)).await
    }

    /// Returns false if no block had exactly this span.
    pub async fn unblock_range(
        &self,
        salon_id: Uuid,
        date: NaiveDate,
        start_time: NaiveTime,
        end_time: NaiveTime,
    ) -> SalonResult<bool> {
        let mut removed = false;
        self.edit_config(salon_id, |config| {
            removed = config.unblock(date, start_time, end_time);
            Ok(())
        })
        .await?;
        Ok(removed)
    }

    /// Switches the +1 emergency ceiling on or off for one date. Has no effect
    /// on the ceiling while emergency capacity is disabled for the salon.
    pub async fn set_emergency_override(
        &self,
        salon_id: Uuid,
        date: NaiveDate,
        active: bool,
    ) -> SalonResult<SalonCapacityConfig> {
        let config = self
            .edit_config(salon_id, |config| {
                config.set_emergency(date, active);
                Ok(())
            })
            .await?;
        info!(%salon_id, %date, active, "Emergency capacity override changed");
        Ok(config)
    }

    async fn config(&self, salon_id: Uuid) -> SalonResult<SalonCapacityConfig> {
        self.store
            .salon_config(salon_id)
            .await?
            .ok_or_else(|| SalonError::NotFound(format!("Capacity settings for salon {}", salon_id)))
    }

    async fn edit_config<F>(&self, salon_id: Uuid, edit: F) -> SalonResult<SalonCapacityConfig>
    where
        F: FnOnce(&mut SalonCapacityConfig) -> SalonResult<()>,
    {
        let _guard = self.salon_locks.acquire(salon_id).await?;
        let mut config = self.config(salon_id).await?;
        edit(&mut config)?;
        config.updated_at = self.clock.now();
        self.store.save_salon_config(&config).await?;
        debug!(%salon_id, "Capacity settings saved");
        Ok(config)
    }

    // ---- braider registry ----

    pub async fn register_braider(&self, salon_id: Uuid, new: NewBraider) -> SalonResult<Braider> {
        self.config(salon_id).await?;
        let mut braider = new.into_braider(salon_id)?;
        braider.created_at = self.clock.now();
        self.save_braider(&braider, None).await?;
        info!(%salon_id, braider_id = %braider.id, name = %braider.name, "Registered braider");
        Ok(braider)
    }

    pub async fn update_braider(&self, braider_id: Uuid, update: BraiderUpdate) -> SalonResult<Braider> {
        self.edit_braider(braider_id, |braider| update.apply_to(braider))
            .await
    }

    /// Braiders are never deleted, so their booking history stays intact.
    pub async fn deactivate_braider(&self, braider_id: Uuid) -> SalonResult<Braider> {
        let braider = self
            .update_braider(
                braider_id,
                BraiderUpdate {
                    is_active: Some(false),
                    ..BraiderUpdate::default()
                },
            )
            .await?;
        info!(%braider_id, "Deactivated braider");
        Ok(braider)
    }

    pub async fn add_time_off(&self, braider_id: Uuid, time_off: TimeOff) -> SalonResult<Braider> {
        if let (Some(start), Some(end)) = (time_off.start_time, time_off.end_time) {
            if end <= start {
                return Err(SalonError::Validation(
                    "Time off must end after it starts".to_string(),
                ));
            }
        }
        self.edit_braider(braider_id, |braider| {
            braider.time_off.push(time_off);
            Ok(())
        })
        .await
    }

    /// Braider edits share the salon's lock with capacity edits and save
    /// conditionally on the revision they read.
    async fn edit_braider<F>(&self, braider_id: Uuid, edit: F) -> SalonResult<Braider>
    where
        F: FnOnce(&mut Braider) -> SalonResult<()>,
    {
        let salon_id = self.braider(braider_id).await?.salon_id;
        let _guard = self.salon_locks.acquire(salon_id).await?;
        let mut braider = self.braider(braider_id).await?;
        edit(&mut braider)?;

        let expected = braider.revision;
        braider.revision += 1;
        self.save_braider(&braider, Some(expected)).await?;
        debug!(%braider_id, revision = braider.revision, "Braider saved");
        Ok(braider)
    }

    async fn save_braider(&self, braider: &Braider, expected_revision: Option<u64>) -> SalonResult<()> {
        match self.store.save_braider(braider, expected_revision).await? {
            CommitOutcome::Committed => Ok(()),
            CommitOutcome::Stale => {
                warn!(braider_id = %braider.id, "Braider changed during edit, aborting");
                Err(Rejection::ConcurrentModification.into())
            }
        }
    }

    pub async fn braiders(&self, salon_id: Uuid) -> SalonResult<Vec<Braider>> {
        Ok(self.store.braiders(salon_id).await?)
    }

    /// Braiders free for the window, qualified ones first, lightest day first.
    pub async fn available_braiders(
        &self,
        salon_id: Uuid,
        date: NaiveDate,
        time: NaiveTime,
        style: ServiceStyle,
        duration_minutes: Option<u32>,
    ) -> SalonResult<Vec<BraiderAvailability>> {
        let config = self.config(salon_id).await?;
        let duration = duration_minutes.unwrap_or_else(|| config.duration_for(style));
        let window = TimeWindow::starting_at(date, time, duration);
        let day = self.store.day(DayKey::new(salon_id, date)).await?;
        let braiders = self.store.braiders(salon_id).await?;

        Ok(AssignmentResolver::new(&braiders, &day.bookings, config.buffer_minutes).rank(&window, style))
    }

    pub async fn braider_schedule(
        &self,
        braider_id: Uuid,
        from: NaiveDate,
        to: NaiveDate,
    ) -> SalonResult<BraiderSchedule> {
        AvailabilityQuery::new(from, to).validate()?;
        let braider = self.braider(braider_id).await?;
        let bookings: Vec<Booking> = self
            .store
            .bookings_between(braider.salon_id, from, to)
            .await?
            .into_iter()
            .filter(|booking| booking.is_active() && booking.assigned_braider_id == Some(braider_id))
            .collect();
        let time_off = braider
            .time_off
            .iter()
            .filter(|off| from <= off.date && off.date <= to)
            .cloned()
            .collect();

        Ok(BraiderSchedule {
            total_bookings: bookings.len() as u32,
            total_minutes: bookings.iter().map(|b| b.duration_minutes).sum(),
            braider,
            bookings,
            time_off,
        })
    }

    async fn braider(&self, braider_id: Uuid) -> SalonResult<Braider> {
        self.store
            .braider(braider_id)
            .await?
            .ok_or_else(|| SalonError::NotFound(format!("Braider with ID {} not found", braider_id)))
    }

    // ---- queries ----

    /// Slot availability for a date range. Reads are not linearized with
    /// concurrent writes; use [`BookingEngine::create_booking`] for decisions.
    pub async fn get_availability(
        &self,
        salon_id: Uuid,
        query: AvailabilityQuery,
    ) -> SalonResult<AvailabilityCalendar> {
        query.validate()?;
        let config = self.config(salon_id).await?;
        let bookings = self.store.bookings_between(salon_id, query.from, query.to).await?;
        let now = config.local_now(self.clock.now());
        debug!(%salon_id, from = %query.from, to = %query.to, bookings = bookings.len(), "Computing availability");

        Ok(AvailabilityCalendar::new(config, bookings, query, now))
    }

    /// Would a booking of this length fit right now? Advisory only.
    pub async fn can_accept(
        &self,
        salon_id: Uuid,
        date: NaiveDate,
        time: NaiveTime,
        duration_minutes: u32,
    ) -> SalonResult<Admission> {
        validate_duration(duration_minutes)?;
        let config = self.config(salon_id).await?;
        let day = self.store.day(DayKey::new(salon_id, date)).await?;
        let now = config.local_now(self.clock.now());

        Ok(ConflictChecker::new(&config, &day.bookings, now).check(&Candidate::new(date, time, duration_minutes)))
    }

    pub async fn get_booking(&self, booking_id: Uuid) -> SalonResult<Booking> {
        self.store
            .booking(booking_id)
            .await?
            .ok_or_else(|| SalonError::NotFound(format!("Booking with ID {} not found", booking_id)))
    }

    pub async fn salon_bookings(
        &self,
        salon_id: Uuid,
        from: NaiveDate,
        to: NaiveDate,
        status: Option<BookingStatus>,
    ) -> SalonResult<Vec<Booking>> {
        AvailabilityQuery::new(from, to).validate()?;
        let bookings = self.store.bookings_between(salon_id, from, to).await?;
        Ok(bookings
            .into_iter()
            .filter(|booking| status.is_none_or(|wanted| booking.status == wanted))
            .collect())
    }

    // ---- commands ----

    /// Checks capacity, assigns a braider and records the booking as one
    /// atomic step.
    pub async fn create_booking(&self, request: CreateBooking) -> SalonResult<BookingReceipt> {
        if request.client_ref.trim().is_empty() {
            return Err(SalonError::Validation("Client reference cannot be empty".to_string()));
        }
        let config = self.config(request.salon_id).await?;
        let style = request.service_details.style;
        let duration = request
            .service_details
            .duration_override_minutes
            .unwrap_or_else(|| config.duration_for(style));
        validate_duration(duration)?;

        let key = DayKey::new(request.salon_id, request.appointment_date);
        let _guard = self.day_locks.acquire(key).await?;
        let day = self.store.day(key).await?;
        let now = config.local_now(self.clock.now());

        let candidate = Candidate::new(request.appointment_date, request.appointment_time, duration);
        let (overlapping, remaining) = ConflictChecker::new(&config, &day.bookings, now)
            .check(&candidate)
            .into_result()
            .inspect_err(|reason| {
                warn!(salon_id = %request.salon_id, date = %candidate.date, time = %candidate.time, %reason, "Booking rejected");
            })?;

        let braiders = self.store.braiders(request.salon_id).await?;
        let resolver = AssignmentResolver::new(&braiders, &day.bookings, config.buffer_minutes);
        let assigned_braider_id = match resolver.assign(&candidate.window(), style, request.preferred_braider_id, None) {
            Assignment::Assigned(braider_id) => Some(braider_id),
            Assignment::NoneQualified => match self.settings.unassigned_policy {
                UnassignedPolicy::AcceptUnassigned => {
                    debug!(salon_id = %request.salon_id, %style, "No braider qualified, booking left unassigned");
                    None
                }
                UnassignedPolicy::Reject => {
                    warn!(salon_id = %request.salon_id, %style, "No braider qualified, booking rejected");
                    return Err(Rejection::NoneQualified { style }.into());
                }
            },
        };

        let now_utc = self.clock.now();
        let booking = Booking {
            id: Uuid::new_v4(),
            salon_id: request.salon_id,
            client_ref: request.client_ref,
            appointment_date: request.appointment_date,
            appointment_time: request.appointment_time,
            duration_minutes: duration,
            assigned_braider_id,
            preferred_braider_id: request.preferred_braider_id,
            status: if self.settings.auto_confirm {
                BookingStatus::Confirmed
            } else {
                BookingStatus::Pending
            },
            service_details: request.service_details,
            notes: request.notes.into_iter().collect(),
            created_at: now_utc,
            updated_at: now_utc,
        };

        self.commit(WriteBatch::new().expect(key, day.revision).put(booking.clone()))
            .await?;
        info!(
            booking_id = %booking.id,
            salon_id = %booking.salon_id,
            date = %booking.appointment_date,
            time = %booking.appointment_time,
            braider = ?booking.assigned_braider_id,
            "Booking created"
        );

        Ok(BookingReceipt {
            booking,
            overlapping_bookings: overlapping,
            remaining_capacity: remaining,
        })
    }

    /// `pending → confirmed`. The slot was reserved at creation, so capacity is
    /// not re-checked.
    pub async fn confirm_booking(&self, booking_id: Uuid) -> SalonResult<TransitionOutcome> {
        self.apply_transition(booking_id, LifecycleAction::Confirm, None).await
    }

    /// Frees the booking's capacity immediately.
    pub async fn cancel_booking(&self, booking_id: Uuid, reason: Option<String>) -> SalonResult<TransitionOutcome> {
        let note = Some(match reason {
            Some(reason) => format!("Cancelled: {}", reason),
            None => "Cancelled".to_string(),
        });
        self.apply_transition(booking_id, LifecycleAction::Cancel, note).await
    }

    pub async fn complete_booking(&self, booking_id: Uuid) -> SalonResult<TransitionOutcome> {
        self.apply_transition(booking_id, LifecycleAction::Complete, None).await
    }

    pub async fn mark_no_show(&self, booking_id: Uuid) -> SalonResult<TransitionOutcome> {
        self.apply_transition(booking_id, LifecycleAction::NoShow, None).await
    }

    async fn apply_transition(
        &self,
        booking_id: Uuid,
        action: LifecycleAction,
        note: Option<String>,
    ) -> SalonResult<TransitionOutcome> {
        let key = self.get_booking(booking_id).await?.day_key();
        let _guard = self.day_locks.acquire(key).await?;
        let day = self.store.day(key).await?;
        // A reschedule may have moved the booking while we waited for the lock.
        let mut booking = day
            .find(booking_id)
            .cloned()
            .ok_or(Rejection::ConcurrentModification)?;

        let status = match lifecycle::transition(booking.status, action) {
            Ok(Transition::To(status)) => status,
            Ok(Transition::NoOp) => {
                debug!(%booking_id, %action, status = %booking.status, "Lifecycle action is a no-op");
                return Ok(TransitionOutcome {
                    booking,
                    changed: false,
                });
            }
            Err(rejection) => {
                warn!(%booking_id, %action, status = %booking.status, "Invalid lifecycle transition");
                return Err(rejection.into());
            }
        };

        let from = booking.status;
        booking.status = status;
        booking.notes.extend(note);
        booking.updated_at = self.clock.now();
        self.commit(WriteBatch::new().expect(key, day.revision).put(booking.clone()))
            .await?;
        info!(%booking_id, %from, to = %status, "Booking status changed");

        Ok(TransitionOutcome {
            booking,
            changed: true,
        })
    }

    /// Moves a booking to a new date and time as one atomic step. If the new
    /// slot is refused the booking is left exactly as it was.
    pub async fn reschedule_booking(
        &self,
        booking_id: Uuid,
        new_date: NaiveDate,
        new_time: NaiveTime,
    ) -> SalonResult<TransitionOutcome> {
        let current = self.get_booking(booking_id).await?;
        let old_key = current.day_key();
        let new_key = DayKey::new(current.salon_id, new_date);
        let _guard = self.day_locks.acquire_all(&[old_key, new_key]).await?;

        let old_day = self.store.day(old_key).await?;
        let mut booking = old_day
            .find(booking_id)
            .cloned()
            .ok_or(Rejection::ConcurrentModification)?;
        lifecycle::transition(booking.status, LifecycleAction::Reschedule)?;

        let new_day = if new_key == old_key {
            old_day.clone()
        } else {
            self.store.day(new_key).await?
        };
        let config = self.config(booking.salon_id).await?;
        let now = config.local_now(self.clock.now());

        let candidate = Candidate::new(new_date, new_time, booking.duration_minutes).excluding(booking_id);
        ConflictChecker::new(&config, &new_day.bookings, now)
            .check(&candidate)
            .into_result()
            .inspect_err(|reason| warn!(%booking_id, %new_date, %new_time, %reason, "Reschedule rejected"))?;

        let window = candidate.window();
        let braiders = self.store.braiders(booking.salon_id).await?;
        let resolver = AssignmentResolver::new(&braiders, &new_day.bookings, config.buffer_minutes);
        let keeps_braider = booking.assigned_braider_id.is_some_and(|braider_id| {
            braiders
                .iter()
                .find(|braider| braider.id == braider_id)
                .is_some_and(|braider| resolver.is_free(braider, &window, Some(booking_id)))
        });
        if !keeps_braider {
            let preferred = booking.preferred_braider_id.or(booking.assigned_braider_id);
            booking.assigned_braider_id = match resolver.assign(
                &window,
                booking.service_details.style,
                preferred,
                Some(booking_id),
            ) {
                Assignment::Assigned(braider_id) => Some(braider_id),
                Assignment::NoneQualified => match self.settings.unassigned_policy {
                    UnassignedPolicy::AcceptUnassigned => None,
                    UnassignedPolicy::Reject => {
                        return Err(Rejection::NoneQualified {
                            style: booking.service_details.style,
                        }
                        .into());
                    }
                },
            };
        }

        booking.notes.push(format!(
            "Rescheduled from {} {}",
            booking.appointment_date,
            booking.appointment_time.format("%H:%M")
        ));
        booking.appointment_date = new_date;
        booking.appointment_time = new_time;
        booking.updated_at = self.clock.now();

        let batch = WriteBatch::new()
            .expect(old_key, old_day.revision)
            .expect(new_key, new_day.revision)
            .put(booking.clone());
        self.commit(batch).await?;
        info!(%booking_id, %new_date, %new_time, "Booking rescheduled");

        Ok(TransitionOutcome {
            booking,
            changed: true,
        })
    }

    /// Manual override of the resolver. Skips the specialty and working-hours
    /// filters but never double-books the braider.
    pub async fn assign_braider(&self, booking_id: Uuid, braider_id: Uuid) -> SalonResult<Booking> {
        let key = self.get_booking(booking_id).await?.day_key();
        let _guard = self.day_locks.acquire(key).await?;
        let day = self.store.day(key).await?;
        let mut booking = day
            .find(booking_id)
            .cloned()
            .ok_or(Rejection::ConcurrentModification)?;
        if !booking.is_active() {
            return Err(SalonError::Validation(format!(
                "Cannot assign a braider to a {} booking",
                booking.status
            )));
        }

        let braider = self.braider(braider_id).await?;
        if braider.salon_id != booking.salon_id {
            return Err(SalonError::Validation(format!(
                "Braider {} does not work at salon {}",
                braider_id, booking.salon_id
            )));
        }
        let config = self.config(booking.salon_id).await?;
        let resolver = AssignmentResolver::new(std::slice::from_ref(&braider), &day.bookings, config.buffer_minutes);
        if !braider.is_active || resolver.is_double_booked(braider_id, &booking.window(), Some(booking_id)) {
            warn!(%booking_id, %braider_id, "Manual assignment refused");
            return Err(Rejection::BraiderUnavailable { braider_id }.into());
        }

        booking.assigned_braider_id = Some(braider_id);
        booking.notes.push(format!("Assigned to {}", braider.name));
        booking.updated_at = self.clock.now();
        self.commit(WriteBatch::new().expect(key, day.revision).put(booking.clone()))
            .await?;
        info!(%booking_id, %braider_id, "Braider assigned manually");
        Ok(booking)
    }

    async fn commit(&self, batch: WriteBatch) -> SalonResult<()> {
        match self.store.commit(batch).await? {
            CommitOutcome::Committed => Ok(()),
            CommitOutcome::Stale => {
                warn!("Day revision moved during commit, aborting");
                Err(Rejection::ConcurrentModification.into())
            }
        }
    }
}

fn validate_duration(minutes: u32) -> SalonResult<()> {
    if minutes == 0 || minutes > MINUTES_PER_DAY {
        return Err(SalonError::Validation(
            "Service duration must be between 1 and 1440 minutes".to_string(),
        ));
    }
    Ok(())
}
