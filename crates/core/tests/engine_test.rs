use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, NaiveDate};
use pretty_assertions::assert_eq;
use salonsync_core::clock::FixedClock;
use salonsync_core::engine::KeyedLocks;
use salonsync_core::errors::{Rejection, SalonError};
use salonsync_core::models::booking::{Booking, BookingStatus};
use salonsync_core::models::braider::{Braider, BraiderUpdate, NewBraider, TimeOff};
use salonsync_core::models::capacity::{BlockedRange, CapacitySettingsUpdate, SalonCapacityConfig};
use salonsync_core::models::service_style::ServiceStyle;
use salonsync_core::models::time_slot::SlotStatus;
use salonsync_core::scheduling::availability::AvailabilityQuery;
use salonsync_core::scheduling::conflict::Admission;
use salonsync_core::scheduling::lifecycle::LifecycleAction;
use salonsync_core::store::{BookingStore, CommitOutcome, DayKey, DaySnapshot, MemoryStore, WriteBatch};
use salonsync_core::{BookingEngine, EngineSettings, UnassignedPolicy};
use uuid::Uuid;

mod common;
use common::{at, date, harness, long_ago, request, request_for, time, tuesday, utc};

async fn with_capacity(engine: &BookingEngine, salon_id: Uuid, max: u32, buffer: u32) {
    engine
        .update_capacity_settings(
            salon_id,
            CapacitySettingsUpdate {
                max_concurrent_bookings: Some(max),
                buffer_minutes: Some(buffer),
                ..CapacitySettingsUpdate::default()
            },
        )
        .await
        .unwrap();
}

async fn register(engine: &BookingEngine, salon_id: Uuid, name: &str, specialties: &[ServiceStyle]) -> Uuid {
    engine
        .register_braider(
            salon_id,
            NewBraider {
                name: name.to_string(),
                specialties: specialties.iter().copied().collect(),
                ..NewBraider::default()
            },
        )
        .await
        .unwrap()
        .id
}

fn rejection(error: SalonError) -> Rejection {
    match error {
        SalonError::Rejected(rejection) => rejection,
        other => panic!("expected a rejection, got {:?}", other),
    }
}

#[test_log::test(tokio::test)]
async fn test_create_and_read_back() {
    let h = harness(EngineSettings::default()).await;
    let braider_id = register(&h.engine, h.salon_id, "Amara", &[]).await;

    let receipt = h
        .engine
        .create_booking(request(h.salon_id, ServiceStyle::BoxBraids, tuesday(), time(10, 0)))
        .await
        .unwrap();

    assert_eq!(receipt.booking.status, BookingStatus::Pending);
    assert_eq!(receipt.booking.duration_minutes, 240);
    assert_eq!(receipt.booking.assigned_braider_id, Some(braider_id));
    assert_eq!(receipt.overlapping_bookings, 0);
    assert_eq!(receipt.remaining_capacity, 2);

    let stored = h.engine.get_booking(receipt.booking.id).await.unwrap();
    assert_eq!(stored, receipt.booking);
}

#[tokio::test]
async fn test_auto_confirm_creates_confirmed_bookings() {
    let settings = EngineSettings {
        auto_confirm: true,
        ..EngineSettings::default()
    };
    let h = harness(settings).await;

    let receipt = h
        .engine
        .create_booking(request(h.salon_id, ServiceStyle::Cornrows, tuesday(), time(9, 0)))
        .await
        .unwrap();

    assert_eq!(receipt.booking.status, BookingStatus::Confirmed);
}

#[tokio::test]
async fn test_unassigned_policy() {
    let h = harness(EngineSettings::default()).await;
    register(&h.engine, h.salon_id, "Amara", &[ServiceStyle::Cornrows]).await;

    let receipt = h
        .engine
        .create_booking(request(h.salon_id, ServiceStyle::MicroBraids, tuesday(), time(10, 0)))
        .await
        .unwrap();
    assert_eq!(receipt.booking.assigned_braider_id, None);

    let strict = harness(EngineSettings {
        unassigned_policy: UnassignedPolicy::Reject,
        ..EngineSettings::default()
    })
    .await;
    register(&strict.engine, strict.salon_id, "Amara", &[ServiceStyle::Cornrows]).await;

    let error = strict
        .engine
        .create_booking(request(strict.salon_id, ServiceStyle::MicroBraids, tuesday(), time(10, 0)))
        .await
        .unwrap_err();
    assert_eq!(
        rejection(error),
        Rejection::NoneQualified {
            style: ServiceStyle::MicroBraids
        }
    );
}

#[tokio::test]
async fn test_missing_salon_is_not_found() {
    let h = harness(EngineSettings::default()).await;

    let error = h
        .engine
        .create_booking(request(Uuid::new_v4(), ServiceStyle::Cornrows, tuesday(), time(10, 0)))
        .await
        .unwrap_err();

    assert!(matches!(error, SalonError::NotFound(_)));
}

#[tokio::test]
async fn test_empty_client_reference_is_invalid() {
    let h = harness(EngineSettings::default()).await;
    let mut request = request(h.salon_id, ServiceStyle::Cornrows, tuesday(), time(10, 0));
    request.client_ref = "  ".to_string();

    let error = h.engine.create_booking(request).await.unwrap_err();

    assert!(matches!(error, SalonError::Validation(_)));
}

#[tokio::test]
async fn test_onboarding_is_idempotent() {
    let h = harness(EngineSettings::default()).await;
    with_capacity(&h.engine, h.salon_id, 5, 10).await;

    let config = h.engine.onboard_salon(h.salon_id).await.unwrap();

    assert_eq!(config.max_concurrent_bookings, 5);
}

#[tokio::test]
async fn test_capacity_exceeded_through_engine() {
    let h = harness(EngineSettings::default()).await;
    with_capacity(&h.engine, h.salon_id, 2, 30).await;

    h.engine
        .create_booking(request_for(h.salon_id, tuesday(), time(9, 0), 240))
        .await
        .unwrap();
    h.engine
        .create_booking(request_for(h.salon_id, tuesday(), time(9, 30), 240))
        .await
        .unwrap();
    let error = h
        .engine
        .create_booking(request_for(h.salon_id, tuesday(), time(9, 45), 240))
        .await
        .unwrap_err();

    assert_eq!(
        rejection(error),
        Rejection::CapacityExceeded {
            current: 2,
            ceiling: 2
        }
    );
}

#[test_log::test(tokio::test(flavor = "multi_thread", worker_threads = 4))]
async fn test_concurrent_requests_for_last_slot() {
    let h = harness(EngineSettings::default()).await;
    with_capacity(&h.engine, h.salon_id, 1, 30).await;

    let mut tasks = Vec::new();
    for _ in 0..2 {
        let engine = h.engine.clone();
        let request = request_for(h.salon_id, tuesday(), time(10, 0), 120);
        tasks.push(tokio::spawn(async move { engine.create_booking(request).await }));
    }

    let mut accepted = 0;
    let mut rejected = Vec::new();
    for task in tasks {
        match task.await.unwrap() {
            Ok(_) => accepted += 1,
            Err(error) => rejected.push(rejection(error)),
        }
    }

    assert_eq!(accepted, 1);
    assert_eq!(
        rejected,
        vec![Rejection::CapacityExceeded {
            current: 1,
            ceiling: 1
        }]
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_engines_sharing_a_store_never_overbook() {
    let h = harness(EngineSettings::default()).await;
    with_capacity(&h.engine, h.salon_id, 2, 0).await;
    let second = Arc::new(BookingEngine::with_clock(
        h.store.clone(),
        h.clock.clone(),
        EngineSettings::default(),
    ));

    let mut tasks = Vec::new();
    for i in 0..12 {
        let engine = if i % 2 == 0 { h.engine.clone() } else { second.clone() };
        let request = request_for(h.salon_id, tuesday(), time(11, 0), 60);
        tasks.push(tokio::spawn(async move { engine.create_booking(request).await }));
    }

    let mut accepted = 0;
    for task in tasks {
        match task.await.unwrap() {
            Ok(_) => accepted += 1,
            Err(error) => assert!(matches!(
                rejection(error),
                Rejection::CapacityExceeded { .. } | Rejection::ConcurrentModification
            )),
        }
    }

    let day = h.store.day(DayKey::new(h.salon_id, tuesday())).await.unwrap();
    let active = day.bookings.iter().filter(|booking| booking.is_active()).count();
    assert!(accepted <= 2);
    assert_eq!(active, accepted);
}

#[tokio::test]
async fn test_cancellation_frees_capacity() {
    let h = harness(EngineSettings::default()).await;
    with_capacity(&h.engine, h.salon_id, 1, 30).await;

    let first = h
        .engine
        .create_booking(request_for(h.salon_id, tuesday(), time(10, 0), 60))
        .await
        .unwrap();
    assert!(
        h.engine
            .create_booking(request_for(h.salon_id, tuesday(), time(10, 0), 60))
            .await
            .is_err()
    );

    h.engine
        .cancel_booking(first.booking.id, Some("Client called".to_string()))
        .await
        .unwrap();

    assert!(
        h.engine
            .create_booking(request_for(h.salon_id, tuesday(), time(10, 0), 60))
            .await
            .is_ok()
    );
}

#[tokio::test]
async fn test_lifecycle_commands_are_idempotent() {
    let h = harness(EngineSettings::default()).await;
    let id = h
        .engine
        .create_booking(request_for(h.salon_id, tuesday(), time(10, 0), 60))
        .await
        .unwrap()
        .booking
        .id;

    let confirmed = h.engine.confirm_booking(id).await.unwrap();
    assert!(confirmed.changed);
    assert_eq!(confirmed.booking.status, BookingStatus::Confirmed);
    assert!(!h.engine.confirm_booking(id).await.unwrap().changed);

    let cancelled = h.engine.cancel_booking(id, Some("Sick".to_string())).await.unwrap();
    assert!(cancelled.changed);
    let again = h.engine.cancel_booking(id, Some("Sick".to_string())).await.unwrap();
    assert!(!again.changed);
    assert_eq!(again.booking.notes, vec!["Cancelled: Sick".to_string()]);
}

#[tokio::test]
async fn test_invalid_transition_is_rejected() {
    let h = harness(EngineSettings::default()).await;
    let id = h
        .engine
        .create_booking(request_for(h.salon_id, tuesday(), time(10, 0), 60))
        .await
        .unwrap()
        .booking
        .id;

    let error = h.engine.complete_booking(id).await.unwrap_err();
    assert_eq!(
        rejection(error),
        Rejection::TransitionInvalid {
            from: BookingStatus::Pending,
            action: LifecycleAction::Complete
        }
    );

    h.engine.confirm_booking(id).await.unwrap();
    h.engine.mark_no_show(id).await.unwrap();
    assert!(h.engine.confirm_booking(id).await.is_err());
    assert!(!h.engine.complete_booking(id).await.unwrap().changed);
    assert_eq!(h.engine.get_booking(id).await.unwrap().status, BookingStatus::NoShow);
}

#[tokio::test]
async fn test_unknown_booking_is_not_found() {
    let h = harness(EngineSettings::default()).await;

    let error = h.engine.confirm_booking(Uuid::new_v4()).await.unwrap_err();

    assert!(matches!(error, SalonError::NotFound(_)));
}

#[test_log::test(tokio::test)]
async fn test_reschedule_moves_booking_between_days() {
    let h = harness(EngineSettings::default()).await;
    with_capacity(&h.engine, h.salon_id, 1, 30).await;
    let wednesday = date(2030, 6, 5);
    let id = h
        .engine
        .create_booking(request_for(h.salon_id, tuesday(), time(10, 0), 60))
        .await
        .unwrap()
        .booking
        .id;

    let outcome = h.engine.reschedule_booking(id, wednesday, time(14, 0)).await.unwrap();

    assert!(outcome.changed);
    assert_eq!(outcome.booking.appointment_date, wednesday);
    assert_eq!(outcome.booking.appointment_time, time(14, 0));
    assert_eq!(outcome.booking.notes, vec!["Rescheduled from 2030-06-04 10:00".to_string()]);

    // The old slot is free again
    let admission = h.engine.can_accept(h.salon_id, tuesday(), time(10, 0), 60).await.unwrap();
    assert!(admission.is_accept());

    let old_day = h.store.day(DayKey::new(h.salon_id, tuesday())).await.unwrap();
    assert!(old_day.bookings.is_empty());
    let new_day = h.store.day(DayKey::new(h.salon_id, wednesday)).await.unwrap();
    assert_eq!(new_day.bookings.len(), 1);
}

#[tokio::test]
async fn test_failed_reschedule_leaves_booking_unchanged() {
    let h = harness(EngineSettings::default()).await;
    with_capacity(&h.engine, h.salon_id, 1, 30).await;
    let moving = h
        .engine
        .create_booking(request_for(h.salon_id, tuesday(), time(9, 0), 60))
        .await
        .unwrap()
        .booking;
    h.engine
        .create_booking(request_for(h.salon_id, tuesday(), time(14, 0), 60))
        .await
        .unwrap();

    let error = h
        .engine
        .reschedule_booking(moving.id, tuesday(), time(14, 0))
        .await
        .unwrap_err();

    assert!(matches!(rejection(error), Rejection::CapacityExceeded { .. }));
    assert_eq!(h.engine.get_booking(moving.id).await.unwrap(), moving);
}

#[tokio::test]
async fn test_reschedule_does_not_count_itself() {
    let h = harness(EngineSettings::default()).await;
    with_capacity(&h.engine, h.salon_id, 1, 30).await;
    let id = h
        .engine
        .create_booking(request_for(h.salon_id, tuesday(), time(10, 0), 60))
        .await
        .unwrap()
        .booking
        .id;

    let outcome = h.engine.reschedule_booking(id, tuesday(), time(10, 30)).await.unwrap();

    assert_eq!(outcome.booking.appointment_time, time(10, 30));
}

#[tokio::test]
async fn test_reschedule_of_cancelled_booking_is_invalid() {
    let h = harness(EngineSettings::default()).await;
    let id = h
        .engine
        .create_booking(request_for(h.salon_id, tuesday(), time(10, 0), 60))
        .await
        .unwrap()
        .booking
        .id;
    h.engine.cancel_booking(id, None).await.unwrap();

    let error = h
        .engine
        .reschedule_booking(id, date(2030, 6, 5), time(10, 0))
        .await
        .unwrap_err();

    assert!(matches!(rejection(error), Rejection::TransitionInvalid { .. }));
}

#[tokio::test]
async fn test_reschedule_reassigns_when_braider_is_busy() {
    let h = harness(EngineSettings::default()).await;
    let amara = register(&h.engine, h.salon_id, "Amara", &[]).await;
    let bisi = register(&h.engine, h.salon_id, "Bisi", &[]).await;

    let first = h
        .engine
        .create_booking(request_for(h.salon_id, tuesday(), time(9, 0), 60))
        .await
        .unwrap()
        .booking;
    assert_eq!(first.assigned_braider_id, Some(amara));
    let mut later = request_for(h.salon_id, tuesday(), time(14, 0), 60);
    later.preferred_braider_id = Some(amara);
    let second = h.engine.create_booking(later).await.unwrap().booking;
    assert_eq!(second.assigned_braider_id, Some(amara));

    // Moving the first booking onto Amara's afternoon forces a new braider
    let outcome = h.engine.reschedule_booking(first.id, tuesday(), time(14, 0)).await.unwrap();

    assert_eq!(outcome.booking.assigned_braider_id, Some(bisi));
}

#[tokio::test]
async fn test_past_slot_is_rejected() {
    let h = harness(EngineSettings::default()).await;
    h.clock.set(utc(at(tuesday(), 12, 0)));

    let error = h
        .engine
        .create_booking(request_for(h.salon_id, tuesday(), time(10, 0), 60))
        .await
        .unwrap_err();
    assert_eq!(rejection(error), Rejection::PastSlot);

    h.clock.advance(ChronoDuration::days(-1));
    assert!(
        h.engine
            .create_booking(request_for(h.salon_id, tuesday(), time(10, 0), 60))
            .await
            .is_ok()
    );
}

#[tokio::test]
async fn test_blocks_and_unblocks() {
    let h = harness(EngineSettings::default()).await;
    h.engine
        .block_range(
            h.salon_id,
            BlockedRange {
                date: tuesday(),
                start_time: time(12, 0),
                end_time: time(13, 0),
                reason: Some("Staff meeting".to_string()),
            },
        )
        .await
        .unwrap();

    let error = h
        .engine
        .create_booking(request_for(h.salon_id, tuesday(), time(12, 30), 30))
        .await
        .unwrap_err();
    assert_eq!(
        rejection(error),
        Rejection::SlotBlocked {
            reason: "Staff meeting".to_string()
        }
    );

    assert!(h.engine.unblock_range(h.salon_id, tuesday(), time(12, 0), time(13, 0)).await.unwrap());
    assert!(!h.engine.unblock_range(h.salon_id, tuesday(), time(12, 0), time(13, 0)).await.unwrap());
    assert!(
        h.engine
            .create_booking(request_for(h.salon_id, tuesday(), time(12, 30), 30))
            .await
            .is_ok()
    );
}

#[tokio::test]
async fn test_emergency_override_admits_one_more() {
    let h = harness(EngineSettings::default()).await;
    with_capacity(&h.engine, h.salon_id, 1, 0).await;
    h.engine
        .create_booking(request_for(h.salon_id, tuesday(), time(10, 0), 60))
        .await
        .unwrap();

    h.engine.set_emergency_override(h.salon_id, tuesday(), true).await.unwrap();
    let receipt = h
        .engine
        .create_booking(request_for(h.salon_id, tuesday(), time(10, 0), 60))
        .await
        .unwrap();
    assert_eq!(receipt.remaining_capacity, 0);

    assert!(
        h.engine
            .create_booking(request_for(h.salon_id, tuesday(), time(10, 0), 60))
            .await
            .is_err()
    );
}

#[tokio::test]
async fn test_availability_reflects_bookings() {
    let h = harness(EngineSettings::default()).await;
    with_capacity(&h.engine, h.salon_id, 1, 0).await;
    h.engine
        .create_booking(request_for(h.salon_id, tuesday(), time(10, 0), 60))
        .await
        .unwrap();

    let calendar = h
        .engine
        .get_availability(h.salon_id, AvailabilityQuery::day(tuesday()))
        .await
        .unwrap();

    let full = calendar.slot_at(at(tuesday(), 10, 0)).unwrap();
    assert_eq!(full.status, SlotStatus::Full);
    let open = calendar.slot_at(at(tuesday(), 11, 0)).unwrap();
    assert_eq!(open.status, SlotStatus::Available);
}

#[tokio::test]
async fn test_can_accept_is_advisory() {
    let h = harness(EngineSettings::default()).await;

    let admission = h.engine.can_accept(h.salon_id, tuesday(), time(10, 0), 60).await.unwrap();
    assert_eq!(
        admission,
        Admission::Accept {
            overlapping: 0,
            remaining: 2
        }
    );

    // Nothing was reserved
    let bookings = h
        .engine
        .salon_bookings(h.salon_id, tuesday(), tuesday(), None)
        .await
        .unwrap();
    assert!(bookings.is_empty());
}

#[tokio::test]
async fn test_manual_assignment() {
    let h = harness(EngineSettings::default()).await;
    let amara = register(&h.engine, h.salon_id, "Amara", &[]).await;
    let first = h
        .engine
        .create_booking(request_for(h.salon_id, tuesday(), time(10, 0), 60))
        .await
        .unwrap()
        .booking;
    assert_eq!(first.assigned_braider_id, Some(amara));
    let second = h
        .engine
        .create_booking(request_for(h.salon_id, tuesday(), time(10, 0), 60))
        .await
        .unwrap()
        .booking;
    assert_eq!(second.assigned_braider_id, None);

    let error = h.engine.assign_braider(second.id, amara).await.unwrap_err();
    assert_eq!(rejection(error), Rejection::BraiderUnavailable { braider_id: amara });

    let bisi = register(&h.engine, h.salon_id, "Bisi", &[ServiceStyle::Cornrows]).await;
    let assigned = h.engine.assign_braider(second.id, bisi).await.unwrap();
    assert_eq!(assigned.assigned_braider_id, Some(bisi));
}

#[tokio::test]
async fn test_manual_assignment_across_salons_is_invalid() {
    let h = harness(EngineSettings::default()).await;
    let other_salon = Uuid::new_v4();
    h.engine.onboard_salon(other_salon).await.unwrap();
    let outsider = register(&h.engine, other_salon, "Chi", &[]).await;
    let booking = h
        .engine
        .create_booking(request_for(h.salon_id, tuesday(), time(10, 0), 60))
        .await
        .unwrap()
        .booking;

    let error = h.engine.assign_braider(booking.id, outsider).await.unwrap_err();

    assert!(matches!(error, SalonError::Validation(_)));
}

#[tokio::test]
async fn test_deactivated_braider_gets_no_new_bookings() {
    let h = harness(EngineSettings::default()).await;
    let amara = register(&h.engine, h.salon_id, "Amara", &[]).await;
    h.engine.deactivate_braider(amara).await.unwrap();

    let receipt = h
        .engine
        .create_booking(request_for(h.salon_id, tuesday(), time(10, 0), 60))
        .await
        .unwrap();

    assert_eq!(receipt.booking.assigned_braider_id, None);
    assert_eq!(h.engine.braiders(h.salon_id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_available_braiders_and_schedule() {
    let h = harness(EngineSettings::default()).await;
    let amara = register(&h.engine, h.salon_id, "Amara", &[ServiceStyle::FauxLocs]).await;
    let bisi = register(&h.engine, h.salon_id, "Bisi", &[ServiceStyle::Cornrows]).await;
    h.engine
        .add_time_off(
            bisi,
            TimeOff {
                date: date(2030, 6, 5),
                start_time: None,
                end_time: None,
                reason: Some("Vacation".to_string()),
            },
        )
        .await
        .unwrap();

    let ranked = h
        .engine
        .available_braiders(h.salon_id, tuesday(), time(9, 0), ServiceStyle::FauxLocs, None)
        .await
        .unwrap();
    let order: Vec<Uuid> = ranked.iter().map(|entry| entry.braider_id).collect();
    assert_eq!(order, vec![amara, bisi]);

    h.engine
        .create_booking(request(h.salon_id, ServiceStyle::FauxLocs, tuesday(), time(9, 0)))
        .await
        .unwrap();
    let schedule = h
        .engine
        .braider_schedule(amara, tuesday(), date(2030, 6, 10))
        .await
        .unwrap();
    assert_eq!(schedule.total_bookings, 1);
    assert_eq!(schedule.total_minutes, 420);

    let bisi_schedule = h
        .engine
        .braider_schedule(bisi, tuesday(), date(2030, 6, 10))
        .await
        .unwrap();
    assert_eq!(bisi_schedule.total_bookings, 0);
    assert_eq!(bisi_schedule.time_off.len(), 1);
}

#[tokio::test]
async fn test_salon_bookings_filter_by_status() {
    let h = harness(EngineSettings::default()).await;
    let cancelled = h
        .engine
        .create_booking(request_for(h.salon_id, tuesday(), time(10, 0), 60))
        .await
        .unwrap()
        .booking
        .id;
    h.engine
        .create_booking(request_for(h.salon_id, tuesday(), time(12, 0), 60))
        .await
        .unwrap();
    h.engine.cancel_booking(cancelled, None).await.unwrap();

    let all = h.engine.salon_bookings(h.salon_id, tuesday(), tuesday(), None).await.unwrap();
    let pending = h
        .engine
        .salon_bookings(h.salon_id, tuesday(), tuesday(), Some(BookingStatus::Pending))
        .await
        .unwrap();

    assert_eq!(all.len(), 2);
    assert_eq!(pending.len(), 1);
}

#[tokio::test]
async fn test_keyed_lock_times_out() {
    let locks = KeyedLocks::new(Duration::from_millis(20));
    let key = DayKey::new(Uuid::new_v4(), tuesday());

    let _held = locks.acquire(key).await.unwrap();
    let error = locks.acquire(key).await.unwrap_err();

    assert!(matches!(error, SalonError::Timeout(_)));
    assert!(error.is_retryable());
}

#[tokio::test]
async fn test_keyed_lock_accepts_duplicate_keys() {
    let locks = KeyedLocks::new(Duration::from_millis(20));
    let key = DayKey::new(Uuid::new_v4(), tuesday());

    let guard = locks.acquire_all(&[key, key]).await.unwrap();
    drop(guard);

    assert!(locks.acquire(key).await.is_ok());
}

#[tokio::test]
async fn test_keyed_lock_map_is_empty_after_guards_drop() {
    let locks = KeyedLocks::new(Duration::from_millis(20));
    let salon_id = Uuid::new_v4();
    let monday = DayKey::new(salon_id, date(2030, 6, 3));
    let key = DayKey::new(salon_id, tuesday());

    let single = locks.acquire(key).await.unwrap();
    assert_eq!(locks.len(), 1);
    drop(single);
    assert!(locks.is_empty());

    let both = locks.acquire_all(&[key, monday]).await.unwrap();
    assert_eq!(locks.len(), 2);
    drop(both);
    assert!(locks.is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_keyed_lock_keeps_entry_while_contended() {
    let locks = Arc::new(KeyedLocks::new(Duration::from_secs(1)));
    let key = DayKey::new(Uuid::new_v4(), tuesday());

    let held = locks.acquire(key).await.unwrap();
    let waiter = tokio::spawn({
        let locks = locks.clone();
        async move {
            let guard = locks.acquire(key).await.unwrap();
            tokio::time::sleep(Duration::from_millis(10)).await;
            drop(guard);
        }
    });
    tokio::time::sleep(Duration::from_millis(20)).await;

    // The waiter's clone keeps the entry alive after the holder leaves
    drop(held);
    assert_eq!(locks.len(), 1);
    waiter.await.unwrap();

    assert!(locks.is_empty());
}

#[tokio::test]
async fn test_keyed_lock_evicts_after_timeout() {
    let locks = KeyedLocks::new(Duration::from_millis(20));
    let salon_id = Uuid::new_v4();
    let monday = DayKey::new(salon_id, date(2030, 6, 3));
    let key = DayKey::new(salon_id, tuesday());

    let held = locks.acquire(key).await.unwrap();
    // Monday sorts first and is released again when Tuesday times out
    let error = locks.acquire_all(&[key, monday]).await.unwrap_err();
    assert!(matches!(error, SalonError::Timeout(_)));
    assert_eq!(locks.len(), 1);

    drop(held);
    assert!(locks.is_empty());
}

async fn available_at(engine: &BookingEngine, salon_id: Uuid, hour: u32) -> u32 {
    engine
        .get_availability(salon_id, AvailabilityQuery::day(tuesday()))
        .await
        .unwrap()
        .slot_at(at(tuesday(), hour, 0))
        .unwrap()
        .available
}

#[tokio::test]
async fn test_available_count_round_trip() {
    let h = harness(EngineSettings::default()).await;
    with_capacity(&h.engine, h.salon_id, 3, 0).await;
    assert_eq!(available_at(&h.engine, h.salon_id, 10).await, 3);

    let receipt = h
        .engine
        .create_booking(request_for(h.salon_id, tuesday(), time(10, 0), 60))
        .await
        .unwrap();
    assert_eq!(available_at(&h.engine, h.salon_id, 10).await, 2);
    assert_eq!(available_at(&h.engine, h.salon_id, 11).await, 3);

    h.engine.cancel_booking(receipt.booking.id, None).await.unwrap();
    assert_eq!(available_at(&h.engine, h.salon_id, 10).await, 3);
}

#[tokio::test]
async fn test_timestamps_follow_engine_clock() {
    let h = harness(EngineSettings::default()).await;
    let start = utc(long_ago());
    let braider = h
        .engine
        .register_braider(
            h.salon_id,
            NewBraider {
                name: "Amara".to_string(),
                ..NewBraider::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(braider.created_at, start);

    let receipt = h
        .engine
        .create_booking(request_for(h.salon_id, tuesday(), time(10, 0), 60))
        .await
        .unwrap();
    assert_eq!(receipt.booking.created_at, start);
    assert_eq!(receipt.booking.updated_at, start);

    h.clock.advance(ChronoDuration::hours(1));
    let cancelled = h.engine.cancel_booking(receipt.booking.id, None).await.unwrap();
    assert_eq!(cancelled.booking.created_at, start);
    assert_eq!(cancelled.booking.updated_at, start + ChronoDuration::hours(1));

    let config = with_block(&h.engine, h.salon_id).await;
    assert_eq!(config.updated_at, start + ChronoDuration::hours(1));
}

async fn with_block(engine: &BookingEngine, salon_id: Uuid) -> SalonCapacityConfig {
    engine
        .block_range(
            salon_id,
            BlockedRange {
                date: tuesday(),
                start_time: time(14, 0),
                end_time: time(15, 0),
                reason: None,
            },
        )
        .await
        .unwrap()
}

/// Memory store whose braider reads take long enough for edits to overlap.
struct SlowBraiderStore {
    inner: MemoryStore,
}

#[async_trait]
impl BookingStore for SlowBraiderStore {
    async fn salon_config(&self, salon_id: Uuid) -> eyre::Result<Option<SalonCapacityConfig>> {
        self.inner.salon_config(salon_id).await
    }

    async fn save_salon_config(&self, config: &SalonCapacityConfig) -> eyre::Result<()> {
        self.inner.save_salon_config(config).await
    }

    async fn braiders(&self, salon_id: Uuid) -> eyre::Result<Vec<Braider>> {
        self.inner.braiders(salon_id).await
    }

    async fn braider(&self, braider_id: Uuid) -> eyre::Result<Option<Braider>> {
        tokio::time::sleep(Duration::from_millis(50)).await;
        self.inner.braider(braider_id).await
    }

    async fn save_braider(&self, braider: &Braider, expected_revision: Option<u64>) -> eyre::Result<CommitOutcome> {
        self.inner.save_braider(braider, expected_revision).await
    }

    async fn booking(&self, booking_id: Uuid) -> eyre::Result<Option<Booking>> {
        self.inner.booking(booking_id).await
    }

    async fn day(&self, key: DayKey) -> eyre::Result<DaySnapshot> {
        self.inner.day(key).await
    }

    async fn bookings_between(&self, salon_id: Uuid, from: NaiveDate, to: NaiveDate) -> eyre::Result<Vec<Booking>> {
        self.inner.bookings_between(salon_id, from, to).await
    }

    async fn commit(&self, batch: WriteBatch) -> eyre::Result<CommitOutcome> {
        self.inner.commit(batch).await
    }
}

async fn slow_store_with_braider() -> (Arc<SlowBraiderStore>, Arc<BookingEngine>, Uuid) {
    let store = Arc::new(SlowBraiderStore {
        inner: MemoryStore::new(),
    });
    let engine = slow_engine(&store);
    let salon_id = Uuid::new_v4();
    engine.onboard_salon(salon_id).await.unwrap();
    let braider_id = register(&engine, salon_id, "Amara", &[]).await;
    (store, engine, braider_id)
}

fn slow_engine(store: &Arc<SlowBraiderStore>) -> Arc<BookingEngine> {
    let clock = Arc::new(FixedClock::new(utc(long_ago())));
    Arc::new(BookingEngine::with_clock(store.clone(), clock, EngineSettings::default()))
}

fn day_off(day: u32) -> TimeOff {
    TimeOff {
        date: date(2030, 6, day),
        start_time: None,
        end_time: None,
        reason: None,
    }
}

#[test_log::test(tokio::test(flavor = "multi_thread", worker_threads = 4))]
async fn test_concurrent_braider_edits_keep_both_changes() {
    let (store, engine, braider_id) = slow_store_with_braider().await;

    let (first, second) = tokio::join!(
        engine.add_time_off(braider_id, day_off(4)),
        engine.add_time_off(braider_id, day_off(5)),
    );
    first.unwrap();
    second.unwrap();

    let braider = store.braider(braider_id).await.unwrap().unwrap();
    assert_eq!(braider.time_off.len(), 2);
    assert_eq!(braider.revision, 2);
}

#[test_log::test(tokio::test(flavor = "multi_thread", worker_threads = 4))]
async fn test_rename_cannot_undo_deactivation() {
    let (store, engine, braider_id) = slow_store_with_braider().await;

    let (deactivated, renamed) = tokio::join!(
        engine.deactivate_braider(braider_id),
        engine.update_braider(
            braider_id,
            BraiderUpdate {
                name: Some("Amara N.".to_string()),
                ..BraiderUpdate::default()
            },
        ),
    );
    deactivated.unwrap();
    renamed.unwrap();

    let braider = store.braider(braider_id).await.unwrap().unwrap();
    assert!(!braider.is_active);
    assert_eq!(braider.name, "Amara N.");
}

#[test_log::test(tokio::test(flavor = "multi_thread", worker_threads = 4))]
async fn test_braider_edits_across_engines_detect_conflicts() {
    let (store, engine, braider_id) = slow_store_with_braider().await;
    let other = slow_engine(&store);

    let (first, second) = tokio::join!(
        engine.add_time_off(braider_id, day_off(4)),
        other.add_time_off(braider_id, day_off(5)),
    );

    let results = [first, second];
    let committed = results.iter().filter(|result| result.is_ok()).count();
    assert_eq!(committed, 1);
    let loser = results.into_iter().find_map(Result::err).unwrap();
    assert_eq!(rejection(loser), Rejection::ConcurrentModification);

    let braider = store.braider(braider_id).await.unwrap().unwrap();
    assert_eq!(braider.time_off.len(), 1);
}

#[tokio::test]
async fn test_registering_an_existing_braider_id_is_stale() {
    let store = MemoryStore::new();
    let braider = Braider::new(Uuid::new_v4(), "Amara");

    assert_eq!(store.save_braider(&braider, None).await.unwrap(), CommitOutcome::Committed);
    assert_eq!(store.save_braider(&braider, None).await.unwrap(), CommitOutcome::Stale);
    assert_eq!(store.save_braider(&braider, Some(3)).await.unwrap(), CommitOutcome::Stale);
}
