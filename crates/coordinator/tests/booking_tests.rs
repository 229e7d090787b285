use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use futures::future::join_all;

use slotguard_coordinator::{CoordinatorBuilder, CoordinatorError, ReservationCoordinator};
use slotguard_core::{
    BookingOutcome, BookingRequest, RejectReason, RequesterId, Reservation, ReservationId,
    SlotGranularity, SlotKey,
};
use slotguard_reservations::{ReservationError, ReservationStore};
use slotguard_reservations_memory::MemoryReservationStore;
use slotguard_state::{LockStore, OwnerToken, StateError};
use slotguard_state_memory::MemoryLockStore;

/// Fault to inject into the wrapped reservation store.
#[derive(Clone, Copy)]
enum Fault {
    None,
    InsertError,
    InsertPanic,
    /// `find_confirmed` always answers "free", so only the store's own
    /// uniqueness check stands between two bookings.
    BlindFind,
    SlowFind(Duration),
    /// Both the lookup and the insert take this long.
    Slow(Duration),
}

struct FaultyStore {
    inner: MemoryReservationStore,
    fault: Fault,
}

#[async_trait]
impl ReservationStore for FaultyStore {
    async fn find_confirmed(&self, slot: &SlotKey) -> Result<Option<Reservation>, ReservationError> {
        match self.fault {
            Fault::BlindFind => Ok(None),
            Fault::SlowFind(delay) | Fault::Slow(delay) => {
                tokio::time::sleep(delay).await;
                self.inner.find_confirmed(slot).await
            }
            _ => self.inner.find_confirmed(slot).await,
        }
    }

    async fn insert(&self, reservation: &Reservation) -> Result<(), ReservationError> {
        match self.fault {
            Fault::InsertError => Err(ReservationError::Storage("connection reset".into())),
            Fault::InsertPanic => panic!("reservation store crashed mid-insert"),
            Fault::Slow(delay) => {
                tokio::time::sleep(delay).await;
                self.inner.insert(reservation).await
            }
            _ => self.inner.insert(reservation).await,
        }
    }

    async fn get(&self, id: &ReservationId) -> Result<Option<Reservation>, ReservationError> {
        self.inner.get(id).await
    }

    async fn list_by_requester(
        &self,
        requester: &RequesterId,
    ) -> Result<Vec<Reservation>, ReservationError> {
        self.inner.list_by_requester(requester).await
    }

    async fn cancel(
        &self,
        id: &ReservationId,
        requester: &RequesterId,
    ) -> Result<bool, ReservationError> {
        self.inner.cancel(id, requester).await
    }
}

/// Lock store whose acquire round trip takes `delay`.
struct SlowLockStore {
    inner: MemoryLockStore,
    delay: Duration,
}

#[async_trait]
impl LockStore for SlowLockStore {
    async fn set_if_absent(&self, key: &str, value: &str, ttl: Duration) -> Result<bool, StateError> {
        tokio::time::sleep(self.delay).await;
        self.inner.set_if_absent(key, value, ttl).await
    }

    async fn compare_and_delete(&self, key: &str, expected: &str) -> Result<bool, StateError> {
        self.inner.compare_and_delete(key, expected).await
    }

    async fn get(&self, key: &str) -> Result<Option<String>, StateError> {
        self.inner.get(key).await
    }
}

struct Harness {
    coordinator: ReservationCoordinator,
    reservations: MemoryReservationStore,
}

fn harness_with(fault: Fault, granularity: SlotGranularity) -> Harness {
    let reservations = MemoryReservationStore::new();
    let store = FaultyStore {
        inner: reservations.clone(),
        fault,
    };
    let coordinator = CoordinatorBuilder::new()
        .lock_store(Arc::new(MemoryLockStore::new()))
        .reservations(Arc::new(store))
        .granularity(granularity)
        .build()
        .expect("coordinator should build");
    Harness {
        coordinator,
        reservations,
    }
}

fn harness() -> Harness {
    harness_with(Fault::None, SlotGranularity::Second)
}

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 12, 30, 10, 0, 0).unwrap()
}

fn request(user: &str, analyst: &str, at: DateTime<Utc>) -> BookingRequest {
    BookingRequest::new(user, analyst, at)
}

#[tokio::test]
async fn books_a_free_slot() {
    let h = harness();
    let outcome = h
        .coordinator
        .book(request("test-user-123", "analyst-456", t0()).with_duration(45))
        .await
        .unwrap();

    let reservation = outcome.reservation().expect("should be confirmed").clone();
    assert_eq!(reservation.requester_id.as_str(), "test-user-123");
    assert_eq!(reservation.analyst_id.as_str(), "analyst-456");
    assert_eq!(reservation.slot_time, t0());
    assert_eq!(reservation.duration_minutes, 45);

    let stored = h.reservations.get(&reservation.id).await.unwrap();
    assert_eq!(stored, Some(reservation));

    let snap = h.coordinator.metrics().snapshot();
    assert_eq!(snap.attempts, 1);
    assert_eq!(snap.confirmed, 1);
    assert_eq!(snap.lock_acquired, 1);
    assert_eq!(snap.lock_released, 1);
}

#[tokio::test]
async fn second_booking_of_same_slot_is_already_booked() {
    let h = harness();
    assert!(
        h.coordinator
            .book(request("u1", "A1", t0()))
            .await
            .unwrap()
            .is_confirmed()
    );

    let second = h.coordinator.book(request("u2", "A1", t0())).await.unwrap();
    assert_eq!(
        second,
        BookingOutcome::Rejected(RejectReason::AlreadyBooked)
    );
    assert_eq!(h.reservations.len(), 1);
    assert_eq!(h.coordinator.metrics().snapshot().already_booked, 1);
}

#[tokio::test]
async fn different_slots_do_not_interfere() {
    let h = harness();
    let later = t0() + chrono::TimeDelta::minutes(30);

    for (user, analyst, at) in [("u1", "A1", t0()), ("u2", "A2", t0()), ("u3", "A1", later)] {
        assert!(
            h.coordinator
                .book(request(user, analyst, at))
                .await
                .unwrap()
                .is_confirmed(),
            "{analyst}@{at} should be bookable"
        );
    }
    assert_eq!(h.reservations.confirmed_count(), 3);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn fifty_concurrent_requests_confirm_exactly_one() {
    let h = harness();

    let attempts = (0..50).map(|i| {
        let coordinator = h.coordinator.clone();
        tokio::spawn(async move {
            coordinator
                .book(request(&format!("user-{i}"), "A1", t0()))
                .await
        })
    });
    let outcomes: Vec<BookingOutcome> = join_all(attempts)
        .await
        .into_iter()
        .map(|joined| joined.expect("task should not panic").expect("booking should not error"))
        .collect();

    let confirmed = outcomes.iter().filter(|o| o.is_confirmed()).count();
    assert_eq!(confirmed, 1, "exactly one request may win the slot");
    assert!(
        outcomes
            .iter()
            .filter(|o| !o.is_confirmed())
            .all(|o| matches!(o, BookingOutcome::Rejected(_)))
    );
    assert_eq!(h.reservations.len(), 1);
    assert_eq!(h.reservations.confirmed_count(), 1);

    let snap = h.coordinator.metrics().snapshot();
    assert_eq!(snap.attempts, 50);
    assert_eq!(snap.confirmed, 1);
    assert_eq!(snap.contended + snap.already_booked, 49);
    assert_eq!(snap.lock_acquired, snap.releases_observed());

    let locks = h.coordinator.lock_manager().metrics().snapshot();
    assert_eq!(locks.acquired, locks.release_attempts);
}

#[tokio::test(start_paused = true)]
async fn crashed_holder_blocks_only_until_ttl() {
    let h = harness();
    let t1 = Utc.with_ymd_and_hms(2025, 12, 30, 11, 0, 0).unwrap();
    let slot = SlotKey::new("A2", t1, SlotGranularity::Second);
    let manager = h.coordinator.lock_manager();

    // Another instance acquires and dies without releasing.
    let _abandoned = manager
        .acquire(&slot, OwnerToken::generate(), manager.config().ttl)
        .await
        .unwrap();

    let blocked = h.coordinator.book(request("u1", "A2", t1)).await.unwrap();
    assert_eq!(blocked, BookingOutcome::Rejected(RejectReason::Contended));

    tokio::time::advance(Duration::from_secs(9)).await;
    let still_blocked = h.coordinator.book(request("u1", "A2", t1)).await.unwrap();
    assert_eq!(
        still_blocked,
        BookingOutcome::Rejected(RejectReason::Contended)
    );

    tokio::time::advance(Duration::from_secs(1)).await;
    let booked = h.coordinator.book(request("u1", "A2", t1)).await.unwrap();
    assert!(booked.is_confirmed(), "slot must be reclaimable after TTL");
}

#[tokio::test]
async fn insert_failure_is_retryable_and_releases_lock() {
    let h = harness_with(Fault::InsertError, SlotGranularity::Second);

    let err = h
        .coordinator
        .book(request("u1", "A1", t0()))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        CoordinatorError::Store(ReservationError::Storage(_))
    ));
    assert!(err.is_retryable());

    let slot = SlotKey::new("A1", t0(), SlotGranularity::Second);
    let lease = h
        .coordinator
        .lock_manager()
        .lease(&slot)
        .await
        .unwrap()
        .expect("lock must be free right after a failed insert");
    lease.release().await.unwrap();

    let snap = h.coordinator.metrics().snapshot();
    assert_eq!(snap.store_failures, 1);
    assert_eq!(snap.lock_released, 1);
    assert!(h.reservations.is_empty());
}

#[tokio::test]
async fn panicking_store_still_releases_lock() {
    let h = harness_with(Fault::InsertPanic, SlotGranularity::Second);

    let coordinator = h.coordinator.clone();
    let joined = tokio::spawn(async move { coordinator.book(request("u1", "A1", t0())).await }).await;
    assert!(joined.unwrap_err().is_panic());

    let slot = SlotKey::new("A1", t0(), SlotGranularity::Second);
    let manager = h.coordinator.lock_manager();

    // The dropped lease releases on a spawned task; let it run.
    let mut lease = None;
    for _ in 0..10 {
        tokio::task::yield_now().await;
        lease = manager.lease(&slot).await.unwrap();
        if lease.is_some() {
            break;
        }
    }
    let lease = lease.expect("dropped lease should have released the slot");
    lease.release().await.unwrap();

    let locks = manager.metrics().snapshot();
    assert_eq!(locks.dropped_leases, 1);
    assert_eq!(locks.acquired, locks.release_attempts);
}

#[tokio::test(start_paused = true)]
async fn slow_store_times_out_and_releases_lock() {
    let h = harness_with(Fault::SlowFind(Duration::from_secs(5)), SlotGranularity::Second);

    let err = h
        .coordinator
        .book(request("u1", "A1", t0()))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        CoordinatorError::Store(ReservationError::Timeout(d)) if d == Duration::from_secs(2)
    ));
    assert!(err.is_retryable());

    let snap = h.coordinator.metrics().snapshot();
    assert_eq!(snap.lock_acquired, 1);
    assert_eq!(snap.lock_released, 1);
}

#[tokio::test(start_paused = true)]
async fn commit_is_cut_off_at_lock_deadline() {
    let delay = Duration::from_millis(1900);
    let reservations = MemoryReservationStore::new();
    let coordinator = CoordinatorBuilder::new()
        .lock_store(Arc::new(SlowLockStore {
            inner: MemoryLockStore::new(),
            delay,
        }))
        .reservations(Arc::new(FaultyStore {
            inner: reservations.clone(),
            fault: Fault::Slow(delay),
        }))
        .lock_ttl(Duration::from_secs(5))
        .store_timeout(Duration::from_secs(2))
        .build()
        .expect("coordinator should build");

    // Acquire and lookup leave 1.2s of lease; the 1.9s insert must not
    // outlive it.
    let err = coordinator
        .book(request("u1", "A1", t0()))
        .await
        .unwrap_err();
    assert!(
        matches!(
            err,
            CoordinatorError::Store(ReservationError::Timeout(d)) if d < Duration::from_secs(2)
        ),
        "unexpected error: {err:?}"
    );
    assert!(err.is_retryable());
    assert!(reservations.is_empty(), "nothing may commit after the lock lapses");

    let snap = coordinator.metrics().snapshot();
    assert_eq!(snap.confirmed, 0);
    assert_eq!(snap.lock_acquired, 1);
    assert_eq!(snap.lock_acquired, snap.releases_observed());
}

#[tokio::test(start_paused = true)]
async fn slow_stores_within_lease_still_confirm() {
    let reservations = MemoryReservationStore::new();
    let coordinator = CoordinatorBuilder::new()
        .lock_store(Arc::new(MemoryLockStore::new()))
        .reservations(Arc::new(FaultyStore {
            inner: reservations.clone(),
            fault: Fault::Slow(Duration::from_millis(1900)),
        }))
        .lock_ttl(Duration::from_secs(5))
        .store_timeout(Duration::from_secs(2))
        .build()
        .expect("coordinator should build");

    let outcome = coordinator.book(request("u1", "A1", t0())).await.unwrap();
    assert!(outcome.is_confirmed());
    assert_eq!(reservations.confirmed_count(), 1);
    assert_eq!(coordinator.metrics().snapshot().lock_released, 1);
}

#[tokio::test]
async fn store_constraint_backs_up_the_lock() {
    let h = harness_with(Fault::BlindFind, SlotGranularity::Second);

    assert!(
        h.coordinator
            .book(request("u1", "A1", t0()))
            .await
            .unwrap()
            .is_confirmed()
    );
    let second = h.coordinator.book(request("u2", "A1", t0())).await.unwrap();
    assert_eq!(
        second,
        BookingOutcome::Rejected(RejectReason::AlreadyBooked)
    );
    assert_eq!(h.reservations.len(), 1);
}

#[tokio::test]
async fn resubmission_after_contention_is_consistent() {
    let h = harness();
    let slot = SlotKey::new("A1", t0(), SlotGranularity::Second);

    let held = h
        .coordinator
        .lock_manager()
        .lease(&slot)
        .await
        .unwrap()
        .expect("slot should be free");
    let first = h.coordinator.book(request("u1", "A1", t0())).await.unwrap();
    assert_eq!(first, BookingOutcome::Rejected(RejectReason::Contended));
    assert!(RejectReason::Contended.is_retryable());
    held.release().await.unwrap();

    let retry = h.coordinator.book(request("u1", "A1", t0())).await.unwrap();
    assert!(retry.is_confirmed());

    let again = h.coordinator.book(request("u1", "A1", t0())).await.unwrap();
    assert_eq!(again, BookingOutcome::Rejected(RejectReason::AlreadyBooked));
    assert_eq!(h.reservations.len(), 1, "never a duplicate confirmed row");
}

#[tokio::test]
async fn invalid_request_never_touches_the_lock() {
    let h = harness();
    let err = h
        .coordinator
        .book(request("", "A1", t0()))
        .await
        .unwrap_err();
    assert!(matches!(err, CoordinatorError::InvalidRequest(_)));
    assert!(!err.is_retryable());

    let snap = h.coordinator.metrics().snapshot();
    assert_eq!(snap.attempts, 1);
    assert_eq!(snap.lock_acquired, 0);
    assert_eq!(h.coordinator.lock_manager().metrics().snapshot().acquired, 0);
}

#[tokio::test]
async fn minute_granularity_merges_seconds() {
    let h = harness_with(Fault::None, SlotGranularity::Minute);
    let a = Utc.with_ymd_and_hms(2025, 12, 30, 10, 0, 5).unwrap();
    let b = Utc.with_ymd_and_hms(2025, 12, 30, 10, 0, 40).unwrap();

    let first = h.coordinator.book(request("u1", "A1", a)).await.unwrap();
    assert_eq!(first.reservation().map(|r| r.slot_time), Some(t0()));

    let second = h.coordinator.book(request("u2", "A1", b)).await.unwrap();
    assert_eq!(
        second,
        BookingOutcome::Rejected(RejectReason::AlreadyBooked)
    );
}

#[tokio::test]
async fn cancel_frees_slot_for_rebooking() {
    let h = harness();
    let booked = h.coordinator.book(request("u1", "A1", t0())).await.unwrap();
    let id = booked.reservation().unwrap().id.clone();

    assert!(
        !h.coordinator
            .cancel(&id, &RequesterId::new("intruder"))
            .await
            .unwrap(),
        "only the requester may cancel"
    );
    assert!(
        h.coordinator
            .cancel(&id, &RequesterId::new("u1"))
            .await
            .unwrap()
    );
    assert!(
        !h.coordinator
            .cancel(&ReservationId::new("missing"), &RequesterId::new("u1"))
            .await
            .unwrap()
    );

    let rebooked = h.coordinator.book(request("u2", "A1", t0())).await.unwrap();
    assert!(rebooked.is_confirmed());
    assert_eq!(h.coordinator.metrics().snapshot().cancellations, 1);

    let history = h
        .coordinator
        .list_for_requester(&RequesterId::new("u1"))
        .await
        .unwrap();
    assert_eq!(history.len(), 1);
    assert!(!history[0].is_confirmed());

    let fetched = h.coordinator.get(&id).await.unwrap().unwrap();
    assert!(!fetched.is_confirmed());
}

#[test]
fn builder_requires_both_stores() {
    let err = CoordinatorBuilder::new()
        .reservations(Arc::new(MemoryReservationStore::new()))
        .build()
        .unwrap_err();
    assert!(matches!(err, CoordinatorError::Configuration(ref m) if m.contains("lock store")));

    let err = CoordinatorBuilder::new()
        .lock_store(Arc::new(MemoryLockStore::new()))
        .build()
        .unwrap_err();
    assert!(matches!(err, CoordinatorError::Configuration(ref m) if m.contains("reservation")));
}

#[test]
fn builder_rejects_timeout_not_below_ttl() {
    let err = CoordinatorBuilder::new()
        .lock_store(Arc::new(MemoryLockStore::new()))
        .reservations(Arc::new(MemoryReservationStore::new()))
        .lock_ttl(Duration::from_secs(2))
        .store_timeout(Duration::from_secs(2))
        .build()
        .unwrap_err();
    assert!(matches!(err, CoordinatorError::Configuration(_)));
}

#[test]
fn builder_rejects_ttl_without_room_for_two_store_calls() {
    let err = CoordinatorBuilder::new()
        .lock_store(Arc::new(MemoryLockStore::new()))
        .reservations(Arc::new(MemoryReservationStore::new()))
        .lock_ttl(Duration::from_secs(3))
        .store_timeout(Duration::from_secs(2))
        .build()
        .unwrap_err();
    assert!(matches!(err, CoordinatorError::Configuration(ref m) if m.contains("half")));
}
