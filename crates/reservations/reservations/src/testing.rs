use chrono::{DateTime, TimeDelta, Utc};

use slotguard_core::{
    RequesterId, Reservation, ReservationId, ReservationStatus, SlotGranularity, SlotKey,
};

use crate::error::ReservationError;
use crate::store::ReservationStore;

fn slot_at(analyst: &str, offset_minutes: i64) -> SlotKey {
    let base: DateTime<Utc> = DateTime::UNIX_EPOCH + TimeDelta::seconds(1_767_088_800);
    SlotKey::new(
        analyst,
        base + TimeDelta::minutes(offset_minutes),
        SlotGranularity::Second,
    )
}

fn confirmed(slot: &SlotKey, requester: &str) -> Reservation {
    Reservation::confirmed(slot, RequesterId::new(requester), 30)
}

/// Run the reservation store conformance test suite.
///
/// Call this from your backend's test module with a fresh, empty store.
///
/// # Errors
///
/// Returns an error if the backend fails an operation the suite expects to
/// succeed.
pub async fn run_reservation_store_conformance_tests(
    store: &dyn ReservationStore,
) -> Result<(), ReservationError> {
    test_insert_and_get(store).await?;
    test_find_confirmed(store).await?;
    test_duplicate_rejected(store).await?;
    test_cancel_frees_slot(store).await?;
    test_cancel_checks_requester(store).await?;
    test_cancel_unknown(store).await?;
    test_list_by_requester(store).await?;
    Ok(())
}

async fn test_insert_and_get(store: &dyn ReservationStore) -> Result<(), ReservationError> {
    let slot = slot_at("conformance-get", 0);
    let r = confirmed(&slot, "user-get");
    store.insert(&r).await?;

    let fetched = store.get(&r.id).await?.expect("inserted row should exist");
    assert_eq!(fetched.id, r.id);
    assert_eq!(fetched.requester_id, r.requester_id);
    assert_eq!(fetched.slot_key(), slot);
    assert_eq!(fetched.duration_minutes, 30);
    assert_eq!(fetched.status, ReservationStatus::Confirmed);

    assert!(
        store.get(&ReservationId::new("missing")).await?.is_none(),
        "unknown id should return None"
    );
    Ok(())
}

async fn test_find_confirmed(store: &dyn ReservationStore) -> Result<(), ReservationError> {
    let slot = slot_at("conformance-find", 0);
    assert!(store.find_confirmed(&slot).await?.is_none());

    let r = confirmed(&slot, "user-find");
    store.insert(&r).await?;
    let found = store
        .find_confirmed(&slot)
        .await?
        .expect("confirmed row should be found");
    assert_eq!(found.id, r.id);

    // Same analyst, different time is a different slot.
    assert!(
        store
            .find_confirmed(&slot_at("conformance-find", 30))
            .await?
            .is_none()
    );
    Ok(())
}

async fn test_duplicate_rejected(store: &dyn ReservationStore) -> Result<(), ReservationError> {
    let slot = slot_at("conformance-dup", 0);
    store.insert(&confirmed(&slot, "user-a")).await?;

    let second = store.insert(&confirmed(&slot, "user-b")).await;
    assert!(
        matches!(second, Err(ReservationError::Duplicate(ref s)) if *s == slot),
        "second confirmed row for a slot must be rejected, got {second:?}"
    );
    Ok(())
}

async fn test_cancel_frees_slot(store: &dyn ReservationStore) -> Result<(), ReservationError> {
    let slot = slot_at("conformance-cancel", 0);
    let r = confirmed(&slot, "user-cancel");
    store.insert(&r).await?;

    assert!(store.cancel(&r.id, &r.requester_id).await?);
    assert!(
        store.find_confirmed(&slot).await?.is_none(),
        "cancelled row must not occupy the slot"
    );
    let row = store.get(&r.id).await?.expect("cancelled row is kept");
    assert_eq!(row.status, ReservationStatus::Cancelled);
    assert!(row.updated_at >= row.created_at);

    assert!(
        !store.cancel(&r.id, &r.requester_id).await?,
        "cancelling twice should report nothing changed"
    );

    let rebook = confirmed(&slot, "user-next");
    store.insert(&rebook).await?;
    assert_eq!(
        store.find_confirmed(&slot).await?.map(|r| r.id),
        Some(rebook.id)
    );
    Ok(())
}

async fn test_cancel_checks_requester(
    store: &dyn ReservationStore,
) -> Result<(), ReservationError> {
    let slot = slot_at("conformance-owner", 0);
    let r = confirmed(&slot, "user-owner");
    store.insert(&r).await?;

    assert!(
        !store.cancel(&r.id, &RequesterId::new("someone-else")).await?,
        "only the requester may cancel"
    );
    assert!(store.find_confirmed(&slot).await?.is_some());
    Ok(())
}

async fn test_cancel_unknown(store: &dyn ReservationStore) -> Result<(), ReservationError> {
    assert!(
        !store
            .cancel(&ReservationId::new("nope"), &RequesterId::new("user"))
            .await?
    );
    Ok(())
}

async fn test_list_by_requester(store: &dyn ReservationStore) -> Result<(), ReservationError> {
    let requester = RequesterId::new("user-list");
    let early = Reservation::confirmed(&slot_at("conformance-list", 0), requester.clone(), 30);
    let late = Reservation::confirmed(&slot_at("conformance-list", 60), requester.clone(), 30);
    store.insert(&early).await?;
    store.insert(&late).await?;
    store.cancel(&early.id, &requester).await?;
    store
        .insert(&confirmed(&slot_at("conformance-list", 120), "other-user"))
        .await?;

    let listed = store.list_by_requester(&requester).await?;
    let ids: Vec<_> = listed.iter().map(|r| r.id.clone()).collect();
    assert_eq!(
        ids,
        vec![late.id, early.id],
        "list includes cancelled rows, newest slot first"
    );

    assert!(
        store
            .list_by_requester(&RequesterId::new("nobody"))
            .await?
            .is_empty()
    );
    Ok(())
}
