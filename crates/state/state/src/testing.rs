use std::sync::Arc;
use std::time::Duration;

use slotguard_core::{SlotGranularity, SlotKey};

use crate::error::StateError;
use crate::manager::{AcquireOutcome, LockConfig, OwnerToken, ReleaseOutcome, SlotLockManager};
use crate::store::LockStore;

const TTL: Duration = Duration::from_secs(10);

fn test_slot(analyst: &str) -> SlotKey {
    let start = std::time::UNIX_EPOCH + Duration::from_secs(1_767_088_800);
    SlotKey::new(analyst, start.into(), SlotGranularity::Second)
}

/// Run the lock store conformance test suite.
///
/// Call this from your backend's test module with a fresh store instance.
/// Key names are prefixed with `conformance:` so a shared backend can be
/// reused across runs once entries expire.
///
/// # Errors
///
/// Returns an error if the backend fails an operation.
pub async fn run_lock_store_conformance_tests(store: &dyn LockStore) -> Result<(), StateError> {
    test_set_if_absent_new(store).await?;
    test_set_if_absent_existing(store).await?;
    test_compare_and_delete_owner(store).await?;
    test_compare_and_delete_foreign(store).await?;
    test_get_missing(store).await?;
    Ok(())
}

async fn test_set_if_absent_new(store: &dyn LockStore) -> Result<(), StateError> {
    let created = store
        .set_if_absent("conformance:new", "owner-1", TTL)
        .await?;
    assert!(created, "set_if_absent on a free key should succeed");
    let val = store.get("conformance:new").await?;
    assert_eq!(val.as_deref(), Some("owner-1"));
    Ok(())
}

async fn test_set_if_absent_existing(store: &dyn LockStore) -> Result<(), StateError> {
    store
        .set_if_absent("conformance:existing", "owner-1", TTL)
        .await?;
    let created = store
        .set_if_absent("conformance:existing", "owner-2", TTL)
        .await?;
    assert!(!created, "set_if_absent on a held key should fail");
    let val = store.get("conformance:existing").await?;
    assert_eq!(val.as_deref(), Some("owner-1"), "original owner should remain");
    Ok(())
}

async fn test_compare_and_delete_owner(store: &dyn LockStore) -> Result<(), StateError> {
    store
        .set_if_absent("conformance:cad-owner", "owner-1", TTL)
        .await?;
    let deleted = store
        .compare_and_delete("conformance:cad-owner", "owner-1")
        .await?;
    assert!(deleted, "owner should be able to delete its entry");
    assert!(store.get("conformance:cad-owner").await?.is_none());

    let again = store
        .compare_and_delete("conformance:cad-owner", "owner-1")
        .await?;
    assert!(!again, "second delete should report nothing removed");
    Ok(())
}

async fn test_compare_and_delete_foreign(store: &dyn LockStore) -> Result<(), StateError> {
    store
        .set_if_absent("conformance:cad-foreign", "owner-1", TTL)
        .await?;
    let deleted = store
        .compare_and_delete("conformance:cad-foreign", "intruder")
        .await?;
    assert!(!deleted, "a foreign token must not delete the entry");
    assert_eq!(
        store.get("conformance:cad-foreign").await?.as_deref(),
        Some("owner-1")
    );
    Ok(())
}

async fn test_get_missing(store: &dyn LockStore) -> Result<(), StateError> {
    assert!(store.get("conformance:missing").await?.is_none());
    Ok(())
}

/// Run the slot lock manager conformance suite on top of `store`.
///
/// # Errors
///
/// Returns an error if the backend fails an operation.
pub async fn run_manager_conformance_tests(store: Arc<dyn LockStore>) -> Result<(), StateError> {
    let manager = SlotLockManager::new(store, LockConfig::default())?;
    test_lease_contention(&manager).await?;
    test_release_is_owner_checked(&manager).await?;
    Ok(())
}

async fn test_lease_contention(manager: &SlotLockManager) -> Result<(), StateError> {
    let slot = test_slot("conformance-lease");
    let held = manager.lease(&slot).await?.expect("should acquire free slot");
    assert!(
        manager.lease(&slot).await?.is_none(),
        "second lease should be refused while held"
    );
    assert_eq!(held.release().await?, ReleaseOutcome::Released);
    let again = manager.lease(&slot).await?.expect("should re-acquire");
    again.release().await?;
    Ok(())
}

async fn test_release_is_owner_checked(manager: &SlotLockManager) -> Result<(), StateError> {
    let slot = test_slot("conformance-owner");
    let AcquireOutcome::Acquired(handle) = manager
        .acquire(&slot, OwnerToken::generate(), TTL)
        .await?
    else {
        panic!("should acquire free slot");
    };
    assert!(manager.is_held(&handle).await?);
    assert_eq!(manager.release(handle).await?, ReleaseOutcome::Released);
    Ok(())
}
