use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

use slotguard_core::{RequesterId, Reservation, ReservationId, ReservationStatus, SlotKey};
use slotguard_reservations::error::ReservationError;
use slotguard_reservations::store::ReservationStore;

/// In-memory [`ReservationStore`] backed by two [`DashMap`]s.
///
/// `rows` holds every reservation by id. `confirmed` maps each occupied
/// [`SlotKey`] to the id of its confirmed reservation and plays the role of a
/// partial unique index. Writers always take the `confirmed` entry before
/// touching `rows`, never the reverse.
#[derive(Debug, Clone, Default)]
pub struct MemoryReservationStore {
    rows: Arc<DashMap<ReservationId, Reservation>>,
    confirmed: Arc<DashMap<SlotKey, ReservationId>>,
}

impl MemoryReservationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored rows, including cancelled ones.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Number of slots currently held by a confirmed reservation.
    pub fn confirmed_count(&self) -> usize {
        self.confirmed.len()
    }
}

#[async_trait]
impl ReservationStore for MemoryReservationStore {
    async fn find_confirmed(&self, slot: &SlotKey) -> Result<Option<Reservation>, ReservationError> {
        let Some(id) = self.confirmed.get(slot).map(|e| e.value().clone()) else {
            return Ok(None);
        };
        Ok(self.rows.get(&id).map(|r| r.value().clone()))
    }

    async fn insert(&self, reservation: &Reservation) -> Result<(), ReservationError> {
        if !reservation.is_confirmed() {
            self.rows
                .insert(reservation.id.clone(), reservation.clone());
            return Ok(());
        }

        let slot = reservation.slot_key();
        match self.confirmed.entry(slot.clone()) {
            Entry::Occupied(_) => Err(ReservationError::Duplicate(slot)),
            Entry::Vacant(vacant) => {
                // Row goes in while the index shard is still held, so a
                // concurrent find_confirmed never sees an id without a row.
                self.rows
                    .insert(reservation.id.clone(), reservation.clone());
                vacant.insert(reservation.id.clone());
                Ok(())
            }
        }
    }

    async fn get(&self, id: &ReservationId) -> Result<Option<Reservation>, ReservationError> {
        Ok(self.rows.get(id).map(|r| r.value().clone()))
    }

    async fn list_by_requester(
        &self,
        requester: &RequesterId,
    ) -> Result<Vec<Reservation>, ReservationError> {
        let mut out: Vec<Reservation> = self
            .rows
            .iter()
            .filter(|r| r.requester_id == *requester)
            .map(|r| r.value().clone())
            .collect();
        out.sort_by(|a, b| {
            b.slot_time
                .cmp(&a.slot_time)
                .then_with(|| b.created_at.cmp(&a.created_at))
        });
        Ok(out)
    }

    async fn cancel(
        &self,
        id: &ReservationId,
        requester: &RequesterId,
    ) -> Result<bool, ReservationError> {
        let slot = match self.rows.get(id) {
            Some(row) if row.requester_id == *requester && row.is_confirmed() => row.slot_key(),
            _ => return Ok(false),
        };

        // Row guard is dropped above; index first, then row.
        let Some(_) = self.confirmed.remove_if(&slot, |_, held| held == id) else {
            return Ok(false);
        };
        if let Some(mut row) = self.rows.get_mut(id) {
            row.status = ReservationStatus::Cancelled;
            row.updated_at = Utc::now();
        }
        Ok(true)
    }
}
