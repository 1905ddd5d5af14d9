use std::fmt;

use async_trait::async_trait;
use dashmap::DashMap;

use crate::model::{Reservation, SlotKey, Status, Timestamp};

/// Collaborator-side failure: the backend was unreachable or misbehaved.
/// The engine wraps every one of these before it reaches a caller.
#[derive(Debug)]
pub struct StoreError(pub String);

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "store error: {}", self.0)
    }
}

impl std::error::Error for StoreError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    AlreadyExists,
}

/// Reservation persistence. The contract any backend must offer the engine:
/// insert-if-absent is the sole concurrency-control primitive, updates touch
/// only `status` and `updatedAt`, partition queries are keyed by space.
#[async_trait]
pub trait ReservationStore: Send + Sync {
    /// Atomic insert that succeeds only if no record holds the key.
    async fn insert_if_absent(&self, record: &Reservation) -> Result<InsertOutcome, StoreError>;

    async fn get(&self, key: &SlotKey) -> Result<Option<Reservation>, StoreError>;

    /// Conditional update against an existing key. Returns the updated record,
    /// or None when the key holds nothing.
    async fn update_status(
        &self,
        key: &SlotKey,
        status: Status,
        updated_at: Timestamp,
    ) -> Result<Option<Reservation>, StoreError>;

    async fn delete(&self, key: &SlotKey) -> Result<(), StoreError>;

    /// All records in a space's partition, optionally narrowed by status,
    /// ordered by slot instant.
    async fn query_by_space(
        &self,
        space_id: &str,
        status: Option<Status>,
    ) -> Result<Vec<Reservation>, StoreError>;

    /// Filtered scan across partitions for one guest's reservations.
    async fn query_by_user(&self, user_id: &str) -> Result<Vec<Reservation>, StoreError>;
}

/// Sharded in-memory backend. Default backend of the service binary and the
/// substitute the engine tests run against.
#[derive(Default)]
pub struct MemoryStore {
    slots: DashMap<SlotKey, Reservation>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

#[async_trait]
impl ReservationStore for MemoryStore {
    async fn insert_if_absent(&self, record: &Reservation) -> Result<InsertOutcome, StoreError> {
        match self.slots.entry(record.key()) {
            dashmap::Entry::Occupied(_) => Ok(InsertOutcome::AlreadyExists),
            dashmap::Entry::Vacant(slot) => {
                slot.insert(record.clone());
                Ok(InsertOutcome::Inserted)
            }
        }
    }

    async fn get(&self, key: &SlotKey) -> Result<Option<Reservation>, StoreError> {
        Ok(self.slots.get(key).map(|e| e.value().clone()))
    }

    async fn update_status(
        &self,
        key: &SlotKey,
        status: Status,
        updated_at: Timestamp,
    ) -> Result<Option<Reservation>, StoreError> {
        match self.slots.get_mut(key) {
            Some(mut entry) => {
                entry.status = status;
                entry.updated_at = updated_at;
                Ok(Some(entry.clone()))
            }
            None => Ok(None),
        }
    }

    async fn delete(&self, key: &SlotKey) -> Result<(), StoreError> {
        self.slots.remove(key);
        Ok(())
    }

    async fn query_by_space(
        &self,
        space_id: &str,
        status: Option<Status>,
    ) -> Result<Vec<Reservation>, StoreError> {
        let mut records: Vec<Reservation> = self
            .slots
            .iter()
            .filter(|e| e.space_id == space_id)
            .filter(|e| status.is_none_or(|s| e.status == s))
            .map(|e| e.value().clone())
            .collect();
        records.sort_by(|a, b| a.slot_timestamp.cmp(&b.slot_timestamp));
        Ok(records)
    }

    async fn query_by_user(&self, user_id: &str) -> Result<Vec<Reservation>, StoreError> {
        let mut records: Vec<Reservation> = self
            .slots
            .iter()
            .filter(|e| e.user_id == user_id)
            .map(|e| e.value().clone())
            .collect();
        records.sort_by(|a, b| {
            a.space_id
                .cmp(&b.space_id)
                .then(a.slot_timestamp.cmp(&b.slot_timestamp))
        });
        Ok(records)
    }
}
