mod availability;
mod error;
mod lifecycle;
mod mutations;
mod queries;

pub use error::EngineError;

use std::sync::Arc;

use chrono::NaiveDate;

use crate::config::EngineConfig;
use crate::directory::{SpaceDirectory, UserDirectory};
use crate::limits::*;
use crate::model::*;
use crate::store::ReservationStore;

/// The slot reservation engine. Stateless between requests: every handle is
/// injected, all cross-request coordination lives in the store's atomic
/// insert-if-absent.
pub struct Engine {
    store: Arc<dyn ReservationStore>,
    spaces: Arc<dyn SpaceDirectory>,
    users: Arc<dyn UserDirectory>,
    config: EngineConfig,
}

impl Engine {
    pub fn new(
        store: Arc<dyn ReservationStore>,
        spaces: Arc<dyn SpaceDirectory>,
        users: Arc<dyn UserDirectory>,
        config: EngineConfig,
    ) -> Self {
        Self {
            store,
            spaces,
            users,
            config,
        }
    }

    pub(super) fn now(&self) -> Timestamp {
        now_in(self.config.utc_offset)
    }

    /// Absolute instant of `(date, hour)` under the service offset.
    pub(super) fn slot_for(&self, date: NaiveDate, hour: u8) -> Result<Timestamp, EngineError> {
        slot_instant(date, hour, self.config.utc_offset)
            .ok_or_else(|| EngineError::Validation(format!("hour {hour} out of range")))
    }

    /// Reparse a client-supplied slot timestamp into the canonical key form.
    pub(super) fn parse_slot_arg(&self, raw: &str) -> Result<Timestamp, EngineError> {
        parse_slot(raw, self.config.utc_offset)
            .ok_or_else(|| EngineError::Validation("unparseable slot timestamp".into()))
    }

    pub(super) fn check_id(value: &str, field: &str) -> Result<(), EngineError> {
        if value.is_empty() {
            return Err(EngineError::Validation(format!("{field} is required")));
        }
        if value.len() > MAX_ID_LEN {
            return Err(EngineError::Validation(format!("{field} too long")));
        }
        Ok(())
    }

    pub(super) fn check_hours(hours: &[u8]) -> Result<(), EngineError> {
        if hours.is_empty() {
            return Err(EngineError::Validation("hours are required".into()));
        }
        if hours.len() > MAX_HOURS_PER_REQUEST {
            return Err(EngineError::Validation("too many hours in one request".into()));
        }
        if let Some(bad) = hours.iter().find(|h| **h > 23) {
            return Err(EngineError::Validation(format!("hour {bad} out of range")));
        }
        Ok(())
    }

    /// Lookup a space and require it to be bookable. Absence and the
    /// availability flag produce the same outcome.
    pub(super) async fn bookable_space(&self, space_id: &str) -> Result<Space, EngineError> {
        match self.spaces.lookup(space_id).await? {
            Some(space) if space.availability => Ok(space),
            _ => Err(EngineError::NotFound(format!("space {space_id} not available"))),
        }
    }

    pub(super) async fn require_user(&self, user_id: &str) -> Result<UserProfile, EngineError> {
        self.users
            .lookup(user_id)
            .await?
            .ok_or_else(|| EngineError::NotFound(format!("user {user_id} not found")))
    }
}
