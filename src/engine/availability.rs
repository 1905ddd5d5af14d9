use chrono::NaiveDate;

use crate::model::{Availability, SlotKey};

use super::{Engine, EngineError};

impl Engine {
    /// Pure read: which of the requested hours are already taken. A conflict
    /// is reported for hour H exactly when a record currently holds that slot
    /// key, whatever its status. Never mutates; stale PENDING records are not
    /// expired on this path.
    pub async fn check_availability(
        &self,
        space_id: &str,
        date: NaiveDate,
        hours: &[u8],
    ) -> Result<Availability, EngineError> {
        Self::check_id(space_id, "spaceId")?;
        Self::check_hours(hours)?;

        let mut conflicts = Vec::new();
        for &hour in hours {
            let slot = self.slot_for(date, hour)?;
            let key = SlotKey::new(space_id, &slot);
            if self.store.get(&key).await?.is_some() {
                conflicts.push(hour);
            }
        }
        Ok(Availability {
            available: conflicts.is_empty(),
            conflicts,
        })
    }
}
