use chrono::NaiveDate;
use metrics::counter;
use tracing::{info, warn};

use crate::model::*;
use crate::observability::{ROLLBACK_FAILURES_TOTAL, SLOT_CONFLICTS_TOTAL};
use crate::store::InsertOutcome;

use super::lifecycle::check_update_target;
use super::{Engine, EngineError};

impl Engine {
    /// Claim one or more hour-slots for a guest. Hours are claimed in request
    /// order, one atomic insert each; the first hour already held by anyone
    /// aborts the request and releases the hours claimed before it. Duplicate
    /// hours are not deduplicated, so a repeated hour conflicts with itself.
    pub async fn reserve(
        &self,
        space_id: &str,
        user_id: &str,
        date: NaiveDate,
        hours: &[u8],
        requested_status: Status,
    ) -> Result<ReservationReceipt, EngineError> {
        Self::check_id(space_id, "spaceId")?;
        Self::check_id(user_id, "userId")?;
        Self::check_hours(hours)?;

        self.bookable_space(space_id).await?;
        self.require_user(user_id).await?;

        let created_at = self.now();
        let mut claimed: Vec<SlotKey> = Vec::with_capacity(hours.len());

        for &hour in hours {
            let slot = self.slot_for(date, hour)?;
            let record = Reservation {
                space_id: space_id.to_string(),
                slot_timestamp: slot,
                user_id: user_id.to_string(),
                status: requested_status,
                date_reservation: date,
                hour,
                created_at,
                updated_at: created_at,
            };

            match self.store.insert_if_absent(&record).await {
                Ok(InsertOutcome::Inserted) => claimed.push(record.key()),
                Ok(InsertOutcome::AlreadyExists) => {
                    counter!(SLOT_CONFLICTS_TOTAL).increment(1);
                    let rolled_back = self.release_claimed(&claimed).await;
                    return Err(EngineError::Conflict { hour, rolled_back });
                }
                Err(e) => {
                    let rolled_back = self.release_claimed(&claimed).await;
                    let tail = if rolled_back {
                        "earlier hours in this request were released"
                    } else {
                        "earlier hours in this request may remain committed"
                    };
                    return Err(EngineError::Dependency(format!(
                        "store failed while reserving hour {hour} ({e}); {tail}"
                    )));
                }
            }
        }

        info!(
            "reserved {} hour(s) on {space_id} {date} for {user_id}",
            hours.len()
        );
        Ok(ReservationReceipt {
            space_id: space_id.to_string(),
            date_reservation: date,
            hours_reserved: hours.to_vec(),
            status: requested_status,
        })
    }

    /// Compensating rollback: best-effort delete of the hours already claimed
    /// in this request. Returns true when every delete went through. A failed
    /// delete leaves a committed hour behind; that is the residual window of
    /// sequential inserts standing in for a multi-key transaction.
    async fn release_claimed(&self, claimed: &[SlotKey]) -> bool {
        let mut clean = true;
        for key in claimed {
            if let Err(e) = self.store.delete(key).await {
                clean = false;
                counter!(ROLLBACK_FAILURES_TOTAL).increment(1);
                warn!("rollback delete failed for {key}: {e}");
            }
        }
        clean
    }

    /// Release a held slot. Only the owning guest may cancel; an absent
    /// record and a foreign record produce the same outcome, so callers
    /// cannot probe for other guests' reservations. Cancellation is a hard
    /// delete, never a stored status.
    pub async fn cancel(
        &self,
        space_id: &str,
        slot_timestamp: &str,
        requesting_user_id: &str,
    ) -> Result<CancelReceipt, EngineError> {
        Self::check_id(space_id, "spaceId")?;
        Self::check_id(requesting_user_id, "userId")?;
        let slot = self.parse_slot_arg(slot_timestamp)?;
        let key = SlotKey::new(space_id, &slot);

        match self.store.get(&key).await? {
            Some(record) if record.user_id == requesting_user_id => {
                self.store.delete(&key).await?;
                info!("canceled reservation {key}");
                Ok(CancelReceipt {
                    space_id: space_id.to_string(),
                    slot_timestamp: slot,
                })
            }
            _ => Err(EngineError::NotFound(
                "reservation not found or not owned by requester".into(),
            )),
        }
    }

    /// Decide a reservation: PENDING to CONFIRMED or REFUSED by the space's
    /// hoster. The new status must come from the closed set and must not be
    /// CANCELED. The write is a conditional update on the existing key; the
    /// store's not-found is the only existence check.
    pub async fn update_status(
        &self,
        space_id: &str,
        slot_timestamp: &str,
        new_status: &str,
        hoster_id: &str,
    ) -> Result<Reservation, EngineError> {
        Self::check_id(space_id, "spaceId")?;
        Self::check_id(hoster_id, "hosterId")?;
        let status = Status::parse(new_status)
            .ok_or_else(|| EngineError::Validation(format!("unknown status {new_status}")))?;
        check_update_target(status)?;
        let slot = self.parse_slot_arg(slot_timestamp)?;

        // Only the space's hoster may decide; a mismatch reads the same as a
        // missing space.
        let space = self.spaces.lookup(space_id).await?;
        if !space.as_ref().is_some_and(|s| s.hoster == hoster_id) {
            return Err(EngineError::NotFound(format!(
                "space {space_id} not found or not managed by requester"
            )));
        }

        let key = SlotKey::new(space_id, &slot);
        self.store
            .update_status(&key, status, self.now())
            .await?
            .ok_or_else(|| EngineError::NotFound(format!("reservation {key} not found")))
    }
}
