use metrics::counter;
use tracing::warn;

use crate::model::{Reservation, Status, Timestamp};
use crate::observability::{EXPIRY_WRITES_TOTAL, EXPIRY_WRITE_FAILURES_TOTAL};

use super::{Engine, EngineError};

/// Gate on targets the status-update operation may write. CANCELED is
/// reachable only through the cancellation path, which deletes the record
/// instead of writing a status.
pub(super) fn check_update_target(next: Status) -> Result<(), EngineError> {
    if next == Status::Canceled {
        return Err(EngineError::Validation(
            "CANCELED cannot be set by status update; use the cancel operation".into(),
        ));
    }
    Ok(())
}

/// A record is due for lazy expiry when it is still PENDING and its slot
/// instant has already passed.
pub(super) fn is_stale(record: &Reservation, now: Timestamp) -> bool {
    record.status == Status::Pending && record.slot_timestamp < now
}

impl Engine {
    /// Post-fetch materialize step for display reads. Stale PENDING records
    /// are rewritten to REFUSED; the write is best-effort and a failure never
    /// fails the read, but it is logged and counted so drift between the
    /// displayed and stored status stays observable. The reader sees REFUSED
    /// either way. Re-materializing an already-REFUSED record is a no-op.
    pub(super) async fn materialize(&self, mut record: Reservation) -> Reservation {
        if !self.config.lazy_expiry {
            return record;
        }
        let now = self.now();
        if !is_stale(&record, now) {
            return record;
        }
        match self
            .store
            .update_status(&record.key(), Status::Refused, now)
            .await
        {
            Ok(Some(updated)) => {
                counter!(EXPIRY_WRITES_TOTAL).increment(1);
                return updated;
            }
            Ok(None) => {
                // Deleted between fetch and expiry; present the refusal anyway.
            }
            Err(e) => {
                counter!(EXPIRY_WRITE_FAILURES_TOTAL).increment(1);
                warn!("expiry write failed for {}: {e}", record.key());
            }
        }
        record.status = Status::Refused;
        record.updated_at = now;
        record
    }
}
