use std::collections::{HashMap, HashSet};

use futures::future::join_all;

use crate::limits::BATCH_LOOKUP_CHUNK;
use crate::model::*;

use super::{Engine, EngineError};

impl Engine {
    /// One guest's reservations across all spaces, materialized for display.
    pub async fn list_by_user(&self, user_id: &str) -> Result<Vec<Reservation>, EngineError> {
        Self::check_id(user_id, "userId")?;
        let records = self.store.query_by_user(user_id).await?;
        let mut out = Vec::with_capacity(records.len());
        for record in records {
            out.push(self.materialize(record).await);
        }
        Ok(out)
    }

    /// The hoster aggregation view: every reservation against the hoster's
    /// spaces, joined with the space name and the guest profile for display.
    /// Reading this view materializes each record, so stale PENDING
    /// reservations come back REFUSED.
    pub async fn list_by_hoster(
        &self,
        hoster_id: &str,
        status_filter: Option<Status>,
    ) -> Result<Vec<HosterReservationItem>, EngineError> {
        Self::check_id(hoster_id, "hosterId")?;
        let spaces = self.spaces.query_by_hoster(hoster_id).await?;

        let mut joined: Vec<(String, Reservation)> = Vec::new();
        for space in &spaces {
            let records = self
                .store
                .query_by_space(&space.space_id, status_filter)
                .await?;
            for record in records {
                let record = self.materialize(record).await;
                joined.push((space.name.clone(), record));
            }
        }

        let profiles = self
            .lookup_profiles(joined.iter().map(|(_, r)| r.user_id.clone()))
            .await?;

        Ok(joined
            .into_iter()
            .map(|(space_name, record)| {
                let user = profiles.get(&record.user_id);
                let user_name = user.map(|u| u.name.clone());
                let user_email = user.map(|u| u.email.clone());
                let id = record.key().to_string();
                HosterReservationItem {
                    id,
                    hoster_id: hoster_id.to_string(),
                    start_date: record.slot_timestamp,
                    end_date: record.slot_timestamp,
                    status: record.status,
                    space_name,
                    user_name,
                    user_email,
                    space_id: record.space_id,
                    user_id: record.user_id,
                }
            })
            .collect())
    }

    /// Batch-fetch guest profiles, deduped and chunked to the backend's
    /// batch-read limit. Missing users are simply absent from the map.
    async fn lookup_profiles(
        &self,
        ids: impl Iterator<Item = String>,
    ) -> Result<HashMap<String, UserProfile>, EngineError> {
        let unique: Vec<String> = {
            let mut seen = HashSet::new();
            ids.filter(|id| seen.insert(id.clone())).collect()
        };
        let lookups = unique
            .chunks(BATCH_LOOKUP_CHUNK)
            .map(|chunk| self.users.batch_lookup(chunk));
        let mut profiles = HashMap::new();
        for result in join_all(lookups).await {
            profiles.extend(result?);
        }
        Ok(profiles)
    }
}
