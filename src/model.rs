use std::fmt;

use chrono::{DateTime, FixedOffset, NaiveDate, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// Timezone-qualified instant, the only time type on the wire.
pub type Timestamp = DateTime<FixedOffset>;

/// Current time expressed in the service offset.
pub fn now_in(offset: FixedOffset) -> Timestamp {
    Utc::now().with_timezone(&offset)
}

/// Reservation status lifecycle. CANCELED never survives as a stored value;
/// cancellation deletes the record instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Status {
    #[serde(rename = "PENDING")]
    Pending,
    #[serde(rename = "CONFIRMED")]
    Confirmed,
    #[serde(rename = "REFUSED")]
    Refused,
    #[serde(rename = "CANCELED")]
    Canceled,
}

impl Status {
    /// Parse a wire status value. The set is closed and case-sensitive.
    pub fn parse(raw: &str) -> Option<Status> {
        match raw {
            "PENDING" => Some(Status::Pending),
            "CONFIRMED" => Some(Status::Confirmed),
            "REFUSED" => Some(Status::Refused),
            "CANCELED" => Some(Status::Canceled),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Pending => "PENDING",
            Status::Confirmed => "CONFIRMED",
            Status::Refused => "REFUSED",
            Status::Canceled => "CANCELED",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Default for Status {
    fn default() -> Self {
        Status::Pending
    }
}

/// Build the absolute slot instant for `(date, hour)` in the given offset.
/// Returns None for an hour outside 0..=23.
pub fn slot_instant(date: NaiveDate, hour: u8, offset: FixedOffset) -> Option<Timestamp> {
    let local = date.and_hms_opt(u32::from(hour), 0, 0)?;
    local.and_local_timezone(offset).single()
}

/// Canonical key rendering of a slot instant: RFC 3339 with explicit offset,
/// whole seconds.
pub fn format_slot(ts: &Timestamp) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Secs, false)
}

/// Reparse a client-supplied slot timestamp and normalize it into the
/// service offset, so two spellings of the same instant address the same key.
pub fn parse_slot(raw: &str, offset: FixedOffset) -> Option<Timestamp> {
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|ts| ts.with_timezone(&offset))
}

/// Composite identity of a reservation and the unit of concurrency control.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SlotKey {
    pub space_id: String,
    pub slot_timestamp: String,
}

impl SlotKey {
    pub fn new(space_id: impl Into<String>, ts: &Timestamp) -> Self {
        Self {
            space_id: space_id.into(),
            slot_timestamp: format_slot(ts),
        }
    }
}

impl fmt::Display for SlotKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}|{}", self.space_id, self.slot_timestamp)
    }
}

/// The persisted reservation record. Field names are the wire contract the
/// other collaborators depend on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reservation {
    pub space_id: String,
    pub slot_timestamp: Timestamp,
    pub user_id: String,
    pub status: Status,
    pub date_reservation: NaiveDate,
    pub hour: u8,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Reservation {
    pub fn key(&self) -> SlotKey {
        SlotKey::new(&self.space_id, &self.slot_timestamp)
    }
}

/// Bookable space, read-only to the engine. Prices pass through untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Space {
    pub space_id: String,
    pub name: String,
    pub availability: bool,
    pub hoster: String,
    #[serde(default)]
    pub price_hour: f64,
    #[serde(default)]
    pub price_day: f64,
    #[serde(default = "default_capacity")]
    pub capacity: u32,
    #[serde(default)]
    pub whole_day: bool,
}

fn default_capacity() -> u32 {
    1
}

/// Guest or hoster account, read-only to the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub user_id: String,
    pub name: String,
    pub email: String,
}

// ── Operation result types ───────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReservationReceipt {
    pub space_id: String,
    pub date_reservation: NaiveDate,
    pub hours_reserved: Vec<u8>,
    pub status: Status,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelReceipt {
    pub space_id: String,
    pub slot_timestamp: Timestamp,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Availability {
    pub available: bool,
    pub conflicts: Vec<u8>,
}

/// One row of the hoster aggregation view: a reservation joined with its
/// space and guest for display. Missing guests leave the user fields absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HosterReservationItem {
    pub id: String,
    pub space_id: String,
    pub user_id: String,
    pub hoster_id: String,
    pub start_date: Timestamp,
    // The record has no real end instant; mirrors start_date.
    pub end_date: Timestamp,
    pub status: Status,
    pub space_name: String,
    pub user_name: Option<String>,
    pub user_email: Option<String>,
}
