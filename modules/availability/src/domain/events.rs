use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use crate::contract::model::TimeRange;

/// Transport-agnostic domain event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AvailabilityEvent {
    Created {
        owner_id: Uuid,
        date: NaiveDate,
        at: DateTime<Utc>,
    },
    Updated {
        owner_id: Uuid,
        date: NaiveDate,
        at: DateTime<Utc>,
    },
    Reserved {
        owner_id: Uuid,
        date: NaiveDate,
        range: TimeRange,
        reservation_ref: String,
        at: DateTime<Utc>,
    },
    Released {
        owner_id: Uuid,
        date: NaiveDate,
        range: TimeRange,
        at: DateTime<Utc>,
    },
    Deleted {
        owner_id: Uuid,
        date: NaiveDate,
        schedule_removed: bool,
        at: DateTime<Utc>,
    },
    ActivityChanged {
        owner_id: Uuid,
        active: bool,
        at: DateTime<Utc>,
    },
}
