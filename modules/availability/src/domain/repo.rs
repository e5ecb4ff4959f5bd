use async_trait::async_trait;
use chrono::NaiveDate;
use uuid::Uuid;

use crate::contract::model::DaySchedule;

/// Result of a versioned write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    Applied,
    /// The stored version was not the one the write was computed from.
    VersionConflict,
}

/// Port for the domain layer: persistence operations the domain needs.
/// Object-safe and async-friendly via `async_trait`.
#[async_trait]
pub trait ScheduleRepository: Send + Sync {
    /// Load the record for one `(owner_id, date)` key.
    async fn find(&self, owner_id: Uuid, date: NaiveDate) -> anyhow::Result<Option<DaySchedule>>;

    /// Records with `from <= date <= to`, ascending by date.
    async fn find_range(
        &self,
        owner_id: Uuid,
        from: NaiveDate,
        to: NaiveDate,
    ) -> anyhow::Result<Vec<DaySchedule>>;

    /// Every record of an owner, ascending by date.
    async fn find_by_owner(&self, owner_id: Uuid) -> anyhow::Result<Vec<DaySchedule>>;

    /// Insert or replace a record.
    ///
    /// `schedule.version` is the new version; the write applies only if the
    /// stored version is `schedule.version - 1` (absent counts as 0).
    async fn save(&self, schedule: &DaySchedule) -> anyhow::Result<WriteOutcome>;

    /// Remove a record if its stored version is still `expected_version`.
    async fn delete(
        &self,
        owner_id: Uuid,
        date: NaiveDate,
        expected_version: u64,
    ) -> anyhow::Result<WriteOutcome>;
}
