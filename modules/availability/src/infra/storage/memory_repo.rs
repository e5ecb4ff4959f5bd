//! Process-local repository used by the CLI when no database is configured
//! and by tests.

use async_trait::async_trait;
use chrono::NaiveDate;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use uuid::Uuid;

use crate::contract::model::DaySchedule;
use crate::domain::locks::ScheduleKey;
use crate::domain::repo::{ScheduleRepository, WriteOutcome};

#[derive(Debug, Default)]
pub struct InMemoryScheduleRepository {
    days: DashMap<ScheduleKey, DaySchedule>,
}

impl InMemoryScheduleRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored day records.
    pub fn len(&self) -> usize {
        self.days.len()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    fn collect(&self, owner_id: Uuid, keep: impl Fn(NaiveDate) -> bool) -> Vec<DaySchedule> {
        let mut out: Vec<DaySchedule> = self
            .days
            .iter()
            .filter(|e| e.key().0 == owner_id && keep(e.key().1))
            .map(|e| e.value().clone())
            .collect();
        out.sort_by_key(|d| d.date);
        out
    }
}

#[async_trait]
impl ScheduleRepository for InMemoryScheduleRepository {
    async fn find(&self, owner_id: Uuid, date: NaiveDate) -> anyhow::Result<Option<DaySchedule>> {
        Ok(self.days.get(&(owner_id, date)).map(|e| e.value().clone()))
    }

    async fn find_range(
        &self,
        owner_id: Uuid,
        from: NaiveDate,
        to: NaiveDate,
    ) -> anyhow::Result<Vec<DaySchedule>> {
        Ok(self.collect(owner_id, |d| from <= d && d <= to))
    }

    async fn find_by_owner(&self, owner_id: Uuid) -> anyhow::Result<Vec<DaySchedule>> {
        Ok(self.collect(owner_id, |_| true))
    }

    async fn save(&self, schedule: &DaySchedule) -> anyhow::Result<WriteOutcome> {
        let expected = schedule.version.saturating_sub(1);
        match self.days.entry((schedule.owner_id, schedule.date)) {
            Entry::Occupied(mut slot) => {
                if slot.get().version != expected {
                    return Ok(WriteOutcome::VersionConflict);
                }
                slot.insert(schedule.clone());
            }
            Entry::Vacant(slot) => {
                if expected != 0 {
                    return Ok(WriteOutcome::VersionConflict);
                }
                slot.insert(schedule.clone());
            }
        }
        Ok(WriteOutcome::Applied)
    }

    async fn delete(
        &self,
        owner_id: Uuid,
        date: NaiveDate,
        expected_version: u64,
    ) -> anyhow::Result<WriteOutcome> {
        let removed = self
            .days
            .remove_if(&(owner_id, date), |_, day| day.version == expected_version);
        Ok(match removed {
            Some(_) => WriteOutcome::Applied,
            None => WriteOutcome::VersionConflict,
        })
    }
}
