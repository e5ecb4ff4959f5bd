//! SeaORM-backed repository implementation for the domain port.
//!
//! Generic over `C: ConnectionTrait`, so it works with a `DatabaseConnection`
//! or a transaction. Writes are optimistic: each one is conditioned on the
//! stored `version`, so two processes sharing a database cannot both apply a
//! change computed from the same snapshot.

use anyhow::Context;
use chrono::NaiveDate;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, Set,
    SqlErr,
};
use uuid::Uuid;

use crate::contract::model::{DaySchedule, Interval};
use crate::domain::repo::{ScheduleRepository, WriteOutcome};
use crate::infra::storage::entity::{ActiveModel as DayAM, Column, Entity as DayEntity, Model};

/// SeaORM repository impl.
/// Holds a connection object; its lifetime/ownership is up to the caller.
pub struct SeaOrmScheduleRepository<C>
where
    C: ConnectionTrait + Send + Sync,
{
    conn: C,
}

impl<C> SeaOrmScheduleRepository<C>
where
    C: ConnectionTrait + Send + Sync,
{
    pub fn new(conn: C) -> Self {
        Self { conn }
    }
}

impl TryFrom<Model> for DaySchedule {
    type Error = anyhow::Error;

    fn try_from(m: Model) -> Result<Self, Self::Error> {
        let intervals: Vec<Interval> = serde_json::from_str(&m.intervals)
            .with_context(|| format!("corrupt intervals for {} on {}", m.owner_id, m.date))?;
        Ok(DaySchedule {
            owner_id: m.owner_id,
            date: m.date,
            intervals,
            active: m.active,
            version: u64::try_from(m.version).context("negative version")?,
            updated_at: m.updated_at,
        })
    }
}

fn to_active_model(s: &DaySchedule) -> anyhow::Result<DayAM> {
    Ok(DayAM {
        owner_id: Set(s.owner_id),
        date: Set(s.date),
        intervals: Set(serde_json::to_string(&s.intervals).context("encode intervals")?),
        active: Set(s.active),
        version: Set(i64::try_from(s.version).context("version overflow")?),
        updated_at: Set(s.updated_at),
    })
}

fn rows_to_schedules(rows: Vec<Model>) -> anyhow::Result<Vec<DaySchedule>> {
    rows.into_iter().map(DaySchedule::try_from).collect()
}

#[async_trait::async_trait]
impl<C> ScheduleRepository for SeaOrmScheduleRepository<C>
where
    C: ConnectionTrait + Send + Sync + 'static,
{
    async fn find(&self, owner_id: Uuid, date: NaiveDate) -> anyhow::Result<Option<DaySchedule>> {
        let found = DayEntity::find_by_id((owner_id, date))
            .one(&self.conn)
            .await
            .context("find failed")?;
        found.map(DaySchedule::try_from).transpose()
    }

    async fn find_range(
        &self,
        owner_id: Uuid,
        from: NaiveDate,
        to: NaiveDate,
    ) -> anyhow::Result<Vec<DaySchedule>> {
        let rows = DayEntity::find()
            .filter(Column::OwnerId.eq(owner_id))
            .filter(Column::Date.between(from, to))
            .order_by_asc(Column::Date)
            .all(&self.conn)
            .await
            .context("find_range failed")?;
        rows_to_schedules(rows)
    }

    async fn find_by_owner(&self, owner_id: Uuid) -> anyhow::Result<Vec<DaySchedule>> {
        let rows = DayEntity::find()
            .filter(Column::OwnerId.eq(owner_id))
            .order_by_asc(Column::Date)
            .all(&self.conn)
            .await
            .context("find_by_owner failed")?;
        rows_to_schedules(rows)
    }

    async fn save(&self, schedule: &DaySchedule) -> anyhow::Result<WriteOutcome> {
        let m = to_active_model(schedule)?;

        if schedule.version <= 1 {
            return match m.insert(&self.conn).await {
                Ok(_) => Ok(WriteOutcome::Applied),
                Err(e) if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
                    Ok(WriteOutcome::VersionConflict)
                }
                Err(e) => Err(e).context("insert failed"),
            };
        }

        let previous = i64::try_from(schedule.version - 1).context("version overflow")?;
        let res = DayEntity::update_many()
            .set(m)
            .filter(Column::OwnerId.eq(schedule.owner_id))
            .filter(Column::Date.eq(schedule.date))
            .filter(Column::Version.eq(previous))
            .exec(&self.conn)
            .await
            .context("update failed")?;
        Ok(if res.rows_affected == 0 {
            WriteOutcome::VersionConflict
        } else {
            WriteOutcome::Applied
        })
    }

    async fn delete(
        &self,
        owner_id: Uuid,
        date: NaiveDate,
        expected_version: u64,
    ) -> anyhow::Result<WriteOutcome> {
        let expected = i64::try_from(expected_version).context("version overflow")?;
        let res = DayEntity::delete_many()
            .filter(Column::OwnerId.eq(owner_id))
            .filter(Column::Date.eq(date))
            .filter(Column::Version.eq(expected))
            .exec(&self.conn)
            .await
            .context("delete failed")?;
        Ok(if res.rows_affected == 0 {
            WriteOutcome::VersionConflict
        } else {
            WriteOutcome::Applied
        })
    }
}
