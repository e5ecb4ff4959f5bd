use async_trait::async_trait;
use chrono::NaiveDate;
use uuid::Uuid;

use crate::contract::{
    error::AvailabilityError,
    model::{
        Availability, DaySchedule, DeleteOptions, DeleteOutcome, Interval, NextOpenSlot,
        PeriodStatistics, ScheduleReport, SlotStatus, SlotUpdate, TimeRange,
    },
};

/// Public API trait for the availability module that other modules can use
#[async_trait]
pub trait AvailabilityApi: Send + Sync {
    /// Add intervals to a day, creating the day record on first use
    async fn create_or_merge(
        &self,
        owner_id: Uuid,
        date: NaiveDate,
        intervals: Vec<Interval>,
    ) -> Result<DaySchedule, AvailabilityError>;

    /// Re-label `range` inside the single interval that contains it
    async fn update_range(
        &self,
        owner_id: Uuid,
        date: NaiveDate,
        range: TimeRange,
        update: SlotUpdate,
    ) -> Result<DaySchedule, AvailabilityError>;

    /// Reserve an OPEN range under a booking reference
    async fn reserve(
        &self,
        owner_id: Uuid,
        date: NaiveDate,
        range: TimeRange,
        reservation_ref: String,
    ) -> Result<DaySchedule, AvailabilityError>;

    /// Turn a reserved range back to OPEN
    async fn release(
        &self,
        owner_id: Uuid,
        date: NaiveDate,
        range: TimeRange,
    ) -> Result<DaySchedule, AvailabilityError>;

    /// Remove or trim intervals
    async fn delete_ranges(
        &self,
        owner_id: Uuid,
        date: NaiveDate,
        ranges: Vec<TimeRange>,
        options: DeleteOptions,
    ) -> Result<DeleteOutcome, AvailabilityError>;

    /// Get one stored day
    async fn read(&self, owner_id: Uuid, date: NaiveDate)
        -> Result<DaySchedule, AvailabilityError>;

    async fn check_available(
        &self,
        owner_id: Uuid,
        date: NaiveDate,
        range: TimeRange,
    ) -> Result<Availability, AvailabilityError>;

    /// Flip the active flag on every stored day of a provider
    async fn set_active(&self, owner_id: Uuid, active: bool) -> Result<usize, AvailabilityError>;

    /// Stored days in `[from, to]`, optionally restricted to one status
    async fn range_query(
        &self,
        owner_id: Uuid,
        from: NaiveDate,
        to: NaiveDate,
        status: Option<SlotStatus>,
    ) -> Result<Vec<DaySchedule>, AvailabilityError>;

    async fn statistics(
        &self,
        owner_id: Uuid,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<PeriodStatistics, AvailabilityError>;

    async fn next_open(
        &self,
        owner_id: Uuid,
        from: NaiveDate,
    ) -> Result<Option<NextOpenSlot>, AvailabilityError>;

    /// Day-by-day breakdown with a summary for the period
    async fn schedule(
        &self,
        owner_id: Uuid,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<ScheduleReport, AvailabilityError>;
}
