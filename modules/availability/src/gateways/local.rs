use async_trait::async_trait;
use chrono::NaiveDate;
use std::sync::Arc;
use uuid::Uuid;

use crate::contract::{
    client::AvailabilityApi,
    error::AvailabilityError,
    model::{
        Availability, DaySchedule, DeleteOptions, DeleteOutcome, Interval, NextOpenSlot,
        PeriodStatistics, ScheduleReport, SlotStatus, SlotUpdate, TimeRange,
    },
};
use crate::domain::service::Service;

/// Local implementation of the AvailabilityApi trait that delegates to the domain service
pub struct AvailabilityLocalClient {
    service: Arc<Service>,
}

impl AvailabilityLocalClient {
    pub fn new(service: Arc<Service>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl AvailabilityApi for AvailabilityLocalClient {
    async fn create_or_merge(
        &self,
        owner_id: Uuid,
        date: NaiveDate,
        intervals: Vec<Interval>,
    ) -> Result<DaySchedule, AvailabilityError> {
        self.service
            .create_or_merge(owner_id, date, intervals)
            .await
            .map_err(Into::into)
    }

    async fn update_range(
        &self,
        owner_id: Uuid,
        date: NaiveDate,
        range: TimeRange,
        update: SlotUpdate,
    ) -> Result<DaySchedule, AvailabilityError> {
        self.service
            .update_range(owner_id, date, range, update)
            .await
            .map_err(Into::into)
    }

    async fn reserve(
        &self,
        owner_id: Uuid,
        date: NaiveDate,
        range: TimeRange,
        reservation_ref: String,
    ) -> Result<DaySchedule, AvailabilityError> {
        self.service
            .reserve(owner_id, date, range, reservation_ref)
            .await
            .map_err(Into::into)
    }

    async fn release(
        &self,
        owner_id: Uuid,
        date: NaiveDate,
        range: TimeRange,
    ) -> Result<DaySchedule, AvailabilityError> {
        self.service
            .release(owner_id, date, range)
            .await
            .map_err(Into::into)
    }

    async fn delete_ranges(
        &self,
        owner_id: Uuid,
        date: NaiveDate,
        ranges: Vec<TimeRange>,
        options: DeleteOptions,
    ) -> Result<DeleteOutcome, AvailabilityError> {
        self.service
            .delete_ranges(owner_id, date, ranges, options)
            .await
            .map_err(Into::into)
    }

    async fn read(
        &self,
        owner_id: Uuid,
        date: NaiveDate,
    ) -> Result<DaySchedule, AvailabilityError> {
        self.service.read(owner_id, date).await.map_err(Into::into)
    }

    async fn check_available(
        &self,
        owner_id: Uuid,
        date: NaiveDate,
        range: TimeRange,
    ) -> Result<Availability, AvailabilityError> {
        self.service
            .check_available(owner_id, date, range)
            .await
            .map_err(Into::into)
    }

    async fn set_active(&self, owner_id: Uuid, active: bool) -> Result<usize, AvailabilityError> {
        self.service
            .set_active(owner_id, active)
            .await
            .map_err(Into::into)
    }

    async fn range_query(
        &self,
        owner_id: Uuid,
        from: NaiveDate,
        to: NaiveDate,
        status: Option<SlotStatus>,
    ) -> Result<Vec<DaySchedule>, AvailabilityError> {
        self.service
            .range_query(owner_id, from, to, status)
            .await
            .map_err(Into::into)
    }

    async fn statistics(
        &self,
        owner_id: Uuid,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<PeriodStatistics, AvailabilityError> {
        self.service
            .statistics(owner_id, from, to)
            .await
            .map_err(Into::into)
    }

    async fn next_open(
        &self,
        owner_id: Uuid,
        from: NaiveDate,
    ) -> Result<Option<NextOpenSlot>, AvailabilityError> {
        self.service.next_open(owner_id, from).await.map_err(Into::into)
    }

    async fn schedule(
        &self,
        owner_id: Uuid,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<ScheduleReport, AvailabilityError> {
        self.service
            .schedule(owner_id, from, to)
            .await
            .map_err(Into::into)
    }
}
