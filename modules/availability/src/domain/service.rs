use std::sync::Arc;

use chrono::{Days, NaiveDate, Utc};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::contract::model::{
    Availability, DaySchedule, DeleteOptions, DeleteOutcome, Interval, NextOpenSlot,
    PeriodStatistics, ScheduleReport, SlotStatus, SlotUpdate, TimeRange,
};
use crate::domain::aggregator;
use crate::domain::error::DomainError;
use crate::domain::events::AvailabilityEvent;
use crate::domain::locks::KeyedLocks;
use crate::domain::mutator::{self, DeletePolicy};
use crate::domain::ports::EventPublisher;
use crate::domain::repo::{ScheduleRepository, WriteOutcome};
use crate::domain::time::{Granularity, IntervalValidator};

/// Domain service owning the day-schedule invariants.
/// Depends only on the repository port, not on infra types.
#[derive(Clone)]
pub struct Service {
    repo: Arc<dyn ScheduleRepository>,
    events: Arc<dyn EventPublisher<AvailabilityEvent>>,
    locks: Arc<KeyedLocks>,
    validator: IntervalValidator,
    config: ServiceConfig,
}

/// Configuration for the domain service
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub granularity: Granularity,
    pub allow_reservation_override: bool,
    pub next_open_horizon_days: u32,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            granularity: Granularity::Free,
            allow_reservation_override: false,
            next_open_horizon_days: 90,
        }
    }
}

impl Service {
    /// Create a service with dependencies.
    pub fn new(
        repo: Arc<dyn ScheduleRepository>,
        events: Arc<dyn EventPublisher<AvailabilityEvent>>,
        config: ServiceConfig,
    ) -> Self {
        Self {
            repo,
            events,
            locks: Arc::new(KeyedLocks::new()),
            validator: IntervalValidator::new(config.granularity),
            config,
        }
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    // --- mutations ---

    #[instrument(
        name = "availability.service.create_or_merge",
        skip(self, intervals),
        fields(owner_id = %owner_id, date = %date, count = intervals.len())
    )]
    pub async fn create_or_merge(
        &self,
        owner_id: Uuid,
        date: NaiveDate,
        intervals: Vec<Interval>,
    ) -> Result<DaySchedule, DomainError> {
        let _guard = self.locks.acquire((owner_id, date)).await;

        let current = self.load(owner_id, date).await?;
        let existing = current.as_ref().map(|s| s.intervals.as_slice()).unwrap_or(&[]);
        let merged = mutator::merge_insert(existing, intervals, &self.validator)?;

        let created = current.is_none();
        let mut schedule = current.unwrap_or_else(|| DaySchedule::new(owner_id, date, Vec::new()));
        schedule.intervals = merged;
        let saved = self.persist(schedule).await?;

        let event = if created {
            AvailabilityEvent::Created {
                owner_id,
                date,
                at: saved.updated_at,
            }
        } else {
            AvailabilityEvent::Updated {
                owner_id,
                date,
                at: saved.updated_at,
            }
        };
        self.events.publish(&event);

        info!(intervals = saved.intervals.len(), created, "Merged intervals");
        Ok(saved)
    }

    #[instrument(
        name = "availability.service.update_range",
        skip(self, update),
        fields(owner_id = %owner_id, date = %date, range = %range, status = %update.status)
    )]
    pub async fn update_range(
        &self,
        owner_id: Uuid,
        date: NaiveDate,
        range: TimeRange,
        update: SlotUpdate,
    ) -> Result<DaySchedule, DomainError> {
        // Booking through update_range obeys the same activity rule as reserve.
        let require_active = update.status == SlotStatus::Reserved;
        let saved = self
            .split(owner_id, date, range, &update, None, require_active)
            .await?;

        self.events.publish(&AvailabilityEvent::Updated {
            owner_id,
            date,
            at: saved.updated_at,
        });
        info!("Updated range");
        Ok(saved)
    }

    /// Claim `range` for a booking; it must lie inside one OPEN interval.
    #[instrument(
        name = "availability.service.reserve",
        skip(self, reservation_ref),
        fields(owner_id = %owner_id, date = %date, range = %range)
    )]
    pub async fn reserve(
        &self,
        owner_id: Uuid,
        date: NaiveDate,
        range: TimeRange,
        reservation_ref: String,
    ) -> Result<DaySchedule, DomainError> {
        let update = SlotUpdate::reserved(reservation_ref.clone());
        let saved = self
            .split(owner_id, date, range, &update, None, true)
            .await
            .map_err(|e| match e {
                // A range outside every single interval is not fully OPEN.
                DomainError::RangeNotFound { range } => {
                    DomainError::conflict(range, "range does not lie inside one OPEN interval")
                }
                other => other,
            })?;

        self.events.publish(&AvailabilityEvent::Reserved {
            owner_id,
            date,
            range,
            reservation_ref,
            at: saved.updated_at,
        });
        info!("Reserved range");
        Ok(saved)
    }

    /// Return a reserved `range` to OPEN and drop its reference.
    #[instrument(
        name = "availability.service.release",
        skip(self),
        fields(owner_id = %owner_id, date = %date, range = %range)
    )]
    pub async fn release(
        &self,
        owner_id: Uuid,
        date: NaiveDate,
        range: TimeRange,
    ) -> Result<DaySchedule, DomainError> {
        let saved = self
            .split(
                owner_id,
                date,
                range,
                &SlotUpdate::open(),
                Some(SlotStatus::Reserved),
                false,
            )
            .await?;

        self.events.publish(&AvailabilityEvent::Released {
            owner_id,
            date,
            range,
            at: saved.updated_at,
        });
        info!("Released range");
        Ok(saved)
    }

    #[instrument(
        name = "availability.service.delete_ranges",
        skip(self, ranges),
        fields(owner_id = %owner_id, date = %date, ranges = ranges.len())
    )]
    pub async fn delete_ranges(
        &self,
        owner_id: Uuid,
        date: NaiveDate,
        ranges: Vec<TimeRange>,
        options: DeleteOptions,
    ) -> Result<DeleteOutcome, DomainError> {
        if !options.delete_all {
            if ranges.is_empty() {
                return Err(DomainError::validation(
                    "ranges",
                    "at least one range is required unless delete_all is set",
                ));
            }
            for range in &ranges {
                self.validator.validate_range(range)?;
            }
        }

        let force = options.force && self.config.allow_reservation_override;
        if options.force && !force {
            warn!("Reservation override requested but disabled by configuration");
        }
        let policy = DeletePolicy {
            allow_partial: options.partial_permitted(),
            delete_all: options.delete_all,
            force,
        };

        let _guard = self.locks.acquire((owner_id, date)).await;

        let mut schedule = self
            .load(owner_id, date)
            .await?
            .ok_or_else(|| DomainError::schedule_not_found(owner_id, date))?;
        let result = mutator::spanning_delete(&schedule.intervals, &ranges, policy)?;

        let schedule_removed = options.remove_empty && result.intervals.is_empty();
        let at = Utc::now();
        if schedule_removed {
            self.remove(&schedule).await?;
        } else {
            schedule.intervals = result.intervals;
            self.persist(schedule).await?;
        }

        self.events.publish(&AvailabilityEvent::Deleted {
            owner_id,
            date,
            schedule_removed,
            at,
        });

        let outcome = DeleteOutcome {
            deleted_count: result.deleted,
            modified_count: result.modified,
            schedule_removed,
        };
        info!(
            deleted = outcome.deleted_count,
            modified = outcome.modified_count,
            schedule_removed,
            "Deleted ranges"
        );
        Ok(outcome)
    }

    /// Provider-level switch applied to every stored day of `owner_id`.
    /// Returns the number of records whose flag changed.
    #[instrument(
        name = "availability.service.set_active",
        skip(self),
        fields(owner_id = %owner_id, active)
    )]
    pub async fn set_active(&self, owner_id: Uuid, active: bool) -> Result<usize, DomainError> {
        let days = self
            .repo
            .find_by_owner(owner_id)
            .await
            .map_err(|e| DomainError::storage(e.to_string()))?;

        let mut changed = 0;
        for day in days {
            let _guard = self.locks.acquire((owner_id, day.date)).await;
            // Re-read under the lock; the listing above may be stale.
            let Some(mut current) = self.load(owner_id, day.date).await? else {
                continue;
            };
            if current.active == active {
                continue;
            }
            current.active = active;
            self.persist(current).await?;
            changed += 1;
        }

        self.events.publish(&AvailabilityEvent::ActivityChanged {
            owner_id,
            active,
            at: Utc::now(),
        });
        info!(changed, "Changed provider activity");
        Ok(changed)
    }

    // --- reads ---

    #[instrument(
        name = "availability.service.read",
        skip(self),
        fields(owner_id = %owner_id, date = %date)
    )]
    pub async fn read(&self, owner_id: Uuid, date: NaiveDate) -> Result<DaySchedule, DomainError> {
        debug!("Reading day schedule");
        self.load(owner_id, date)
            .await?
            .ok_or_else(|| DomainError::schedule_not_found(owner_id, date))
    }

    #[instrument(
        name = "availability.service.check_available",
        skip(self),
        fields(owner_id = %owner_id, date = %date, range = %range)
    )]
    pub async fn check_available(
        &self,
        owner_id: Uuid,
        date: NaiveDate,
        range: TimeRange,
    ) -> Result<Availability, DomainError> {
        self.validator.validate_range(&range)?;
        let schedule = self.load(owner_id, date).await?;
        let availability = aggregator::availability_in(schedule.as_ref(), range);
        debug!(
            is_available = availability.is_available,
            slots = availability.open_slots.len(),
            "Checked availability"
        );
        Ok(availability)
    }

    #[instrument(
        name = "availability.service.range_query",
        skip(self),
        fields(owner_id = %owner_id, from = %from, to = %to)
    )]
    pub async fn range_query(
        &self,
        owner_id: Uuid,
        from: NaiveDate,
        to: NaiveDate,
        status: Option<SlotStatus>,
    ) -> Result<Vec<DaySchedule>, DomainError> {
        let schedules = self.load_range(owner_id, from, to).await?;
        let filtered = aggregator::filter_by_status(schedules, status);
        debug!("Found {} matching days", filtered.len());
        Ok(filtered)
    }

    #[instrument(
        name = "availability.service.statistics",
        skip(self),
        fields(owner_id = %owner_id, from = %from, to = %to)
    )]
    pub async fn statistics(
        &self,
        owner_id: Uuid,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<PeriodStatistics, DomainError> {
        let schedules = self.load_range(owner_id, from, to).await?;
        Ok(aggregator::statistics(&schedules))
    }

    #[instrument(
        name = "availability.service.schedule",
        skip(self),
        fields(owner_id = %owner_id, from = %from, to = %to)
    )]
    pub async fn schedule(
        &self,
        owner_id: Uuid,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<ScheduleReport, DomainError> {
        let schedules = self.load_range(owner_id, from, to).await?;
        Ok(aggregator::build_report(owner_id, from, to, &schedules))
    }

    /// Scan forward from `from` up to the configured horizon.
    #[instrument(
        name = "availability.service.next_open",
        skip(self),
        fields(owner_id = %owner_id, from = %from)
    )]
    pub async fn next_open(
        &self,
        owner_id: Uuid,
        from: NaiveDate,
    ) -> Result<Option<NextOpenSlot>, DomainError> {
        let horizon = Days::new(u64::from(self.config.next_open_horizon_days));
        let to = from.checked_add_days(horizon).unwrap_or(NaiveDate::MAX);
        let schedules = self.load_range(owner_id, from, to).await?;

        let next = aggregator::first_open(&schedules);
        match &next {
            Some(slot) => debug!(
                date = %slot.date,
                start = %slot.interval.start,
                "Found open slot"
            ),
            None => debug!("No open slot within horizon"),
        }
        Ok(next)
    }

    // --- helpers ---

    /// Locked split-update shared by update_range, reserve and release.
    async fn split(
        &self,
        owner_id: Uuid,
        date: NaiveDate,
        range: TimeRange,
        update: &SlotUpdate,
        expected: Option<SlotStatus>,
        require_active: bool,
    ) -> Result<DaySchedule, DomainError> {
        self.validator.validate_range(&range)?;
        self.validator.validate_update(update)?;

        let _guard = self.locks.acquire((owner_id, date)).await;

        let mut schedule = self
            .load(owner_id, date)
            .await?
            .ok_or_else(|| DomainError::schedule_not_found(owner_id, date))?;
        if require_active && !schedule.active {
            warn!("Refusing to book an inactive schedule");
            return Err(DomainError::conflict(range, "schedule is inactive"));
        }

        schedule.intervals = mutator::split_update(&schedule.intervals, range, update, expected)
            .inspect_err(|e| warn!(error = %e, "Split-update refused"))?;
        self.persist(schedule).await
    }

    async fn load(
        &self,
        owner_id: Uuid,
        date: NaiveDate,
    ) -> Result<Option<DaySchedule>, DomainError> {
        self.repo
            .find(owner_id, date)
            .await
            .map_err(|e| DomainError::storage(e.to_string()))
    }

    async fn load_range(
        &self,
        owner_id: Uuid,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<DaySchedule>, DomainError> {
        if from > to {
            return Err(DomainError::validation(
                "date_range",
                format!("from {from} is after to {to}"),
            ));
        }
        self.repo
            .find_range(owner_id, from, to)
            .await
            .map_err(|e| DomainError::storage(e.to_string()))
    }

    async fn persist(&self, mut schedule: DaySchedule) -> Result<DaySchedule, DomainError> {
        schedule.version += 1;
        schedule.updated_at = Utc::now();

        let outcome = self
            .repo
            .save(&schedule)
            .await
            .map_err(|e| DomainError::storage(e.to_string()))?;
        match outcome {
            WriteOutcome::Applied => Ok(schedule),
            WriteOutcome::VersionConflict => Err(DomainError::concurrent_modification(
                schedule.owner_id,
                schedule.date,
            )),
        }
    }

    async fn remove(&self, schedule: &DaySchedule) -> Result<(), DomainError> {
        let outcome = self
            .repo
            .delete(schedule.owner_id, schedule.date, schedule.version)
            .await
            .map_err(|e| DomainError::storage(e.to_string()))?;
        match outcome {
            WriteOutcome::Applied => Ok(()),
            WriteOutcome::VersionConflict => Err(DomainError::concurrent_modification(
                schedule.owner_id,
                schedule.date,
            )),
        }
    }
}
