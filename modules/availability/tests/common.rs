#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use chrono::NaiveDate;

use availability::contract::model::{Interval, TimeRange};
use availability::domain::events::AvailabilityEvent;
use availability::domain::ports::EventPublisher;
use availability::domain::repo::ScheduleRepository;
use availability::domain::service::{Service, ServiceConfig};
use availability::infra::events::TracingEventPublisher;
use availability::infra::storage::memory_repo::InMemoryScheduleRepository;

pub fn range(start: &str, end: &str) -> TimeRange {
    TimeRange::parse(start, end).unwrap()
}

pub fn open(start: &str, end: &str) -> Interval {
    Interval::open(range(start, end))
}

/// A day in March 2025.
pub fn date(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 3, day).unwrap()
}

pub fn service() -> Service {
    service_with(ServiceConfig::default())
}

pub fn service_with(config: ServiceConfig) -> Service {
    Service::new(
        Arc::new(InMemoryScheduleRepository::new()),
        Arc::new(TracingEventPublisher),
        config,
    )
}

pub fn service_over(repo: Arc<dyn ScheduleRepository>) -> Service {
    Service::new(repo, Arc::new(TracingEventPublisher), ServiceConfig::default())
}

/// Keeps every published event for later inspection.
#[derive(Default)]
pub struct RecordingPublisher {
    events: Mutex<Vec<AvailabilityEvent>>,
}

impl RecordingPublisher {
    pub fn events(&self) -> Vec<AvailabilityEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl EventPublisher<AvailabilityEvent> for RecordingPublisher {
    fn publish(&self, event: &AvailabilityEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}
