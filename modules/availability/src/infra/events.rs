//! Adapters implementing the `EventPublisher` port.

use std::sync::Arc;

use tokio::sync::broadcast;
use tracing::info;

use crate::domain::{events::AvailabilityEvent, ports::EventPublisher};

/// Writes each event as a structured log line.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingEventPublisher;

impl EventPublisher<AvailabilityEvent> for TracingEventPublisher {
    fn publish(&self, event: &AvailabilityEvent) {
        match event {
            AvailabilityEvent::Created { owner_id, date, .. } => {
                info!(%owner_id, %date, "availability.created");
            }
            AvailabilityEvent::Updated { owner_id, date, .. } => {
                info!(%owner_id, %date, "availability.updated");
            }
            AvailabilityEvent::Reserved {
                owner_id,
                date,
                range,
                reservation_ref,
                ..
            } => {
                info!(%owner_id, %date, %range, %reservation_ref, "availability.reserved");
            }
            AvailabilityEvent::Released {
                owner_id,
                date,
                range,
                ..
            } => {
                info!(%owner_id, %date, %range, "availability.released");
            }
            AvailabilityEvent::Deleted {
                owner_id,
                date,
                schedule_removed,
                ..
            } => {
                info!(%owner_id, %date, schedule_removed, "availability.deleted");
            }
            AvailabilityEvent::ActivityChanged {
                owner_id, active, ..
            } => {
                info!(%owner_id, active, "availability.activity_changed");
            }
        }
    }
}

/// Fans events out to in-process subscribers.
///
/// Publishing never blocks; with no subscriber the event is dropped and slow
/// receivers observe `RecvError::Lagged`.
#[derive(Debug, Clone)]
pub struct BroadcastEventPublisher {
    tx: broadcast::Sender<AvailabilityEvent>,
}

impl BroadcastEventPublisher {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<AvailabilityEvent> {
        self.tx.subscribe()
    }
}

impl EventPublisher<AvailabilityEvent> for BroadcastEventPublisher {
    fn publish(&self, event: &AvailabilityEvent) {
        let _ = self.tx.send(event.clone());
    }
}

/// Forwards every event to each inner publisher in order.
#[derive(Clone, Default)]
pub struct FanoutEventPublisher {
    sinks: Vec<Arc<dyn EventPublisher<AvailabilityEvent>>>,
}

impl FanoutEventPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, sink: Arc<dyn EventPublisher<AvailabilityEvent>>) -> Self {
        self.sinks.push(sink);
        self
    }
}

impl EventPublisher<AvailabilityEvent> for FanoutEventPublisher {
    fn publish(&self, event: &AvailabilityEvent) {
        for sink in &self.sinks {
            sink.publish(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Utc};
    use uuid::Uuid;

    #[tokio::test]
    async fn subscribers_receive_published_events() {
        let publisher = BroadcastEventPublisher::new(8);
        let mut rx = publisher.subscribe();

        let event = AvailabilityEvent::Created {
            owner_id: Uuid::nil(),
            date: NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
            at: Utc::now(),
        };
        publisher.publish(&event);

        assert_eq!(rx.recv().await.unwrap(), event);
    }

    #[tokio::test]
    async fn fanout_reaches_every_sink() {
        let a = BroadcastEventPublisher::new(4);
        let b = BroadcastEventPublisher::new(4);
        let (mut rx_a, mut rx_b) = (a.subscribe(), b.subscribe());
        let fanout = FanoutEventPublisher::new()
            .with(Arc::new(TracingEventPublisher))
            .with(Arc::new(a))
            .with(Arc::new(b));

        let event = AvailabilityEvent::ActivityChanged {
            owner_id: Uuid::nil(),
            active: true,
            at: Utc::now(),
        };
        fanout.publish(&event);

        assert_eq!(rx_a.recv().await.unwrap(), event);
        assert_eq!(rx_b.recv().await.unwrap(), event);
    }

    #[test]
    fn publishing_without_subscribers_is_silent() {
        let publisher = BroadcastEventPublisher::new(1);
        publisher.publish(&AvailabilityEvent::ActivityChanged {
            owner_id: Uuid::nil(),
            active: false,
            at: Utc::now(),
        });
    }
}
