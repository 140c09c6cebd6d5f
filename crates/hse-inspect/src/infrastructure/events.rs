//! Event publishers

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::domain::events::DomainEvent;
use crate::ports::outbound::{EventPublisher, StoreResult};

/// Logs every event through `tracing`
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingEventPublisher;

#[async_trait]
impl EventPublisher for TracingEventPublisher {
    async fn publish(&self, events: Vec<DomainEvent>) -> StoreResult<()> {
        for event in &events {
            tracing::info!(
                event_type = event.event_type(),
                aggregate_id = event.aggregate_id(),
                "Domain event"
            );
        }
        Ok(())
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoOpEventPublisher;

#[async_trait]
impl EventPublisher for NoOpEventPublisher {
    async fn publish(&self, _events: Vec<DomainEvent>) -> StoreResult<()> {
        Ok(())
    }
}

/// Keeps published events in memory for inspection in tests
#[derive(Debug, Default)]
pub struct RecordingEventPublisher {
    events: Mutex<Vec<DomainEvent>>,
}

impl RecordingEventPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn event_types(&self) -> Vec<&'static str> {
        self.events.lock().iter().map(DomainEvent::event_type).collect()
    }

    pub fn take(&self) -> Vec<DomainEvent> {
        std::mem::take(&mut *self.events.lock())
    }
}

#[async_trait]
impl EventPublisher for RecordingEventPublisher {
    async fn publish(&self, events: Vec<DomainEvent>) -> StoreResult<()> {
        self.events.lock().extend(events);
        Ok(())
    }
}
