//! Domain event sink trait and implementations.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use super::DomainEvent;
use crate::tenants::PartitionHandle;

/// Trait for receiving domain events.
///
/// Core services await `emit()` after a successful write and before they
/// return, so handlers finish before the caller can issue its next read.
///
/// # Design Rules
///
/// - `emit()` never fails: handler errors are logged inside the sink
/// - Failure to handle an event must not affect the write that raised it
#[async_trait]
pub trait DomainEventSink: Send + Sync {
    /// Emit a single domain event for a partition.
    async fn emit(&self, partition: &PartitionHandle, event: DomainEvent);

    /// Emit multiple domain events in order.
    async fn emit_batch(&self, partition: &PartitionHandle, events: Vec<DomainEvent>) {
        for event in events {
            self.emit(partition, event).await;
        }
    }
}

/// No-op implementation for tests or contexts that don't need events.
#[derive(Clone, Default)]
pub struct NoOpDomainEventSink;

#[async_trait]
impl DomainEventSink for NoOpDomainEventSink {
    async fn emit(&self, _partition: &PartitionHandle, _event: DomainEvent) {}
}

/// Mock sink for testing - collects emitted events with their partition ids.
#[derive(Clone, Default)]
pub struct MockDomainEventSink {
    events: Arc<Mutex<Vec<(String, DomainEvent)>>>,
}

impl MockDomainEventSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns all collected events.
    pub fn events(&self) -> Vec<DomainEvent> {
        self.lock().iter().map(|(_, e)| e.clone()).collect()
    }

    /// Returns collected events together with the partition they targeted.
    pub fn partitioned_events(&self) -> Vec<(String, DomainEvent)> {
        self.lock().clone()
    }

    /// Clears collected events.
    pub fn clear(&self) {
        self.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<(String, DomainEvent)>> {
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl DomainEventSink for MockDomainEventSink {
    async fn emit(&self, partition: &PartitionHandle, event: DomainEvent) {
        self.lock()
            .push((partition.partition_id().to_string(), event));
    }
}
