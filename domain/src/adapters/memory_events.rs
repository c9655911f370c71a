use std::sync::Mutex;

use crate::{CoreError, EventPublisher, ProductEvent};

/// In-memory event publisher for tests; keeps every event in publish order.
pub struct InMemoryEventPublisher {
    events: Mutex<Vec<ProductEvent>>,
}

impl InMemoryEventPublisher {
    pub fn new() -> Self {
        Self {
            events: Mutex::new(Vec::new()),
        }
    }

    /// Snapshot of the events published so far.
    pub fn events(&self) -> Vec<ProductEvent> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }
}

impl Default for InMemoryEventPublisher {
    fn default() -> Self {
        Self::new()
    }
}

impl EventPublisher for InMemoryEventPublisher {
    fn publish(&self, event: &ProductEvent) -> Result<(), CoreError> {
        let mut events = self
            .events
            .lock()
            .map_err(|_| CoreError::Publish("mutex poisoned".into()))?;
        events.push(event.clone());
        Ok(())
    }
}
