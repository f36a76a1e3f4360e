use std::sync::{Arc, Mutex, PoisonError};

use super::EventRecord;

/// Receives events after they have been committed.
pub trait EventPublisher: Send + Sync {
    fn publish(&self, aggregate_id: &str, event: &EventRecord);
}

/// Default publisher. Drops everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopPublisher;

impl EventPublisher for NoopPublisher {
    fn publish(&self, _aggregate_id: &str, _event: &EventRecord) {}
}

/// Logs every event through `tracing`, optionally mirroring the line into a buffer.
#[derive(Debug, Default, Clone)]
pub struct LogPublisher {
    buffer: Option<Arc<Mutex<Vec<String>>>>,
}

impl LogPublisher {
    pub fn new() -> Self {
        LogPublisher { buffer: None }
    }

    pub fn with_buffer(buffer: Arc<Mutex<Vec<String>>>) -> Self {
        LogPublisher {
            buffer: Some(buffer),
        }
    }
}

impl EventPublisher for LogPublisher {
    fn publish(&self, aggregate_id: &str, event: &EventRecord) {
        tracing::info!(
            aggregate_id,
            event = %event.event_name,
            sequence = event.sequence,
            "domain event committed"
        );
        if let Some(buffer) = &self.buffer {
            let line = format!("[EVENT] {} {} #{}", event.event_name, aggregate_id, event.sequence);
            buffer
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(line);
        }
    }
}

/// Re-emits committed events on an in-process `EventEmitter`, using the
/// aggregate id as the payload.
#[cfg(feature = "emitter")]
pub struct LocalEmitterPublisher {
    emitter: Mutex<event_emitter_rs::EventEmitter>,
}

#[cfg(feature = "emitter")]
impl LocalEmitterPublisher {
    pub fn new(emitter: event_emitter_rs::EventEmitter) -> Self {
        LocalEmitterPublisher {
            emitter: Mutex::new(emitter),
        }
    }
}

#[cfg(feature = "emitter")]
impl EventPublisher for LocalEmitterPublisher {
    fn publish(&self, aggregate_id: &str, event: &EventRecord) {
        self.emitter
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .emit(&event.event_name, aggregate_id.to_string());
    }
}
