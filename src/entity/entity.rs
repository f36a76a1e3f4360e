use serde::{Deserialize, Serialize};

use super::{EventRecord, PayloadError};

/// The event stream backing one aggregate instance.
///
/// `committed_version` marks how much of the stream has already been
/// persisted; everything after it is pending and goes out with the next
/// commit.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Entity {
    id: String,
    version: u64,
    events: Vec<EventRecord>,
    #[serde(skip, default)]
    committed_version: u64,
}

impl Entity {
    pub fn new() -> Self {
        Entity::default()
    }

    pub fn with_id(id: impl Into<String>) -> Self {
        Entity {
            id: id.into(),
            ..Entity::default()
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn committed_version(&self) -> u64 {
        self.committed_version
    }

    pub fn events(&self) -> &[EventRecord] {
        &self.events
    }

    /// Returns events added since the entity was loaded (not yet persisted).
    pub fn new_events(&self) -> &[EventRecord] {
        &self.events[self.committed_version as usize..]
    }

    /// Mark all current events as committed. Called by repository after successful commit.
    pub fn mark_committed(&mut self) {
        self.committed_version = self.version;
    }

    /// Record an event with a serializable payload.
    ///
    /// Nothing is appended when encoding fails, so callers can digest before
    /// touching their own fields and keep the aggregate untouched on error.
    pub fn digest<T: Serialize>(
        &mut self,
        name: impl Into<String>,
        payload: &T,
    ) -> Result<(), PayloadError> {
        let sequence = self.events.len() as u64 + 1;
        let record = EventRecord::encode(name, payload, sequence)?;
        self.events.push(record);
        self.version = sequence;
        Ok(())
    }

    pub fn load_from_history(&mut self, history: Vec<EventRecord>) {
        self.events = history;
        self.version = self.events.len() as u64;
        self.committed_version = self.version;
    }
}
