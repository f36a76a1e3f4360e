use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::entity::{Entity, EventRecord};
use crate::events::{EventPublisher, NoopPublisher};
use crate::repository::{Commit, Find, GetOne, RepositoryError};

/// In-memory event store keyed by aggregate id.
///
/// Commits are optimistic: a stream is only written when the stored length
/// still matches the version the entity was loaded at.
pub struct HashMapRepository {
    storage: RwLock<HashMap<String, Vec<EventRecord>>>,
    publisher: Arc<dyn EventPublisher>,
}

impl Default for HashMapRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl HashMapRepository {
    pub fn new() -> Self {
        HashMapRepository {
            storage: RwLock::new(HashMap::new()),
            publisher: Arc::new(NoopPublisher),
        }
    }

    pub fn with_publisher(publisher: impl EventPublisher + 'static) -> Self {
        HashMapRepository {
            storage: RwLock::new(HashMap::new()),
            publisher: Arc::new(publisher),
        }
    }

    /// Whether a stream exists for `id`.
    pub fn contains(&self, id: &str) -> Result<bool, RepositoryError> {
        let storage = self
            .storage
            .read()
            .map_err(|_| RepositoryError::LockPoisoned("read"))?;
        Ok(storage.contains_key(id))
    }
}

fn to_entity(id: &str, events: &[EventRecord]) -> Entity {
    let mut entity = Entity::with_id(id);
    entity.load_from_history(events.to_vec());
    entity
}

impl GetOne for HashMapRepository {
    fn get_one(&self, id: &str) -> Result<Option<Entity>, RepositoryError> {
        let storage = self
            .storage
            .read()
            .map_err(|_| RepositoryError::LockPoisoned("read"))?;
        Ok(storage.get(id).map(|events| to_entity(id, events)))
    }
}

impl Find for HashMapRepository {
    fn find<F>(&self, predicate: F) -> Result<Vec<Entity>, RepositoryError>
    where
        F: Fn(&Entity) -> bool,
    {
        let storage = self
            .storage
            .read()
            .map_err(|_| RepositoryError::LockPoisoned("find"))?;
        let mut found: Vec<Entity> = storage
            .iter()
            .map(|(id, events)| to_entity(id, events))
            .filter(|entity| predicate(entity))
            .collect();
        // HashMap order is arbitrary; callers get creation order.
        found.sort_by_key(|entity| {
            (
                entity.events().first().map(|e| e.recorded_at),
                entity.id().to_string(),
            )
        });
        Ok(found)
    }
}

impl Commit for HashMapRepository {
    fn commit(&self, entity: &mut Entity) -> Result<(), RepositoryError> {
        let published: Vec<EventRecord> = {
            let mut storage = self
                .storage
                .write()
                .map_err(|_| RepositoryError::LockPoisoned("write"))?;

            let stored = storage.get(entity.id()).map_or(0, |events| events.len() as u64);
            if stored != entity.committed_version() {
                return Err(RepositoryError::ConcurrentWrite {
                    id: entity.id().to_string(),
                    expected: entity.committed_version(),
                    actual: stored,
                });
            }

            storage.insert(entity.id().to_string(), entity.events().to_vec());
            entity.new_events().to_vec()
        };
        entity.mark_committed();

        for event in &published {
            self.publisher.publish(entity.id(), event);
        }

        Ok(())
    }
}
