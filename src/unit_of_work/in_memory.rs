use std::sync::Arc;

use async_trait::async_trait;

use super::{ScopedRepository, UnitOfWork};
use crate::aggregate::{Aggregate, AggregateBuilder, AggregateRepository};
use crate::error::CollaboratorError;
use crate::hashmap::HashMapRepository;
use crate::queued::{Queueable, QueuedRepository};

/// Locking in-memory store for one aggregate type.
pub type InMemoryStore<A> = AggregateRepository<QueuedRepository<HashMapRepository>, A>;

pub fn in_memory_store<A: Aggregate>() -> Arc<InMemoryStore<A>> {
    Arc::new(HashMapRepository::new().queued().aggregate())
}

/// [`UnitOfWork`] over an [`InMemoryStore`].
///
/// `get` takes the aggregate's lock and `save` releases it. Anything still
/// held when the closure returns is unlocked when the scope is dropped. Locks
/// are not reentrant: loading the same id twice in one transaction blocks.
pub struct InMemoryUnitOfWork<A> {
    store: Arc<InMemoryStore<A>>,
}

impl<A> InMemoryUnitOfWork<A> {
    pub fn new(store: Arc<InMemoryStore<A>>) -> Self {
        InMemoryUnitOfWork { store }
    }

    pub fn store(&self) -> &Arc<InMemoryStore<A>> {
        &self.store
    }
}

impl<A> Clone for InMemoryUnitOfWork<A> {
    fn clone(&self) -> Self {
        InMemoryUnitOfWork {
            store: Arc::clone(&self.store),
        }
    }
}

struct TransactionScope<'a, A> {
    store: &'a InMemoryStore<A>,
    held: Vec<String>,
}

impl<A: Aggregate> ScopedRepository<A> for TransactionScope<'_, A> {
    fn get(&mut self, id: &str) -> Result<A, CollaboratorError> {
        match self.store.get(id) {
            Ok(Some(aggregate)) => {
                self.held.push(id.to_string());
                Ok(aggregate)
            }
            Ok(None) => {
                self.store.abort(id)?;
                Err(CollaboratorError::NotFound {
                    aggregate: A::KIND,
                    id: id.to_string(),
                })
            }
            Err(err) => {
                // A replay failure happens after the lock was taken.
                self.store.abort(id)?;
                Err(err.into())
            }
        }
    }

    fn save(&mut self, mut aggregate: A) -> Result<Option<A>, CollaboratorError> {
        let id = aggregate.id().to_string();
        if !self.store.repo().inner().contains(&id)? {
            return Ok(None);
        }

        self.store.commit(&mut aggregate)?;
        self.held.retain(|held| *held != id);
        Ok(Some(aggregate))
    }
}

impl<A> Drop for TransactionScope<'_, A> {
    fn drop(&mut self) {
        for id in self.held.drain(..) {
            if let Err(err) = self.store.repo().unlock(&id) {
                tracing::warn!(id = %id, error = %err, "failed to release transaction lock");
            }
        }
    }
}

#[async_trait]
impl<A: Aggregate> UnitOfWork<A> for InMemoryUnitOfWork<A> {
    async fn with_scoped_transaction<T, F>(&self, work: F) -> Result<T, CollaboratorError>
    where
        T: Send,
        F: FnOnce(&mut dyn ScopedRepository<A>) -> Result<T, CollaboratorError> + Send,
    {
        let mut scope = TransactionScope {
            store: self.store.as_ref(),
            held: Vec::new(),
        };
        work(&mut scope)
    }
}
