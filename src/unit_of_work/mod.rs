//! Scoped load-mutate-save transactions over one aggregate type.

mod in_memory;

pub use in_memory::{in_memory_store, InMemoryStore, InMemoryUnitOfWork};

use async_trait::async_trait;

use crate::aggregate::Aggregate;
use crate::error::CollaboratorError;

/// The repository handed to a transaction's closure.
pub trait ScopedRepository<A> {
    /// Load an aggregate for mutation. A missing id is `NotFound`.
    fn get(&mut self, id: &str) -> Result<A, CollaboratorError>;

    /// Persist a loaded aggregate. `Ok(None)` means the aggregate no longer
    /// exists in the store; callers must treat that as not found.
    fn save(&mut self, aggregate: A) -> Result<Option<A>, CollaboratorError>;
}

/// Runs `work` inside a transaction. Everything the closure loaded is
/// released when the call returns, on success and on failure alike.
#[async_trait]
pub trait UnitOfWork<A: Aggregate>: Send + Sync {
    async fn with_scoped_transaction<T, F>(&self, work: F) -> Result<T, CollaboratorError>
    where
        T: Send,
        F: FnOnce(&mut dyn ScopedRepository<A>) -> Result<T, CollaboratorError> + Send;
}
