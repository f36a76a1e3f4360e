use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use super::lock::Lock;
use crate::entity::Entity;
use crate::repository::{Commit, Find, GetOne, RepositoryError};

/// Serializes load-mutate-save cycles per aggregate id.
///
/// `get_one` takes the id's lock and leaves it held; a successful `commit`
/// releases it. Callers that give up without committing must call
/// [`QueuedRepository::unlock`].
pub struct QueuedRepository<R> {
    inner: R,
    locks: Mutex<HashMap<String, Arc<Lock>>>,
}

impl<R> QueuedRepository<R> {
    pub fn new(inner: R) -> Self {
        QueuedRepository {
            inner,
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// Access the inner repository (reads through it never lock).
    pub fn inner(&self) -> &R {
        &self.inner
    }

    pub fn unlock(&self, id: impl AsRef<str>) -> Result<(), RepositoryError> {
        self.release(id.as_ref())
    }

    pub fn is_locked(&self, id: impl AsRef<str>) -> Result<bool, RepositoryError> {
        let locks = self.locks()?;
        Ok(locks.get(id.as_ref()).is_some_and(|lock| lock.is_locked()))
    }

    fn locks(&self) -> Result<MutexGuard<'_, HashMap<String, Arc<Lock>>>, RepositoryError> {
        self.locks
            .lock()
            .map_err(|_| RepositoryError::LockPoisoned("queue map"))
    }

    fn ensure_lock(&self, id: &str) -> Result<Arc<Lock>, RepositoryError> {
        Ok(self
            .locks()?
            .entry(id.to_string())
            .or_insert_with(|| Arc::new(Lock::new()))
            .clone())
    }

    /// Unlocks `id` and drops its entry once no caller is waiting on it.
    fn release(&self, id: &str) -> Result<(), RepositoryError> {
        let mut locks = self.locks()?;
        let idle = match locks.get(id) {
            Some(lock) => {
                lock.unlock();
                Arc::strong_count(lock) == 1
            }
            None => false,
        };
        if idle {
            locks.remove(id);
        }
        Ok(())
    }

    #[cfg(test)]
    fn tracked(&self) -> usize {
        self.locks.lock().map(|locks| locks.len()).unwrap_or_default()
    }
}

impl<R: GetOne> GetOne for QueuedRepository<R> {
    fn get_one(&self, id: &str) -> Result<Option<Entity>, RepositoryError> {
        self.ensure_lock(id)?.lock();
        let loaded = self.inner.get_one(id);
        if loaded.is_err() {
            self.release(id)?;
        }
        loaded
    }
}

impl<R: Find> Find for QueuedRepository<R> {
    /// Non-locking; used for read projections.
    fn find<F>(&self, predicate: F) -> Result<Vec<Entity>, RepositoryError>
    where
        F: Fn(&Entity) -> bool,
    {
        self.inner.find(predicate)
    }
}

impl<R: Commit> Commit for QueuedRepository<R> {
    fn commit(&self, entity: &mut Entity) -> Result<(), RepositoryError> {
        self.inner.commit(entity)?;
        self.release(entity.id())
    }
}

/// Wraps a repository in a [`QueuedRepository`].
pub trait Queueable: Sized {
    fn queued(self) -> QueuedRepository<Self> {
        QueuedRepository::new(self)
    }
}

impl<R: GetOne + Commit> Queueable for R {}
