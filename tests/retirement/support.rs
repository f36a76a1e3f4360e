use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use lending_core::{
    Aggregate, BlobStorage, CollaboratorError, ConversationReadRepository, ConversationRef,
    ExpiredListingCandidate, InMemoryConversationReadRepository, InMemoryStore,
    InMemoryUnitOfWork, ListingReadRepository, ScopedRepository, UnitOfWork,
};

// =============================================================================
// Listing query
// =============================================================================

pub struct CountingListingReads {
    candidates: Vec<ExpiredListingCandidate>,
    fail: bool,
    calls: AtomicUsize,
}

impl CountingListingReads {
    pub fn new(candidates: Vec<ExpiredListingCandidate>) -> Self {
        CountingListingReads {
            candidates,
            fail: false,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        CountingListingReads {
            fail: true,
            ..Self::new(Vec::new())
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ListingReadRepository for CountingListingReads {
    async fn get_expired_for_deletion(
        &self,
        _threshold_months: u32,
        batch_size: usize,
    ) -> Result<Vec<ExpiredListingCandidate>, CollaboratorError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(CollaboratorError::backend("listing index unavailable"));
        }
        Ok(self.candidates.iter().take(batch_size).cloned().collect())
    }
}

// =============================================================================
// Conversation query
// =============================================================================

pub struct CountingConversationReads {
    inner: InMemoryConversationReadRepository,
    failing_listings: HashSet<String>,
    calls: AtomicUsize,
}

impl CountingConversationReads {
    pub fn new(store: Arc<InMemoryStore<lending_core::Conversation>>) -> Self {
        CountingConversationReads {
            inner: InMemoryConversationReadRepository::new(store),
            failing_listings: HashSet::new(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing_for(mut self, listing_id: &str) -> Self {
        self.failing_listings.insert(listing_id.to_string());
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ConversationReadRepository for CountingConversationReads {
    async fn get_by_listing_id(
        &self,
        listing_id: &str,
    ) -> Result<Vec<ConversationRef>, CollaboratorError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing_listings.contains(listing_id) {
            return Err(CollaboratorError::backend("conversation index unavailable"));
        }
        self.inner.get_by_listing_id(listing_id).await
    }
}

// =============================================================================
// Unit of work
// =============================================================================

/// Counts transactions and injects failures by aggregate id.
pub struct CountingUnitOfWork<A> {
    inner: InMemoryUnitOfWork<A>,
    failing: HashSet<String>,
    vanishing: HashSet<String>,
    transactions: AtomicUsize,
}

impl<A> CountingUnitOfWork<A> {
    pub fn new(store: Arc<InMemoryStore<A>>) -> Self {
        CountingUnitOfWork {
            inner: InMemoryUnitOfWork::new(store),
            failing: HashSet::new(),
            vanishing: HashSet::new(),
            transactions: AtomicUsize::new(0),
        }
    }

    /// Loading `id` fails.
    pub fn failing_on(mut self, id: &str) -> Self {
        self.failing.insert(id.to_string());
        self
    }

    /// Saving `id` reports that it no longer exists.
    pub fn vanishing_on(mut self, id: &str) -> Self {
        self.vanishing.insert(id.to_string());
        self
    }

    pub fn transactions(&self) -> usize {
        self.transactions.load(Ordering::SeqCst)
    }
}

struct FaultyScope<'a, A> {
    inner: &'a mut dyn ScopedRepository<A>,
    failing: &'a HashSet<String>,
    vanishing: &'a HashSet<String>,
}

impl<A: Aggregate> ScopedRepository<A> for FaultyScope<'_, A> {
    fn get(&mut self, id: &str) -> Result<A, CollaboratorError> {
        if self.failing.contains(id) {
            return Err(CollaboratorError::backend(format!("transaction failed for {id}")));
        }
        self.inner.get(id)
    }

    fn save(&mut self, aggregate: A) -> Result<Option<A>, CollaboratorError> {
        if self.vanishing.contains(aggregate.id()) {
            return Ok(None);
        }
        self.inner.save(aggregate)
    }
}

#[async_trait]
impl<A: Aggregate> UnitOfWork<A> for CountingUnitOfWork<A> {
    async fn with_scoped_transaction<T, F>(&self, work: F) -> Result<T, CollaboratorError>
    where
        T: Send,
        F: FnOnce(&mut dyn ScopedRepository<A>) -> Result<T, CollaboratorError> + Send,
    {
        self.transactions.fetch_add(1, Ordering::SeqCst);
        let failing = &self.failing;
        let vanishing = &self.vanishing;
        self.inner
            .with_scoped_transaction(move |repo| {
                let mut scope = FaultyScope {
                    inner: repo,
                    failing,
                    vanishing,
                };
                work(&mut scope)
            })
            .await
    }
}

// =============================================================================
// Blob storage
// =============================================================================

/// Records every attempt and the peak number of concurrent deletions.
#[derive(Default)]
pub struct CountingBlobStorage {
    failing: HashSet<String>,
    attempts: AtomicUsize,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
    deleted: Mutex<Vec<(String, String)>>,
}

impl CountingBlobStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_on(mut self, path: &str) -> Self {
        self.failing.insert(path.to_string());
        self
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    pub fn deleted(&self) -> Vec<(String, String)> {
        self.deleted.lock().unwrap().clone()
    }
}

#[async_trait]
impl BlobStorage for CountingBlobStorage {
    async fn delete_blob(&self, container_name: &str, path: &str) -> Result<(), CollaboratorError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);

        tokio::task::yield_now().await;

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        if self.failing.contains(path) {
            return Err(CollaboratorError::backend(format!("cannot delete {path}")));
        }
        self.deleted
            .lock()
            .unwrap()
            .push((container_name.to_string(), path.to_string()));
        Ok(())
    }
}
