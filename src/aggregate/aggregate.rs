use std::marker::PhantomData;
use std::ops::Deref;

use crate::entity::{Entity, EventRecord, PayloadError};
use crate::queued::QueuedRepository;
use crate::repository::{Commit, Find, GetOne, RepositoryError};

/// Trait for domain aggregates backed by an event stream.
pub trait Aggregate: Sized {
    /// Human-readable aggregate name, used in errors and logs.
    const KIND: &'static str;

    fn entity(&self) -> &Entity;
    fn entity_mut(&mut self) -> &mut Entity;

    /// Build the aggregate from the first event of its stream.
    fn genesis(event: &EventRecord) -> Result<Self, PayloadError>;

    /// Apply a later event during replay. No authorization applies here.
    fn replay_event(&mut self, event: &EventRecord) -> Result<(), PayloadError>;

    fn id(&self) -> &str {
        self.entity().id()
    }
}

#[macro_export]
macro_rules! impl_aggregate {
    ($ty:ty, $entity:ident, $kind:literal, $genesis:ident, $replay:ident) => {
        impl $crate::Aggregate for $ty {
            const KIND: &'static str = $kind;

            fn entity(&self) -> &$crate::Entity {
                &self.$entity
            }

            fn entity_mut(&mut self) -> &mut $crate::Entity {
                &mut self.$entity
            }

            fn genesis(event: &$crate::EventRecord) -> Result<Self, $crate::PayloadError> {
                Self::$genesis(event)
            }

            fn replay_event(
                &mut self,
                event: &$crate::EventRecord,
            ) -> Result<(), $crate::PayloadError> {
                Self::$replay(self, event)
            }
        }
    };
}

/// Rebuild an aggregate by replaying its stream.
pub fn hydrate<A: Aggregate>(entity: Entity) -> Result<A, RepositoryError> {
    let replay_error = |message: String| RepositoryError::Replay {
        id: entity.id().to_string(),
        message,
    };

    let (first, rest) = entity
        .events()
        .split_first()
        .ok_or_else(|| replay_error(format!("empty {} stream", A::KIND)))?;

    let mut aggregate = A::genesis(first).map_err(|e| replay_error(e.to_string()))?;
    for event in rest {
        aggregate
            .replay_event(event)
            .map_err(|e| replay_error(e.to_string()))?;
    }

    *aggregate.entity_mut() = entity;
    Ok(aggregate)
}

/// A freshly created aggregate that has never been persisted.
///
/// Factories return this instead of the bare aggregate. It can be inspected
/// but not mutated, and only [`AggregateRepository::commit_new`] unwraps it.
#[derive(Debug)]
pub struct Unsaved<A>(A);

impl<A> Unsaved<A> {
    pub(crate) fn new(aggregate: A) -> Self {
        Unsaved(aggregate)
    }

    fn into_inner(self) -> A {
        self.0
    }
}

impl<A> Deref for Unsaved<A> {
    type Target = A;

    fn deref(&self) -> &A {
        &self.0
    }
}

/// Builder trait for creating typed aggregate repositories.
pub trait AggregateBuilder: Sized {
    fn aggregate<A: Aggregate>(self) -> AggregateRepository<Self, A> {
        AggregateRepository::new(self)
    }
}

impl<T> AggregateBuilder for T {}

/// A repository wrapper that provides typed access to a specific aggregate type.
pub struct AggregateRepository<R, A> {
    repo: R,
    _marker: PhantomData<fn() -> A>,
}

impl<R, A> AggregateRepository<R, A> {
    pub fn new(repo: R) -> Self {
        AggregateRepository {
            repo,
            _marker: PhantomData,
        }
    }

    pub fn repo(&self) -> &R {
        &self.repo
    }
}

impl<R: GetOne, A: Aggregate> AggregateRepository<R, A> {
    pub fn get(&self, id: &str) -> Result<Option<A>, RepositoryError> {
        self.repo.get_one(id)?.map(hydrate::<A>).transpose()
    }
}

impl<R: Find, A: Aggregate> AggregateRepository<R, A> {
    /// Find all aggregates matching a predicate.
    pub fn find<F>(&self, predicate: F) -> Result<Vec<A>, RepositoryError>
    where
        F: Fn(&A) -> bool,
    {
        let mut results = Vec::new();
        for entity in self.repo.find(|_| true)? {
            let aggregate = hydrate::<A>(entity)?;
            if predicate(&aggregate) {
                results.push(aggregate);
            }
        }
        Ok(results)
    }
}

impl<R: Commit, A: Aggregate> AggregateRepository<R, A> {
    pub fn commit(&self, aggregate: &mut A) -> Result<(), RepositoryError> {
        self.repo.commit(aggregate.entity_mut())
    }

    /// First save of a new aggregate. Returns the persisted aggregate.
    pub fn commit_new(&self, unsaved: Unsaved<A>) -> Result<A, RepositoryError> {
        let mut aggregate = unsaved.into_inner();
        self.repo.commit(aggregate.entity_mut())?;
        Ok(aggregate)
    }
}

impl<R: GetOne, A: Aggregate> AggregateRepository<QueuedRepository<R>, A> {
    /// Release the lock taken by `get` without committing.
    pub fn abort(&self, id: &str) -> Result<(), RepositoryError> {
        self.repo.unlock(id)
    }

    /// Non-locking read.
    pub fn peek(&self, id: &str) -> Result<Option<A>, RepositoryError> {
        self.repo.inner().get_one(id)?.map(hydrate::<A>).transpose()
    }
}
