use super::error::RepositoryError;
use crate::entity::Entity;

/// Load a single stream by id.
pub trait GetOne {
    fn get_one(&self, id: &str) -> Result<Option<Entity>, RepositoryError>;
}

/// Find all streams matching a predicate.
pub trait Find {
    fn find<F>(&self, predicate: F) -> Result<Vec<Entity>, RepositoryError>
    where
        F: Fn(&Entity) -> bool;
}

/// Persist the pending tail of a stream.
pub trait Commit {
    fn commit(&self, entity: &mut Entity) -> Result<(), RepositoryError>;
}
