#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RepositoryError {
    #[error("repository lock poisoned during {0}")]
    LockPoisoned(&'static str),

    #[error("concurrent write detected for entity {id} (expected version {expected}, got {actual})")]
    ConcurrentWrite {
        id: String,
        expected: u64,
        actual: u64,
    },

    #[error("replay error for {id}: {message}")]
    Replay { id: String, message: String },
}
