mod aggregate;
mod authorization;
mod blob;
mod conversation;
mod entity;
mod error;
mod events;
mod hashmap;
mod listing;
mod queries;
mod queued;
mod repository;
mod reservation;
mod retirement;
mod unit_of_work;

pub use aggregate::{hydrate, Aggregate, AggregateBuilder, AggregateRepository, Unsaved};
pub use authorization::{
    ConversationPermissions, ListingPermissions, Passport, PermissionSnapshot, Principal,
    ReservationRequestPermissions, SnapshotPassport, SnapshotVisa, Visa,
};
pub use blob::{BlobStorage, InMemoryBlobStorage};
pub use conversation::Conversation;
pub use entity::{Entity, EventRecord, PayloadError};
pub use error::{CollaboratorError, DomainError};
pub use events::{EventPublisher, LogPublisher, NoopPublisher};
pub use hashmap::HashMapRepository;
pub use listing::Listing;
pub use queries::{
    ConversationReadRepository, ConversationRef, ExpiredListingCandidate,
    InMemoryConversationReadRepository, InMemoryListingReadRepository, ListingReadRepository,
};
pub use queued::{Queueable, QueuedRepository};
pub use repository::{Commit, Find, GetOne, RepositoryError};
pub use reservation::{ReservationPeriod, ReservationRequest, ReservationState};
pub use retirement::{
    ConversationRetirement, ConversationRetirementResult, ExpiredListingRetirement,
    RetirementConfig, RetirementFailure, RetirementResult, DEFAULT_ARCHIVAL_THRESHOLD_MONTHS,
    DEFAULT_BATCH_SIZE, DEFAULT_IMAGE_CONTAINER,
};
pub use unit_of_work::{
    in_memory_store, InMemoryStore, InMemoryUnitOfWork, ScopedRepository, UnitOfWork,
};

#[cfg(feature = "emitter")]
pub use events::LocalEmitterPublisher;

// Re-export the EventEmitter so subscribers need not depend on event_emitter_rs
#[cfg(feature = "emitter")]
pub use event_emitter_rs::EventEmitter;
