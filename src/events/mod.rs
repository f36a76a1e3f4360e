//! Post-commit publishing of domain events.
//!
//! Aggregates record their transitions as [`EventRecord`]s. Once a commit has
//! been written, the repository hands each newly committed record to its
//! [`EventPublisher`]. Publishing is fire-and-forget: the commit has already
//! happened, so a publisher has no way to fail it.

mod publisher;

pub use publisher::{EventPublisher, LogPublisher, NoopPublisher};

#[cfg(feature = "emitter")]
pub use publisher::LocalEmitterPublisher;

use crate::entity::EventRecord;
