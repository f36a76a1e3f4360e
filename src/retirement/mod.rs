//! Batch retirement of expired listings and their dependents.
//!
//! Both pipelines isolate failures: one bad listing, conversation or image
//! degrades the returned counts and error list, never the whole run.

mod config;
mod conversations;
mod listings;
mod result;

pub use config::{
    RetirementConfig, DEFAULT_ARCHIVAL_THRESHOLD_MONTHS, DEFAULT_BATCH_SIZE, DEFAULT_IMAGE_CONTAINER,
};
pub use conversations::ConversationRetirement;
pub use listings::ExpiredListingRetirement;
pub use result::{ConversationRetirementResult, RetirementFailure, RetirementResult};
