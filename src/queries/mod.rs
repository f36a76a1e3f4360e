//! Read-only query boundaries consumed by the retirement pipelines.

mod in_memory;

pub use in_memory::{InMemoryConversationReadRepository, InMemoryListingReadRepository};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::CollaboratorError;

/// A listing past its archival threshold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpiredListingCandidate {
    pub id: String,
    pub images: Vec<String>,
}

/// A conversation attached to a listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationRef {
    pub id: String,
    pub listing_id: String,
}

#[async_trait]
pub trait ListingReadRepository: Send + Sync {
    /// Live listings that expired more than `threshold_months` ago, oldest
    /// first, at most `batch_size` of them.
    async fn get_expired_for_deletion(
        &self,
        threshold_months: u32,
        batch_size: usize,
    ) -> Result<Vec<ExpiredListingCandidate>, CollaboratorError>;
}

#[async_trait]
pub trait ConversationReadRepository: Send + Sync {
    /// Live conversations for `listing_id`.
    async fn get_by_listing_id(
        &self,
        listing_id: &str,
    ) -> Result<Vec<ConversationRef>, CollaboratorError>;
}
