use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Months, Utc};

use super::{ConversationReadRepository, ConversationRef, ExpiredListingCandidate, ListingReadRepository};
use crate::conversation::Conversation;
use crate::error::CollaboratorError;
use crate::listing::Listing;
use crate::unit_of_work::InMemoryStore;

/// Answers listing queries by scanning an [`InMemoryStore`]. Never locks.
pub struct InMemoryListingReadRepository {
    store: Arc<InMemoryStore<Listing>>,
}

impl InMemoryListingReadRepository {
    pub fn new(store: Arc<InMemoryStore<Listing>>) -> Self {
        InMemoryListingReadRepository { store }
    }
}

#[async_trait]
impl ListingReadRepository for InMemoryListingReadRepository {
    async fn get_expired_for_deletion(
        &self,
        threshold_months: u32,
        batch_size: usize,
    ) -> Result<Vec<ExpiredListingCandidate>, CollaboratorError> {
        let now = Utc::now();
        let cutoff = now
            .checked_sub_months(Months::new(threshold_months))
            .ok_or_else(|| {
                CollaboratorError::backend(format!(
                    "archival threshold of {threshold_months} months is out of range"
                ))
            })?;

        let mut expired = self
            .store
            .find(|listing| !listing.is_deleted() && listing.expires_at() < cutoff)?;
        expired.sort_by_key(|listing| listing.expires_at());

        Ok(expired
            .into_iter()
            .take(batch_size)
            .map(|listing| ExpiredListingCandidate {
                id: listing.id().to_string(),
                images: listing.images().to_vec(),
            })
            .collect())
    }
}

/// Answers conversation queries by scanning an [`InMemoryStore`]. Never locks.
pub struct InMemoryConversationReadRepository {
    store: Arc<InMemoryStore<Conversation>>,
}

impl InMemoryConversationReadRepository {
    pub fn new(store: Arc<InMemoryStore<Conversation>>) -> Self {
        InMemoryConversationReadRepository { store }
    }
}

#[async_trait]
impl ConversationReadRepository for InMemoryConversationReadRepository {
    async fn get_by_listing_id(
        &self,
        listing_id: &str,
    ) -> Result<Vec<ConversationRef>, CollaboratorError> {
        let conversations = self
            .store
            .find(|conversation| !conversation.is_deleted() && conversation.listing_id() == listing_id)?;

        Ok(conversations
            .into_iter()
            .map(|conversation| ConversationRef {
                id: conversation.id().to_string(),
                listing_id: conversation.listing_id().to_string(),
            })
            .collect())
    }
}
