use std::sync::Arc;

use futures::future::join_all;
use futures::stream::{self, StreamExt};
use tracing::{debug, info, instrument, warn};

use super::config::RetirementConfig;
use super::conversations::ConversationRetirement;
use super::result::{RetirementFailure, RetirementResult};
use crate::aggregate::Aggregate;
use crate::authorization::Passport;
use crate::blob::BlobStorage;
use crate::conversation::Conversation;
use crate::error::CollaboratorError;
use crate::listing::Listing;
use crate::queries::{ExpiredListingCandidate, ListingReadRepository};
use crate::unit_of_work::UnitOfWork;

/// Retires listings past their archival threshold together with their
/// images and conversations.
///
/// Candidates are handled one at a time. A failure on one candidate is
/// recorded and the next one proceeds. Images and conversations removed
/// before a failed listing transaction stay removed.
///
/// ```ignore
/// let pipeline = ExpiredListingRetirement::new(listings, listing_uow, conversations, passport)
///     .with_blob_storage(blobs)
///     .with_config(RetirementConfig::new().with_batch_size(50));
/// let result = pipeline.run().await?;
/// ```
pub struct ExpiredListingRetirement<U, C> {
    listings: Arc<dyn ListingReadRepository>,
    unit_of_work: U,
    conversations: ConversationRetirement<C>,
    passport: Arc<dyn Passport>,
    blob_storage: Option<Arc<dyn BlobStorage>>,
    config: RetirementConfig,
}

impl<U, C> ExpiredListingRetirement<U, C>
where
    U: UnitOfWork<Listing>,
    C: UnitOfWork<Conversation>,
{
    pub fn new(
        listings: Arc<dyn ListingReadRepository>,
        unit_of_work: U,
        conversations: ConversationRetirement<C>,
        passport: Arc<dyn Passport>,
    ) -> Self {
        ExpiredListingRetirement {
            listings,
            unit_of_work,
            conversations,
            passport,
            blob_storage: None,
            config: RetirementConfig::default(),
        }
    }

    pub fn with_blob_storage(mut self, blob_storage: Arc<dyn BlobStorage>) -> Self {
        self.blob_storage = Some(blob_storage);
        self
    }

    pub fn with_config(mut self, config: RetirementConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &RetirementConfig {
        &self.config
    }

    pub fn unit_of_work(&self) -> &U {
        &self.unit_of_work
    }

    pub fn conversations(&self) -> &ConversationRetirement<C> {
        &self.conversations
    }

    /// Retire using the configured threshold and batch size.
    pub async fn run(&self) -> Result<RetirementResult, CollaboratorError> {
        self.retire_expired_listings(self.config.archival_threshold_months, self.config.batch_size)
            .await
    }

    /// Only a failed candidate query is an `Err`.
    #[instrument(skip(self), fields(principal = %self.passport.principal()))]
    pub async fn retire_expired_listings(
        &self,
        threshold_months: u32,
        batch_size: usize,
    ) -> Result<RetirementResult, CollaboratorError> {
        let candidates = self
            .listings
            .get_expired_for_deletion(threshold_months, batch_size)
            .await?;

        let mut result = RetirementResult::default();
        if candidates.is_empty() {
            debug!("no expired listings");
            return Ok(result);
        }

        for candidate in candidates {
            self.retire_candidate(candidate, &mut result).await;
        }

        info!(
            deleted = result.deleted_count,
            conversations = result.deleted_conversations_count,
            images = result.deleted_images_count,
            errors = result.errors.len(),
            "listing retirement finished"
        );
        Ok(result)
    }

    async fn retire_candidate(&self, candidate: ExpiredListingCandidate, result: &mut RetirementResult) {
        let listing_id = candidate.id;

        if let Some(blobs) = &self.blob_storage {
            if !candidate.images.is_empty() {
                result.deleted_images_count +=
                    self.delete_images(blobs.as_ref(), &listing_id, &candidate.images).await;
            }
        }

        match self.conversations.retire_conversations_for_listing(&listing_id).await {
            Ok(conversations) => {
                result.deleted_conversations_count += conversations.deleted_count;
                for failure in &conversations.errors {
                    warn!(
                        listing_id = %listing_id,
                        conversation_id = %failure.entity_id,
                        error = %failure.error,
                        "conversation left in place"
                    );
                }
            }
            Err(error) => {
                warn!(listing_id = %listing_id, %error, "could not look up conversations");
            }
        }

        match self.delete_listing(&listing_id).await {
            Ok(()) => {
                debug!(listing_id = %listing_id, "listing deleted");
                result.deleted_count += 1;
                result.deleted_ids.push(listing_id);
            }
            Err(error) => {
                warn!(listing_id = %listing_id, %error, "failed to delete listing");
                result.errors.push(RetirementFailure::new(listing_id, error));
            }
        }
    }

    /// Attempts every deletion and returns how many succeeded.
    async fn delete_images(&self, blobs: &dyn BlobStorage, listing_id: &str, images: &[String]) -> usize {
        let container = self.config.image_container.as_str();
        let attempts = images
            .iter()
            .map(move |path| async move { (path, blobs.delete_blob(container, path).await) });

        let outcomes: Vec<_> = match self.config.max_concurrent_image_deletions {
            None => join_all(attempts).await,
            Some(limit) => stream::iter(attempts).buffer_unordered(limit.max(1)).collect().await,
        };

        let mut deleted = 0;
        for (path, outcome) in outcomes {
            match outcome {
                Ok(()) => deleted += 1,
                Err(error) => {
                    warn!(listing_id = %listing_id, image = %path, %error, "failed to delete image");
                }
            }
        }
        deleted
    }

    async fn delete_listing(&self, listing_id: &str) -> Result<(), CollaboratorError> {
        let passport = self.passport.as_ref();
        self.unit_of_work
            .with_scoped_transaction(|repo| {
                let mut listing = repo.get(listing_id)?;
                let visa = passport.for_listing(&listing);
                listing.request_delete(visa.as_ref())?;
                repo.save(listing)?
                    .map(|_| ())
                    .ok_or_else(|| CollaboratorError::NotFound {
                        aggregate: Listing::KIND,
                        id: listing_id.to_string(),
                    })
            })
            .await
    }
}
