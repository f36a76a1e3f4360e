use std::sync::Arc;

use tracing::{debug, instrument, warn};

use super::result::{ConversationRetirementResult, RetirementFailure};
use crate::aggregate::Aggregate;
use crate::authorization::Passport;
use crate::conversation::Conversation;
use crate::error::CollaboratorError;
use crate::queries::ConversationReadRepository;
use crate::unit_of_work::UnitOfWork;

/// Deletes every conversation attached to a listing, one transaction each.
pub struct ConversationRetirement<U> {
    conversations: Arc<dyn ConversationReadRepository>,
    unit_of_work: U,
    passport: Arc<dyn Passport>,
}

impl<U: UnitOfWork<Conversation>> ConversationRetirement<U> {
    pub fn new(
        conversations: Arc<dyn ConversationReadRepository>,
        unit_of_work: U,
        passport: Arc<dyn Passport>,
    ) -> Self {
        ConversationRetirement {
            conversations,
            unit_of_work,
            passport,
        }
    }

    pub fn unit_of_work(&self) -> &U {
        &self.unit_of_work
    }

    /// Only a failed lookup is an `Err`. Per-conversation failures land in
    /// the result and never stop the remaining conversations.
    #[instrument(skip(self), fields(principal = %self.passport.principal()))]
    pub async fn retire_conversations_for_listing(
        &self,
        listing_id: &str,
    ) -> Result<ConversationRetirementResult, CollaboratorError> {
        let conversations = self.conversations.get_by_listing_id(listing_id).await?;
        let mut result = ConversationRetirementResult::default();

        for conversation in conversations {
            match self.retire(&conversation.id).await {
                Ok(()) => {
                    debug!(conversation_id = %conversation.id, "conversation deleted");
                    result.deleted_count += 1;
                    result.deleted_ids.push(conversation.id);
                }
                Err(error) => {
                    warn!(conversation_id = %conversation.id, %error, "failed to delete conversation");
                    result.errors.push(RetirementFailure::new(conversation.id, error));
                }
            }
        }

        Ok(result)
    }

    async fn retire(&self, conversation_id: &str) -> Result<(), CollaboratorError> {
        let passport = self.passport.as_ref();
        self.unit_of_work
            .with_scoped_transaction(|repo| {
                let mut conversation = repo.get(conversation_id)?;
                let visa = passport.for_conversation(&conversation);
                conversation.request_delete(visa.as_ref())?;
                repo.save(conversation)?
                    .map(|_| ())
                    .ok_or_else(|| CollaboratorError::NotFound {
                        aggregate: Conversation::KIND,
                        id: conversation_id.to_string(),
                    })
            })
            .await
    }
}
