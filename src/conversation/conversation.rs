use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::aggregate::Unsaved;
use crate::authorization::{ConversationPermissions, Visa};
use crate::entity::{Entity, EventRecord, PayloadError};
use crate::error::DomainError;
use crate::impl_aggregate;

const SCHEMA_VERSION: u32 = 1;

const CREATED: &str = "ConversationCreated";
const DELETED: &str = "ConversationDeleted";

#[derive(Serialize, Deserialize)]
struct Created {
    listing_id: String,
    sharer_id: String,
    reserver_id: String,
    schema_version: u32,
    at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize)]
struct Deleted {
    at: DateTime<Utc>,
}

/// A message thread between a listing's sharer and a would-be reserver.
#[derive(Debug, Clone)]
pub struct Conversation {
    entity: Entity,
    listing_id: String,
    sharer_id: String,
    reserver_id: String,
    deleted: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    schema_version: u32,
}

impl Conversation {
    pub fn create(
        listing_id: impl Into<String>,
        sharer_id: impl Into<String>,
        reserver_id: impl Into<String>,
    ) -> Result<Unsaved<Self>, DomainError> {
        let created = Created {
            listing_id: listing_id.into(),
            sharer_id: sharer_id.into(),
            reserver_id: reserver_id.into(),
            schema_version: SCHEMA_VERSION,
            at: Utc::now(),
        };

        let mut entity = Entity::with_id(Uuid::new_v4().to_string());
        entity.digest(CREATED, &created)?;

        let mut conversation = Self::from_created(created);
        conversation.entity = entity;
        Ok(Unsaved::new(conversation))
    }

    fn from_created(created: Created) -> Self {
        Conversation {
            entity: Entity::new(),
            listing_id: created.listing_id,
            sharer_id: created.sharer_id,
            reserver_id: created.reserver_id,
            deleted: false,
            created_at: created.at,
            updated_at: created.at,
            schema_version: created.schema_version,
        }
    }

    pub fn id(&self) -> &str {
        self.entity.id()
    }

    pub fn listing_id(&self) -> &str {
        &self.listing_id
    }

    pub fn sharer_id(&self) -> &str {
        &self.sharer_id
    }

    pub fn reserver_id(&self) -> &str {
        &self.reserver_id
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn schema_version(&self) -> u32 {
        self.schema_version
    }

    /// Soft-delete the conversation. Deleting twice is a no-op.
    pub fn request_delete(
        &mut self,
        visa: &dyn Visa<ConversationPermissions>,
    ) -> Result<(), DomainError> {
        if !visa.determine_if(&|p| p.can_delete_conversation || p.is_system_account) {
            return Err(DomainError::Permission(
                "you do not have permission to delete this conversation",
            ));
        }
        if self.deleted {
            return Ok(());
        }

        let deleted = Deleted { at: Utc::now() };
        self.entity.digest(DELETED, &deleted)?;
        self.deleted = true;
        self.updated_at = deleted.at;
        Ok(())
    }

    fn from_genesis(event: &EventRecord) -> Result<Self, PayloadError> {
        if event.event_name != CREATED {
            return Err(PayloadError {
                message: format!("conversation stream starts with {}", event.event_name),
            });
        }
        Ok(Self::from_created(event.decode()?))
    }

    fn apply_event(&mut self, event: &EventRecord) -> Result<(), PayloadError> {
        if event.event_name != DELETED {
            return Err(PayloadError {
                message: format!("unknown conversation event {}", event.event_name),
            });
        }
        let deleted: Deleted = event.decode()?;
        self.deleted = true;
        self.updated_at = deleted.at;
        Ok(())
    }
}

impl_aggregate!(
    Conversation,
    entity,
    "conversation",
    from_genesis,
    apply_event
);
