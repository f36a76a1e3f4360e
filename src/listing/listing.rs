use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::aggregate::Unsaved;
use crate::authorization::{ListingPermissions, Visa};
use crate::entity::{Entity, EventRecord, PayloadError};
use crate::error::DomainError;
use crate::impl_aggregate;

const SCHEMA_VERSION: u32 = 1;

const CREATED: &str = "ListingCreated";
const DELETED: &str = "ListingDeleted";

#[derive(Serialize, Deserialize)]
struct Created {
    sharer_id: String,
    title: String,
    images: Vec<String>,
    expires_at: DateTime<Utc>,
    schema_version: u32,
    at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize)]
struct Deleted {
    at: DateTime<Utc>,
}

/// An item offered for lending.
#[derive(Debug, Clone)]
pub struct Listing {
    entity: Entity,
    sharer_id: String,
    title: String,
    images: Vec<String>,
    expires_at: DateTime<Utc>,
    deleted: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    schema_version: u32,
}

impl Listing {
    /// `images` are blob paths inside the listing image container.
    pub fn create(
        sharer_id: impl Into<String>,
        title: impl Into<String>,
        images: Vec<String>,
        expires_at: DateTime<Utc>,
    ) -> Result<Unsaved<Self>, DomainError> {
        let created = Created {
            sharer_id: sharer_id.into(),
            title: title.into(),
            images,
            expires_at,
            schema_version: SCHEMA_VERSION,
            at: Utc::now(),
        };

        let mut entity = Entity::with_id(Uuid::new_v4().to_string());
        entity.digest(CREATED, &created)?;

        let mut listing = Self::from_created(created);
        listing.entity = entity;
        Ok(Unsaved::new(listing))
    }

    fn from_created(created: Created) -> Self {
        Listing {
            entity: Entity::new(),
            sharer_id: created.sharer_id,
            title: created.title,
            images: created.images,
            expires_at: created.expires_at,
            deleted: false,
            created_at: created.at,
            updated_at: created.at,
            schema_version: created.schema_version,
        }
    }

    pub fn id(&self) -> &str {
        self.entity.id()
    }

    pub fn sharer_id(&self) -> &str {
        &self.sharer_id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn images(&self) -> &[String] {
        &self.images
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
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

    /// Soft-delete the listing. Deleting twice is a no-op.
    pub fn request_delete(&mut self, visa: &dyn Visa<ListingPermissions>) -> Result<(), DomainError> {
        if !visa.determine_if(&|p| p.can_delete_listing || p.is_system_account) {
            return Err(DomainError::Permission(
                "you do not have permission to delete this listing",
            ));
        }
        if self.deleted {
            return Ok(());
        }

        let deleted = Deleted { at: Utc::now() };
        self.entity.digest(DELETED, &deleted)?;
        self.apply_deleted(deleted);
        Ok(())
    }

    fn apply_deleted(&mut self, deleted: Deleted) {
        self.deleted = true;
        self.updated_at = deleted.at;
    }

    fn from_genesis(event: &EventRecord) -> Result<Self, PayloadError> {
        if event.event_name != CREATED {
            return Err(PayloadError {
                message: format!("listing stream starts with {}", event.event_name),
            });
        }
        Ok(Self::from_created(event.decode()?))
    }

    fn apply_event(&mut self, event: &EventRecord) -> Result<(), PayloadError> {
        match event.event_name.as_str() {
            DELETED => {
                self.apply_deleted(event.decode()?);
                Ok(())
            }
            other => Err(PayloadError {
                message: format!("unknown listing event {other}"),
            }),
        }
    }
}

impl_aggregate!(Listing, entity, "listing", from_genesis, apply_event);
