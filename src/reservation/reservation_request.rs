use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{ReservationPeriod, ReservationState};
use crate::aggregate::Unsaved;
use crate::authorization::{ReservationRequestPermissions, Visa};
use crate::entity::{Entity, EventRecord, PayloadError};
use crate::error::DomainError;
use crate::impl_aggregate;

const SCHEMA_VERSION: u32 = 1;

const REQUESTED: &str = "ReservationRequested";
const ACCEPTED: &str = "ReservationAccepted";
const REJECTED: &str = "ReservationRejected";
const CANCELLED: &str = "ReservationCancelled";
const CLOSE_REQUESTED: &str = "ReservationCloseRequested";
const CLOSED: &str = "ReservationClosed";

#[derive(Serialize, Deserialize)]
struct Requested {
    listing_id: String,
    reserver_id: String,
    reservation_period: ReservationPeriod,
    schema_version: u32,
    at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize)]
struct Transitioned {
    at: DateTime<Utc>,
}

/// A request to borrow a listing for a period.
///
/// Every mutator asks its visa first and checks the lifecycle second, so a
/// caller without permission always gets [`DomainError::Permission`] whatever
/// the current state. A rejected call leaves the request untouched.
#[derive(Debug, Clone)]
pub struct ReservationRequest {
    entity: Entity,
    state: ReservationState,
    reservation_period: ReservationPeriod,
    listing_id: String,
    reserver_id: String,
    close_requested: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    schema_version: u32,
}

impl ReservationRequest {
    /// Open a new request in the `Requested` state.
    ///
    /// No visa is involved: there is no prior state to protect. The result
    /// must go through `AggregateRepository::commit_new` before it can be
    /// mutated.
    pub fn create(
        listing_id: impl Into<String>,
        reserver_id: impl Into<String>,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Unsaved<Self>, DomainError> {
        let requested = Requested {
            listing_id: listing_id.into(),
            reserver_id: reserver_id.into(),
            reservation_period: ReservationPeriod::create(start, end)?,
            schema_version: SCHEMA_VERSION,
            at: Utc::now(),
        };

        let mut entity = Entity::with_id(Uuid::new_v4().to_string());
        entity.digest(REQUESTED, &requested)?;

        let mut request = Self::from_requested(requested);
        request.entity = entity;
        Ok(Unsaved::new(request))
    }

    fn from_requested(requested: Requested) -> Self {
        ReservationRequest {
            entity: Entity::new(),
            state: ReservationState::Requested,
            reservation_period: requested.reservation_period,
            listing_id: requested.listing_id,
            reserver_id: requested.reserver_id,
            close_requested: false,
            created_at: requested.at,
            updated_at: requested.at,
            schema_version: requested.schema_version,
        }
    }

    pub fn id(&self) -> &str {
        self.entity.id()
    }

    pub fn state(&self) -> ReservationState {
        self.state
    }

    pub fn reservation_period(&self) -> &ReservationPeriod {
        &self.reservation_period
    }

    pub fn listing_id(&self) -> &str {
        &self.listing_id
    }

    pub fn reserver_id(&self) -> &str {
        &self.reserver_id
    }

    pub fn close_requested(&self) -> bool {
        self.close_requested
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

    pub fn accept(
        &mut self,
        visa: &dyn Visa<ReservationRequestPermissions>,
    ) -> Result<(), DomainError> {
        authorize(
            visa,
            |p| p.can_accept_reservation_request,
            "you do not have permission to accept this reservation request",
        )?;
        if self.state != ReservationState::Requested {
            return Err(DomainError::InvalidState(
                "can only accept requested reservations",
            ));
        }
        self.record(ACCEPTED)
    }

    pub fn reject(
        &mut self,
        visa: &dyn Visa<ReservationRequestPermissions>,
    ) -> Result<(), DomainError> {
        authorize(
            visa,
            |p| p.can_reject_reservation_request,
            "you do not have permission to reject this reservation request",
        )?;
        if self.state != ReservationState::Requested {
            return Err(DomainError::InvalidState(
                "can only reject requested reservations",
            ));
        }
        self.record(REJECTED)
    }

    pub fn cancel(
        &mut self,
        visa: &dyn Visa<ReservationRequestPermissions>,
    ) -> Result<(), DomainError> {
        authorize(
            visa,
            |p| p.can_cancel_reservation_request,
            "you do not have permission to cancel this reservation request",
        )?;
        if !self.state.can_be_cancelled() {
            return Err(DomainError::InvalidState(
                "cannot cancel reservation in current state",
            ));
        }
        self.record(CANCELLED)
    }

    /// Flag that a participant wants the reservation closed. The state is
    /// left as is; `close` performs the actual transition.
    pub fn request_close(
        &mut self,
        visa: &dyn Visa<ReservationRequestPermissions>,
    ) -> Result<(), DomainError> {
        authorize(
            visa,
            |p| p.can_request_close_reservation_request,
            "you do not have permission to request close for this reservation request",
        )?;
        if !self.state.can_be_closed() {
            return Err(DomainError::InvalidState(
                "can only request close for accepted reservations",
            ));
        }
        self.record(CLOSE_REQUESTED)
    }

    pub fn close(
        &mut self,
        visa: &dyn Visa<ReservationRequestPermissions>,
    ) -> Result<(), DomainError> {
        authorize(
            visa,
            |p| p.can_close_reservation_request,
            "you do not have permission to close this reservation request",
        )?;
        if self.state != ReservationState::Accepted {
            return Err(DomainError::InvalidState(
                "can only close accepted reservations",
            ));
        }
        self.record(CLOSED)
    }

    // Digest first: if encoding fails nothing has been touched yet.
    fn record(&mut self, event_name: &'static str) -> Result<(), DomainError> {
        let transitioned = Transitioned { at: Utc::now() };
        self.entity.digest(event_name, &transitioned)?;
        self.apply(event_name, transitioned.at)?;
        Ok(())
    }

    fn apply(&mut self, event_name: &str, at: DateTime<Utc>) -> Result<(), PayloadError> {
        match event_name {
            ACCEPTED => self.state = ReservationState::Accepted,
            REJECTED => self.state = ReservationState::Rejected,
            CANCELLED => self.state = ReservationState::Cancelled,
            CLOSE_REQUESTED => self.close_requested = true,
            CLOSED => self.state = ReservationState::ReservationPeriod,
            other => {
                return Err(PayloadError {
                    message: format!("unknown reservation request event {other}"),
                })
            }
        }
        self.updated_at = at;
        Ok(())
    }

    fn from_genesis(event: &EventRecord) -> Result<Self, PayloadError> {
        if event.event_name != REQUESTED {
            return Err(PayloadError {
                message: format!(
                    "reservation request stream starts with {}",
                    event.event_name
                ),
            });
        }
        Ok(Self::from_requested(event.decode()?))
    }

    fn apply_event(&mut self, event: &EventRecord) -> Result<(), PayloadError> {
        let transitioned: Transitioned = event.decode()?;
        self.apply(&event.event_name, transitioned.at)
    }
}

impl_aggregate!(
    ReservationRequest,
    entity,
    "reservation request",
    from_genesis,
    apply_event
);

fn authorize(
    visa: &dyn Visa<ReservationRequestPermissions>,
    rule: impl Fn(&ReservationRequestPermissions) -> bool,
    denied: &'static str,
) -> Result<(), DomainError> {
    if visa.determine_if(&rule) {
        Ok(())
    } else {
        Err(DomainError::Permission(denied))
    }
}
