use std::fmt;

use super::permissions::{
    ConversationPermissions, ListingPermissions, PermissionSnapshot, ReservationRequestPermissions,
};
use super::visa::{SnapshotVisa, Visa};
use crate::conversation::Conversation;
use crate::listing::Listing;
use crate::reservation::ReservationRequest;

/// Who is acting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Principal {
    User(String),
    System,
}

impl fmt::Display for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Principal::User(id) => write!(f, "user:{id}"),
            Principal::System => f.write_str("system"),
        }
    }
}

/// Issues visas scoped to a single aggregate instance.
pub trait Passport: Send + Sync {
    fn principal(&self) -> &Principal;

    fn for_reservation_request(
        &self,
        root: &ReservationRequest,
    ) -> Box<dyn Visa<ReservationRequestPermissions>>;

    fn for_listing(&self, root: &Listing) -> Box<dyn Visa<ListingPermissions>>;

    fn for_conversation(&self, root: &Conversation) -> Box<dyn Visa<ConversationPermissions>>;
}

/// Passport backed by a precomputed [`PermissionSnapshot`].
///
/// The aggregate passed to each `for_*` method is not inspected: there are no
/// per-instance rules (e.g. "is this caller a participant of *this*
/// reservation"), only the snapshot.
#[derive(Debug, Clone)]
pub struct SnapshotPassport {
    principal: Principal,
    snapshot: PermissionSnapshot,
}

impl SnapshotPassport {
    pub fn new(principal: Principal, snapshot: PermissionSnapshot) -> Self {
        SnapshotPassport {
            principal,
            snapshot,
        }
    }

    pub fn for_user(user_id: impl Into<String>, snapshot: PermissionSnapshot) -> Self {
        Self::new(Principal::User(user_id.into()), snapshot)
    }

    pub fn system() -> Self {
        Self::new(Principal::System, PermissionSnapshot::system())
    }

    pub fn snapshot(&self) -> &PermissionSnapshot {
        &self.snapshot
    }
}

impl Passport for SnapshotPassport {
    fn principal(&self) -> &Principal {
        &self.principal
    }

    fn for_reservation_request(
        &self,
        _root: &ReservationRequest,
    ) -> Box<dyn Visa<ReservationRequestPermissions>> {
        Box::new(SnapshotVisa::new(self.snapshot.reservation_request))
    }

    fn for_listing(&self, _root: &Listing) -> Box<dyn Visa<ListingPermissions>> {
        Box::new(SnapshotVisa::new(self.snapshot.listing))
    }

    fn for_conversation(&self, _root: &Conversation) -> Box<dyn Visa<ConversationPermissions>> {
        Box::new(SnapshotVisa::new(self.snapshot.conversation))
    }
}
