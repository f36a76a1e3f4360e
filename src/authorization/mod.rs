//! Passport/visa authorization.
//!
//! A [`Passport`] is built once per operation from the caller's
//! [`PermissionSnapshot`]. For each aggregate it touches, the passport issues
//! a [`Visa`], and the aggregate asks the visa whether a transition is allowed.
//! Aggregates never see roles, tokens or the snapshot itself.

mod passport;
mod permissions;
mod visa;

pub use passport::{Passport, Principal, SnapshotPassport};
pub use permissions::{
    ConversationPermissions, ListingPermissions, PermissionSnapshot, ReservationRequestPermissions,
};
pub use visa::{SnapshotVisa, Visa};
