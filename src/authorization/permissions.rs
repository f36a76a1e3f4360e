use serde::{Deserialize, Serialize};

/// What the caller may do to reservation requests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReservationRequestPermissions {
    pub can_accept_reservation_request: bool,
    pub can_reject_reservation_request: bool,
    pub can_cancel_reservation_request: bool,
    pub can_request_close_reservation_request: bool,
    pub can_close_reservation_request: bool,
    pub is_system_account: bool,
    pub is_listing_owner: bool,
    pub is_reserver: bool,
}

/// What the caller may do to listings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ListingPermissions {
    pub can_delete_listing: bool,
    pub is_system_account: bool,
    pub is_owner: bool,
}

/// What the caller may do to conversations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConversationPermissions {
    pub can_delete_conversation: bool,
    pub is_system_account: bool,
    pub is_participant: bool,
}

/// Permissions computed once per request by the caller's authentication
/// context. Everything defaults to denied.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PermissionSnapshot {
    pub reservation_request: ReservationRequestPermissions,
    pub listing: ListingPermissions,
    pub conversation: ConversationPermissions,
}

impl PermissionSnapshot {
    /// Snapshot for background jobs running as the system account.
    ///
    /// Only retirement rights are granted; reservation transitions stay with
    /// the participants.
    pub fn system() -> Self {
        PermissionSnapshot {
            reservation_request: ReservationRequestPermissions {
                is_system_account: true,
                ..Default::default()
            },
            listing: ListingPermissions {
                can_delete_listing: true,
                is_system_account: true,
                is_owner: false,
            },
            conversation: ConversationPermissions {
                can_delete_conversation: true,
                is_system_account: true,
                is_participant: false,
            },
        }
    }
}
