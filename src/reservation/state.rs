use std::fmt;

use serde::{Deserialize, Serialize};

/// Lifecycle tag of a reservation request.
///
/// ```text
/// Requested ──accept──> Accepted ──close──> ReservationPeriod
///     │
///     ├──reject──> Rejected ──cancel──> Cancelled
///     └──cancel──────────────────────> Cancelled
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReservationState {
    Requested,
    Accepted,
    Rejected,
    Cancelled,
    /// Closed; the reservation now occupies its period.
    ReservationPeriod,
}

impl ReservationState {
    pub fn can_be_cancelled(self) -> bool {
        matches!(self, ReservationState::Requested | ReservationState::Rejected)
    }

    pub fn can_be_closed(self) -> bool {
        self == ReservationState::Accepted
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ReservationState::Requested => "REQUESTED",
            ReservationState::Accepted => "ACCEPTED",
            ReservationState::Rejected => "REJECTED",
            ReservationState::Cancelled => "CANCELLED",
            ReservationState::ReservationPeriod => "RESERVATION_PERIOD",
        }
    }
}

impl fmt::Display for ReservationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
