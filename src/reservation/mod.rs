mod period;
mod reservation_request;
mod state;

pub use period::ReservationPeriod;
pub use reservation_request::ReservationRequest;
pub use state::ReservationState;
