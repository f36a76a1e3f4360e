mod lock;
mod repository;

pub use repository::{Queueable, QueuedRepository};
