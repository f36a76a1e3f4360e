use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// A half-open borrowing window. `start` is always strictly before `end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "PeriodFields")]
pub struct ReservationPeriod {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

#[derive(Deserialize)]
struct PeriodFields {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl TryFrom<PeriodFields> for ReservationPeriod {
    type Error = DomainError;

    fn try_from(fields: PeriodFields) -> Result<Self, Self::Error> {
        ReservationPeriod::create(fields.start, fields.end)
    }
}

impl ReservationPeriod {
    pub fn create(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self, DomainError> {
        if start >= end {
            return Err(DomainError::InvalidRange { start, end });
        }
        Ok(ReservationPeriod { start, end })
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }
}
