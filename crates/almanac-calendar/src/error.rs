use chrono::NaiveDateTime;
use thiserror::Error;

/// User input rejected before any event is built.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Event description must not be empty")]
    EmptyText,

    #[error("Invalid date {0:?}, expected YYYY-MM-DD")]
    InvalidDate(String),

    #[error("Invalid time {0:?}, expected HH:MM")]
    InvalidTime(String),

    #[error("Reminder must be a whole number of minutes, got {0:?}")]
    InvalidLead(String),

    #[error("Reminder lead time cannot be negative ({0})")]
    NegativeLead(i64),

    #[error("Unknown category {0:?}")]
    UnknownCategory(String),

    #[error("Event time must be in the future ({at})")]
    InPast { at: NaiveDateTime },
}

#[derive(Debug, Error)]
pub enum CalendarError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Storage error: {0}")]
    Store(#[from] almanac_store::StoreError),
}

impl CalendarError {
    pub fn is_validation(&self) -> bool {
        matches!(self, CalendarError::Validation(_))
    }
}

pub type Result<T> = std::result::Result<T, CalendarError>;
