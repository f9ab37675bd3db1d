pub mod book;
pub mod error;
pub mod input;

pub use book::{Calendar, EventSelector, RefreshOutcome, SharedCalendar};
pub use error::{CalendarError, Result, ValidationError};
pub use input::{EventDraft, ValidEvent};
