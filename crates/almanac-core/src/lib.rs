pub mod config;
pub mod error;
pub mod portable;
pub mod types;

pub use error::{AlmanacError, Result};
pub use portable::{PortableEvent, PortableSnapshot};
pub use types::{Category, EventId};
