use thiserror::Error;

/// Errors that can occur within the reminder subsystem.
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// Tick interval / acceptance band combination rejected.
    #[error(transparent)]
    Config(#[from] almanac_core::AlmanacError),

    /// A portable record could not be turned back into an event.
    #[error("Invalid event record: {0}")]
    InvalidRecord(String),

    /// The background poll task panicked or was aborted.
    #[error("Scheduler task failed: {0}")]
    TaskFailed(String),
}

/// Why a delivery sink refused a reminder. Logged by the scheduler, never retried.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("delivery queue full")]
    Full,

    #[error("delivery queue closed")]
    Closed,

    #[error("delivery rejected: {0}")]
    Rejected(String),
}

pub type Result<T> = std::result::Result<T, SchedulerError>;
