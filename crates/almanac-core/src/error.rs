use thiserror::Error;

#[derive(Debug, Error)]
pub enum AlmanacError {
    #[error("Configuration error: {0}")]
    Config(String),
}

impl AlmanacError {
    /// Short error code string, stable across releases.
    pub fn code(&self) -> &'static str {
        match self {
            AlmanacError::Config(_) => "CONFIG_ERROR",
        }
    }
}

pub type Result<T> = std::result::Result<T, AlmanacError>;
