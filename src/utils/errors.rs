use thiserror::Error;

pub type Result<T> = std::result::Result<T, KioskError>;

#[derive(Error, Debug)]
pub enum KioskError {
    /// The storefront answered with an `{"error": "..."}` payload.
    #[error("Server error: {0}")]
    Server(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Unexpected HTTP status: {0}")]
    Status(u16),

    #[error("Invalid endpoint URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("Storage error: {0}")]
    Storage(#[from] sqlx::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Cart slot {position} is out of range for {kind} selection")]
    SlotOutOfRange {
        kind: crate::models::MediaKind,
        position: usize,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl KioskError {
    /// Message suitable for the notice area.
    pub fn notice(&self) -> String {
        match self {
            KioskError::Server(message) => message.clone(),
            other => other.to_string(),
        }
    }
}
