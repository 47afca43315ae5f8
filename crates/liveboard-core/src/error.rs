use thiserror::Error;

#[derive(Debug, Error)]
pub enum LiveboardError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid channel: {0}")]
    InvalidChannel(String),

    #[error("Invalid params: {0}")]
    InvalidParams(String),

    #[error("Upstream error: {0}")]
    Upstream(String),

    #[error("Connect to {channel} was superseded before it completed")]
    Superseded { channel: String },

    #[error("Method not found: {method}")]
    MethodNotFound { method: String },

    #[error("Broadcast hub is not running")]
    HubUnavailable,

    #[error("Payload too large: {size} bytes (max {max})")]
    PayloadTooLarge { size: usize, max: usize },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl LiveboardError {
    /// Short error code string sent to clients in WS RES frames.
    pub fn code(&self) -> &'static str {
        match self {
            LiveboardError::Config(_) => "CONFIG_ERROR",
            LiveboardError::InvalidChannel(_) => "INVALID_CHANNEL",
            LiveboardError::InvalidParams(_) => "INVALID_PARAMS",
            LiveboardError::Upstream(_) => "UPSTREAM_ERROR",
            LiveboardError::Superseded { .. } => "SUPERSEDED",
            LiveboardError::MethodNotFound { .. } => "METHOD_NOT_FOUND",
            LiveboardError::HubUnavailable => "HUB_UNAVAILABLE",
            LiveboardError::PayloadTooLarge { .. } => "PAYLOAD_TOO_LARGE",
            LiveboardError::Serialization(_) => "SERIALIZATION_ERROR",
            LiveboardError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

pub type Result<T> = std::result::Result<T, LiveboardError>;
