use thiserror::Error;

/// Errors raised by an upstream live source.
#[derive(Debug, Error)]
pub enum UpstreamError {
    /// The connection to the platform (or its relay) could not be established.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// The handshake did not finish within its time budget.
    #[error("Connect timed out after {ms}ms")]
    Timeout { ms: u64 },

    /// The platform reported a problem but the stream is still usable.
    #[error("Platform error: {0}")]
    Platform(String),

    /// A frame arrived that could not be decoded; it was skipped.
    #[error("Malformed upstream frame: {0}")]
    Protocol(String),

    /// The stream is gone; nothing more will arrive on it.
    #[error("Stream terminated: {0}")]
    StreamTerminated(String),

    /// No traffic (not even keep-alive replies) for too long.
    #[error("Upstream silent for more than {secs}s")]
    Silent { secs: u64 },
}

impl UpstreamError {
    /// Fatal errors end the upstream session; the rest are reported and the
    /// session carries on.
    pub fn is_fatal(&self) -> bool {
        match self {
            UpstreamError::Platform(_) | UpstreamError::Protocol(_) => false,
            UpstreamError::ConnectionFailed(_)
            | UpstreamError::Timeout { .. }
            | UpstreamError::StreamTerminated(_)
            | UpstreamError::Silent { .. } => true,
        }
    }
}
