//! Error types for the relay client

/// Result type alias using the relay client Error
pub type Result<T> = std::result::Result<T, Error>;

/// Broad failure classes used to decide whether the relay loop keeps running
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The signaling connection itself is gone or unusable
    Transport,
    /// A signaling message could not be understood
    MessageFormat,
    /// The peer connection rejected a description, candidate or send
    Negotiation,
    /// The client was configured incorrectly
    Config,
}

/// Errors that can occur while relaying signaling for a peer connection
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid configuration parameter
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// WebSocket error (connect, read or write)
    #[error("WebSocket error: {0}")]
    WebSocketError(String),

    /// Signaling connection closed or sender task gone
    #[error("Signaling error: {0}")]
    SignalingError(String),

    /// Malformed signaling payload
    #[error("Invalid message: {0}")]
    InvalidMessage(String),

    /// JSON decoding error
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// SDP negotiation error
    #[error("SDP negotiation error: {0}")]
    SdpError(String),

    /// ICE candidate error
    #[error("ICE candidate error: {0}")]
    IceCandidateError(String),

    /// Offer/answer sequencing violated
    #[error("Illegal negotiation transition: {0}")]
    IllegalTransition(String),

    /// Data channel error
    #[error("Data channel error: {0}")]
    DataChannelError(String),

    /// WebRTC library error
    #[error("WebRTC error: {0}")]
    WebRtcError(String),

    /// I/O error
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Any other error
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl Error {
    /// Classify this error
    pub fn kind(&self) -> FailureKind {
        match self {
            Error::InvalidConfig(_) => FailureKind::Config,
            Error::WebSocketError(_) | Error::SignalingError(_) | Error::IoError(_) => {
                FailureKind::Transport
            }
            Error::InvalidMessage(_) | Error::SerializationError(_) => FailureKind::MessageFormat,
            Error::SdpError(_)
            | Error::IceCandidateError(_)
            | Error::IllegalTransition(_)
            | Error::DataChannelError(_)
            | Error::WebRtcError(_) => FailureKind::Negotiation,
            Error::Other(_) => FailureKind::Transport,
        }
    }

    /// Check if this error is a negotiation-level error
    pub fn is_negotiation_error(&self) -> bool {
        self.kind() == FailureKind::Negotiation
    }

    /// Check if this error ends the relay loop under the given policy
    pub fn is_fatal(&self, fail_on_negotiation_error: bool) -> bool {
        match self.kind() {
            FailureKind::Negotiation => fail_on_negotiation_error,
            _ => true,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::SerializationError(e.to_string())
    }
}

impl From<tokio_tungstenite::tungstenite::Error> for Error {
    fn from(e: tokio_tungstenite::tungstenite::Error) -> Self {
        Error::WebSocketError(e.to_string())
    }
}
