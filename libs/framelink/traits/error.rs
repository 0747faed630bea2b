use thiserror::Error;

/// Main error type for framelink
#[derive(Error, Debug)]
pub enum FramelinkError {
    /// WebSocket connection error
    #[error("WebSocket error: {0}")]
    WebSocket(String),

    /// Connection closed unexpectedly
    #[error("Connection closed: {0}")]
    ConnectionClosed(String),

    /// Auth handshake could not be sent
    #[error("Handshake failed: {0}")]
    Handshake(String),

    /// Channel send error
    #[error("Channel send error: {0}")]
    ChannelSend(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),
}

/// Result type for framelink operations
pub type Result<T> = std::result::Result<T, FramelinkError>;
