use std::io;
use std::time::Duration;

use thiserror::Error;

/// Failures establishing or keeping the association alive
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConnectionError {
    /// Remote address could not be resolved
    #[error("Failed to resolve {address}: {reason}")]
    Resolve { address: String, reason: String },

    /// Underlying transport connection failed
    #[error("Failed to connect to {address}: {reason}")]
    Connect { address: String, reason: String },

    /// A connection step did not finish in time
    #[error("Timed out after {timeout:?} during {stage}")]
    Timeout {
        stage: &'static str,
        timeout: Duration,
    },

    /// Peer answered with an M3UA ERR message
    #[error("Peer reported M3UA error code {code:#x}")]
    PeerError { code: u32 },

    /// Peer closed the transport
    #[error("Peer closed the association")]
    PeerClosed,

    /// No BEAT ACK within the heartbeat timeout
    #[error("No heartbeat acknowledgement within {0:?}")]
    HeartbeatTimeout(Duration),

    /// I/O failure on the transport
    #[error("I/O error on association: {0}")]
    Io(String),

    /// Peer sent bytes that are not valid M3UA
    #[error("Malformed M3UA traffic from peer: {0}")]
    Protocol(String),
}

/// Failures writing user data
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// Session is not in the Connected state
    #[error("Association is not connected")]
    NotConnected,

    /// Underlying transport refused the bytes
    #[error("Write rejected: {0}")]
    WriteRejected(String),
}

/// M3UA wire format errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CodecError {
    #[error("Unsupported M3UA version {0}")]
    UnsupportedVersion(u8),

    #[error("Invalid M3UA message length {0}")]
    InvalidLength(u32),

    #[error("Buffer too small: need {required} but have {available}")]
    BufferTooSmall { required: usize, available: usize },

    #[error("Malformed parameter {tag:#06x}: {reason}")]
    MalformedParameter { tag: u16, reason: String },

    #[error("Missing mandatory parameter {0:#06x}")]
    MissingParameter(u16),

    #[error("Parameter value of {0} bytes is too long")]
    ParameterTooLong(usize),

    #[error("Message of {0} bytes exceeds the M3UA frame limit")]
    MessageTooLong(usize),

    #[error("I/O error: {0}")]
    Io(String),
}

impl From<io::Error> for CodecError {
    fn from(err: io::Error) -> Self {
        CodecError::Io(err.to_string())
    }
}

impl From<CodecError> for ConnectionError {
    fn from(err: CodecError) -> Self {
        match err {
            CodecError::Io(reason) => ConnectionError::Io(reason),
            other => ConnectionError::Protocol(other.to_string()),
        }
    }
}

/// Error type for M3UA transport operations
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    #[error(transparent)]
    Connection(#[from] ConnectionError),

    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// Framing failures on a live stream end the association
impl From<CodecError> for Error {
    fn from(err: CodecError) -> Self {
        Error::Connection(err.into())
    }
}

/// Result type for M3UA transport operations
pub type Result<T> = std::result::Result<T, Error>;
