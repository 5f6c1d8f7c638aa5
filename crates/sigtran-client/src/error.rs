use std::path::PathBuf;

use thiserror::Error;

/// Error type for the client pipeline
#[derive(Debug, Error)]
pub enum ClientError {
    /// Invalid configuration value
    #[error("Configuration error: {0}")]
    Config(String),

    /// Configuration file could not be read or parsed
    #[error("Failed to load {path}: {reason}")]
    ConfigFile { path: PathBuf, reason: String },

    /// Logging could not be initialized
    #[error("Logging setup failed: {0}")]
    Logging(String),

    /// TCAP message could not be built
    #[error("TCAP encoding failed: {0}")]
    Tcap(#[from] tcap_core::Error),

    /// SCCP datagram could not be built
    #[error("SCCP encoding failed: {0}")]
    Sccp(#[from] sccp_core::Error),

    /// Association failure
    #[error(transparent)]
    Transport(#[from] m3ua_transport::Error),
}

impl ClientError {
    /// Whether the failure happened before any network activity
    pub fn is_local(&self) -> bool {
        !matches!(self, ClientError::Transport(_))
    }
}

/// Result type for client operations
pub type Result<T> = std::result::Result<T, ClientError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_sources() {
        let err = ClientError::from(tcap_core::Error::MissingOtid);
        assert!(err.is_local());
        assert!(err.to_string().starts_with("TCAP encoding failed"));

        let err = ClientError::from(m3ua_transport::Error::from(
            m3ua_transport::TransportError::NotConnected,
        ));
        assert!(!err.is_local());
        assert_eq!(err.to_string(), "Association is not connected");
    }
}
