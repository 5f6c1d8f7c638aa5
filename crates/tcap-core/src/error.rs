use thiserror::Error;

use crate::transaction::MessageType;

/// Error type for TCAP encoding operations
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    /// Caller-supplied operation payload is not valid hex
    #[error("Failed to decode operation payload: {0}")]
    Decode(String),

    /// Begin without an originating transaction ID
    #[error("Begin requires an originating transaction ID")]
    MissingOtid,

    /// OTID supplied on a message type that must not carry one
    #[error("{0} must not carry an originating transaction ID")]
    UnexpectedOtid(MessageType),

    /// DTID missing on Continue/End
    #[error("{0} requires a destination transaction ID")]
    MissingDtid(MessageType),

    /// DTID supplied on Begin
    #[error("{0} must not carry a destination transaction ID")]
    UnexpectedDtid(MessageType),

    /// Invoke ID outside of the INTEGER (-128..127) range of Q.773
    #[error("Invoke ID {0} out of range (-128..=127)")]
    InvokeIdOutOfRange(i32),

    /// Element content too long for a definite BER length
    #[error("Element length {0} exceeds the encodable range")]
    LengthOverflow(usize),
}

impl From<hex::FromHexError> for Error {
    fn from(err: hex::FromHexError) -> Self {
        Error::Decode(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(
            Error::MissingOtid.to_string(),
            "Begin requires an originating transaction ID"
        );
        assert_eq!(
            Error::MissingDtid(MessageType::End).to_string(),
            "End requires a destination transaction ID"
        );

        let err = Error::from(hex::decode("0g").unwrap_err());
        assert!(err.to_string().starts_with("Failed to decode operation payload"));
    }
}
