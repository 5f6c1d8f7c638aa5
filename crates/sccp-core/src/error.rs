use thiserror::Error;

/// Error type for SCCP encoding operations
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    /// Global title digit string holds a non-decimal character
    #[error("Invalid global title digit {digit:?} at position {position}")]
    InvalidDigit { digit: char, position: usize },

    /// BCD octet holds a nibble outside 0..=9
    #[error("Invalid BCD nibble {nibble:#x} at octet {position}")]
    InvalidBcd { nibble: u8, position: usize },

    /// Variable part does not fit the one-octet length/pointer fields
    #[error("{field} is {len} bytes, exceeds the 255 byte limit")]
    FieldTooLong { field: &'static str, len: usize },

    /// Point code does not fit in 14 bits
    #[error("Point code {0} exceeds 14 bits")]
    PointCodeOutOfRange(u16),

    /// Global title indicator this encoder does not know
    #[error("Unsupported global title indicator {0}")]
    UnsupportedGlobalTitleIndicator(u8),

    /// Encoding scheme is not BCD odd/even or disagrees with the digit count
    #[error("Encoding scheme {scheme} does not match {digits} digits")]
    EncodingSchemeMismatch { scheme: u8, digits: usize },

    /// Global title without an odd/even indication given an odd digit count
    #[error("Global title indicator {gti} cannot carry an odd number of digits ({digits})")]
    OddDigitCount { gti: u8, digits: usize },

    /// Address field wider than its slot in the encoded octet
    #[error("{field} {value:#x} exceeds {max:#x}")]
    FieldOutOfRange { field: &'static str, value: u8, max: u8 },

    /// UDT carries only connectionless classes 0 and 1
    #[error("Invalid protocol class {0} for a unitdata message")]
    InvalidProtocolClass(u8),

    /// Address without point code, subsystem or global title
    #[error("Address has no point code, subsystem number or global title")]
    EmptyAddress,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::FieldTooLong {
            field: "user data",
            len: 300,
        };
        assert_eq!(err.to_string(), "user data is 300 bytes, exceeds the 255 byte limit");

        let err = Error::InvalidDigit {
            digit: 'a',
            position: 3,
        };
        assert_eq!(err.to_string(), "Invalid global title digit 'a' at position 3");
    }
}
