//! SCCP connectionless encoding for the SIGTRAN client stack
//!
//! This crate wraps transaction-layer bytes into an SCCP unitdata (UDT)
//! message routed by a called and a calling party address.
//!
//! - `udt`: UDT message and protocol class
//! - `address`: party addresses and global titles
//! - `bcd`: swapped-nibble digit packing

mod error;

pub mod address;
pub mod bcd;
pub mod udt;

pub use error::Error;

pub use address::{encoding_scheme_for, GlobalTitle, RoutingAddress, RoutingIndicator};
pub use bcd::{digits_to_swapped_bytes, swapped_bytes_to_digits};
pub use udt::{encode, ProtocolClass, Unitdata};

/// Subsystem number of an HLR
pub const SSN_HLR: u8 = 6;
/// Subsystem number of an MSC
pub const SSN_MSC: u8 = 8;

/// Result type for SCCP operations
pub type Result<T> = std::result::Result<T, Error>;

/// Prelude module with commonly used types
pub mod prelude {
    pub use crate::{Error, GlobalTitle, ProtocolClass, Result, RoutingAddress, Unitdata};
}
