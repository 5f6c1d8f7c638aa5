//! TCAP encoding for the SIGTRAN client stack
//!
//! This crate builds ITU-T Q.773 transaction messages: a Begin, Continue or
//! End wrapper carrying transaction IDs, an optional dialogue portion naming
//! the MAP application context, and a component portion with one invoke per
//! requested operation. Operation arguments are opaque, pre-encoded bytes.
//!
//! The library is organized into several modules:
//!
//! - `transaction`: message types and the top level encoder
//! - `dialogue`: dialogue portion and MAP application contexts
//! - `component`: invoke components
//! - `preset`: ready-made MAP operations
//!
//! ```
//! use tcap_core::{ApplicationContext, TransactionMessage};
//!
//! let bytes = TransactionMessage::begin_invoke_with_dialogue(
//!     0x11111111,
//!     ApplicationContext::SendRoutingInfoForSm,
//!     3,
//!     113,
//!     45,
//!     vec![0x80, 0x01, 0xFF],
//! )
//! .encode()
//! .unwrap();
//! assert_eq!(&bytes[..4], &[0x62, 0x35, 0x48, 0x04]);
//! ```

mod error;

pub mod ber;
pub mod component;
pub mod dialogue;
pub mod preset;
pub mod transaction;

pub use error::Error;

pub use component::Invocation;
pub use dialogue::{ApplicationContext, DialoguePortion, DialogueType};
pub use preset::OperationPreset;
pub use transaction::{encode, MessageType, TransactionMessage};

/// Result type for TCAP operations
pub type Result<T> = std::result::Result<T, Error>;

/// Prelude module with commonly used types
pub mod prelude {
    pub use crate::{
        ApplicationContext, DialoguePortion, Error, Invocation, MessageType, OperationPreset,
        Result, TransactionMessage,
    };
}
