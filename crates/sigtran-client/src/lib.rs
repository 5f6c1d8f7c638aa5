//! SIGTRAN test client
//!
//! Builds a MAP operation as a TCAP Begin, wraps it into an SCCP UDT and
//! sends it once over an M3UA association, then keeps the association
//! alive with heartbeats until interrupted.
//!
//! - `config`: the immutable [`ClientConfig`] and its TOML form
//! - `cli`: command line flags layered over the configuration
//! - `pipeline`: message assembly, the one-shot send and the idle loop
//! - `logging`: tracing subscriber setup

pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod pipeline;

pub use config::{AddressConfig, AssociationSettings, ClientConfig, DatagramConfig, TransactionConfig};
pub use error::{ClientError, Result};
pub use pipeline::{build_datagram, build_message, build_transaction, idle, send_once, IdleExit};
