//! M3UA transport for the SIGTRAN client stack
//!
//! This crate carries SCCP datagrams to a signalling gateway over an M3UA
//! association (RFC 4666). It provides:
//!
//! - `codec`: the M3UA common header, parameters and a `tokio_util` frame codec
//! - `session`: connect, ASP handshake, heartbeat and user data writes
//! - `config`: routing label and timers of an association
//!
//! The association runs over TCP. M3UA messages carry their own length, so
//! the byte stream is split back into messages without extra framing.
//!
//! ```no_run
//! use std::time::Duration;
//! use m3ua_transport::{AssociationConfig, M3uaSession, SI_SCCP};
//!
//! # async fn example() -> m3ua_transport::Result<()> {
//! let config = AssociationConfig::new(0x11111111, 0x22222222, SI_SCCP, 0, 0, 1)
//!     .enable_heartbeat(Duration::from_secs(5), Duration::from_secs(100));
//!
//! let (mut session, _events) = M3uaSession::connect("127.0.0.1:2905", config).await?;
//! session.write(vec![0x09, 0x80]).await?;
//! session.close().await?;
//! # Ok(())
//! # }
//! ```

pub mod codec;
pub mod config;
pub mod error;
pub mod session;

pub use codec::{M3uaCodec, Message, TrafficMode};
pub use config::{AssociationConfig, HeartbeatConfig, DEFAULT_PORT, SI_SCCP};
pub use error::{CodecError, ConnectionError, Error, Result, TransportError};
pub use session::{M3uaSession, SessionEvent, SessionState};

/// Prelude module with commonly used types
pub mod prelude {
    pub use crate::{
        AssociationConfig, ConnectionError, Error, M3uaSession, Result, SessionEvent,
        SessionState, TransportError,
    };
}
