//! ASP state maintenance: ASPUP then ASPAC (RFC 4666 §4.3)

use futures::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::time::{timeout_at, Instant};
use tokio_util::codec::Framed;
use tracing::{debug, info, warn};

use crate::codec::{M3uaCodec, Message};
use crate::config::AssociationConfig;
use crate::error::{ConnectionError, Result};

/// Bring the ASP to ASP-ACTIVE
pub(crate) async fn run<S>(framed: &mut Framed<S, M3uaCodec>, config: &AssociationConfig) -> Result<()>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    framed
        .send(Message::AspUp {
            asp_identifier: config.asp_identifier,
        })
        .await?;
    debug!("Sent ASPUP");
    await_reply(framed, config, "ASPUP ACK", |m| matches!(m, Message::AspUpAck)).await?;

    framed
        .send(Message::AspActive {
            traffic_mode: Some(config.traffic_mode),
            routing_context: config.routing_context,
        })
        .await?;
    debug!("Sent ASPAC");
    await_reply(framed, config, "ASPAC ACK", |m| {
        matches!(m, Message::AspActiveAck { .. })
    })
    .await?;

    Ok(())
}

/// Read frames until `expected` matches, answering BEATs on the way
async fn await_reply<S, F>(
    framed: &mut Framed<S, M3uaCodec>,
    config: &AssociationConfig,
    stage: &'static str,
    expected: F,
) -> Result<()>
where
    S: AsyncRead + AsyncWrite + Unpin,
    F: Fn(&Message) -> bool,
{
    let timeout = config.connect_timeout();
    let deadline = Instant::now() + timeout;

    loop {
        let frame = timeout_at(deadline, framed.next())
            .await
            .map_err(|_| ConnectionError::Timeout { stage, timeout })?;

        let message = match frame {
            None => return Err(ConnectionError::PeerClosed.into()),
            Some(frame) => frame?,
        };

        if expected(&message) {
            debug!("Received {}", message.name());
            return Ok(());
        }

        match message {
            Message::Error { code } => {
                warn!("Peer rejected {} with error code {:#x}", stage, code);
                return Err(ConnectionError::PeerError { code }.into());
            }
            Message::Notify {
                status_type,
                status_info,
            } => {
                info!(
                    "Peer notification during handshake: type {} info {}",
                    status_type, status_info
                );
            }
            Message::Heartbeat { data } => {
                framed.send(Message::HeartbeatAck { data }).await?;
            }
            other => {
                debug!("Ignoring {} while waiting for {}", other.name(), stage);
            }
        }
    }
}
