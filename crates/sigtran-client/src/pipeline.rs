//! Message assembly and the one-shot send
//!
//! TCAP Begin → SCCP UDT → one M3UA DATA on a fresh association. All
//! encoding happens before the network is touched, so a bad payload or
//! address never opens a connection.

use std::future::Future;
use std::time::Duration;

use bytes::Bytes;
use m3ua_transport::{M3uaSession, SessionEvent};
use tokio::sync::mpsc;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::config::ClientConfig;
use crate::error::Result;

/// Encode the configured TCAP Begin
pub fn build_transaction(config: &ClientConfig) -> Result<Bytes> {
    let t = &config.transaction;
    let message = t.operation.begin(
        t.otid,
        t.opcode,
        t.invoke_id,
        t.payload.as_deref(),
        t.acn_version,
    )?;
    Ok(message.encode()?)
}

/// Wrap transaction bytes into the configured SCCP UDT
pub fn build_datagram(config: &ClientConfig, user_data: &[u8]) -> Result<Bytes> {
    let d = &config.datagram;
    let called = d.called.to_routing_address()?;
    let calling = d.calling.to_routing_address()?;
    Ok(sccp_core::encode(
        d.protocol_class,
        d.return_on_error,
        &called,
        &calling,
        user_data,
    )?)
}

/// The complete SCCP datagram for `config`
pub fn build_message(config: &ClientConfig) -> Result<Bytes> {
    let tcap = build_transaction(config)?;
    debug!("TCAP Begin: {} bytes", tcap.len());
    let udt = build_datagram(config, &tcap)?;
    debug!("SCCP UDT: {} bytes", udt.len());
    Ok(udt)
}

/// Build the message, connect and write it once
///
/// The session is returned still running so the caller can keep the
/// association alive.
pub async fn send_once(
    config: &ClientConfig,
) -> Result<(M3uaSession, mpsc::Receiver<SessionEvent>)> {
    let message = build_message(config)?;

    let remote = config.remote_endpoint();
    info!("Connecting to {}", remote);
    let (session, events) = M3uaSession::connect(&remote, config.association_config()).await?;

    let len = message.len();
    session.write(message).await?;
    info!(
        "Sent {:?} (OTID {:#010x}, {} bytes)",
        config.transaction.operation, config.transaction.otid, len
    );

    Ok((session, events))
}

/// Why the idle loop returned
#[derive(Debug)]
pub enum IdleExit {
    /// Shutdown was requested and the association closed
    Interrupted,
    /// The association ended on its own
    SessionEnded(m3ua_transport::Result<()>),
}

/// Keep the association alive until `shutdown` resolves or the session ends
///
/// Logs a beat line every `beat_interval`. On shutdown the session is closed
/// orderly, flushing writes still queued.
pub async fn idle<F>(
    session: &mut M3uaSession,
    events: &mut mpsc::Receiver<SessionEvent>,
    beat_interval: Duration,
    shutdown: F,
) -> IdleExit
where
    F: Future<Output = ()>,
{
    tokio::pin!(shutdown);
    let mut ticker = interval_at(Instant::now() + beat_interval, beat_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                info!("Shutdown requested, closing association");
                if let Err(e) = session.close().await {
                    warn!("Association did not close cleanly: {}", e);
                }
                return IdleExit::Interrupted;
            }
            result = session.closed() => {
                return IdleExit::SessionEnded(result);
            }
            Some(event) = events.recv() => log_event(&event),
            _ = ticker.tick() => info!("Beat...."),
        }
    }
}

fn log_event(event: &SessionEvent) {
    match event {
        SessionEvent::Established => info!("Association established"),
        SessionEvent::HeartbeatAcked { rtt } => debug!("Heartbeat acknowledged in {:?}", rtt),
        SessionEvent::Notify {
            status_type,
            status_info,
        } => info!("Gateway notification: type {} info {}", status_type, status_info),
        SessionEvent::PeerError { code } => warn!("Gateway reported error {:#x}", code),
        SessionEvent::Closed { reason } => info!("Association closed: {}", reason),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ClientError;

    #[test]
    fn test_default_message_layout() {
        let config = ClientConfig::default();
        let tcap = build_transaction(&config).unwrap();
        assert_eq!(tcap[0], 0x62);
        assert_eq!(&tcap[2..8], &[0x48, 0x04, 0x11, 0x11, 0x11, 0x11]);

        let udt = build_message(&config).unwrap();
        // type, class | return-on-error, three pointers
        assert_eq!(&udt[..5], &[0x09, 0x80, 0x03, 0x0E, 0x19]);
        // user data length then the Begin
        assert_eq!(udt[0x1D] as usize, tcap.len());
        assert_eq!(&udt[0x1E..], &tcap[..]);
    }

    #[test]
    fn test_bad_payload_fails_before_send() {
        let mut config = ClientConfig::default();
        config.transaction.payload = Some("80zz".to_string());
        let err = build_message(&config).unwrap_err();
        assert!(matches!(err, ClientError::Tcap(_)));
        assert!(err.is_local());
    }

    #[test]
    fn test_bad_digits_fail_before_send() {
        let mut config = ClientConfig::default();
        config.datagram.calling.digits = "8170A5".to_string();
        let err = build_message(&config).unwrap_err();
        assert!(matches!(err, ClientError::Sccp(_)));
    }

    #[test]
    fn test_protocol_class_one() {
        let mut config = ClientConfig::default();
        config.datagram.protocol_class = 1;
        config.datagram.return_on_error = false;
        let udt = build_message(&config).unwrap();
        assert_eq!(udt[1], 0x01);
    }
}
