use std::future;

use bytes::Bytes;
use futures::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio::sync::{mpsc, watch};
use tokio::time::{interval_at, sleep_until, Duration, Instant, Interval, MissedTickBehavior};
use tokio_util::codec::Framed;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace, warn};

use super::{SessionEvent, SessionState, WriteRequest};
use crate::codec::params::ProtocolData;
use crate::codec::{M3uaCodec, Message};
use crate::config::AssociationConfig;
use crate::error::{ConnectionError, Result, TransportError};

/// Oldest BEAT still waiting for its ACK
struct PendingBeat {
    sequence: u64,
    sent_at: Instant,
    deadline: Instant,
}

/// Background task owning the association stream
pub(super) struct SessionTask<S> {
    framed: Framed<S, M3uaCodec>,
    config: AssociationConfig,
    writes: mpsc::Receiver<WriteRequest>,
    events: mpsc::Sender<SessionEvent>,
    state: watch::Sender<SessionState>,
    cancel: CancellationToken,
    next_sequence: u64,
    pending: Option<PendingBeat>,
}

impl<S> SessionTask<S>
where
    S: AsyncRead + AsyncWrite + Send + Unpin + 'static,
{
    pub(super) fn new(
        framed: Framed<S, M3uaCodec>,
        config: AssociationConfig,
        writes: mpsc::Receiver<WriteRequest>,
        events: mpsc::Sender<SessionEvent>,
        state: watch::Sender<SessionState>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            framed,
            config,
            writes,
            events,
            state,
            cancel,
            next_sequence: 0,
            pending: None,
        }
    }

    pub(super) async fn run(mut self) -> Result<()> {
        let result = self.event_loop().await;

        self.state.send_replace(SessionState::Closed);
        let reason = match &result {
            Ok(()) => {
                info!("M3UA association closed");
                "closed locally".to_string()
            }
            Err(e) => {
                error!("M3UA association failed: {}", e);
                e.to_string()
            }
        };
        self.emit(SessionEvent::Closed { reason });

        result
    }

    async fn event_loop(&mut self) -> Result<()> {
        let mut ticker = self.config.heartbeat.map(|hb| {
            let mut ticker = interval_at(Instant::now() + hb.interval(), hb.interval());
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            ticker
        });
        let heartbeat_timeout = self
            .config
            .heartbeat
            .map(|hb| hb.timeout())
            .unwrap_or_default();

        loop {
            let deadline = self.pending.as_ref().map(|p| p.deadline);

            tokio::select! {
                biased;

                _ = self.cancel.cancelled() => {
                    debug!("Session cancelled");
                    return self.shutdown().await;
                }

                frame = self.framed.next() => match frame {
                    Some(Ok(message)) => self.handle_message(message).await?,
                    Some(Err(e)) => return Err(e.into()),
                    None => return Err(ConnectionError::PeerClosed.into()),
                },

                request = self.writes.recv() => match request {
                    Some(request) => self.handle_write(request).await?,
                    None => {
                        debug!("All session handles dropped");
                        return self.shutdown().await;
                    }
                },

                _ = sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                    warn!("No BEAT ACK within {:?}", heartbeat_timeout);
                    return Err(ConnectionError::HeartbeatTimeout(heartbeat_timeout).into());
                }

                _ = tick(&mut ticker) => {
                    self.send_heartbeat(heartbeat_timeout).await?;
                }
            }
        }
    }

    async fn handle_message(&mut self, message: Message) -> Result<()> {
        trace!("Received {}", message.name());
        match message {
            Message::Heartbeat { data } => {
                self.framed.send(Message::HeartbeatAck { data }).await?;
            }
            Message::HeartbeatAck { data } => self.handle_heartbeat_ack(&data),
            Message::Notify {
                status_type,
                status_info,
            } => {
                info!("Peer notification: type {} info {}", status_type, status_info);
                self.emit(SessionEvent::Notify {
                    status_type,
                    status_info,
                });
            }
            Message::Error { code } => {
                warn!("Peer reported M3UA error code {:#x}", code);
                self.emit(SessionEvent::PeerError { code });
            }
            Message::Data { protocol_data, .. } => {
                debug!(
                    "Ignoring {} bytes of inbound DATA from {:#x}",
                    protocol_data.user_data.len(),
                    protocol_data.originating_point_code
                );
            }
            other => debug!("Ignoring {}", other.name()),
        }
        Ok(())
    }

    fn handle_heartbeat_ack(&mut self, data: &Bytes) {
        let sequence = match <[u8; 8]>::try_from(&data[..]) {
            Ok(raw) => u64::from_be_bytes(raw),
            Err(_) => {
                warn!("BEAT ACK with {} bytes of unknown heartbeat data", data.len());
                return;
            }
        };

        match self.pending.take() {
            Some(pending) if sequence >= pending.sequence && sequence < self.next_sequence => {
                let rtt = pending.sent_at.elapsed();
                debug!("BEAT ACK {} after {:?}", sequence, rtt);
                if sequence == pending.sequence {
                    self.emit(SessionEvent::HeartbeatAcked { rtt });
                }
            }
            other => {
                debug!("Unexpected BEAT ACK {}", sequence);
                self.pending = other;
            }
        }
    }

    async fn send_heartbeat(&mut self, timeout: Duration) -> Result<()> {
        let sequence = self.next_sequence;
        self.next_sequence += 1;

        let data = Bytes::copy_from_slice(&sequence.to_be_bytes());
        self.framed.send(Message::Heartbeat { data }).await?;
        trace!("Sent BEAT {}", sequence);

        if self.pending.is_none() {
            let now = Instant::now();
            self.pending = Some(PendingBeat {
                sequence,
                sent_at: now,
                deadline: now + timeout,
            });
        }
        Ok(())
    }

    async fn handle_write(&mut self, request: WriteRequest) -> Result<()> {
        let len = request.user_data.len();
        let message = Message::Data {
            routing_context: self.config.routing_context,
            protocol_data: ProtocolData {
                originating_point_code: self.config.originating_point_code,
                destination_point_code: self.config.destination_point_code,
                service_indicator: self.config.service_indicator,
                network_indicator: self.config.network_indicator,
                message_priority: self.config.message_priority,
                signaling_link_selection: self.config.signaling_link_selection,
                user_data: request.user_data,
            },
        };

        // rejected locally, the association stays up
        if let Err(e) = message.encoded_len() {
            warn!("Rejecting write of {} bytes: {}", len, e);
            let _ = request
                .done
                .send(Err(TransportError::WriteRejected(e.to_string()).into()));
            return Ok(());
        }

        match self.framed.send(message).await {
            Ok(()) => {
                debug!("Sent DATA with {} bytes of user data", len);
                let _ = request.done.send(Ok(()));
                Ok(())
            }
            Err(e) => {
                let _ = request
                    .done
                    .send(Err(TransportError::WriteRejected(e.to_string()).into()));
                Err(ConnectionError::Io(e.to_string()).into())
            }
        }
    }

    /// Flush queued writes, then leave ASP-UP and close the stream
    async fn shutdown(&mut self) -> Result<()> {
        self.writes.close();
        while let Some(request) = self.writes.recv().await {
            self.handle_write(request).await?;
        }

        if let Err(e) = self.framed.send(Message::AspDown).await {
            debug!("Failed to send ASPDN: {}", e);
        }
        if let Err(e) = self.framed.get_mut().shutdown().await {
            debug!("Failed to shut down stream: {}", e);
        }
        Ok(())
    }

    fn emit(&self, event: SessionEvent) {
        if let Err(mpsc::error::TrySendError::Full(event)) = self.events.try_send(event) {
            warn!("Session event queue full, dropping {:?}", event);
        }
    }
}

async fn tick(ticker: &mut Option<Interval>) -> Instant {
    match ticker {
        Some(ticker) => ticker.tick().await,
        None => future::pending().await,
    }
}
