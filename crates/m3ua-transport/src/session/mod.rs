//! M3UA association session
//!
//! A session owns one stream to a signalling gateway. After the ASP
//! handshake the stream is handed to a background task that serializes
//! user writes, answers and sends heartbeats, and watches for cancellation.
//! The [`M3uaSession`] handle only talks to that task through channels.

mod handshake;
mod task;

use std::fmt;
use std::net::SocketAddr;
use std::time::Duration;

use bytes::Bytes;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::{lookup_host, TcpStream};
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio_util::codec::Framed;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::codec::M3uaCodec;
use crate::config::AssociationConfig;
use crate::error::{ConnectionError, Error, Result, TransportError};

use task::SessionTask;

/// Lifecycle of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Stream open, ASP handshake not finished
    Unconnected,
    /// ASP is active and user data may be written
    Connected,
    /// Terminal, the session task has ended
    Closed,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionState::Unconnected => write!(f, "unconnected"),
            SessionState::Connected => write!(f, "connected"),
            SessionState::Closed => write!(f, "closed"),
        }
    }
}

/// Events published by a running session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// ASP handshake completed
    Established,

    /// A BEAT ACK answered our last BEAT
    HeartbeatAcked { rtt: Duration },

    /// Peer sent NTFY
    Notify { status_type: u16, status_info: u16 },

    /// Peer sent ERR on an established association
    PeerError { code: u32 },

    /// Session task ended
    Closed { reason: String },
}

/// A user data write waiting for the session task
pub(crate) struct WriteRequest {
    pub user_data: Bytes,
    pub done: oneshot::Sender<Result<()>>,
}

/// Handle to an established M3UA association
pub struct M3uaSession {
    writes: mpsc::Sender<WriteRequest>,
    state: watch::Receiver<SessionState>,
    cancel: CancellationToken,
    task: Option<JoinHandle<Result<()>>>,
    outcome: Option<Result<()>>,
}

impl M3uaSession {
    /// Resolve `remote`, open a TCP connection and bring the ASP up
    ///
    /// Resolution plus TCP connect, and each handshake step, are bounded by
    /// the configured connect timeout.
    pub async fn connect(
        remote: &str,
        config: AssociationConfig,
    ) -> Result<(Self, mpsc::Receiver<SessionEvent>)> {
        let timeout = config.connect_timeout();
        let stream = tokio::time::timeout(timeout, dial(remote))
            .await
            .map_err(|_| ConnectionError::Timeout {
                stage: "connect",
                timeout,
            })??;

        if let Err(e) = stream.set_nodelay(true) {
            debug!("Failed to set TCP_NODELAY: {}", e);
        }
        match stream.peer_addr() {
            Ok(peer) => info!("M3UA transport connected to {} ({})", remote, peer),
            Err(_) => info!("M3UA transport connected to {}", remote),
        }

        Self::establish(stream, config).await
    }

    /// Run the ASP handshake over an already connected stream and start
    /// the session task
    pub async fn establish<S>(
        stream: S,
        config: AssociationConfig,
    ) -> Result<(Self, mpsc::Receiver<SessionEvent>)>
    where
        S: AsyncRead + AsyncWrite + Send + Unpin + 'static,
    {
        let capacity = config.queue_capacity.max(1);
        let (events_tx, events_rx) = mpsc::channel(capacity);
        let (writes_tx, writes_rx) = mpsc::channel(capacity);
        let (state_tx, state_rx) = watch::channel(SessionState::Unconnected);

        let mut framed = Framed::new(stream, M3uaCodec);
        handshake::run(&mut framed, &config).await?;

        state_tx.send_replace(SessionState::Connected);
        let _ = events_tx.try_send(SessionEvent::Established);
        info!(
            "M3UA association active (OPC {:#x}, DPC {:#x})",
            config.originating_point_code, config.destination_point_code
        );

        let cancel = CancellationToken::new();
        let task = SessionTask::new(
            framed,
            config,
            writes_rx,
            events_tx,
            state_tx,
            cancel.clone(),
        );
        let handle = tokio::spawn(task.run());

        Ok((
            Self {
                writes: writes_tx,
                state: state_rx,
                cancel,
                task: Some(handle),
                outcome: None,
            },
            events_rx,
        ))
    }

    /// Current session state
    pub fn state(&self) -> SessionState {
        *self.state.borrow()
    }

    /// Send `user_data` in one DATA message
    ///
    /// Resolves once the bytes were written to the stream.
    pub async fn write(&self, user_data: impl Into<Bytes>) -> Result<()> {
        if self.state() != SessionState::Connected {
            return Err(TransportError::NotConnected.into());
        }

        let (done, done_rx) = oneshot::channel();
        let request = WriteRequest {
            user_data: user_data.into(),
            done,
        };
        self.writes
            .send(request)
            .await
            .map_err(|_| Error::from(TransportError::NotConnected))?;

        done_rx
            .await
            .map_err(|_| Error::from(TransportError::NotConnected))?
    }

    /// Ask the session task to stop
    ///
    /// Queued writes are still flushed before ASPDN is sent.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Wait for the session task to end and return its outcome
    ///
    /// Safe to call again, or to use in `select!`: the outcome is kept once
    /// the task has finished.
    pub async fn closed(&mut self) -> Result<()> {
        if let Some(outcome) = &self.outcome {
            return outcome.clone();
        }

        let outcome = match self.task.as_mut() {
            Some(task) => match task.await {
                Ok(result) => result,
                Err(e) => Err(ConnectionError::Io(format!("session task failed: {}", e)).into()),
            },
            None => Ok(()),
        };
        self.task = None;
        self.outcome = Some(outcome.clone());
        outcome
    }

    /// Cancel and wait for the orderly shutdown
    pub async fn close(&mut self) -> Result<()> {
        self.cancel();
        self.closed().await
    }
}

impl fmt::Debug for M3uaSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "M3uaSession({})", self.state())
    }
}

async fn dial(remote: &str) -> std::result::Result<TcpStream, ConnectionError> {
    let addrs: Vec<SocketAddr> = lookup_host(remote)
        .await
        .map_err(|e| ConnectionError::Resolve {
            address: remote.to_string(),
            reason: e.to_string(),
        })?
        .collect();

    if addrs.is_empty() {
        return Err(ConnectionError::Resolve {
            address: remote.to_string(),
            reason: "no addresses found".to_string(),
        });
    }

    let mut last_error = String::new();
    for addr in addrs {
        debug!("Connecting to {}", addr);
        match TcpStream::connect(addr).await {
            Ok(stream) => return Ok(stream),
            Err(e) => {
                debug!("Connect to {} failed: {}", addr, e);
                last_error = e.to_string();
            }
        }
    }

    Err(ConnectionError::Connect {
        address: remote.to_string(),
        reason: last_error,
    })
}
