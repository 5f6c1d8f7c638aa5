//! In-memory signalling gateway used by the session tests

#![allow(dead_code)]

use futures::{SinkExt, StreamExt};
use m3ua_transport::{AssociationConfig, M3uaCodec, Message, SI_SCCP};
use tokio::io::{duplex, AsyncRead, AsyncWrite, DuplexStream};
use tokio_util::codec::Framed;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

pub fn test_config() -> AssociationConfig {
    AssociationConfig::new(0x11111111, 0x22222222, SI_SCCP, 0, 0, 1)
}

/// Gateway side of an association
pub struct FakePeer<S = DuplexStream> {
    framed: Framed<S, M3uaCodec>,
}

impl FakePeer {
    /// Returns the client end of an in-memory stream and the gateway
    pub fn pair() -> (DuplexStream, FakePeer) {
        let (client, server) = duplex(4096);
        (client, FakePeer::new(server))
    }
}

impl<S: AsyncRead + AsyncWrite + Unpin> FakePeer<S> {
    pub fn new(stream: S) -> Self {
        FakePeer {
            framed: Framed::new(stream, M3uaCodec),
        }
    }

    pub async fn recv(&mut self) -> Option<Message> {
        self.framed
            .next()
            .await
            .map(|frame| frame.expect("valid M3UA frame"))
    }

    pub async fn send(&mut self, message: Message) {
        self.framed.send(message).await.expect("send to client");
    }

    /// Answer ASPUP and ASPAC
    pub async fn accept_handshake(&mut self) {
        match self.recv().await {
            Some(Message::AspUp { .. }) => self.send(Message::AspUpAck).await,
            other => panic!("expected ASPUP, got {:?}", other),
        }
        match self.recv().await {
            Some(Message::AspActive {
                traffic_mode,
                routing_context,
            }) => {
                self.send(Message::AspActiveAck {
                    traffic_mode,
                    routing_context,
                })
                .await
            }
            other => panic!("expected ASPAC, got {:?}", other),
        }
    }

    /// Read everything until the client goes away
    pub async fn drain(mut self) -> Vec<Message> {
        let mut seen = Vec::new();
        while let Some(message) = self.recv().await {
            seen.push(message);
        }
        seen
    }

    /// Answer every BEAT until the client goes away
    pub async fn echo_heartbeats(mut self) -> usize {
        let mut answered = 0;
        while let Some(message) = self.recv().await {
            if let Message::Heartbeat { data } = message {
                if self.framed.send(Message::HeartbeatAck { data }).await.is_err() {
                    break;
                }
                answered += 1;
            }
        }
        answered
    }
}
