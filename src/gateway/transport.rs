//! Gateway Transport
//!
//! The wire seam for the session machine. A connection is handed out as a
//! split sink/stream pair so the session can read and write concurrently,
//! the same way the socket itself is split. Production uses a
//! `tokio-tungstenite` WebSocket; tests inject a channel-backed fake
//! through the same traits.

use async_trait::async_trait;
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::{connect_async, tungstenite, MaybeTlsStream, WebSocketStream};

use crate::shared::ClientError;

/// One inbound notification from the transport.
#[derive(Debug)]
pub enum TransportEvent {
    /// A complete text frame
    Frame(String),
    /// The peer closed the connection or the transport failed
    Closed,
}

/// Write half of a connection.
#[async_trait]
pub trait TransportSink: Send {
    /// Write one outbound frame.
    async fn send(&mut self, frame: String) -> Result<(), ClientError>;

    /// Close the connection. Best-effort and idempotent.
    async fn close(&mut self);
}

/// Read half of a connection.
#[async_trait]
pub trait TransportStream: Send {
    /// Wait for the next inbound event. After `Closed` is returned the
    /// stream yields nothing further.
    async fn recv(&mut self) -> TransportEvent;
}

/// Opens transport connections; the session machine holds one of these
/// rather than touching the network directly.
#[async_trait]
pub trait TransportFactory: Send + Sync {
    async fn connect(
        &self,
        url: &str,
    ) -> Result<(Box<dyn TransportSink>, Box<dyn TransportStream>), ClientError>;
}

type WsStreamInner = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Write half of a `tokio-tungstenite` WebSocket.
pub struct WsSink {
    sink: SplitSink<WsStreamInner, tungstenite::Message>,
}

#[async_trait]
impl TransportSink for WsSink {
    async fn send(&mut self, frame: String) -> Result<(), ClientError> {
        self.sink
            .send(tungstenite::Message::Text(frame.into()))
            .await
            .map_err(Into::into)
    }

    async fn close(&mut self) {
        let _ = self.sink.close().await;
    }
}

/// Read half of a `tokio-tungstenite` WebSocket.
pub struct WsStream {
    stream: SplitStream<WsStreamInner>,
}

#[async_trait]
impl TransportStream for WsStream {
    async fn recv(&mut self) -> TransportEvent {
        loop {
            match self.stream.next().await {
                Some(Ok(tungstenite::Message::Text(text))) => {
                    return TransportEvent::Frame(text.to_string())
                }
                // Control frames are not part of the protocol; the
                // heartbeat rides in text frames
                Some(Ok(tungstenite::Message::Ping(_)))
                | Some(Ok(tungstenite::Message::Pong(_)))
                | Some(Ok(tungstenite::Message::Binary(_)))
                | Some(Ok(tungstenite::Message::Frame(_))) => continue,
                Some(Ok(tungstenite::Message::Close(_))) | None => return TransportEvent::Closed,
                Some(Err(e)) => {
                    tracing::debug!(error = %e, "WebSocket read error");
                    return TransportEvent::Closed;
                }
            }
        }
    }
}

/// Factory producing WebSocket connections.
#[derive(Debug, Default)]
pub struct WsTransportFactory;

#[async_trait]
impl TransportFactory for WsTransportFactory {
    async fn connect(
        &self,
        url: &str,
    ) -> Result<(Box<dyn TransportSink>, Box<dyn TransportStream>), ClientError> {
        let (stream, _) = connect_async(url)
            .await
            .map_err(|e| ClientError::Connect(e.to_string()))?;
        let (sink, stream) = stream.split();
        Ok((Box::new(WsSink { sink }), Box::new(WsStream { stream })))
    }
}
