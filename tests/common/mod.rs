//! Common Test Utilities
//!
//! A channel-backed fake transport that stands in for the WebSocket, plus
//! frame fixtures and polling helpers. Tests drive the session through
//! the same `TransportFactory` seam production uses.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio::time::timeout;

use chat_client::auth::StaticCredentials;
use chat_client::config::GatewaySettings;
use chat_client::gateway::transport::{
    TransportEvent, TransportFactory, TransportSink, TransportStream,
};
use chat_client::gateway::ChatSession;
use chat_client::shared::ClientError;

/// Test-side handle to one fake connection: observe what the client
/// sent, push frames "from the server", close the wire.
pub struct FakeGateway {
    sent: mpsc::UnboundedReceiver<String>,
    inbound: mpsc::UnboundedSender<TransportEvent>,
    closed: Arc<AtomicBool>,
}

impl FakeGateway {
    /// Wait for the next outbound frame and parse it as JSON.
    pub async fn expect_frame(&mut self) -> serde_json::Value {
        let frame = timeout(Duration::from_secs(2), self.sent.recv())
            .await
            .expect("timed out waiting for an outbound frame")
            .expect("transport dropped before sending");
        serde_json::from_str(&frame).expect("outbound frame is not valid json")
    }

    /// Pop an outbound frame if one has already been written.
    pub fn try_frame(&mut self) -> Option<serde_json::Value> {
        self.sent
            .try_recv()
            .ok()
            .map(|frame| serde_json::from_str(&frame).expect("outbound frame is not valid json"))
    }

    /// Assert nothing has been written to the wire.
    pub fn expect_no_frame(&mut self) {
        assert!(
            self.sent.try_recv().is_err(),
            "expected no outbound frame, but one was written"
        );
    }

    /// Deliver a server frame to the client.
    pub fn push(&self, frame: serde_json::Value) {
        let _ = self.inbound.send(TransportEvent::Frame(frame.to_string()));
    }

    /// Deliver raw (possibly malformed) text to the client.
    pub fn push_raw(&self, text: &str) {
        let _ = self.inbound.send(TransportEvent::Frame(text.to_string()));
    }

    /// Close the wire from the server side.
    pub fn close(&self) {
        let _ = self.inbound.send(TransportEvent::Closed);
    }

    /// Whether the client closed its end.
    pub fn client_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

struct FakeSink {
    sent: mpsc::UnboundedSender<String>,
    closed: Arc<AtomicBool>,
}

#[async_trait]
impl TransportSink for FakeSink {
    async fn send(&mut self, frame: String) -> Result<(), ClientError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(ClientError::Closed);
        }
        self.sent.send(frame).map_err(|_| ClientError::Closed)
    }

    async fn close(&mut self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}

struct FakeStream {
    inbound: mpsc::UnboundedReceiver<TransportEvent>,
}

#[async_trait]
impl TransportStream for FakeStream {
    async fn recv(&mut self) -> TransportEvent {
        match self.inbound.recv().await {
            Some(event) => event,
            None => TransportEvent::Closed,
        }
    }
}

/// Factory handing each `connect()` call a fresh fake connection and
/// pushing the matching [`FakeGateway`] handle to the test.
pub struct FakeTransportFactory {
    gateways: mpsc::UnboundedSender<FakeGateway>,
}

impl FakeTransportFactory {
    pub fn new() -> (Arc<Self>, mpsc::UnboundedReceiver<FakeGateway>) {
        let (gateways, rx) = mpsc::unbounded_channel();
        (Arc::new(Self { gateways }), rx)
    }
}

#[async_trait]
impl TransportFactory for FakeTransportFactory {
    async fn connect(
        &self,
        _url: &str,
    ) -> Result<(Box<dyn TransportSink>, Box<dyn TransportStream>), ClientError> {
        let (sent_tx, sent_rx) = mpsc::unbounded_channel();
        let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();
        let closed = Arc::new(AtomicBool::new(false));
        let _ = self.gateways.send(FakeGateway {
            sent: sent_rx,
            inbound: inbound_tx,
            closed: Arc::clone(&closed),
        });
        Ok((
            Box::new(FakeSink {
                sent: sent_tx,
                closed,
            }),
            Box::new(FakeStream {
                inbound: inbound_rx,
            }),
        ))
    }
}

/// Factory whose `connect()` always fails, for open-error paths.
pub struct FailingTransportFactory {
    attempts: AtomicUsize,
}

impl FailingTransportFactory {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            attempts: AtomicUsize::new(0),
        })
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TransportFactory for FailingTransportFactory {
    async fn connect(
        &self,
        url: &str,
    ) -> Result<(Box<dyn TransportSink>, Box<dyn TransportStream>), ClientError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(ClientError::Connect(format!("refused: {}", url)))
    }
}

/// Gateway settings pointing at nothing real; the wire is always faked.
pub fn test_settings(heartbeat_interval_ms: u64) -> GatewaySettings {
    GatewaySettings {
        url: "ws://gateway.test/ws".to_string(),
        heartbeat_interval_ms,
    }
}

/// A session holding a valid token, wired to a fake transport factory.
pub fn authorized_session(
    heartbeat_interval_ms: u64,
) -> (ChatSession, mpsc::UnboundedReceiver<FakeGateway>) {
    let (factory, gateways) = FakeTransportFactory::new();
    let session = ChatSession::new(
        test_settings(heartbeat_interval_ms),
        StaticCredentials::with_token("abc"),
        factory,
    );
    (session, gateways)
}

/// Wait for the fake connection created by the last `connect()`.
pub async fn next_gateway(gateways: &mut mpsc::UnboundedReceiver<FakeGateway>) -> FakeGateway {
    timeout(Duration::from_secs(2), gateways.recv())
        .await
        .expect("timed out waiting for a connection attempt")
        .expect("factory dropped")
}

/// Poll until `cond` holds; panics after two seconds.
pub async fn wait_until(mut cond: impl FnMut() -> bool) {
    timeout(Duration::from_secs(2), async {
        while !cond() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("condition not met in time");
}

// ============================================================================
// Frame fixtures
// ============================================================================

pub fn user_value(id: &str, username: &str) -> serde_json::Value {
    serde_json::json!({
        "id": id,
        "username": username,
        "created": "2023-02-27T12:00:00Z",
    })
}

pub fn message_value(id: &str, content: &str, author: &serde_json::Value) -> serde_json::Value {
    serde_json::json!({
        "id": id,
        "content": content,
        "author": author,
        "timestamp": "2023-02-27T12:01:00Z",
    })
}

pub fn ready_frame(users: Vec<serde_json::Value>, messages: Vec<serde_json::Value>) -> serde_json::Value {
    serde_json::json!({ "op": 3, "action": 1, "data": { "users": users, "messages": messages } })
}

pub fn join_frame(user: serde_json::Value) -> serde_json::Value {
    serde_json::json!({ "op": 3, "action": 2, "data": { "user": user } })
}

pub fn leave_frame(user: serde_json::Value) -> serde_json::Value {
    serde_json::json!({ "op": 3, "action": 3, "data": { "user": user } })
}

pub fn message_frame(message: serde_json::Value) -> serde_json::Value {
    serde_json::json!({ "op": 3, "action": 4, "data": { "message": message } })
}

pub fn error_frame(code: u8, message: &str) -> serde_json::Value {
    serde_json::json!({ "op": 4, "action": 0, "data": { "code": code, "message": message } })
}

pub fn ping_ack_frame(sequence: u64) -> serde_json::Value {
    serde_json::json!({ "op": 2, "action": 0, "data": { "sequence": sequence } })
}
