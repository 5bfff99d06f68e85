//! Session State Machine
//!
//! Owns the gateway connection: drives the identify handshake, supervises
//! heartbeats, decodes inbound frames, and routes presence/message events
//! into the store. All commands return immediately; outcomes are observed
//! through `phase()` and the derived views, never through raised errors.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio::time::interval;

use crate::auth::CredentialProvider;
use crate::config::GatewaySettings;

use super::events::{self, ActionEvent, ServerEvent};
use super::store::ChatState;
use super::transport::{TransportEvent, TransportFactory, TransportSink, TransportStream};

/// Connection lifecycle phase.
///
/// `Disconnected` is the initial state, the terminal state, and the
/// landing point of every error path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionPhase {
    #[default]
    Disconnected,
    /// Transport open in flight
    Connecting,
    /// Identify sent, waiting for the ready snapshot
    AwaitingReady,
    /// Ready received; events flow into the store
    Live,
}

/// Handle to a live outbound channel for one connection attempt.
struct Connection {
    generation: u64,
    outbound: mpsc::UnboundedSender<String>,
}

struct SessionInner {
    settings: GatewaySettings,
    credentials: Arc<dyn CredentialProvider>,
    factory: Arc<dyn TransportFactory>,
    state: Mutex<ChatState>,
    phase: Mutex<SessionPhase>,
    conn: Mutex<Option<Connection>>,
    /// Bumped on every connect/disconnect; a connection task whose
    /// generation is stale must not touch session state.
    generation: AtomicU64,
    /// Locally chosen display name, used only in the legacy anonymous
    /// mode before an authenticated identity exists.
    username: Mutex<String>,
}

/// The realtime chat session.
///
/// Construct one per client with an injected credential provider and
/// transport factory, then drive it with [`connect`](Self::connect),
/// [`disconnect`](Self::disconnect), and
/// [`send_message`](Self::send_message). Cloning the session hands out
/// another handle to the same underlying state.
#[derive(Clone)]
pub struct ChatSession {
    inner: Arc<SessionInner>,
}

impl ChatSession {
    /// Create a disconnected session.
    pub fn new(
        settings: GatewaySettings,
        credentials: Arc<dyn CredentialProvider>,
        factory: Arc<dyn TransportFactory>,
    ) -> Self {
        Self {
            inner: Arc::new(SessionInner {
                settings,
                credentials,
                factory,
                state: Mutex::new(ChatState::new()),
                phase: Mutex::new(SessionPhase::default()),
                conn: Mutex::new(None),
                generation: AtomicU64::new(0),
                username: Mutex::new(String::new()),
            }),
        }
    }

    /// Open the gateway connection.
    ///
    /// No-op unless the credential provider authorizes the client and no
    /// connection is already in flight. Must be called from within a
    /// tokio runtime; the connection runs as a spawned task and failures
    /// land the session back in `Disconnected`.
    pub fn connect(&self) {
        if !self.inner.credentials.authorized() {
            tracing::debug!("Connect refused: not authorized");
            return;
        }
        let Some(token) = self.inner.credentials.token() else {
            tracing::debug!("Connect refused: no token");
            return;
        };

        {
            let mut phase = self.inner.phase.lock();
            if *phase != SessionPhase::Disconnected {
                tracing::debug!(phase = ?*phase, "Connect ignored: already in flight");
                return;
            }
            *phase = SessionPhase::Connecting;
        }

        let generation = self.inner.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let inner = Arc::clone(&self.inner);
        tokio::spawn(run_connection(inner, generation, token));
    }

    /// Tear the connection down and clear all derived state. Idempotent.
    pub fn disconnect(&self) {
        // Invalidate any running connection task before touching state;
        // a stale task observes the bumped generation and stands down.
        self.inner.generation.fetch_add(1, Ordering::SeqCst);
        // Dropping the outbound sender wakes the connection loop
        *self.inner.conn.lock() = None;
        self.inner.state.lock().reset();
        *self.inner.phase.lock() = SessionPhase::Disconnected;
        tracing::info!("Session disconnected");
    }

    /// Queue a chat message for sending.
    ///
    /// No-op when no connection handle exists; callers observe
    /// connectivity through [`phase`](Self::phase) rather than an error.
    pub fn send_message(&self, text: &str) {
        let conn = self.inner.conn.lock();
        let Some(conn) = conn.as_ref() else {
            tracing::trace!("send_message dropped: not connected");
            return;
        };
        let _ = conn.outbound.send(events::outbound_message(text));
    }

    /// Set the legacy anonymous-mode display name.
    pub fn set_username(&self, username: impl Into<String>) {
        *self.inner.username.lock() = username.into();
    }

    /// The legacy anonymous-mode display name.
    pub fn username(&self) -> String {
        self.inner.username.lock().clone()
    }

    /// Current lifecycle phase.
    pub fn phase(&self) -> SessionPhase {
        *self.inner.phase.lock()
    }

    /// Snapshot of the currently-present users.
    pub fn users(&self) -> Vec<crate::domain::User> {
        self.inner.state.lock().users()
    }

    /// Snapshot of the message log, in arrival order.
    pub fn messages(&self) -> Vec<crate::domain::Message> {
        self.inner.state.lock().messages()
    }
}

/// One connection attempt, from transport open to teardown.
async fn run_connection(inner: Arc<SessionInner>, generation: u64, token: String) {
    let (mut sink, stream) = match inner.factory.connect(&inner.settings.url).await {
        Ok(pair) => pair,
        Err(e) => {
            tracing::warn!(error = %e, "Gateway connect failed");
            teardown(&inner, generation);
            return;
        }
    };

    // The session may already have moved on while the open was in flight
    if inner.generation.load(Ordering::SeqCst) != generation {
        sink.close().await;
        return;
    }

    // Identify is the first outbound frame, before anything else
    if sink.send(events::identify(&token)).await.is_err() {
        tracing::warn!("Failed to send identify");
        sink.close().await;
        teardown(&inner, generation);
        return;
    }

    let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel::<String>();
    {
        let mut conn = inner.conn.lock();
        if inner.generation.load(Ordering::SeqCst) != generation {
            drop(conn);
            sink.close().await;
            return;
        }
        *conn = Some(Connection {
            generation,
            outbound: outbound_tx,
        });
    }
    set_phase(&inner, generation, SessionPhase::AwaitingReady);
    tracing::debug!("Identify sent, awaiting ready");

    // Forward inbound frames into the session mailbox so reads and
    // writes run concurrently over the split transport
    let (inbound_tx, mut inbound_rx) = mpsc::unbounded_channel::<TransportEvent>();
    let reader = tokio::spawn(forward_inbound(stream, inbound_tx));

    // Heartbeat runs for the lifetime of this loop; dropping the loop
    // cancels it, which keeps timer and connection coupled 1:1
    let mut heartbeat = interval(inner.settings.heartbeat_interval());
    heartbeat.tick().await; // Skip first immediate tick
    let mut sequence: u64 = 0;
    let mut pending_ack: Option<u64> = None;

    loop {
        tokio::select! {
            // Outbound frames queued by send_message
            frame = outbound_rx.recv() => {
                match frame {
                    Some(frame) => {
                        if sink.send(frame).await.is_err() {
                            tracing::debug!("Write failed, closing");
                            break;
                        }
                    }
                    // All senders dropped: the session disconnected us
                    None => break,
                }
            }

            // Inbound frames
            event = inbound_rx.recv() => {
                match event {
                    Some(TransportEvent::Frame(text)) => {
                        match events::decode(&text) {
                            Some(ServerEvent::PingAck { sequence: acked }) => {
                                if pending_ack == Some(acked) {
                                    pending_ack = None;
                                }
                            }
                            Some(ServerEvent::Action(action)) => {
                                apply_action(&inner, generation, action);
                            }
                            Some(ServerEvent::Error { code, message }) => {
                                tracing::warn!(?code, %message, "Gateway error, closing");
                                break;
                            }
                            // Malformed or unknown frames are dropped by
                            // contract, never surfaced
                            None => tracing::trace!("Dropped unknown frame"),
                        }
                    }
                    Some(TransportEvent::Closed) | None => {
                        tracing::debug!("Gateway connection closed");
                        break;
                    }
                }
            }

            // Heartbeat supervision
            _ = heartbeat.tick() => {
                if pending_ack.is_some() {
                    tracing::warn!("Heartbeat ack missed, presuming connection dead");
                    break;
                }
                sequence += 1;
                pending_ack = Some(sequence);
                if sink.send(events::ping(sequence)).await.is_err() {
                    tracing::debug!("Heartbeat write failed, closing");
                    break;
                }
            }
        }
    }

    sink.close().await;
    reader.abort();
    teardown(&inner, generation);
}

/// Pump the transport read half into the session mailbox until the
/// connection closes or the session stops listening.
async fn forward_inbound(
    mut stream: Box<dyn TransportStream>,
    mailbox: mpsc::UnboundedSender<TransportEvent>,
) {
    loop {
        let event = stream.recv().await;
        let closed = matches!(event, TransportEvent::Closed);
        if mailbox.send(event).is_err() || closed {
            break;
        }
    }
}

/// Dispatch one decoded action into the store, guarding against a stale
/// connection task mutating current state.
fn apply_action(inner: &SessionInner, generation: u64, action: ActionEvent) {
    if inner.generation.load(Ordering::SeqCst) != generation {
        return;
    }
    if matches!(action, ActionEvent::Ready { .. }) {
        set_phase(inner, generation, SessionPhase::Live);
        tracing::info!("Session live");
    }
    inner.state.lock().apply(action);
}

fn set_phase(inner: &SessionInner, generation: u64, phase: SessionPhase) {
    if inner.generation.load(Ordering::SeqCst) != generation {
        return;
    }
    *inner.phase.lock() = phase;
}

/// Unconditional teardown: release the connection handle, clear derived
/// state, land in `Disconnected`. No-op for a superseded generation, so
/// running it twice is harmless.
fn teardown(inner: &SessionInner, generation: u64) {
    if inner.generation.load(Ordering::SeqCst) != generation {
        return;
    }
    {
        let mut conn = inner.conn.lock();
        if conn.as_ref().map(|c| c.generation) == Some(generation) {
            *conn = None;
        }
    }
    inner.state.lock().reset();
    *inner.phase.lock() = SessionPhase::Disconnected;
    tracing::info!("Session torn down");
}
