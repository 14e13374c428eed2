//! Connection Manager (spec §4.5).
//!
//! Owns the state machine `IDLE → AUTHENTICATING → DIALING → READY →
//! DRAINING → RECONNECTING → (READY|STOPPED)`, the reader/writer/heartbeat
//! tasks, and reconnect backoff. Mirrors the teacher's
//! `Arc<Mutex<Option<WriterHalf>>>` pattern for the socket write half so
//! the writer task and control-message senders never race on the same
//! handle.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, Mutex, RwLock};
use tokio::task::AbortHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

use crate::auth::AuthClient;
use crate::constants::{
    DEFAULT_HEARTBEAT_INTERVAL_SECS, DRAIN_TIMEOUT_MS, HEARTBEAT_TIMEOUT_MULTIPLIER,
    MAX_RECONNECT_ATTEMPTS,
};
use crate::error::{IntrinioError, Result};
use crate::provider::{ControlMessage, ProviderProfile};
use crate::queue::{Counters, EventCallback, FrameSender, RawFrame};
use crate::registry::Registry;
use crate::types::events::TerminalReason;
use crate::types::Event;

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Abort handles for the reader/writer/heartbeat-watch tasks of the
/// currently running connection attempt, kept so `stop()` can tear one down
/// from outside `run_connection` (spec §5: "stop() ... closes the socket,
/// causing reader unblock").
struct ConnectionHandles {
    reader: AbortHandle,
    writer: AbortHandle,
    timeout_watch: AbortHandle,
}

/// Connection lifecycle state (spec §4.5).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Idle,
    Authenticating,
    Dialing,
    Ready,
    Draining,
    Reconnecting,
    Stopped,
}

/// Drives one logical connection: auth, dial, subscribe, heartbeat,
/// detect loss, reconnect. Shared via `Arc` between the public client and
/// its background tasks.
pub struct ConnectionManager {
    profile: ProviderProfile,
    auth: AuthClient,
    registry: Arc<Registry>,
    frame_tx: FrameSender,
    counters: Arc<Counters>,
    state: RwLock<State>,
    control_tx: Mutex<Option<mpsc::UnboundedSender<ControlMessage>>>,
    cancelled: Arc<tokio::sync::Notify>,
    current: Mutex<Option<ConnectionHandles>>,
    callback: Arc<RwLock<EventCallback>>,
}

impl ConnectionManager {
    pub fn new(
        profile: ProviderProfile,
        auth: AuthClient,
        registry: Arc<Registry>,
        frame_tx: FrameSender,
        counters: Arc<Counters>,
        callback: Arc<RwLock<EventCallback>>,
    ) -> Arc<Self> {
        Arc::new(Self {
            profile,
            auth,
            registry,
            frame_tx,
            counters,
            state: RwLock::new(State::Idle),
            control_tx: Mutex::new(None),
            cancelled: Arc::new(tokio::sync::Notify::new()),
            current: Mutex::new(None),
            callback,
        })
    }

    pub async fn state(&self) -> State {
        *self.state.read().await
    }

    async fn set_state(&self, next: State) {
        let mut state = self.state.write().await;
        tracing::info!(from = ?*state, to = ?next, "connection state transition");
        *state = next;
    }

    /// Deliver a terminal event to the registered callback (spec §7:
    /// `ReconnectExhausted` and equivalent fatal outcomes are "surfaced via
    /// a terminal event and by stopping the client").
    async fn emit_terminal(&self, reason: TerminalReason) {
        let callback = self.callback.read().await.clone();
        crate::queue::dispatch(&callback, Event::Terminal(reason));
    }

    /// `start()` (spec §4.5): AUTHENTICATING → DIALING → READY, then flush
    /// the subscription registry. Spawns the reader/writer/heartbeat/
    /// reconnect loop as its own background task and returns as soon as the
    /// first connection attempt either reaches READY or fails fatally —
    /// callers must be able to call `join`/`leave`/`stop` while the
    /// connection is healthy (spec §4.8), not block for the connection's
    /// entire lifetime.
    pub async fn start(self: &Arc<Self>) -> Result<()> {
        self.set_state(State::Authenticating).await;
        let token = match self.auth.fetch_token(&self.profile).await {
            Ok(token) => token,
            Err(e) => {
                tracing::error!(error = %e, "authentication failed, not dialing");
                self.set_state(State::Stopped).await;
                return Err(e);
            }
        };

        self.set_state(State::Dialing).await;
        let socket = match self.dial(&token.value).await {
            Ok(socket) => socket,
            Err(e) => {
                tracing::error!(error = %e, "initial dial failed");
                self.set_state(State::Stopped).await;
                return Err(e);
            }
        };
        self.bring_up(socket).await;
        Ok(())
    }

    /// Like [`start`](Self::start) but dials `url` directly instead of
    /// deriving it from the provider profile, bypassing auth entirely.
    /// Exposed so tests can point the Connection Manager at a plain-`ws://`
    /// fake server without a live vendor endpoint, mirroring
    /// `AuthClient::fetch_token_from_url`.
    pub async fn start_with_url(self: &Arc<Self>, url: &str) -> Result<()> {
        self.set_state(State::Dialing).await;
        let socket = match self.dial_url(url).await {
            Ok(socket) => socket,
            Err(e) => {
                self.set_state(State::Stopped).await;
                return Err(e);
            }
        };
        self.bring_up(socket).await;
        Ok(())
    }

    /// Shared READY transition: flush the registry, spawn the background
    /// connection loop.
    async fn bring_up(self: &Arc<Self>, socket: Socket) {
        self.set_state(State::Ready).await;

        let (control_tx, control_rx) = mpsc::unbounded_channel();
        *self.control_tx.lock().await = Some(control_tx);
        self.flush_registry().await;

        let this = self.clone();
        tokio::spawn(async move {
            this.run_connection(socket, control_rx).await;
        });
    }

    async fn dial(&self, token: &str) -> Result<Socket> {
        self.dial_url(&self.profile.socket_url(token)).await
    }

    async fn dial_url(&self, url: &str) -> Result<Socket> {
        let (socket, _response) = tokio_tungstenite::connect_async(url).await?;
        Ok(socket)
    }

    /// Send every channel currently in the registry as a fresh join
    /// (spec §4.4, §8 property 4: "reconnect replay ... in insertion
    /// order").
    async fn flush_registry(&self) {
        let channels = self.registry.snapshot_for_replay();
        let guard = self.control_tx.lock().await;
        let Some(tx) = guard.as_ref() else { return };
        for channel in channels {
            let msg = self.profile.encode_join(&channel);
            if tx.send(msg).is_err() {
                tracing::warn!("control channel closed while flushing registry");
                break;
            }
        }
    }

    /// Enqueue a control message (join/leave) if currently connected;
    /// otherwise it's silently dropped — the registry itself is the
    /// durable record, replayed on the next successful dial.
    pub async fn send_control(&self, msg: ControlMessage) {
        let guard = self.control_tx.lock().await;
        if let Some(tx) = guard.as_ref() {
            let _ = tx.send(msg);
        }
    }

    /// Run the reader/writer/heartbeat loop for one connection attempt,
    /// then handle reconnect or shutdown (spec §4.5).
    async fn run_connection(
        self: &Arc<Self>,
        socket: Socket,
        mut control_rx: mpsc::UnboundedReceiver<ControlMessage>,
    ) {
        let (mut write, mut read) = socket.split();
        let last_rx = Arc::new(AtomicU64::new(now_millis()));
        let heartbeat = self.profile.heartbeat_message();

        let writer_cancel = self.cancelled.clone();
        let writer = tokio::spawn(async move {
            let mut ticker =
                tokio::time::interval(Duration::from_secs(DEFAULT_HEARTBEAT_INTERVAL_SECS));
            loop {
                tokio::select! {
                    _ = writer_cancel.notified() => {
                        // Best-effort close frame; the socket is going away
                        // either way once reader/writer both exit.
                        let _ = write.close().await;
                        return;
                    }
                    _ = ticker.tick() => {
                        if write_message(&mut write, &heartbeat).await.is_err() {
                            return;
                        }
                    }
                    msg = control_rx.recv() => {
                        match msg {
                            Some(m) => {
                                if write_message(&mut write, &m).await.is_err() {
                                    return;
                                }
                            }
                            None => return,
                        }
                    }
                }
            }
        });

        let reader_frame_tx = self.frame_tx.clone();
        let reader_last_rx = last_rx.clone();
        let reader = tokio::spawn(async move {
            while let Some(msg) = read.next().await {
                match msg {
                    Ok(Message::Binary(bytes)) => {
                        reader_last_rx.store(now_millis(), Ordering::Relaxed);
                        reader_frame_tx
                            .try_send(RawFrame::Binary(bytes.to_vec()))
                            .await;
                    }
                    Ok(Message::Text(text)) => {
                        reader_last_rx.store(now_millis(), Ordering::Relaxed);
                        reader_frame_tx
                            .try_send(RawFrame::Text(text.as_str().as_bytes().to_vec()))
                            .await;
                    }
                    Ok(Message::Close(_)) => break,
                    Ok(_) => {}
                    Err(err) => {
                        tracing::warn!(error = %err, "websocket read error");
                        break;
                    }
                }
            }
        });

        let timeout_watch = {
            let last_rx = last_rx.clone();
            let cancel = self.cancelled.clone();
            let timeout = Duration::from_secs(
                DEFAULT_HEARTBEAT_INTERVAL_SECS * u64::from(HEARTBEAT_TIMEOUT_MULTIPLIER),
            );
            tokio::spawn(async move {
                loop {
                    tokio::select! {
                        _ = cancel.notified() => return,
                        _ = tokio::time::sleep(Duration::from_secs(1)) => {
                            let elapsed = now_millis().saturating_sub(last_rx.load(Ordering::Relaxed));
                            if elapsed >= timeout.as_millis() as u64 {
                                tracing::warn!("heartbeat timeout, forcing reconnect");
                                return;
                            }
                        }
                    }
                }
            })
        };

        *self.current.lock().await = Some(ConnectionHandles {
            reader: reader.abort_handle(),
            writer: writer.abort_handle(),
            timeout_watch: timeout_watch.abort_handle(),
        });

        let mut reader = reader;
        let mut timeout_watch = timeout_watch;
        tokio::select! {
            _ = &mut reader => {}
            _ = &mut timeout_watch => {}
        }

        // Whichever branch resolved, tear down everything belonging to this
        // connection attempt: notify cooperative waiters, then abort
        // anything still running so the reader never leaks a blocked
        // socket read (spec §5: "stop() ... closes the socket, causing
        // reader unblock").
        self.cancelled.notify_waiters();
        reader.abort();
        writer.abort();
        timeout_watch.abort();
        let _ = writer.await;
        let _ = reader.await;
        let _ = timeout_watch.await;
        *self.current.lock().await = None;

        if self.state().await == State::Draining {
            self.set_state(State::Stopped).await;
            return;
        }

        self.reconnect().await;
    }

    /// RECONNECTING with randomized exponential backoff, full jitter,
    /// max attempts before surfacing fatal (spec §4.5).
    async fn reconnect(self: &Arc<Self>) {
        self.set_state(State::Reconnecting).await;
        self.counters.reconnects.fetch_add(1, Ordering::Relaxed);

        for attempt in 1..=MAX_RECONNECT_ATTEMPTS {
            let delay = crate::backoff::delay_for_attempt(attempt);
            tracing::info!(attempt, delay_ms = delay.as_millis() as u64, "reconnecting");
            tokio::time::sleep(delay).await;

            match self.auth.fetch_token(&self.profile).await {
                Ok(token) => match self.dial(&token.value).await {
                    Ok(socket) => {
                        self.bring_up(socket).await;
                        return;
                    }
                    Err(err) => {
                        tracing::warn!(error = %err, attempt, "reconnect dial failed");
                    }
                },
                Err(IntrinioError::Auth(msg)) => {
                    tracing::error!(%msg, "reconnect auth rejected, stopping");
                    self.set_state(State::Stopped).await;
                    self.emit_terminal(TerminalReason::AuthRejected(msg)).await;
                    return;
                }
                Err(err) => {
                    tracing::warn!(error = %err, attempt, "reconnect auth failed");
                }
            }
        }

        let err = IntrinioError::ReconnectExhausted {
            attempts: MAX_RECONNECT_ATTEMPTS,
        };
        tracing::error!(error = %err, "giving up on reconnecting");
        self.set_state(State::Stopped).await;
        self.emit_terminal(TerminalReason::ReconnectExhausted {
            attempts: MAX_RECONNECT_ATTEMPTS,
        })
        .await;
    }

    /// `stop()` (spec §4.5): DRAINING (close socket, drain queue up to
    /// 5 s) → STOPPED.
    pub async fn stop(&self) {
        self.set_state(State::Draining).await;
        self.cancelled.notify_waiters();
        if let Some(handles) = self.current.lock().await.as_ref() {
            handles.reader.abort();
            handles.writer.abort();
            handles.timeout_watch.abort();
        }
        tokio::time::sleep(Duration::from_millis(DRAIN_TIMEOUT_MS.min(5_000))).await;
        self.set_state(State::Stopped).await;
    }
}

async fn write_message(
    write: &mut futures_util::stream::SplitSink<Socket, Message>,
    msg: &ControlMessage,
) -> std::result::Result<(), tokio_tungstenite::tungstenite::Error> {
    match msg {
        ControlMessage::Text(text) => write.send(Message::Text(text.clone().into())).await,
        ControlMessage::Binary(bytes) => write.send(Message::Binary(bytes.clone().into())).await,
    }
}

fn now_millis() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
