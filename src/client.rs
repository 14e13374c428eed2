//! Public Client API (spec §4.8).
//!
//! Wires together [`Config`], [`ProviderProfile`], [`AuthClient`],
//! [`Registry`], the bounded queue/worker pool, and the
//! [`ConnectionManager`] behind a small surface: `join`/`leave`/`start`/
//! `stop`/`get_stats`, plus runtime callback registration.

use std::sync::Arc;

use tokio::sync::RwLock;

use crate::config::Config;
use crate::connection::ConnectionManager;
use crate::error::Result;
use crate::provider::ProviderProfile;
use crate::queue::{self, Counters, EventCallback, FrameReceiver, FrameSender};
use crate::registry::Registry;
use crate::types::{Channel, Event, Stats};

/// Real-time streaming client (spec §4.8).
///
/// Construct with [`Client::new`], register callbacks, then call
/// [`Client::start`]. `start()` returns as soon as the first connection
/// attempt reaches `READY` (or fails fatally) — it does not block for the
/// connection's lifetime, so `join`/`leave`/`get_stats`/`stop` can be
/// called from the same task right after it returns. `join`/`leave` can be
/// called at any time; if the connection is not currently `READY` the
/// subscription is still recorded and replayed once the connection becomes
/// ready (spec §4.4).
pub struct Client {
    config: Config,
    registry: Arc<Registry>,
    counters: Arc<Counters>,
    frame_tx: FrameSender,
    frame_rx: RwLock<Option<FrameReceiver>>,
    connection: Arc<ConnectionManager>,
    callback: Arc<RwLock<EventCallback>>,
    workers: RwLock<Vec<tokio::task::JoinHandle<()>>>,
}

impl Client {
    /// Build a new client from `config`, validating it first (spec §4.8,
    /// §4.9). `on_event` is the initial callback; it can be replaced later
    /// with [`Client::set_callback`] (spec §9 "dynamic callback
    /// registration").
    pub fn new(config: Config, on_event: EventCallback) -> Result<Self> {
        config.validate()?;

        let profile = ProviderProfile::lookup(
            config.provider,
            config.delayed,
            config.manual_ip_address.as_deref(),
        )?;
        let auth = crate::auth::AuthClient::new(config.api_key.clone());
        let registry = Arc::new(Registry::new());
        let (frame_tx, frame_rx, counters) = queue::channel(config.max_queue_size);
        let callback: Arc<RwLock<EventCallback>> = Arc::new(RwLock::new(on_event));
        let connection = ConnectionManager::new(
            profile,
            auth,
            registry.clone(),
            frame_tx.clone(),
            counters.clone(),
            callback.clone(),
        );

        for symbol in &config.symbols {
            registry.join(Channel::new(symbol.clone()));
        }

        Ok(Self {
            config,
            registry,
            counters,
            frame_tx,
            frame_rx: RwLock::new(Some(frame_rx)),
            connection,
            callback,
            workers: RwLock::new(Vec::new()),
        })
    }

    /// Replace the event callback at runtime (spec §9). In-flight
    /// dispatches keep using whichever callback they already captured;
    /// new dispatches after this call use the replacement. This also
    /// changes which callback receives a future terminal event (spec §7),
    /// since the Connection Manager shares this same callback slot.
    pub async fn set_callback(&self, on_event: EventCallback) {
        *self.callback.write().await = on_event;
    }

    /// `start()`/`connect()` (spec §4.8): spins up the worker pool, then
    /// drives the Connection Manager through AUTHENTICATING → DIALING →
    /// READY. Returns once that first attempt settles; the reader/writer/
    /// heartbeat/reconnect loop that keeps the connection alive afterward
    /// runs in the background, so this call does not block for the
    /// connection's lifetime.
    pub async fn start(&self) -> Result<()> {
        let receiver = self
            .frame_rx
            .write()
            .await
            .take()
            .expect("start() called more than once");

        let wire_variant = if self.config.provider.is_options() {
            crate::provider::WireVariant::Options
        } else {
            crate::provider::WireVariant::Equities
        };

        let dispatch_callback = self.callback.read().await.clone();
        let handles = queue::spawn_workers(
            self.config.num_threads,
            receiver,
            self.counters.clone(),
            wire_variant,
            self.config.bypass_parsing,
            dispatch_callback,
        );
        *self.workers.write().await = handles;

        self.connection.start().await
    }

    /// `stop()`/`disconnect()` (spec §4.8): DRAINING → STOPPED, waiting
    /// for workers to drain the queue.
    pub async fn stop(&self) {
        self.connection.stop().await;
        let handles = std::mem::take(&mut *self.workers.write().await);
        for handle in handles {
            let _ = handle.await;
        }
    }

    /// Join one channel (spec §4.8 `join`). Always updates the registry;
    /// sends immediately if `READY`, otherwise the next reconnect/connect
    /// flush picks it up (spec §4.4).
    pub async fn join(&self, channel: impl Into<Channel>) {
        let channel = channel.into();
        if self.registry.join(channel.clone()) {
            self.send_join(&channel).await;
        }
    }

    /// Join the firehose sentinel (spec §4.8 `joinFirehose`).
    pub async fn join_firehose(&self) {
        if self.registry.join_firehose() {
            self.send_join(&Channel::firehose()).await;
        }
    }

    /// Leave one channel (spec §4.8 `leave`). A leave for an unknown
    /// channel is a no-op (spec §8 property 3).
    pub async fn leave(&self, channel: impl Into<Channel>) {
        let channel = channel.into();
        if self.registry.leave(&channel) {
            self.send_leave(&channel).await;
        }
    }

    /// Drop every subscription, including firehose (spec §4.8 `leaveAll`).
    pub async fn leave_all(&self) {
        self.registry.clear();
    }

    async fn send_join(&self, channel: &Channel) {
        let msg = self.provider_profile_join(channel);
        self.connection.send_control(msg).await;
    }

    async fn send_leave(&self, channel: &Channel) {
        let msg = self.provider_profile_leave(channel);
        self.connection.send_control(msg).await;
    }

    fn provider_profile_join(&self, channel: &Channel) -> crate::provider::ControlMessage {
        self.profile().encode_join(channel)
    }

    fn provider_profile_leave(&self, channel: &Channel) -> crate::provider::ControlMessage {
        self.profile().encode_leave(channel)
    }

    fn profile(&self) -> ProviderProfile {
        // Re-derive rather than store a second copy: `ProviderProfile` is
        // cheap (a handful of owned strings) and this keeps `Client` from
        // needing a lock around it just for encode calls.
        ProviderProfile::lookup(
            self.config.provider,
            self.config.delayed,
            self.config.manual_ip_address.as_deref(),
        )
        .expect("validated at construction")
    }

    /// `getStats()` (spec §4.8, §4.6).
    pub fn get_stats(&self) -> Stats {
        // Queue depth isn't tracked by `tokio::sync::mpsc` directly, so it
        // is approximated as 0 here; the counters that matter for
        // backpressure (`dropped_frames`) come straight from the workers.
        self.counters.snapshot(0)
    }
}

/// A default no-op callback, useful for clients that only care about
/// `bypass_parsing` raw frames handled elsewhere, or in tests.
pub fn noop_callback() -> EventCallback {
    Arc::new(|_event: Event| {})
}
