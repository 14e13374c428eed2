//! Constants for the Intrinio real-time streaming API.
//!
//! Contains default hosts, the `Client-Information` header value, and the
//! tunable defaults referenced throughout the connection manager, the event
//! queue, and the replay engine.

/// Header sent on every auth request, identifying the SDK language/variant
/// to the vendor (see spec §4.2 / §6).
pub const CLIENT_INFORMATION: &str = "INTRINIO_REALTIME_RUST_SDK";

/// Default heartbeat interval (spec §4.5, §6): 20 seconds.
pub const DEFAULT_HEARTBEAT_INTERVAL_SECS: u64 = 20;

/// Heartbeat timeout multiplier — absence of any inbound frame for this many
/// heartbeat intervals triggers a reconnect (spec §4.5, §6).
pub const HEARTBEAT_TIMEOUT_MULTIPLIER: u32 = 2;

/// Default bounded queue size for equities providers (spec §3).
pub const DEFAULT_MAX_QUEUE_SIZE_EQUITIES: usize = 10_000;

/// Default bounded queue size for options providers (spec §3).
pub const DEFAULT_MAX_QUEUE_SIZE_OPTIONS: usize = 500_000;

/// Minimum worker thread count for an options client (spec §4.5).
pub const MIN_THREADS_OPTIONS: usize = 4;

/// Minimum worker thread count for an equities client (spec §4.5).
pub const MIN_THREADS_EQUITIES: usize = 2;

/// Reconnect backoff base delay (spec §4.5): 1 second.
pub const BACKOFF_BASE_MS: u64 = 1_000;

/// Reconnect backoff cap (spec §4.5): 60 seconds.
pub const BACKOFF_CAP_MS: u64 = 60_000;

/// Maximum reconnect attempts before the manager surfaces a fatal
/// `ReconnectExhausted` error (spec §4.5).
pub const MAX_RECONNECT_ATTEMPTS: u32 = 20;

/// Grace period allotted to workers to drain the queue on `stop()`
/// (spec §4.5).
pub const DRAIN_TIMEOUT_MS: u64 = 5_000;

/// Minimum interval between "queue full" log lines (spec §4.6).
pub const OVERFLOW_LOG_INTERVAL_SECS: u64 = 1;

/// Length in bytes of an OPRA-format option contract identifier
/// (6 root + 6 expiry + 1 right + 8 strike, spec GLOSSARY).
pub const CONTRACT_LEN: usize = 21;

/// Fixed-point divisor applied to options wire prices (spec §4.3).
pub const PRICE_DIVISOR: f64 = 10_000.0;

/// Wire sentinel for a `NaN` fixed-point price (spec §4.3).
pub const PRICE_NAN_SENTINEL: i32 = i32::MIN;

/// Firehose subscription sentinels, keyed by provider spelling (spec §4.1,
/// §9 "Firehose sentinel spelling differs across providers").
pub mod firehose {
    /// Used by `REALTIME` / `IEX` / `DELAYED_SIP` / `NASDAQ_BASIC`.
    pub const DOLLAR_FIREHOSE: &str = "$FIREHOSE";
    /// Used by `CBOE_ONE`.
    pub const LOBBY: &str = "lobby";
    /// Used by options (`OPRA` / `MANUAL`).
    pub const DOLLAR_LOBBY: &str = "$lobby";
    /// Used by delayed options last-price-only mode.
    pub const DOLLAR_LOBBY_LAST_PRICE: &str = "$lobby_last_price";
}
