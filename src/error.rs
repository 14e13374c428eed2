//! Error types for the `intrinio-realtime-rs` crate.
//!
//! All fallible operations in this crate return [`Result<T>`], an alias for
//! `std::result::Result<T, IntrinioError>`. The variants follow the error
//! taxonomy in the design spec §7:
//!
//! - [`IntrinioError::Config`] — fatal at construction.
//! - [`IntrinioError::Auth`] — fatal; no retry (401 from the vendor).
//! - [`IntrinioError::TransientNetwork`] — retried with backoff by the caller.
//! - [`IntrinioError::Protocol`] — malformed frame; recorded and decoding
//!   continues.
//! - [`IntrinioError::QueueOverflow`] — a frame was dropped; recorded and
//!   streaming continues.
//! - [`IntrinioError::Callback`] — a user callback panicked or returned an
//!   error; logged, never propagated past the worker loop.
//! - [`IntrinioError::ReconnectExhausted`] — fatal; surfaced to the caller
//!   and the client stops.

use std::fmt;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, IntrinioError>;

/// A decoded frame that could not be parsed, kept for forensic logging.
///
/// Raw bytes are hex-truncated to the first 32 bytes, per spec §7 ("the
/// offending channel or raw bytes (hex-truncated) for forensic logging").
#[derive(Debug, Clone)]
pub struct ProtocolErrorDetail {
    /// Human-readable description of what went wrong.
    pub reason: String,
    /// Hex-encoded, truncated prefix of the offending frame.
    pub raw_hex: String,
}

impl ProtocolErrorDetail {
    /// Build a detail record, truncating `raw` to at most 32 bytes of hex.
    pub fn new(reason: impl Into<String>, raw: &[u8]) -> Self {
        let take = raw.len().min(32);
        let mut raw_hex = String::with_capacity(take * 2);
        for b in &raw[..take] {
            raw_hex.push_str(&format!("{b:02x}"));
        }
        if raw.len() > take {
            raw_hex.push_str("...");
        }
        Self {
            reason: reason.into(),
            raw_hex,
        }
    }
}

impl fmt::Display for ProtocolErrorDetail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (raw: {})", self.reason, self.raw_hex)
    }
}

/// All possible errors produced by the `intrinio-realtime-rs` client.
#[derive(Debug, thiserror::Error)]
pub enum IntrinioError {
    /// A configuration error detected at construction time.
    #[error("configuration error: {0}")]
    Config(String),

    /// Authentication failed (HTTP 401). Fatal — the caller must not retry
    /// without a new API key.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// A network or transport-level error, retryable with backoff.
    #[error("transient network error: {0}")]
    TransientNetwork(String),

    /// A malformed inbound frame. Decoding continues past this record.
    #[error("protocol error: {0}")]
    Protocol(ProtocolErrorDetail),

    /// The bounded event queue was full; the newest frame was dropped.
    #[error("event queue overflow, frame dropped")]
    QueueOverflow,

    /// A user-supplied callback failed. Never escapes the worker loop.
    #[error("callback error: {0}")]
    Callback(String),

    /// Reconnection attempts were exhausted (spec §4.5: max 20 attempts).
    #[error("reconnect attempts exhausted after {attempts} tries")]
    ReconnectExhausted {
        /// Number of attempts made before giving up.
        attempts: u32,
    },

    /// A WebSocket-level error.
    #[error("websocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    /// Failed to (de)serialize a JSON control message.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// An error building or parsing a URL.
    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),

    /// An I/O error, e.g. while writing a replay CSV or capture file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl IntrinioError {
    /// True if this error kind is lifecycle-fatal (spec §7: the Connection
    /// Manager, not the reader, decides lifecycle-fatal outcomes).
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            IntrinioError::Config(_)
                | IntrinioError::Auth(_)
                | IntrinioError::ReconnectExhausted { .. }
        )
    }
}
