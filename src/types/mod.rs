//! Domain types shared across the streaming client.
//!
//! - [`channel`] — the opaque subscription key and contract padding helper.
//! - [`enums`] — `Provider`, `Subprovider`, and the small wire enumerations.
//! - [`events`] — the typed events produced by the frame decoder.
//!
//! All enums and events are re-exported at the module root.

pub mod channel;
pub mod enums;
pub mod events;

pub use channel::Channel;
pub use enums::*;
pub use events::*;

/// A point-in-time snapshot of client counters, returned by `get_stats()`
/// (spec §4.6, §4.8).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Stats {
    /// Binary (market-data) WebSocket messages received.
    pub data_messages: u64,
    /// Text (control/ack) WebSocket messages received.
    pub text_messages: u64,
    /// Approximate current depth of the event queue (spec GLOSSARY: "Backlog").
    pub queue_depth: usize,
    /// Frames dropped because the queue was full (spec §4.6).
    pub dropped_frames: u64,
    /// Records skipped because they failed to decode (spec §4.3).
    pub malformed_frames: u64,
    /// Number of times the connection has reconnected.
    pub reconnects: u64,
}
