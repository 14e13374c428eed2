//! Typed domain events produced by the frame decoder (spec §3).

use bytes::Bytes;

use super::enums::{ActivityType, OptionsExchange, QuoteType, Sentiment, Subprovider};
use crate::error::ProtocolErrorDetail;

/// An equities trade tick.
#[derive(Debug, Clone, PartialEq)]
pub struct EquitiesTrade {
    pub symbol: String,
    pub price: f32,
    pub size: u32,
    pub total_volume: u32,
    /// Nanoseconds since the Unix epoch.
    pub timestamp: i64,
    pub subprovider: Subprovider,
    /// Single-character market-center code.
    pub market_center: char,
    /// Single-character condition code.
    pub condition: char,
}

/// An equities ask/bid quote tick.
#[derive(Debug, Clone, PartialEq)]
pub struct EquitiesQuote {
    pub symbol: String,
    pub quote_type: QuoteType,
    pub price: f32,
    pub size: u32,
    /// Nanoseconds since the Unix epoch.
    pub timestamp: i64,
    pub subprovider: Subprovider,
    pub market_center: char,
    pub condition: char,
}

/// An options trade tick.
#[derive(Debug, Clone, PartialEq)]
pub struct OptionsTrade {
    /// 21-character OPRA contract identifier (spec GLOSSARY).
    pub contract: String,
    pub exchange: OptionsExchange,
    pub price: f64,
    pub size: u32,
    /// Seconds since the Unix epoch, microsecond precision.
    pub timestamp: f64,
    pub total_volume: u64,
    pub qualifiers: (u8, u8, u8, u8),
    pub ask_at_execution: f64,
    pub bid_at_execution: f64,
    pub underlying_price_at_execution: f64,
}

/// An options ask/bid quote tick.
#[derive(Debug, Clone, PartialEq)]
pub struct OptionsQuote {
    pub contract: String,
    pub ask_price: f64,
    pub ask_size: u32,
    pub bid_price: f64,
    pub bid_size: u32,
    /// Seconds since the Unix epoch, microsecond precision.
    pub timestamp: f64,
}

/// A periodic open-interest/OHLC snapshot for an options contract — not a
/// tick (spec GLOSSARY: "Refresh").
#[derive(Debug, Clone, PartialEq)]
pub struct OptionsRefresh {
    pub contract: String,
    pub open_interest: u32,
    pub open: f64,
    pub close: f64,
    pub high: f64,
    pub low: f64,
}

/// A vendor-detected unusual-activity event for an options contract.
#[derive(Debug, Clone, PartialEq)]
pub struct OptionsUnusualActivity {
    pub contract: String,
    pub activity_type: ActivityType,
    pub sentiment: Sentiment,
    pub total_value: f64,
    pub total_size: u64,
    pub average_price: f64,
    pub ask_at_execution: f64,
    pub bid_at_execution: f64,
    pub underlying_price_at_execution: f64,
    /// Seconds since the Unix epoch, microsecond precision.
    pub timestamp: f64,
}

/// A malformed frame or record, reported out-of-band for forensic logging
/// (spec §4.3: "Decoder never throws to the reader; it emits `DecodeError`
/// events on an out-of-band error channel").
#[derive(Debug, Clone)]
pub struct DecodeNotice {
    pub detail: ProtocolErrorDetail,
}

/// Why the Connection Manager gave up for good (spec §7, §4.5).
#[derive(Debug, Clone)]
pub enum TerminalReason {
    /// Every reconnect attempt failed and the attempt budget ran out.
    ReconnectExhausted { attempts: u32 },
    /// The vendor rejected the API key; the client will not retry.
    AuthRejected(String),
}

/// The tagged union of everything that can come out of the decoder and
/// reach a user callback (spec §9: "Encoded as a tagged union/event enum").
#[derive(Debug, Clone)]
pub enum Event {
    EquitiesTrade(EquitiesTrade),
    EquitiesQuote(EquitiesQuote),
    OptionsTrade(OptionsTrade),
    OptionsQuote(OptionsQuote),
    OptionsRefresh(OptionsRefresh),
    OptionsUnusualActivity(OptionsUnusualActivity),
    /// Present only when `Config::bypass_parsing` is set: the raw frame
    /// bytes, undecoded (spec §6 `bypassParsing`, §9).
    Raw(Bytes),
    /// A decode failure, delivered on the same path so a single callback
    /// registration can observe it (spec §4.3).
    Decode(DecodeNotice),
    /// The connection has died permanently; no further events will follow
    /// unless the caller calls `start()` again (spec §7).
    Terminal(TerminalReason),
}
