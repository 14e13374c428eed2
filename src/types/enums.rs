//! Shared enumerations for the streaming domain model.
//!
//! Variant names use `SCREAMING_SNAKE_CASE` where they mirror a wire-level
//! vendor spelling, matching the convention this crate's teacher uses for
//! values that round-trip to an external protocol.
#![allow(non_camel_case_types)]

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Provider
// ---------------------------------------------------------------------------

/// Selects the vendor feed (and therefore the wire variant) a client
/// connects to. Live and replay modes share the same set (spec §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Provider {
    /// IEX-sourced realtime equities feed.
    REALTIME,
    /// IEX equities feed (alias kept distinct from `REALTIME` per vendor docs).
    IEX,
    /// 15-minute delayed consolidated SIP equities feed.
    DELAYED_SIP,
    /// Nasdaq Basic equities feed.
    NASDAQ_BASIC,
    /// Cboe One equities feed.
    CBOE_ONE,
    /// OPRA options feed.
    OPRA,
    /// Hand-supplied IP options feed (direct multicast gateway).
    MANUAL,
}

impl Provider {
    /// Whether this provider serves options contracts (vs. equities symbols).
    pub fn is_options(self) -> bool {
        matches!(self, Provider::OPRA | Provider::MANUAL)
    }

    /// Minimum worker thread count this provider's client must be built with
    /// (spec §4.5).
    pub fn min_threads(self) -> usize {
        if self.is_options() {
            crate::constants::MIN_THREADS_OPTIONS
        } else {
            crate::constants::MIN_THREADS_EQUITIES
        }
    }
}

// ---------------------------------------------------------------------------
// Subprovider
// ---------------------------------------------------------------------------

/// Granular source tag within an equities provider (spec §3, GLOSSARY).
/// Determines the decoder sub-branch and, in replay mode, the capture-file
/// set downloaded for a given day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Subprovider {
    NO_SUBPROVIDER,
    CTA_A,
    CTA_B,
    UTP,
    OTC,
    NASDAQ_BASIC,
    IEX,
    CBOE_ONE,
}

impl Subprovider {
    /// Decode the wire byte used in equities trade/quote records.
    pub fn from_wire(byte: u8) -> Option<Self> {
        match byte {
            0 => Some(Self::NO_SUBPROVIDER),
            1 => Some(Self::CTA_A),
            2 => Some(Self::CTA_B),
            3 => Some(Self::UTP),
            4 => Some(Self::OTC),
            5 => Some(Self::NASDAQ_BASIC),
            6 => Some(Self::IEX),
            7 => Some(Self::CBOE_ONE),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Quote side
// ---------------------------------------------------------------------------

/// Side of an equities quote (spec §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QuoteType {
    Ask,
    Bid,
}

// ---------------------------------------------------------------------------
// Options exchange
// ---------------------------------------------------------------------------

/// Exchange an options trade executed on. The full enumeration is vendor
/// defined; unrecognized codes are preserved via `Unknown` rather than
/// rejected, since new exchange codes should not make the decoder fail
/// closed (spec §4.3: unknown sub-fields degrade, frames don't).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OptionsExchange {
    Cboe,
    C2,
    Amex,
    Bats,
    Box_,
    Nasdaq,
    Nom,
    Mercury,
    Miax,
    Phlx,
    Pearl,
    Emerald,
    Ise,
    Gemini,
    Unknown(u8),
}

impl OptionsExchange {
    /// Decode the wire byte used in options records.
    pub fn from_wire(byte: u8) -> Self {
        match byte {
            0 => Self::Cboe,
            1 => Self::C2,
            2 => Self::Amex,
            3 => Self::Bats,
            4 => Self::Box_,
            5 => Self::Nasdaq,
            6 => Self::Nom,
            7 => Self::Mercury,
            8 => Self::Miax,
            9 => Self::Phlx,
            10 => Self::Pearl,
            11 => Self::Emerald,
            12 => Self::Ise,
            13 => Self::Gemini,
            other => Self::Unknown(other),
        }
    }
}

// ---------------------------------------------------------------------------
// Unusual activity
// ---------------------------------------------------------------------------

/// Vendor-detected unusual-activity category (spec §3, GLOSSARY).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActivityType {
    BLOCK,
    SWEEP,
    LARGE,
    UNUSUAL_SWEEP,
}

impl ActivityType {
    /// Decode the wire subtype byte.
    ///
    /// Byte value `0` is ambiguous in the vendor's own source (spec §9 open
    /// question) and is treated here as "no recognized subtype" rather than
    /// aliased to `BLOCK` — see DESIGN.md for the rationale.
    pub fn from_wire(byte: u8) -> Option<Self> {
        match byte {
            1 => Some(Self::BLOCK),
            2 => Some(Self::SWEEP),
            3 => Some(Self::LARGE),
            4 => Some(Self::UNUSUAL_SWEEP),
            _ => None,
        }
    }
}

/// Directional sentiment attached to an unusual-activity event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Sentiment {
    NEUTRAL,
    BULLISH,
    BEARISH,
}

impl Sentiment {
    /// Decode the wire sentiment byte. Unrecognized values fall back to
    /// `NEUTRAL` — sentiment is advisory, not load-bearing for correctness.
    pub fn from_wire(byte: u8) -> Self {
        match byte {
            1 => Self::BULLISH,
            2 => Self::BEARISH,
            _ => Self::NEUTRAL,
        }
    }
}
