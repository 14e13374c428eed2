//! Frame Decoder (spec §4.3).
//!
//! Inbound binary WebSocket messages are multi-message: byte 0 is the
//! message count `M`, followed by `M` back-to-back variable-length records.
//! Each decoder branch ([`equities`] / [`options`]) knows how to compute one
//! record's length from its own header fields and advances exactly that far
//! — an overrun discards the remainder of the frame and counts as one
//! [`crate::error::IntrinioError::Protocol`], never more.

pub mod equities;
pub mod options;
pub(crate) mod wire;

use bytes::Bytes;

use crate::error::ProtocolErrorDetail;
use crate::provider::WireVariant;
use crate::types::events::Event;

/// The outcome of decoding one multi-message binary frame: the events it
/// produced (in record order) plus the number of malformed records
/// encountered (spec §8 property 2: "any byte truncation yields at most
/// k-1 events and a single ProtocolError").
#[derive(Debug, Default)]
pub struct DecodedFrame {
    pub events: Vec<Event>,
    pub malformed: u32,
}

/// Decode one complete binary frame per the wire variant in effect for the
/// connection (spec §4.3).
pub fn decode_frame(variant: WireVariant, data: &[u8]) -> DecodedFrame {
    match variant {
        WireVariant::Equities => equities::decode_frame(data),
        WireVariant::Options => options::decode_frame(data),
    }
}

/// Build a protocol-error event from a decode failure, truncating the raw
/// bytes for forensic logging (spec §7).
pub(crate) fn protocol_error_event(reason: impl Into<String>, raw: &[u8]) -> Event {
    Event::Decode(crate::types::events::DecodeNotice {
        detail: ProtocolErrorDetail::new(reason, raw),
    })
}

/// Wrap an undecoded frame for `bypass_parsing` mode (spec §6, §9): workers
/// push the raw slice through instead of a decoded record.
pub fn bypass_event(data: &[u8]) -> Event {
    Event::Raw(Bytes::copy_from_slice(data))
}
