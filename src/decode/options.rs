//! Options binary frame layout (spec §4.3).
//!
//! Each record is self-describing: `type: u8`, `msgLen: u8`, then exactly
//! `msgLen` bytes of type-specific payload. Unlike equities, an unknown
//! `type` can still be skipped cleanly — `msgLen` tells us how far to jump
//! — so a single unrecognized record doesn't cost the rest of the frame.

use super::wire::{fixed_point_price, fixed_point_price_i64, Cursor};
use super::{protocol_error_event, DecodedFrame};
use crate::constants::CONTRACT_LEN;
use crate::types::enums::{ActivityType, OptionsExchange, Sentiment};
use crate::types::events::{
    Event, OptionsQuote, OptionsRefresh, OptionsTrade, OptionsUnusualActivity,
};

const TYPE_TRADE: u8 = 1;
const TYPE_QUOTE: u8 = 2;
const TYPE_REFRESH: u8 = 3;
const TYPE_UNUSUAL_ACTIVITY: u8 = 4;

/// Decode a complete multi-message options binary frame (spec §4.3).
///
/// Byte 0 is the message count `M`. Each record carries its own length, so
/// an unrecognized `type` is skipped by `msgLen` and decoding continues;
/// only a genuine overrun (an `msgLen` that runs past the end of the frame,
/// or a malformed fixed-field payload) discards the remainder.
pub fn decode_frame(data: &[u8]) -> DecodedFrame {
    let mut out = DecodedFrame::default();
    let Some((&count, rest)) = data.split_first() else {
        out.malformed += 1;
        out.events.push(protocol_error_event("empty options frame", data));
        return out;
    };

    let mut cursor = Cursor::new(rest);
    for _ in 0..count {
        let record_type = match cursor.u8() {
            Some(b) => b,
            None => {
                out.malformed += 1;
                out.events
                    .push(protocol_error_event("truncated record header", rest));
                break;
            }
        };
        let msg_len = match cursor.u8() {
            Some(b) => b as usize,
            None => {
                out.malformed += 1;
                out.events
                    .push(protocol_error_event("truncated record header", rest));
                break;
            }
        };
        let Some(payload) = cursor.take(msg_len) else {
            out.malformed += 1;
            out.events
                .push(protocol_error_event("record length exceeds frame", rest));
            break;
        };

        match decode_record(record_type, payload) {
            Ok(Some(event)) => out.events.push(event),
            Ok(None) => {
                // Recognized type but self-describing length didn't match
                // the fixed shape we expect; skip, frame continues.
                out.malformed += 1;
            }
            Err(_unknown_type) => {
                // Unknown record type: already skipped via `msgLen`, not a
                // malformed frame (spec §4.3: self-describing records let
                // unknown types be skipped without cost).
            }
        }
    }
    out
}

/// Decode one self-describing record's payload. `Err` means the type byte
/// was not recognized (already consumed via `msgLen`, not fatal). `Ok(None)`
/// means the type was recognized but the payload didn't fit its fixed
/// shape (malformed).
fn decode_record(record_type: u8, payload: &[u8]) -> Result<Option<Event>, u8> {
    let mut cursor = Cursor::new(payload);

    match record_type {
        TYPE_TRADE => Ok(decode_trade(&mut cursor)),
        TYPE_QUOTE => Ok(decode_quote(&mut cursor)),
        TYPE_REFRESH => Ok(decode_refresh(&mut cursor)),
        TYPE_UNUSUAL_ACTIVITY => Ok(decode_unusual_activity(&mut cursor)),
        other => Err(other),
    }
}

fn read_contract(cursor: &mut Cursor<'_>) -> Option<String> {
    cursor.ascii_trimmed(CONTRACT_LEN)
}

fn decode_trade(cursor: &mut Cursor<'_>) -> Option<Event> {
    let contract = read_contract(cursor)?;
    let exchange = OptionsExchange::from_wire(cursor.u8()?);
    let price = fixed_point_price(cursor.i32_le()?);
    let size = cursor.u32_le()?;
    let timestamp = cursor.u64_le()? as f64 / 1_000_000.0;
    let total_volume = cursor.u64_le()?;
    let qualifiers = (cursor.u8()?, cursor.u8()?, cursor.u8()?, cursor.u8()?);
    let ask_at_execution = fixed_point_price(cursor.i32_le()?);
    let bid_at_execution = fixed_point_price(cursor.i32_le()?);
    let underlying_price_at_execution = fixed_point_price_i64(cursor.i64_le()?);

    Some(Event::OptionsTrade(OptionsTrade {
        contract,
        exchange,
        price,
        size,
        timestamp,
        total_volume,
        qualifiers,
        ask_at_execution,
        bid_at_execution,
        underlying_price_at_execution,
    }))
}

fn decode_quote(cursor: &mut Cursor<'_>) -> Option<Event> {
    let contract = read_contract(cursor)?;
    let ask_price = fixed_point_price(cursor.i32_le()?);
    let ask_size = cursor.u32_le()?;
    let bid_price = fixed_point_price(cursor.i32_le()?);
    let bid_size = cursor.u32_le()?;
    let timestamp = cursor.u64_le()? as f64 / 1_000_000.0;

    Some(Event::OptionsQuote(OptionsQuote {
        contract,
        ask_price,
        ask_size,
        bid_price,
        bid_size,
        timestamp,
    }))
}

fn decode_refresh(cursor: &mut Cursor<'_>) -> Option<Event> {
    let contract = read_contract(cursor)?;
    let open_interest = cursor.u32_le()?;
    let open = fixed_point_price(cursor.i32_le()?);
    let close = fixed_point_price(cursor.i32_le()?);
    let high = fixed_point_price(cursor.i32_le()?);
    let low = fixed_point_price(cursor.i32_le()?);

    Some(Event::OptionsRefresh(OptionsRefresh {
        contract,
        open_interest,
        open,
        close,
        high,
        low,
    }))
}

fn decode_unusual_activity(cursor: &mut Cursor<'_>) -> Option<Event> {
    let contract = read_contract(cursor)?;
    let subtype_byte = cursor.u8()?;
    let sentiment = Sentiment::from_wire(cursor.u8()?);
    let total_value = fixed_point_price_i64(cursor.i64_le()?);
    let total_size = cursor.u64_le()?;
    let average_price = fixed_point_price(cursor.i32_le()?);
    let ask_at_execution = fixed_point_price(cursor.i32_le()?);
    let bid_at_execution = fixed_point_price(cursor.i32_le()?);
    let underlying_price_at_execution = fixed_point_price_i64(cursor.i64_le()?);
    let timestamp = cursor.u64_le()? as f64 / 1_000_000.0;

    // subtype 0 is "no recognized subtype" (spec §9 open question,
    // resolved in DESIGN.md): report as a protocol-level decode notice
    // rather than silently dropping or aliasing to BLOCK.
    let activity_type = ActivityType::from_wire(subtype_byte)?;

    Some(Event::OptionsUnusualActivity(OptionsUnusualActivity {
        contract,
        activity_type,
        sentiment,
        total_value,
        total_size,
        average_price,
        ask_at_execution,
        bid_at_execution,
        underlying_price_at_execution,
        timestamp,
    }))
}
