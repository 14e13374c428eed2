//! Equities binary frame layout (spec §4.3).
//!
//! Each record: `type: u8`, `symbolLen: u8`, `symbol: symbolLen bytes`, then
//! type-specific fixed fields. Record length is computed from the declared
//! fields, not self-describing, so an unknown `type` or a truncated record
//! discards the rest of the frame (there is no `msgLen` to skip by, unlike
//! options).

use super::wire::Cursor;
use super::{protocol_error_event, DecodedFrame};
use crate::types::enums::{QuoteType, Subprovider};
use crate::types::events::{EquitiesQuote, EquitiesTrade, Event};

const TYPE_TRADE: u8 = 0;
const TYPE_ASK_QUOTE: u8 = 1;
const TYPE_BID_QUOTE: u8 = 2;

/// Decode a complete multi-message equities binary frame (spec §4.3).
///
/// Byte 0 is the message count `M` (0 is a valid heartbeat ack). Each of
/// the `M` records is decoded in turn; an overrun within a record discards
/// the remainder of the *frame* (equities records aren't self-describing
/// enough to skip just one) and counts as a single malformed record.
pub fn decode_frame(data: &[u8]) -> DecodedFrame {
    let mut out = DecodedFrame::default();
    let Some((&count, rest)) = data.split_first() else {
        out.malformed += 1;
        out.events.push(protocol_error_event("empty equities frame", data));
        return out;
    };

    let mut cursor = Cursor::new(rest);
    for _ in 0..count {
        match decode_record(&mut cursor) {
            Ok(Some(event)) => out.events.push(event),
            Ok(None) => {
                // Symbol length 0: discard this record only, keep reading
                // (spec §4.3: "Symbol length 0 => discard").
            }
            Err(reason) => {
                out.malformed += 1;
                out.events.push(protocol_error_event(reason, rest));
                break;
            }
        }
    }
    out
}

/// Decode one record. `Ok(None)` means "valid but intentionally discarded"
/// (zero-length symbol); `Err` means the frame is unrecoverable from here.
fn decode_record(cursor: &mut Cursor<'_>) -> Result<Option<Event>, &'static str> {
    let record_type = cursor.u8().ok_or("truncated record header")?;
    let symbol_len = cursor.u8().ok_or("truncated record header")? as usize;

    if symbol_len == 0 {
        return Ok(None);
    }

    let symbol = cursor
        .ascii_trimmed(symbol_len)
        .ok_or("truncated symbol")?;

    match record_type {
        TYPE_TRADE => {
            let price = cursor.f32_le().ok_or("truncated trade")?;
            let size = cursor.u32_le().ok_or("truncated trade")?;
            let timestamp = cursor.u64_le().ok_or("truncated trade")? as i64;
            let total_volume = cursor.u32_le().ok_or("truncated trade")?;
            let subprovider_byte = cursor.u8().ok_or("truncated trade")?;
            let market_center_raw = cursor.u16_le().ok_or("truncated trade")?;
            let condition = cursor.ascii_trimmed(8).ok_or("truncated trade")?;

            let subprovider =
                Subprovider::from_wire(subprovider_byte).ok_or("unknown subprovider byte")?;

            Ok(Some(Event::EquitiesTrade(EquitiesTrade {
                symbol,
                price,
                size,
                total_volume,
                timestamp,
                subprovider,
                market_center: (market_center_raw & 0xFF) as u8 as char,
                condition: condition.chars().next().unwrap_or('\0'),
            })))
        }
        TYPE_ASK_QUOTE | TYPE_BID_QUOTE => {
            let price = cursor.f32_le().ok_or("truncated quote")?;
            let size = cursor.u32_le().ok_or("truncated quote")?;
            let timestamp = cursor.u64_le().ok_or("truncated quote")? as i64;
            let subprovider_byte = cursor.u8().ok_or("truncated quote")?;
            let market_center_raw = cursor.u16_le().ok_or("truncated quote")?;
            let condition = cursor.ascii_trimmed(8).ok_or("truncated quote")?;

            let subprovider =
                Subprovider::from_wire(subprovider_byte).ok_or("unknown subprovider byte")?;
            let quote_type = if record_type == TYPE_ASK_QUOTE {
                QuoteType::Ask
            } else {
                QuoteType::Bid
            };

            Ok(Some(Event::EquitiesQuote(EquitiesQuote {
                symbol,
                quote_type,
                price,
                size,
                timestamp,
                subprovider,
                market_center: (market_center_raw & 0xFF) as u8 as char,
                condition: condition.chars().next().unwrap_or('\0'),
            })))
        }
        _ => Err("unknown equities record type"),
    }
}
