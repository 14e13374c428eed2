//! Decoder round-trip and multi-message framing properties (spec §8
//! properties 1-2, scenarios E1/E2/E4).

use intrinio_realtime_rs::decode::{decode_frame, equities, options};
use intrinio_realtime_rs::provider::WireVariant;
use intrinio_realtime_rs::types::Event;

/// E1: a single equities trade record decodes bit-exact.
#[test]
fn e1_equities_trade_end_to_end() {
    let mut frame = Vec::new();
    frame.push(1u8);
    frame.push(0u8); // Trade
    frame.push(4u8);
    frame.extend_from_slice(b"AAPL");
    frame.extend_from_slice(&150.25f32.to_le_bytes());
    frame.extend_from_slice(&100u32.to_le_bytes());
    frame.extend_from_slice(&1_700_000_000_000_000_000u64.to_le_bytes());
    frame.extend_from_slice(&12345u32.to_le_bytes());
    frame.push(6u8); // IEX
    frame.extend_from_slice(&(b'N' as u16).to_le_bytes());
    frame.extend_from_slice(b"@       ");

    let decoded = decode_frame(WireVariant::Equities, &frame);
    assert_eq!(decoded.malformed, 0);
    let Event::EquitiesTrade(trade) = &decoded.events[0] else {
        panic!("expected trade");
    };
    assert_eq!(trade.symbol, "AAPL");
    assert!((trade.price - 150.25).abs() < 1e-6);
    assert_eq!(trade.size, 100);
    assert_eq!(trade.total_volume, 12345);
    assert_eq!(trade.timestamp, 1_700_000_000_000_000_000);
    assert_eq!(trade.market_center, 'N');
    assert_eq!(trade.condition, '@');
}

/// E2: options quote decode with fixed-point price conversion.
#[test]
fn e2_options_quote_end_to_end() {
    use intrinio_realtime_rs::types::channel::pad_contract;

    let mut payload = Vec::new();
    payload.extend_from_slice(&pad_contract("AAPL__230616C00180000"));
    payload.extend_from_slice(&1_500_000i32.to_le_bytes());
    payload.extend_from_slice(&10u32.to_le_bytes());
    payload.extend_from_slice(&1_490_000i32.to_le_bytes());
    payload.extend_from_slice(&12u32.to_le_bytes());
    payload.extend_from_slice(&1_700_000_000_000_000u64.to_le_bytes());

    let mut frame = Vec::new();
    frame.push(1u8);
    frame.push(2u8); // Quote
    frame.push(payload.len() as u8);
    frame.extend_from_slice(&payload);

    let decoded = decode_frame(WireVariant::Options, &frame);
    assert_eq!(decoded.malformed, 0);
    let Event::OptionsQuote(quote) = &decoded.events[0] else {
        panic!("expected quote");
    };
    assert_eq!(quote.contract, "AAPL__230616C00180000");
    assert!((quote.ask_price - 150.00).abs() < 1e-9);
    assert!((quote.bid_price - 149.00).abs() < 1e-9);
    assert!((quote.timestamp - 1.7e9).abs() < 1e-3);
}

/// E4: two back-to-back records in one frame produce two events in order.
#[test]
fn e4_two_records_one_frame_preserve_order() {
    let mut frame = Vec::new();
    frame.push(2u8);
    for symbol in [b"AAPL", b"MSFT"] {
        frame.push(0u8);
        frame.push(4u8);
        frame.extend_from_slice(symbol);
        frame.extend_from_slice(&1.0f32.to_le_bytes());
        frame.extend_from_slice(&1u32.to_le_bytes());
        frame.extend_from_slice(&1u64.to_le_bytes());
        frame.extend_from_slice(&1u32.to_le_bytes());
        frame.push(6u8);
        frame.extend_from_slice(&0u16.to_le_bytes());
        frame.extend_from_slice(&[0u8; 8]);
    }

    let decoded = decode_frame(WireVariant::Equities, &frame);
    assert_eq!(decoded.malformed, 0);
    assert_eq!(decoded.events.len(), 2);
    let Event::EquitiesTrade(first) = &decoded.events[0] else {
        panic!("expected trade");
    };
    let Event::EquitiesTrade(second) = &decoded.events[1] else {
        panic!("expected trade");
    };
    assert_eq!(first.symbol, "AAPL");
    assert_eq!(second.symbol, "MSFT");
}

/// Property 2: any byte truncation yields at most k-1 events and a single
/// ProtocolError, for both wire variants.
#[test]
fn property_truncation_yields_k_minus_one_events_and_one_error() {
    let equities_decoded = equities::decode_frame(&[2, 0, 4, b'A', b'A', b'P', b'L']); // truncated after symbol
    assert_eq!(equities_decoded.events.len(), 1); // only the DecodeNotice
    assert_eq!(equities_decoded.malformed, 1);

    let options_decoded = options::decode_frame(&[1, 1, 10, 0, 0, 0, 0, 0]); // msgLen=10 but only 5 bytes remain
    assert_eq!(options_decoded.malformed, 1);
}

/// Frame count 0 is a valid heartbeat ack for both wire variants.
#[test]
fn zero_count_frame_is_valid_for_both_variants() {
    assert_eq!(decode_frame(WireVariant::Equities, &[0]).events.len(), 0);
    assert_eq!(decode_frame(WireVariant::Options, &[0]).events.len(), 0);
}
