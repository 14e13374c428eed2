//! Subscription registry properties (spec §8 property 3, and the
//! registry-side half of property 4: insertion-order replay). The
//! end-to-end reconnect-replay exercise against a live socket lives in
//! `mock_server.rs`.

use intrinio_realtime_rs::{Channel, Registry};

/// Property 3: `join(c)` twice leaves one entry; `leave` on an unknown
/// channel is a no-op.
#[test]
fn join_twice_is_idempotent_leave_unknown_is_noop() {
    let registry = Registry::new();
    assert!(registry.join(Channel::new("AAPL")));
    assert!(!registry.join(Channel::new("AAPL")));
    assert_eq!(registry.len(), 1);

    assert!(!registry.leave(&Channel::new("MSFT")));
    assert_eq!(registry.len(), 1);

    assert!(registry.leave(&Channel::new("AAPL")));
    assert!(registry.is_empty());
}

#[test]
fn firehose_and_symbol_subscriptions_are_independent() {
    let registry = Registry::new();
    registry.join(Channel::new("AAPL"));
    registry.join_firehose();
    assert_eq!(registry.len(), 1);
    assert!(registry.wants_firehose());

    registry.clear();
    assert!(registry.is_empty());
    assert!(!registry.wants_firehose());
}

/// Reconnect replay order (spec §8 property 4, registry half): firehose
/// first if wanted, then every per-symbol channel in the exact order it
/// was joined.
#[test]
fn replay_snapshot_orders_firehose_before_symbols_in_insertion_order() {
    let registry = Registry::new();
    registry.join(Channel::new("MSFT"));
    registry.join(Channel::new("AAPL"));
    registry.join_firehose();

    let snapshot = registry.snapshot_for_replay();
    assert_eq!(
        snapshot,
        vec![
            Channel::firehose(),
            Channel::new("MSFT"),
            Channel::new("AAPL"),
        ]
    );
}
