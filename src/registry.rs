//! Subscription Registry (spec §4.4).
//!
//! Tracks the canonical set of channels a client wants joined, independent
//! of connection state. `join`/`leave` always update the set; whether a
//! control message is sent immediately or buffered for the next `READY`
//! transition is the Connection Manager's call, not the registry's — the
//! registry only answers "what do I currently want joined" and "replay my
//! wants in a stable order" (spec §4.4: "reconnect resends the whole set").

use std::collections::HashSet;
use std::sync::Mutex;

use crate::types::Channel;

/// The thread-safe canonical set of channels a client has asked to be
/// joined to, plus a separate firehose flag (spec §4.4: "firehose is
/// tracked distinctly from the per-symbol set so leaving it doesn't
/// require enumerating every channel").
#[derive(Debug, Default)]
pub struct Registry {
    inner: Mutex<RegistryState>,
}

/// `channels` keeps insertion order (spec §8 property 4: reconnect replay
/// re-emits joins "in insertion order"); `index` is a side table purely
/// for O(1) dedupe/removal, kept in sync with `channels`.
#[derive(Debug, Default)]
struct RegistryState {
    channels: Vec<Channel>,
    index: HashSet<Channel>,
    firehose: bool,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `channel` to the wanted set. Returns `true` if this was a new
    /// addition (spec §4.4 invariant: "join is idempotent, a duplicate join
    /// is a no-op observable only as `false`").
    pub fn join(&self, channel: Channel) -> bool {
        let mut state = self.inner.lock().unwrap();
        if state.index.insert(channel.clone()) {
            state.channels.push(channel);
            true
        } else {
            false
        }
    }

    /// Remove `channel` from the wanted set. Returns `true` if it was
    /// present.
    pub fn leave(&self, channel: &Channel) -> bool {
        let mut state = self.inner.lock().unwrap();
        if state.index.remove(channel) {
            state.channels.retain(|c| c != channel);
            true
        } else {
            false
        }
    }

    /// Mark the firehose subscription as wanted. Returns `true` if this
    /// changed state.
    pub fn join_firehose(&self) -> bool {
        let mut state = self.inner.lock().unwrap();
        let changed = !state.firehose;
        state.firehose = true;
        changed
    }

    /// Clear the firehose subscription. Returns `true` if it was set.
    pub fn leave_firehose(&self) -> bool {
        let mut state = self.inner.lock().unwrap();
        let changed = state.firehose;
        state.firehose = false;
        changed
    }

    /// Drop every tracked channel and the firehose flag (spec §4.4
    /// `leaveAll`).
    pub fn clear(&self) {
        let mut state = self.inner.lock().unwrap();
        state.channels.clear();
        state.index.clear();
        state.firehose = false;
    }

    /// Whether the firehose subscription is currently wanted.
    pub fn wants_firehose(&self) -> bool {
        self.inner.lock().unwrap().firehose
    }

    /// The number of per-symbol/per-contract channels currently tracked
    /// (excludes the firehose flag).
    pub fn len(&self) -> usize {
        self.inner.lock().unwrap().channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot every channel that should be (re)joined on a fresh
    /// connection: firehose first if wanted, then every per-symbol channel
    /// in the order it was joined (spec §8 property 4: "re-emits a join
    /// message for every channel currently in the registry in insertion
    /// order").
    pub fn snapshot_for_replay(&self) -> Vec<Channel> {
        let state = self.inner.lock().unwrap();
        let mut out = Vec::with_capacity(state.channels.len() + 1);
        if state.firehose {
            out.push(Channel::firehose());
        }
        out.extend(state.channels.iter().cloned());
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_is_idempotent() {
        let reg = Registry::new();
        assert!(reg.join(Channel::new("AAPL")));
        assert!(!reg.join(Channel::new("AAPL")));
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn leave_removes_and_reports_presence() {
        let reg = Registry::new();
        reg.join(Channel::new("AAPL"));
        assert!(reg.leave(&Channel::new("AAPL")));
        assert!(!reg.leave(&Channel::new("AAPL")));
        assert_eq!(reg.len(), 0);
    }

    #[test]
    fn firehose_tracked_independently_of_symbol_set() {
        let reg = Registry::new();
        reg.join(Channel::new("AAPL"));
        assert!(reg.join_firehose());
        assert!(reg.wants_firehose());
        reg.leave_firehose();
        assert!(!reg.wants_firehose());
        assert_eq!(reg.len(), 1); // leaving firehose doesn't touch AAPL
    }

    #[test]
    fn replay_snapshot_is_firehose_first_then_insertion_order() {
        let reg = Registry::new();
        reg.join(Channel::new("MSFT"));
        reg.join(Channel::new("AAPL"));
        reg.join_firehose();
        let replay = reg.snapshot_for_replay();
        assert_eq!(
            replay,
            vec![
                Channel::firehose(),
                Channel::new("MSFT"),
                Channel::new("AAPL"),
            ]
        );
    }

    #[test]
    fn replay_snapshot_preserves_insertion_order_after_a_leave_and_rejoin() {
        let reg = Registry::new();
        reg.join(Channel::new("MSFT"));
        reg.join(Channel::new("AAPL"));
        reg.join(Channel::new("GOOG"));
        reg.leave(&Channel::new("AAPL"));
        reg.join(Channel::new("AAPL"));
        assert_eq!(
            reg.snapshot_for_replay(),
            vec![
                Channel::new("MSFT"),
                Channel::new("GOOG"),
                Channel::new("AAPL"),
            ]
        );
    }

    #[test]
    fn clear_resets_everything() {
        let reg = Registry::new();
        reg.join(Channel::new("AAPL"));
        reg.join_firehose();
        reg.clear();
        assert!(reg.is_empty());
        assert!(!reg.wants_firehose());
    }
}
