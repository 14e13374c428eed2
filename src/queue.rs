//! Event Queue & Workers (spec §4.6).
//!
//! A single bounded channel between the reader and N decoder workers.
//! Frames are placed in receive order; each frame is decoded atomically by
//! whichever worker dequeues it, so intra-frame record order is preserved,
//! but cross-frame ordering across workers is not guaranteed unless
//! `num_threads == 1` (documented, not enforced).

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, Mutex};

use crate::decode::{self, DecodedFrame};
use crate::provider::WireVariant;
use crate::types::{Event, Stats};

/// A raw inbound frame as handed from the reader to a worker: the wire
/// bytes plus whether it was text (control/ack) or binary (market data),
/// so stats can distinguish the two (spec §4.6 `getStats`).
#[derive(Debug, Clone)]
pub enum RawFrame {
    Binary(Vec<u8>),
    Text(Vec<u8>),
}

/// Shared atomic counters backing `Stats` (spec §4.6, §4.8).
#[derive(Debug, Default)]
pub struct Counters {
    pub data_messages: AtomicU64,
    pub text_messages: AtomicU64,
    pub dropped_frames: AtomicU64,
    pub malformed_frames: AtomicU64,
    pub reconnects: AtomicU64,
}

impl Counters {
    pub fn snapshot(&self, queue_depth: usize) -> Stats {
        Stats {
            data_messages: self.data_messages.load(Ordering::Relaxed),
            text_messages: self.text_messages.load(Ordering::Relaxed),
            queue_depth,
            dropped_frames: self.dropped_frames.load(Ordering::Relaxed),
            malformed_frames: self.malformed_frames.load(Ordering::Relaxed),
            reconnects: self.reconnects.load(Ordering::Relaxed),
        }
    }
}

/// The producer side of the bounded frame queue. Owned by the reader task.
#[derive(Clone)]
pub struct FrameSender {
    tx: mpsc::Sender<RawFrame>,
    counters: Arc<Counters>,
    last_overflow_log: Arc<Mutex<Option<std::time::Instant>>>,
}

impl FrameSender {
    /// Attempt to enqueue a frame. On a full queue, drop it, bump
    /// `dropped_frames`, and log at most once per second (spec §4.6).
    pub async fn try_send(&self, frame: RawFrame) {
        match &frame {
            RawFrame::Binary(_) => self.counters.data_messages.fetch_add(1, Ordering::Relaxed),
            RawFrame::Text(_) => self.counters.text_messages.fetch_add(1, Ordering::Relaxed),
        };

        if let Err(mpsc::error::TrySendError::Full(_)) = self.tx.try_send(frame) {
            self.counters.dropped_frames.fetch_add(1, Ordering::Relaxed);
            self.log_overflow_rate_limited().await;
        }
    }

    async fn log_overflow_rate_limited(&self) {
        let mut last = self.last_overflow_log.lock().await;
        let now = std::time::Instant::now();
        let should_log = last.map_or(true, |t| {
            now.duration_since(t)
                >= Duration::from_secs(crate::constants::OVERFLOW_LOG_INTERVAL_SECS)
        });
        if should_log {
            tracing::warn!("event queue full, dropping newest frame");
            *last = Some(now);
        }
    }
}

/// The consumer side, shared across worker tasks behind a `Mutex` so only
/// one worker locks the receiver at a time — the lock is released before
/// decoding/callback work runs (SPEC_FULL §5).
#[derive(Clone)]
pub struct FrameReceiver {
    rx: Arc<Mutex<mpsc::Receiver<RawFrame>>>,
}

/// Build a bounded queue with the given capacity (spec §4.6
/// `maxQueueSize`).
pub fn channel(capacity: usize) -> (FrameSender, FrameReceiver, Arc<Counters>) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    let counters = Arc::new(Counters::default());
    (
        FrameSender {
            tx,
            counters: counters.clone(),
            last_overflow_log: Arc::new(Mutex::new(None)),
        },
        FrameReceiver {
            rx: Arc::new(Mutex::new(rx)),
        },
    )
}

/// A callback invoked with each decoded event. Boxed so the client can
/// install different closures at runtime (spec §4.8, §9 "dynamic callback
/// registration").
pub type EventCallback = Arc<dyn Fn(Event) + Send + Sync>;

/// Spawn `num_workers` decoder workers pulling from `receiver`, decoding
/// with `wire_variant`, and dispatching to `callback`. Returns the join
/// handles so the caller can await shutdown.
pub fn spawn_workers(
    num_workers: usize,
    receiver: FrameReceiver,
    counters: Arc<Counters>,
    wire_variant: WireVariant,
    bypass_parsing: bool,
    callback: EventCallback,
) -> Vec<tokio::task::JoinHandle<()>> {
    (0..num_workers)
        .map(|id| {
            let receiver = receiver.clone();
            let counters = counters.clone();
            let callback = callback.clone();
            tokio::spawn(async move {
                worker_loop(id, receiver, counters, wire_variant, bypass_parsing, callback).await;
            })
        })
        .collect()
}

async fn worker_loop(
    id: usize,
    receiver: FrameReceiver,
    counters: Arc<Counters>,
    wire_variant: WireVariant,
    bypass_parsing: bool,
    callback: EventCallback,
) {
    loop {
        let frame = {
            let mut rx = receiver.rx.lock().await;
            rx.recv().await
        };
        let Some(frame) = frame else {
            tracing::debug!(worker = id, "frame channel closed, worker exiting");
            return;
        };

        match frame {
            RawFrame::Text(_) => {
                // Control/ack frames are consumed for stats only; they
                // never reach user callbacks (spec §4.6).
            }
            RawFrame::Binary(bytes) => {
                if bypass_parsing {
                    dispatch(&callback, decode::bypass_event(&bytes));
                    continue;
                }

                let DecodedFrame { events, malformed } = decode::decode_frame(wire_variant, &bytes);
                if malformed > 0 {
                    counters
                        .malformed_frames
                        .fetch_add(u64::from(malformed), Ordering::Relaxed);
                }
                for event in events {
                    dispatch(&callback, event);
                }
            }
        }
    }
}

pub(crate) fn dispatch(callback: &EventCallback, event: Event) {
    // Callback discipline (spec §4.6): a panicking callback must not take
    // down the worker loop.
    let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| callback(event)));
    if let Err(panic) = result {
        let msg = panic
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| panic.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "callback panicked".to_owned());
        tracing::error!(error = %msg, "user callback panicked, continuing");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[tokio::test]
    async fn overflow_drops_newest_and_counts() {
        let (sender, _receiver, counters) = channel(1);
        sender.try_send(RawFrame::Binary(vec![0])).await;
        sender.try_send(RawFrame::Binary(vec![1])).await;
        sender.try_send(RawFrame::Binary(vec![2])).await;
        assert_eq!(counters.dropped_frames.load(Ordering::Relaxed), 2);
        assert_eq!(counters.data_messages.load(Ordering::Relaxed), 3);
    }

    #[tokio::test]
    async fn worker_decodes_and_dispatches_events() {
        let (sender, receiver, counters) = channel(16);
        let seen = Arc::new(AtomicUsize::new(0));
        let seen_clone = seen.clone();
        let callback: EventCallback = Arc::new(move |_event| {
            seen_clone.fetch_add(1, Ordering::Relaxed);
        });

        let handles = spawn_workers(
            1,
            receiver,
            counters.clone(),
            WireVariant::Equities,
            false,
            callback,
        );

        // One trade record, frame count = 1.
        let mut frame = Vec::new();
        frame.push(1u8);
        frame.push(0u8); // type=Trade
        frame.push(4u8);
        frame.extend_from_slice(b"AAPL");
        frame.extend_from_slice(&1.0f32.to_le_bytes());
        frame.extend_from_slice(&1u32.to_le_bytes());
        frame.extend_from_slice(&1u64.to_le_bytes());
        frame.extend_from_slice(&1u32.to_le_bytes());
        frame.push(0u8);
        frame.extend_from_slice(&0u16.to_le_bytes());
        frame.extend_from_slice(&[0u8; 8]);

        sender.try_send(RawFrame::Binary(frame)).await;

        // Give the worker a tick to process, then drop the sender to
        // close the channel so the loop exits cleanly.
        tokio::time::sleep(Duration::from_millis(20)).await;
        drop(sender);
        for h in handles {
            let _ = tokio::time::timeout(Duration::from_millis(200), h).await;
        }

        assert_eq!(seen.load(Ordering::Relaxed), 1);
    }

    #[tokio::test]
    async fn bypass_parsing_delivers_raw_event() {
        let (sender, receiver, counters) = channel(4);
        let seen = Arc::new(AtomicUsize::new(0));
        let seen_clone = seen.clone();
        let callback: EventCallback = Arc::new(move |event| {
            if matches!(event, Event::Raw(_)) {
                seen_clone.fetch_add(1, Ordering::Relaxed);
            }
        });
        let handles = spawn_workers(
            1,
            receiver,
            counters,
            WireVariant::Options,
            true,
            callback,
        );
        sender.try_send(RawFrame::Binary(vec![9, 9, 9])).await;
        tokio::time::sleep(Duration::from_millis(20)).await;
        drop(sender);
        for h in handles {
            let _ = tokio::time::timeout(Duration::from_millis(200), h).await;
        }
        assert_eq!(seen.load(Ordering::Relaxed), 1);
    }
}
