//! Randomized exponential backoff with full jitter (spec §4.5).
//!
//! `base=1s, cap=60s`, capped attempts enforced by the caller via
//! [`MAX_RECONNECT_ATTEMPTS`](crate::constants::MAX_RECONNECT_ATTEMPTS).

use std::time::Duration;

use rand::Rng;

use crate::constants::{BACKOFF_BASE_MS, BACKOFF_CAP_MS};

/// Compute the delay before reconnect attempt `attempt` (1-indexed),
/// using full jitter: `random(0, min(cap, base * 2^(attempt-1)))`.
pub fn delay_for_attempt(attempt: u32) -> Duration {
    let exp = BACKOFF_BASE_MS.saturating_mul(1u64 << attempt.min(32).saturating_sub(1).min(20));
    let capped = exp.min(BACKOFF_CAP_MS);
    let jittered = rand::thread_rng().gen_range(0..=capped);
    Duration::from_millis(jittered)
}
