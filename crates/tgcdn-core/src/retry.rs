//! Exponential backoff math for the sweeper's FAILED retry phase.
//!
//! `min(2^retry_count - 1, 3000) + uniform(1, 5)` seconds, clamped at both
//! ends exactly as specified.

use std::time::Duration;

use rand::Rng;

const BACKOFF_CAP_SECS: u64 = 3000;

/// Deterministic half of the formula: `min(2^retry_count - 1, 3000)`.
pub fn backoff_base_secs(retry_count: u32) -> u64 {
    match 2u64.checked_pow(retry_count) {
        Some(v) => (v - 1).min(BACKOFF_CAP_SECS),
        None => BACKOFF_CAP_SECS,
    }
}

/// Full delay including the anti-thundering-herd jitter, as a `Duration`.
pub fn backoff_delay(retry_count: u32, rng: &mut impl Rng) -> Duration {
    let base = backoff_base_secs(retry_count);
    let jitter = rng.gen_range(1..=5u64);
    Duration::from_secs(base + jitter)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grows_exponentially_before_cap() {
        assert_eq!(backoff_base_secs(0), 0);
        assert_eq!(backoff_base_secs(1), 1);
        assert_eq!(backoff_base_secs(2), 3);
        assert_eq!(backoff_base_secs(4), 15);
    }

    #[test]
    fn clamps_at_cap() {
        assert_eq!(backoff_base_secs(12), 3000);
        assert_eq!(backoff_base_secs(63), 3000);
    }

    #[test]
    fn jitter_stays_in_window() {
        let mut rng = rand::thread_rng();
        for retry_count in [0, 4, 20] {
            let delay = backoff_delay(retry_count, &mut rng).as_secs();
            let base = backoff_base_secs(retry_count);
            assert!(delay >= base + 1 && delay <= base + 5);
        }
    }
}
