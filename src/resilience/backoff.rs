//! Retry delay policies: fixed, or exponential backoff with jitter.

use std::time::Duration;

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Delay policy applied between transport attempts.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum RetryDelay {
    /// Same delay before every retry.
    Fixed { delay_ms: u64 },
    /// Exponential backoff capped at `max_ms`, with 0-10% jitter.
    Exponential { base_ms: u64, max_ms: u64 },
}

impl RetryDelay {
    /// Delay before the given attempt. Attempt 0 is the initial call and
    /// never waits.
    pub fn for_attempt(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            return Duration::from_millis(0);
        }
        match *self {
            RetryDelay::Fixed { delay_ms } => Duration::from_millis(delay_ms),
            RetryDelay::Exponential { base_ms, max_ms } => {
                calculate_backoff(attempt, base_ms, max_ms)
            }
        }
    }
}

/// Calculate exponential backoff delay with jitter.
fn calculate_backoff(attempt: u32, base_ms: u64, max_ms: u64) -> Duration {
    let exponential_base = 2u64.saturating_pow(attempt - 1);
    let delay_ms = base_ms.saturating_mul(exponential_base);
    let capped_delay = delay_ms.min(max_ms);

    // Apply jitter (0 to 10% of the delay)
    let jitter_range = capped_delay / 10;
    let jitter = if jitter_range > 0 {
        rand::thread_rng().gen_range(0..jitter_range)
    } else {
        0
    };

    Duration::from_millis(capped_delay + jitter)
}
