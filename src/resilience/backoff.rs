//! Exponential backoff with jitter.

use rand::Rng;
use std::time::Duration;

/// Delay before retry number `retry` (1-based), doubling from `base` and
/// capped at `max`, plus up to 10% jitter. Retry 0 waits nothing.
pub fn backoff_delay(retry: u32, base: Duration, max: Duration) -> Duration {
    if retry == 0 {
        return Duration::ZERO;
    }

    let factor = 2u32.saturating_pow(retry - 1);
    let capped = base.saturating_mul(factor).min(max);

    let jitter_ceiling = capped / 10;
    if jitter_ceiling.is_zero() {
        return capped;
    }
    capped + rand::thread_rng().gen_range(Duration::ZERO..jitter_ceiling)
}
