use std::time::Duration;

use rand::{Rng, SeedableRng, rngs::SmallRng};

use super::types::ReconnectStrategy;

/// Doubling step of the backoff policy: `min(current * 2, ceiling)`.
///
/// Idempotent at the ceiling.
#[inline]
pub fn next_backoff_delay(current: Duration, ceiling: Duration) -> Duration {
    current.saturating_mul(2).min(ceiling)
}

/// Exponential backoff reconnect strategy.
///
/// `next_delay` hands out the current delay and then doubles it, so the sequence of scheduled
/// delays is `initial, 2*initial, 4*initial, ...` saturating at `max`.
#[derive(Clone, Debug)]
pub struct ExponentialBackoffReconnect {
    initial: Duration,
    max: Duration,
    current: Duration,
    jitter: bool,
}

impl ExponentialBackoffReconnect {
    pub fn new(initial: Duration, max: Duration) -> Self {
        let max = max.max(initial);
        Self {
            initial,
            max,
            current: initial,
            jitter: false,
        }
    }

    /// Scale each handed-out delay by a random factor in `[0.5, 1.0]`.
    pub fn with_jitter(mut self, jitter: bool) -> Self {
        self.jitter = jitter;
        self
    }

    pub fn initial(&self) -> Duration {
        self.initial
    }

    pub fn ceiling(&self) -> Duration {
        self.max
    }
}

impl Default for ExponentialBackoffReconnect {
    fn default() -> Self {
        Self::new(Duration::from_secs(1), Duration::from_secs(30))
    }
}

impl ReconnectStrategy for ExponentialBackoffReconnect {
    fn next_delay(&mut self) -> Duration {
        let delay = self.current;
        self.current = next_backoff_delay(self.current, self.max);
        if self.jitter {
            jitter_delay(delay)
        } else {
            delay
        }
    }

    fn current_delay(&self) -> Duration {
        self.current
    }

    fn reset(&mut self) {
        self.current = self.initial;
    }

    fn should_retry(&self) -> bool {
        true
    }
}

/// Reconnect strategy that never retries.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoReconnect;

impl ReconnectStrategy for NoReconnect {
    fn next_delay(&mut self) -> Duration {
        Duration::from_secs(24 * 60 * 60)
    }

    fn current_delay(&self) -> Duration {
        Duration::from_secs(24 * 60 * 60)
    }

    fn reset(&mut self) {}

    fn should_retry(&self) -> bool {
        false
    }
}

pub fn jitter_delay(base: Duration) -> Duration {
    if base.is_zero() {
        return base;
    }

    let mut rng = SmallRng::from_entropy();
    let jitter: f64 = rng.gen_range(0.5..=1.0);
    let nanos = (base.as_nanos() as f64 * jitter) as u128;
    Duration::from_nanos(nanos.min(u64::MAX as u128) as u64)
}
