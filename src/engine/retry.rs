// * Retry policy for page reads
// * A failed page is re-read with a delay between attempts, optionally up to a cap.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// How long to wait before the next attempt
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum DelayStrategy {
    /// Same wait before every attempt
    Fixed(Duration),
    /// `base * 2^(attempt - 1)`, never above `cap`
    Exponential { base: Duration, cap: Duration },
}

impl DelayStrategy {
    /// Delay after failed attempt number `attempt` (1-based)
    pub fn delay_for(&self, attempt: u32) -> Duration {
        match *self {
            DelayStrategy::Fixed(delay) => delay,
            DelayStrategy::Exponential { base, cap } => {
                let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
                base.saturating_mul(factor).min(cap)
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// `None` retries until the page reads cleanly
    pub max_attempts: Option<u32>,
    pub delay: DelayStrategy,
}

impl RetryPolicy {
    /// Retry forever with a fixed wait; the default for scraping runs
    pub fn unbounded(delay: Duration) -> Self {
        Self {
            max_attempts: None,
            delay: DelayStrategy::Fixed(delay),
        }
    }

    pub fn bounded(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts: Some(max_attempts.max(1)),
            delay: DelayStrategy::Fixed(delay),
        }
    }

    /// No wait between attempts, no cap
    pub fn immediate() -> Self {
        Self::unbounded(Duration::ZERO)
    }

    pub fn with_delay(mut self, delay: DelayStrategy) -> Self {
        self.delay = delay;
        self
    }

    /// Whether another attempt may follow attempt number `attempt`
    pub fn allows_another(&self, attempt: u32) -> bool {
        match self.max_attempts {
            Some(max) => attempt < max,
            None => true,
        }
    }

    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.delay.delay_for(attempt)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::unbounded(Duration::from_secs(1))
    }
}
