use std::time::Duration;

/// Default number of attempts before a batch is dead-lettered.
const DEFAULT_MAX_RETRIES: u32 = 3;
/// Default delay before the first retry.
const DEFAULT_INITIAL_DELAY: Duration = Duration::from_secs(5 * 60);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryConfig {
    /// Total attempts allowed per batch, the initial one included.
    max_retries: u32,
    /// Delay after the first failure; doubles after each further failure.
    initial_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            initial_delay: DEFAULT_INITIAL_DELAY,
        }
    }
}

impl RetryConfig {
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_initial_delay(mut self, initial_delay: Duration) -> Self {
        self.initial_delay = initial_delay;
        self
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    pub fn initial_delay(&self) -> Duration {
        self.initial_delay
    }
}

/// Delay before the attempt following `previous_attempt` (1-based).
pub fn backoff_delay(initial_delay: Duration, previous_attempt: u32) -> Duration {
    let exp = previous_attempt.saturating_sub(1).min(31);
    initial_delay.saturating_mul(1 << exp)
}
