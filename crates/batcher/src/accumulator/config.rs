use std::{num::NonZeroUsize, time::Duration};

/// Default number of CIDs that triggers a flush.
const DEFAULT_BATCH_SIZE: NonZeroUsize = NonZeroUsize::new(5).unwrap();
/// Default time after which a non-empty batch is flushed regardless of size.
const DEFAULT_FLUSH_INTERVAL: Duration = Duration::from_secs(60);
/// Smallest accepted flush interval.
const MIN_FLUSH_INTERVAL: Duration = Duration::from_millis(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccumulatorConfig {
    /// Max CIDs in a batch; reaching it flushes immediately.
    batch_size: NonZeroUsize,
    /// Flush timer period.
    flush_interval: Duration,
}

impl Default for AccumulatorConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            flush_interval: DEFAULT_FLUSH_INTERVAL,
        }
    }
}

impl AccumulatorConfig {
    pub fn with_batch_size(mut self, batch_size: impl Into<NonZeroUsize>) -> Self {
        self.batch_size = batch_size.into();
        self
    }

    pub fn with_flush_interval(mut self, flush_interval: Duration) -> Self {
        self.flush_interval = flush_interval.max(MIN_FLUSH_INTERVAL);
        self
    }

    pub fn batch_size(&self) -> NonZeroUsize {
        self.batch_size
    }

    pub fn flush_interval(&self) -> Duration {
        self.flush_interval
    }
}
