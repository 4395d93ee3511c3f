//! Exponential-backoff retry of failed anchor attempts.
//!
//! A failed batch waits `initial_delay * 2^(attempt - 1)` before the whole
//! pipeline reruns on it. Once `max_retries` attempts have failed the batch
//! goes to the dead-letter sink and is never tried again.

mod config;
mod handle;
mod queue;
mod task;

pub use config::{backoff_delay, RetryConfig};
pub use handle::{create_retry_scheduler, RetrySchedulerHandle};
pub use queue::RetryState;
