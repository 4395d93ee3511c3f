//! Batch accumulator: buffers CIDs and flushes them to the anchor pipeline.
//!
//! The pending batch is owned by a single task. Adds, forced flushes and the
//! flush timer are all handled inside that task's loop, so a batch is always
//! swapped out in one step and concurrent in-flight batches never overlap.

mod config;
mod handle;
mod state;
mod task;

pub use config::AccumulatorConfig;
pub use handle::{create_batch_accumulator, BatchAccumulatorHandle};
pub use state::PendingBatch;
pub use task::AddOutcome;
