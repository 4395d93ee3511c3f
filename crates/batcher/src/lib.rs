//! Batch accumulation and anchoring pipeline for the CID gateway.
//!
//! CIDs enter through a [`BatchAccumulatorHandle`]. When a batch fills up or
//! the flush timer expires, the batch is committed to a Merkle root and
//! anchored on Bitcoin. Failed batches are retried with exponential backoff
//! by the retry scheduler and, once retries run out, written to the
//! dead-letter sink.

pub mod accumulator;
pub mod dead_letter;
mod errors;
pub mod pipeline;
pub mod retry;
pub mod submit;

#[cfg(test)]
mod test_utils;

pub use accumulator::{
    create_batch_accumulator, AccumulatorConfig, AddOutcome, BatchAccumulatorHandle,
};
pub use dead_letter::{
    record_dead_letter, DeadLetterEntry, DeadLetterError, DeadLetterSink, FileDeadLetterSink,
};
pub use errors::{AccumulatorError, RetryError};
pub use pipeline::{AnchorPipeline, AnchorReceipt, MerkleAnchorPipeline, PipelineError};
pub use retry::{create_retry_scheduler, RetryConfig, RetrySchedulerHandle};
pub use submit::{ContentStore, ContentStoreError, ContentSubmitter, SubmitError};
