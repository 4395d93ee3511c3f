//! Storing content and queueing its CID for anchoring.

use std::sync::Arc;

use async_trait::async_trait;
use gateway_primitives::Cid;
use thiserror::Error;
use tracing::debug;

use crate::{accumulator::BatchAccumulatorHandle, errors::AccumulatorError, AddOutcome};

#[derive(Debug, Error)]
#[error("content store: {0}")]
pub struct ContentStoreError(pub String);

/// Content-addressed storage that hands back a CID for stored bytes.
#[cfg_attr(any(test, feature = "test-utils"), mockall::automock)]
#[async_trait]
pub trait ContentStore: Send + Sync {
    async fn put(&self, content: Vec<u8>) -> Result<Cid, ContentStoreError>;
}

#[derive(Debug, Error)]
pub enum SubmitError {
    #[error(transparent)]
    Store(#[from] ContentStoreError),

    #[error(transparent)]
    Accumulator(#[from] AccumulatorError),
}

/// Stores content, then queues its CID for the next batch.
///
/// Anchoring outcomes are not reported back; a successful submit only means
/// the CID is buffered or already flushed.
#[derive(Debug)]
pub struct ContentSubmitter<S> {
    store: Arc<S>,
    accumulator: BatchAccumulatorHandle,
}

impl<S: ContentStore> ContentSubmitter<S> {
    pub fn new(store: Arc<S>, accumulator: BatchAccumulatorHandle) -> Self {
        Self { store, accumulator }
    }

    pub async fn submit(&self, content: Vec<u8>) -> Result<Cid, SubmitError> {
        let size = content.len();
        let cid = self.store.put(content).await?;
        let outcome = self.accumulator.add(cid.clone()).await?;
        match outcome {
            AddOutcome::Buffered { pending } => debug!(%cid, size, pending, "content queued"),
            AddOutcome::Flushed { batch_len } => {
                debug!(%cid, size, batch_len, "content queued; batch flushed")
            }
        }
        Ok(cid)
    }
}
