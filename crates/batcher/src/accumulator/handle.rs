//! Handle and factory for the batch accumulator task.

use std::{future::Future, sync::Arc};

use gateway_primitives::Cid;
use tokio::sync::{mpsc, oneshot};

use super::{
    config::AccumulatorConfig,
    task::{batch_accumulator_task, AccumulatorCommand, AccumulatorCtx, AddOutcome},
};
use crate::{errors::AccumulatorError, pipeline::AnchorPipeline, retry::RetrySchedulerHandle};

/// Submits CIDs to the accumulator task.
///
/// Cheap to clone. The task exits, flushing anything pending, once the last
/// handle is dropped.
#[derive(Debug, Clone)]
pub struct BatchAccumulatorHandle {
    command_tx: mpsc::Sender<AccumulatorCommand>,
}

impl BatchAccumulatorHandle {
    /// Appends `cid` to the pending batch.
    ///
    /// Resolves once the task has buffered the CID, or flushed the batch it
    /// completed. Never waits for anchoring.
    pub async fn add(&self, cid: Cid) -> Result<AddOutcome, AccumulatorError> {
        let (response_tx, rx) = oneshot::channel();
        self.command_tx
            .send(AccumulatorCommand::Add { cid, response_tx })
            .await?;
        Ok(rx.await?)
    }

    /// Flushes the pending batch now, returning its size if it was non-empty.
    pub async fn flush_now(&self) -> Result<Option<usize>, AccumulatorError> {
        let (tx, rx) = oneshot::channel();
        self.command_tx
            .send(AccumulatorCommand::FlushNow(tx))
            .await?;
        Ok(rx.await?)
    }

    pub async fn pending_len(&self) -> Result<usize, AccumulatorError> {
        let (tx, rx) = oneshot::channel();
        self.command_tx
            .send(AccumulatorCommand::PendingLen(tx))
            .await?;
        Ok(rx.await?)
    }
}

/// Create batch accumulator task.
pub fn create_batch_accumulator<P: AnchorPipeline>(
    config: AccumulatorConfig,
    pipeline: Arc<P>,
    retry: RetrySchedulerHandle,
) -> (BatchAccumulatorHandle, impl Future<Output = ()>) {
    let (command_tx, command_rx) = mpsc::channel(64);

    let ctx = AccumulatorCtx {
        config,
        pipeline,
        retry,
    };

    let handle = BatchAccumulatorHandle { command_tx };
    let task = batch_accumulator_task(command_rx, ctx);

    (handle, task)
}
