//! Handle and factory for the retry scheduler task.

use std::{future::Future, sync::Arc};

use gateway_primitives::Cid;
use tokio::sync::mpsc;

use super::{
    config::RetryConfig,
    task::{retry_scheduler_task, RetryRequest},
};
use crate::{dead_letter::DeadLetterSink, errors::RetryError, pipeline::AnchorPipeline, PipelineError};

/// Hands failed batches to the retry scheduler.
#[derive(Debug, Clone)]
pub struct RetrySchedulerHandle {
    request_tx: mpsc::Sender<RetryRequest>,
}

impl RetrySchedulerHandle {
    /// Reports that attempt number `previous_attempt` of `batch` failed with `error`.
    ///
    /// The scheduler decides whether the batch is retried or dead-lettered.
    pub async fn schedule_retry(
        &self,
        batch: Vec<Cid>,
        previous_attempt: u32,
        error: PipelineError,
    ) -> Result<(), RetryError> {
        self.request_tx
            .send(RetryRequest {
                batch,
                previous_attempt,
                error,
            })
            .await
            .map_err(|e| RetryError::Closed { batch: e.0.batch })
    }
}

/// Create retry scheduler task.
///
/// The task exits once every handle is dropped and no batch is waiting or
/// in flight.
pub fn create_retry_scheduler<P, D>(
    config: RetryConfig,
    pipeline: Arc<P>,
    dead_letter: Arc<D>,
) -> (RetrySchedulerHandle, impl Future<Output = ()>)
where
    P: AnchorPipeline,
    D: DeadLetterSink,
{
    let (request_tx, request_rx) = mpsc::channel(64);
    let handle = RetrySchedulerHandle { request_tx };
    let task = retry_scheduler_task(config, request_rx, pipeline, dead_letter);

    (handle, task)
}
