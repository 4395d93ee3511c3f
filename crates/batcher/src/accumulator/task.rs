//! Batch accumulator task implementation.

use std::{fmt, sync::Arc};

use gateway_primitives::Cid;
use tokio::{
    select,
    sync::{mpsc, oneshot},
    time::{self, Instant},
};
use tracing::{error, info, trace, warn};

use super::{config::AccumulatorConfig, state::PendingBatch};
use crate::{
    errors::RetryError,
    pipeline::{run_attempt, AnchorPipeline},
    retry::RetrySchedulerHandle,
};

/// What happened to the batch as a result of an `add`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    /// CID was buffered; `pending` CIDs now await the next flush.
    Buffered { pending: usize },
    /// CID completed a batch of `batch_len`, which was handed to the pipeline.
    Flushed { batch_len: usize },
}

pub(crate) enum AccumulatorCommand {
    Add {
        cid: Cid,
        response_tx: oneshot::Sender<AddOutcome>,
    },
    FlushNow(oneshot::Sender<Option<usize>>),
    PendingLen(oneshot::Sender<usize>),
}

#[derive(Debug, Clone, Copy)]
enum FlushTrigger {
    Size,
    Timer,
    Manual,
    Shutdown,
}

impl fmt::Display for FlushTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Size => "size",
            Self::Timer => "timer",
            Self::Manual => "manual",
            Self::Shutdown => "shutdown",
        })
    }
}

pub(crate) struct AccumulatorCtx<P> {
    pub(crate) config: AccumulatorConfig,
    pub(crate) pipeline: Arc<P>,
    pub(crate) retry: RetrySchedulerHandle,
}

/// Main batch accumulator task.
///
/// Runs until every handle is dropped, then flushes whatever is still pending
/// and exits.
pub(crate) async fn batch_accumulator_task<P: AnchorPipeline>(
    mut command_rx: mpsc::Receiver<AccumulatorCommand>,
    ctx: AccumulatorCtx<P>,
) {
    let mut pending = PendingBatch::default();
    let mut deadline = Instant::now() + ctx.config.flush_interval();

    loop {
        select! {
            maybe_command = command_rx.recv() => {
                let Some(command) = maybe_command else {
                    info!(pending = pending.len(), "channel closed; exiting");
                    if !pending.is_empty() {
                        flush(&mut pending, &ctx, FlushTrigger::Shutdown);
                    }
                    break;
                };
                handle_command(command, &mut pending, &mut deadline, &ctx);
            }

            _ = time::sleep_until(deadline) => {
                if pending.is_empty() {
                    trace!("flush timer fired with nothing pending");
                } else {
                    flush(&mut pending, &ctx, FlushTrigger::Timer);
                }
                deadline = Instant::now() + ctx.config.flush_interval();
            }
        }
    }
}

fn handle_command<P: AnchorPipeline>(
    command: AccumulatorCommand,
    pending: &mut PendingBatch,
    deadline: &mut Instant,
    ctx: &AccumulatorCtx<P>,
) {
    match command {
        AccumulatorCommand::Add { cid, response_tx } => {
            trace!(%cid, "cid added");
            pending.push(cid);
            let outcome = if pending.len() >= ctx.config.batch_size().get() {
                let batch_len = flush(pending, ctx, FlushTrigger::Size);
                *deadline = Instant::now() + ctx.config.flush_interval();
                AddOutcome::Flushed { batch_len }
            } else {
                AddOutcome::Buffered {
                    pending: pending.len(),
                }
            };
            let _ = response_tx.send(outcome);
        }
        AccumulatorCommand::FlushNow(response_tx) => {
            let flushed =
                (!pending.is_empty()).then(|| flush(pending, ctx, FlushTrigger::Manual));
            *deadline = Instant::now() + ctx.config.flush_interval();
            let _ = response_tx.send(flushed);
        }
        AccumulatorCommand::PendingLen(response_tx) => {
            let _ = response_tx.send(pending.len());
        }
    }
}

/// Swaps out the pending batch and spawns its first anchor attempt.
fn flush<P: AnchorPipeline>(
    pending: &mut PendingBatch,
    ctx: &AccumulatorCtx<P>,
    trigger: FlushTrigger,
) -> usize {
    let batch = pending.take();
    let batch_len = batch.len();
    info!(batch_len, %trigger, "flushing batch");

    tokio::spawn(run_first_attempt(
        ctx.pipeline.clone(),
        ctx.retry.clone(),
        batch,
    ));
    batch_len
}

async fn run_first_attempt<P: AnchorPipeline>(
    pipeline: Arc<P>,
    retry: RetrySchedulerHandle,
    batch: Vec<Cid>,
) {
    let batch_len = batch.len();
    match run_attempt(pipeline, batch.clone()).await {
        Ok(receipt) => info!(
            root = %receipt.root,
            txid = %receipt.txid,
            attempt = 1,
            batch_len,
            "batch anchored"
        ),
        Err(err) => {
            warn!(%err, attempt = 1, batch_len, "anchor attempt failed");
            if let Err(RetryError::Closed { batch }) = retry.schedule_retry(batch, 1, err).await {
                error!(?batch, "retry scheduler not running; batch dropped");
            }
        }
    }
}
