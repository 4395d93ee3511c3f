//! Retry scheduler task implementation.

use std::{sync::Arc, time::Duration};

use gateway_primitives::Cid;
use tokio::{
    select,
    sync::mpsc,
    task::JoinSet,
    time::{self, Instant},
};
use tracing::{debug, error, info, warn};

use super::{
    config::{backoff_delay, RetryConfig},
    queue::{RetryQueue, RetryState},
};
use crate::{
    dead_letter::{record_dead_letter, DeadLetterSink},
    pipeline::{run_attempt, AnchorPipeline, AnchorReceipt, PipelineError},
};

/// Longest single wait between attempts.
const MAX_BACKOFF: Duration = Duration::from_secs(30 * 24 * 60 * 60);

pub(crate) struct RetryRequest {
    pub(crate) batch: Vec<Cid>,
    pub(crate) previous_attempt: u32,
    pub(crate) error: PipelineError,
}

type AttemptOutput = (RetryState, Result<AnchorReceipt, PipelineError>);

/// Main retry scheduler task.
///
/// Owns the delay queue. Failures arrive over `request_rx`; due batches are
/// rerun through `pipeline` as independent tasks whose failures feed straight
/// back into the queue.
pub(crate) async fn retry_scheduler_task<P, D>(
    config: RetryConfig,
    mut request_rx: mpsc::Receiver<RetryRequest>,
    pipeline: Arc<P>,
    dead_letter: Arc<D>,
) where
    P: AnchorPipeline,
    D: DeadLetterSink,
{
    let mut queue = RetryQueue::default();
    let mut in_flight: JoinSet<AttemptOutput> = JoinSet::new();
    let mut accepting = true;

    loop {
        if !accepting && queue.is_empty() && in_flight.is_empty() {
            debug!("no retries outstanding; exiting");
            break;
        }

        let next_deadline = queue.next_deadline();

        select! {
            maybe_request = request_rx.recv(), if accepting => {
                let Some(request) = maybe_request else {
                    warn!(
                        queued = queue.len(),
                        in_flight = in_flight.len(),
                        "channel closed; draining outstanding retries"
                    );
                    accepting = false;
                    continue;
                };
                handle_failure(
                    &config,
                    &mut queue,
                    dead_letter.as_ref(),
                    request.batch,
                    request.previous_attempt,
                    request.error,
                )
                .await;
            }

            _ = time::sleep_until(next_deadline.unwrap_or_else(Instant::now)), if next_deadline.is_some() => {
                for state in queue.pop_due(Instant::now()) {
                    info!(
                        attempt = state.attempt,
                        batch_len = state.batch.len(),
                        "retrying batch"
                    );
                    let pipeline = pipeline.clone();
                    in_flight.spawn(async move {
                        let result = run_attempt(pipeline, state.batch.clone()).await;
                        (state, result)
                    });
                }
            }

            Some(joined) = in_flight.join_next(), if !in_flight.is_empty() => {
                match joined {
                    Ok((state, Ok(receipt))) => info!(
                        root = %receipt.root,
                        txid = %receipt.txid,
                        attempt = state.attempt,
                        batch_len = state.batch.len(),
                        "batch anchored on retry"
                    ),
                    Ok((state, Err(err))) => {
                        handle_failure(
                            &config,
                            &mut queue,
                            dead_letter.as_ref(),
                            state.batch,
                            state.attempt,
                            err,
                        )
                        .await;
                    }
                    Err(err) => error!(%err, "retry attempt task failed"),
                }
            }
        }
    }
}

/// Decides the fate of a batch whose attempt `previous_attempt` just failed.
async fn handle_failure<D: DeadLetterSink>(
    config: &RetryConfig,
    queue: &mut RetryQueue,
    dead_letter: &D,
    batch: Vec<Cid>,
    previous_attempt: u32,
    error: PipelineError,
) {
    let batch_len = batch.len();

    if !error.is_retryable() {
        if batch.is_empty() {
            error!(%error, "non-retryable failure for empty batch; nothing to record");
            return;
        }
        error!(%error, batch_len, "non-retryable failure; dead-lettering batch");
        record_dead_letter(dead_letter, batch, format!("non-retryable failure: {error}")).await;
        return;
    }

    if previous_attempt >= config.max_retries() {
        error!(
            %error,
            attempts = previous_attempt,
            batch_len,
            "retries exhausted; dead-lettering batch"
        );
        let reason = format!("batch failed after {previous_attempt} attempts: {error}");
        record_dead_letter(dead_letter, batch, reason).await;
        return;
    }

    let delay = backoff_delay(config.initial_delay(), previous_attempt).min(MAX_BACKOFF);
    let attempt = previous_attempt + 1;
    warn!(
        %error,
        attempt,
        batch_len,
        delay_ms = delay.as_millis() as u64,
        "anchor attempt failed; retry scheduled"
    );
    queue.push(RetryState {
        batch,
        attempt,
        next_fire_at: Instant::now() + delay,
    });
}
