//! Service wiring for the `run` and `quote` subcommands.

use std::{
    future::{pending, Future},
    path::Path,
    sync::Arc,
    time::Duration,
};

use gateway_batcher::{
    create_batch_accumulator, create_retry_scheduler, AddOutcome, BatchAccumulatorHandle,
    FileDeadLetterSink, MerkleAnchorPipeline,
};
use gateway_btcio::{
    fees::{FeeOracleCache, MempoolFeeOracle},
    AnchorSigner, AnchorTransactionBuilder, EsploraClient, WifSigner,
};
use gateway_config::Config;
use gateway_pricing::{Attachment, PricingEngine};
use gateway_primitives::Cid;
use tokio::{
    io::{self, AsyncBufRead, AsyncBufReadExt, BufReader},
    select, signal,
};
use tracing::*;

use crate::{
    args::SubcQuote,
    context::{accumulator_config, anchor_config, pricing_config, resolve_in_datadir, retry_config},
    errors::InitError,
};

type FeeCache = FeeOracleCache<MempoolFeeOracle>;
type GatewayAnchorer = AnchorTransactionBuilder<EsploraClient, WifSigner, FeeCache>;
type GatewayPipeline = MerkleAnchorPipeline<GatewayAnchorer>;

fn request_timeout(config: &Config) -> Duration {
    Duration::from_millis(config.bitcoin.request_timeout_ms)
}

fn build_fee_cache(config: &Config) -> Result<Arc<FeeCache>, InitError> {
    let oracle = MempoolFeeOracle::new(&config.fees.oracle_url, request_timeout(config))?;
    let ttl = Duration::from_millis(config.fees.cache_ttl_ms);
    Ok(Arc::new(FeeOracleCache::new(oracle, ttl)))
}

fn build_pipeline(config: &Config, signer: WifSigner) -> Result<Arc<GatewayPipeline>, InitError> {
    let client = EsploraClient::new(config.bitcoin.esplora_url.clone(), request_timeout(config))?;
    let fees = build_fee_cache(config)?;
    let anchorer = AnchorTransactionBuilder::new(
        Arc::new(client),
        Arc::new(signer),
        fees,
        anchor_config(&config.anchor),
    );
    Ok(Arc::new(MerkleAnchorPipeline::new(Arc::new(anchorer))))
}

/// Runs the gateway until stdin closes or an interrupt arrives.
///
/// On shutdown the pending CIDs are flushed as a final batch, then the retry
/// scheduler is drained. A second interrupt abandons the outstanding retries.
pub(crate) async fn run_gateway(
    config: Config,
    datadir: &Path,
    signer: WifSigner,
) -> Result<(), InitError> {
    info!(
        address = %signer.address(),
        network = %config.bitcoin.network,
        esplora = %config.bitcoin.esplora_url,
        fee_policy = ?config.anchor.fee_policy,
        "anchoring key loaded"
    );

    let pipeline = build_pipeline(&config, signer)?;
    let dead_letter = Arc::new(FileDeadLetterSink::new(resolve_in_datadir(
        datadir,
        &config.retry.dead_letter_path,
    )));
    info!(path = %dead_letter.path().display(), "dead-letter sink ready");

    let (retry, retry_task) =
        create_retry_scheduler(retry_config(&config.retry), pipeline.clone(), dead_letter);
    let mut retry_task = tokio::spawn(retry_task);

    let (handle, acc_task) =
        create_batch_accumulator(accumulator_config(&config.batch)?, pipeline, retry);
    let acc_task = tokio::spawn(acc_task);

    let accepted = ingest_lines(BufReader::new(io::stdin()), &handle, interrupt()).await;
    info!(accepted, "input closed; flushing pending CIDs");

    drop(handle);
    if let Err(err) = acc_task.await {
        error!(%err, "accumulator task failed");
    }

    select! {
        res = &mut retry_task => {
            if let Err(err) = res {
                error!(%err, "retry scheduler task failed");
            }
        }
        _ = interrupt() => {
            warn!("interrupt received; abandoning outstanding retries");
            retry_task.abort();
        }
    }

    Ok(())
}

async fn interrupt() {
    if let Err(err) = signal::ctrl_c().await {
        error!(%err, "failed to listen for interrupt");
        pending::<()>().await;
    }
}

/// Feeds one CID per non-blank line to the accumulator.
///
/// Stops at EOF, on a read error, when `shutdown` resolves, or when the
/// accumulator goes away. Returns the number of CIDs accepted.
pub(crate) async fn ingest_lines<R, S>(
    reader: R,
    handle: &BatchAccumulatorHandle,
    shutdown: S,
) -> usize
where
    R: AsyncBufRead + Unpin,
    S: Future<Output = ()>,
{
    let mut lines = reader.lines();
    let mut accepted = 0;
    tokio::pin!(shutdown);

    loop {
        select! {
            line = lines.next_line() => match line {
                Ok(Some(line)) => {
                    let cid = line.trim();
                    if cid.is_empty() {
                        continue;
                    }
                    let cid = Cid::new(cid);
                    match handle.add(cid.clone()).await {
                        Ok(AddOutcome::Buffered { pending }) => {
                            debug!(%cid, pending, "cid buffered")
                        }
                        Ok(AddOutcome::Flushed { batch_len }) => {
                            info!(%cid, batch_len, "batch full; flushed")
                        }
                        Err(err) => {
                            error!(%err, %cid, "accumulator stopped; no longer accepting cids");
                            break;
                        }
                    }
                    accepted += 1;
                }
                Ok(None) => {
                    debug!("reached end of input");
                    break;
                }
                Err(err) => {
                    error!(%err, "failed to read input");
                    break;
                }
            },
            _ = &mut shutdown => {
                info!("interrupt received");
                break;
            }
        }
    }

    accepted
}

/// Prints the service fee for the described submission.
pub(crate) async fn print_quote(config: &Config, quote: &SubcQuote) -> Result<(), InitError> {
    let engine = PricingEngine::new(build_fee_cache(config)?, pricing_config(&config.pricing));

    let attachments: Vec<_> = quote.attachment.iter().copied().map(Attachment::new).collect();
    let sats = engine
        .quote(quote.message_size, &attachments, quote.stress, quote.target)
        .await;

    debug!(
        message_size = quote.message_size,
        attachments = attachments.len(),
        stress = quote.stress,
        target = ?quote.target,
        sats,
        "computed quote"
    );
    println!("{sats}");
    Ok(())
}
