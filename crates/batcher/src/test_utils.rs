//! Shared fakes for the batcher tests.

use std::{
    collections::VecDeque,
    ops::Range,
    sync::Mutex,
    time::Duration,
};

use async_trait::async_trait;
use bitcoin::{hashes::Hash, Txid};
use gateway_btcio::AnchorError;
use gateway_primitives::{Cid, MerkleRoot};
use tokio::time::{self, Instant};

use crate::{
    dead_letter::{DeadLetterEntry, DeadLetterError, DeadLetterSink},
    pipeline::{AnchorPipeline, AnchorReceipt, PipelineError},
};

pub(crate) fn cids(range: Range<usize>) -> Vec<Cid> {
    range.map(|i| Cid::new(format!("bafy-{i}"))).collect()
}

/// Lets spawned tasks run to completion without moving the paused clock
/// past any pending timer.
pub(crate) async fn settle() {
    for _ in 0..16 {
        tokio::task::yield_now().await;
    }
}

/// Asserts `actual` is `expected`, allowing for timer-wheel rounding.
pub(crate) fn assert_elapsed(actual: Duration, expected: Duration) {
    assert!(
        actual >= expected && actual <= expected + Duration::from_millis(10),
        "elapsed {actual:?}, expected {expected:?}"
    );
}

/// Pipeline that records every batch it is asked to anchor.
///
/// Scripted outcomes (`true` = success) are consumed first; afterwards every
/// run yields the default outcome.
#[derive(Debug)]
pub(crate) struct RecordingPipeline {
    runs: Mutex<Vec<(Instant, Vec<Cid>)>>,
    outcomes: Mutex<VecDeque<bool>>,
    default_ok: bool,
}

impl RecordingPipeline {
    fn new(outcomes: impl IntoIterator<Item = bool>, default_ok: bool) -> Self {
        Self {
            runs: Mutex::new(Vec::new()),
            outcomes: Mutex::new(outcomes.into_iter().collect()),
            default_ok,
        }
    }

    pub(crate) fn succeeding() -> Self {
        Self::new(std::iter::empty(), true)
    }

    pub(crate) fn failing() -> Self {
        Self::new(std::iter::empty(), false)
    }

    /// Scripted outcomes, failing once they run out.
    pub(crate) fn with_outcomes(outcomes: impl IntoIterator<Item = bool>) -> Self {
        Self::new(outcomes, false)
    }

    pub(crate) fn runs(&self) -> Vec<Vec<Cid>> {
        self.runs
            .lock()
            .unwrap()
            .iter()
            .map(|(_, b)| b.clone())
            .collect()
    }

    pub(crate) fn run_times(&self) -> Vec<Instant> {
        self.runs.lock().unwrap().iter().map(|(t, _)| *t).collect()
    }
}

#[async_trait]
impl AnchorPipeline for RecordingPipeline {
    async fn run(&self, batch: &[Cid]) -> Result<AnchorReceipt, PipelineError> {
        self.runs
            .lock()
            .unwrap()
            .push((time::Instant::now(), batch.to_vec()));

        let ok = self
            .outcomes
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(self.default_ok);
        if ok {
            Ok(AnchorReceipt {
                root: MerkleRoot::new([1; 32]),
                txid: Txid::all_zeros(),
            })
        } else {
            Err(AnchorError::NoFunds.into())
        }
    }
}

#[derive(Debug, Default)]
pub(crate) struct MemoryDeadLetterSink {
    entries: Mutex<Vec<DeadLetterEntry>>,
}

impl MemoryDeadLetterSink {
    pub(crate) fn entries(&self) -> Vec<DeadLetterEntry> {
        self.entries.lock().unwrap().clone()
    }
}

#[async_trait]
impl DeadLetterSink for MemoryDeadLetterSink {
    async fn append(&self, entry: &DeadLetterEntry) -> Result<(), DeadLetterError> {
        self.entries.lock().unwrap().push(entry.clone());
        Ok(())
    }
}

/// Pipeline whose attempts never finish.
#[derive(Debug)]
pub(crate) struct HangingPipeline;

#[async_trait]
impl AnchorPipeline for HangingPipeline {
    async fn run(&self, _batch: &[Cid]) -> Result<AnchorReceipt, PipelineError> {
        std::future::pending().await
    }
}

/// Pipeline whose attempts panic.
#[derive(Debug)]
pub(crate) struct PanickingPipeline;

#[async_trait]
impl AnchorPipeline for PanickingPipeline {
    async fn run(&self, _batch: &[Cid]) -> Result<AnchorReceipt, PipelineError> {
        panic!("pipeline exploded")
    }
}
