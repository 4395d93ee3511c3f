//! Commit-then-anchor pipeline run once per batch attempt.

use std::sync::Arc;

use async_trait::async_trait;
use bitcoin::Txid;
use gateway_btcio::{AnchorError, Anchorer};
use gateway_merkle::{MerkleCommitter, MerkleError};
use gateway_primitives::{Cid, MerkleRoot};
use thiserror::Error;

/// Result of a successful anchor attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnchorReceipt {
    pub root: MerkleRoot,
    pub txid: Txid,
}

#[derive(Debug, Error)]
pub enum PipelineError {
    /// Batch could not be committed; retrying the same batch cannot help.
    #[error("merkle commitment: {0}")]
    Commit(#[from] MerkleError),

    #[error("anchoring: {0}")]
    Anchor(#[from] AnchorError),

    /// Attempt task panicked or was cancelled before producing a result.
    #[error("attempt aborted: {0}")]
    AttemptAborted(String),
}

impl PipelineError {
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Commit(_) | Self::AttemptAborted(_) => false,
            Self::Anchor(_) => true,
        }
    }
}

/// One full attempt at anchoring a batch.
///
/// Every call recomputes the commitment from `batch`, so a retry never relies
/// on state left over from a previous attempt.
#[async_trait]
pub trait AnchorPipeline: Send + Sync + 'static {
    async fn run(&self, batch: &[Cid]) -> Result<AnchorReceipt, PipelineError>;
}

/// Runs one attempt on its own task so that a panic inside the pipeline comes
/// back as [`PipelineError::AttemptAborted`] instead of losing the batch.
pub(crate) async fn run_attempt<P: AnchorPipeline>(
    pipeline: Arc<P>,
    batch: Vec<Cid>,
) -> Result<AnchorReceipt, PipelineError> {
    tokio::spawn(async move { pipeline.run(&batch).await })
        .await
        .unwrap_or_else(|err| Err(PipelineError::AttemptAborted(err.to_string())))
}

/// Production pipeline: SHA-256 Merkle commitment, then an on-chain anchor.
#[derive(Debug)]
pub struct MerkleAnchorPipeline<A> {
    committer: MerkleCommitter,
    anchorer: Arc<A>,
}

impl<A: Anchorer> MerkleAnchorPipeline<A> {
    pub fn new(anchorer: Arc<A>) -> Self {
        Self {
            committer: MerkleCommitter::new(),
            anchorer,
        }
    }
}

#[async_trait]
impl<A: Anchorer + 'static> AnchorPipeline for MerkleAnchorPipeline<A> {
    async fn run(&self, batch: &[Cid]) -> Result<AnchorReceipt, PipelineError> {
        let root = self.committer.commit(batch)?;
        let txid = self.anchorer.anchor(&root).await?;
        Ok(AnchorReceipt { root, txid })
    }
}

#[cfg(test)]
mod tests {
    use bitcoin::hashes::Hash;
    use gateway_btcio::MockAnchorer;

    use super::*;
    use crate::test_utils::{cids, PanickingPipeline};

    fn batch() -> Vec<Cid> {
        ["bafy-a", "bafy-b", "bafy-c"].map(Cid::from).to_vec()
    }

    #[tokio::test]
    async fn test_anchors_committed_root() {
        let committer: MerkleCommitter = MerkleCommitter::new();
        let expected_root = committer.commit(&batch()).unwrap();
        let txid = Txid::from_byte_array([9; 32]);

        let mut anchorer = MockAnchorer::new();
        anchorer
            .expect_anchor()
            .withf(move |root| *root == expected_root)
            .times(1)
            .returning(move |_| Ok(txid));

        let pipeline = MerkleAnchorPipeline::new(Arc::new(anchorer));
        let receipt = pipeline.run(&batch()).await.unwrap();
        assert_eq!(receipt.root, expected_root);
        assert_eq!(receipt.txid, txid);
    }

    #[tokio::test]
    async fn test_empty_batch_is_not_retryable() {
        let mut anchorer = MockAnchorer::new();
        anchorer.expect_anchor().never();

        let pipeline = MerkleAnchorPipeline::new(Arc::new(anchorer));
        let err = pipeline.run(&[]).await.unwrap_err();
        assert!(matches!(err, PipelineError::Commit(MerkleError::EmptyBatch)));
        assert!(!err.is_retryable());
    }

    #[tokio::test]
    async fn test_anchor_failure_is_retryable() {
        let mut anchorer = MockAnchorer::new();
        anchorer
            .expect_anchor()
            .returning(|_| Err(AnchorError::NoFunds));

        let pipeline = MerkleAnchorPipeline::new(Arc::new(anchorer));
        let err = pipeline.run(&batch()).await.unwrap_err();
        assert!(matches!(err, PipelineError::Anchor(AnchorError::NoFunds)));
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn test_panicking_attempt_becomes_error() {
        let err = run_attempt(Arc::new(PanickingPipeline), cids(0..2))
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::AttemptAborted(_)));
        assert!(!err.is_retryable());
    }
}
