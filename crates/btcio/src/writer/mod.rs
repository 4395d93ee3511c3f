//! Anchor transaction construction, signing and broadcast.

use async_trait::async_trait;
use bitcoin::Txid;
use gateway_primitives::MerkleRoot;

pub mod builder;
pub mod error;
pub mod signer;

/// Commits a Merkle root on-chain.
#[cfg_attr(any(test, feature = "test-utils"), mockall::automock)]
#[async_trait]
pub trait Anchorer: Send + Sync {
    /// Returns the txid of the broadcast anchor transaction.
    async fn anchor(&self, root: &MerkleRoot) -> Result<Txid, error::AnchorError>;
}
