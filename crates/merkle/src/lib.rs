//! Merkle commitment over ordered CID batches.
//!
//! A batch is committed by hashing every CID into a leaf and folding the leaves
//! pairwise into a single root. Leaf order is significant: the same ordering is
//! required later to rebuild an inclusion proof for any CID in the batch.

mod error;
mod hasher;
mod tree;

pub use error::MerkleError;
pub use hasher::{Hash32, MerkleHasher};
pub use tree::{MerkleCommitter, MerkleProof, ProofStep, Side};
