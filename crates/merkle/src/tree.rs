//! Merkle tree construction over an ordered list of CIDs.

use std::{fmt, marker::PhantomData};

use gateway_primitives::{Cid, MerkleRoot};
use sha2::Sha256;

use crate::{error::MerkleError, hasher::MerkleHasher, Hash32};

/// Which side of the running hash a proof sibling sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
}

/// One level of an inclusion proof.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProofStep {
    pub sibling: Hash32,
    pub side: Side,
}

/// Inclusion proof for a single CID in a committed batch.
///
/// Levels where the node was promoted without a sibling contribute no step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MerkleProof {
    leaf_index: usize,
    steps: Vec<ProofStep>,
}

impl MerkleProof {
    pub fn leaf_index(&self) -> usize {
        self.leaf_index
    }

    pub fn steps(&self) -> &[ProofStep] {
        &self.steps
    }

    /// Checks that `cid` folds up to `root` along this proof, using SHA-256.
    pub fn verify(&self, cid: &Cid, root: &MerkleRoot) -> bool {
        self.verify_with::<Sha256>(cid, root)
    }

    pub fn verify_with<H: MerkleHasher>(&self, cid: &Cid, root: &MerkleRoot) -> bool {
        let acc = self
            .steps
            .iter()
            .fold(H::hash_leaf(cid.as_bytes()), |acc, step| match step.side {
                Side::Left => H::hash_node(&step.sibling, &acc),
                Side::Right => H::hash_node(&acc, &step.sibling),
            });
        &acc == root.as_bytes()
    }
}

/// Commits ordered CID batches to a single root.
///
/// Leaves are `H(cid)`, parents are `H(left || right)`. When a level has an
/// odd number of nodes the last one is carried up unchanged rather than
/// duplicated, so a single-CID batch commits to the hash of that CID.
pub struct MerkleCommitter<H = Sha256> {
    _hasher: PhantomData<fn() -> H>,
}

impl<H> fmt::Debug for MerkleCommitter<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MerkleCommitter").finish()
    }
}

impl<H> Clone for MerkleCommitter<H> {
    fn clone(&self) -> Self {
        Self {
            _hasher: PhantomData,
        }
    }
}

impl Default for MerkleCommitter<Sha256> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H: MerkleHasher> MerkleCommitter<H> {
    pub fn new() -> Self {
        Self {
            _hasher: PhantomData,
        }
    }

    /// Computes the root for `cids`, preserving their order.
    pub fn commit(&self, cids: &[Cid]) -> Result<MerkleRoot, MerkleError> {
        let mut level = Self::leaves(cids)?;
        while level.len() > 1 {
            level = Self::next_level(&level);
        }
        Ok(MerkleRoot::new(level[0]))
    }

    /// Builds the inclusion proof for the CID at `index`.
    pub fn prove(&self, cids: &[Cid], index: usize) -> Result<MerkleProof, MerkleError> {
        let mut level = Self::leaves(cids)?;
        if index >= level.len() {
            return Err(MerkleError::IndexOutOfRange {
                index,
                len: level.len(),
            });
        }

        let mut steps = Vec::new();
        let mut idx = index;
        while level.len() > 1 {
            if idx % 2 == 1 {
                steps.push(ProofStep {
                    sibling: level[idx - 1],
                    side: Side::Left,
                });
            } else if let Some(sibling) = level.get(idx + 1) {
                steps.push(ProofStep {
                    sibling: *sibling,
                    side: Side::Right,
                });
            }
            level = Self::next_level(&level);
            idx /= 2;
        }

        Ok(MerkleProof {
            leaf_index: index,
            steps,
        })
    }

    fn leaves(cids: &[Cid]) -> Result<Vec<Hash32>, MerkleError> {
        if cids.is_empty() {
            return Err(MerkleError::EmptyBatch);
        }
        Ok(cids.iter().map(|cid| H::hash_leaf(cid.as_bytes())).collect())
    }

    fn next_level(level: &[Hash32]) -> Vec<Hash32> {
        level
            .chunks(2)
            .map(|pair| match pair {
                [left, right] => H::hash_node(left, right),
                [single] => *single,
                _ => unreachable!("chunks(2) yields one or two nodes"),
            })
            .collect()
    }
}
