use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MerkleError {
    /// Nothing to commit.
    #[error("cannot commit an empty batch")]
    EmptyBatch,

    /// Requested proof for a leaf that is not in the batch.
    #[error("leaf index {index} out of range for batch of {len}")]
    IndexOutOfRange { index: usize, len: usize },
}
