use bitcoin::Txid;
use thiserror::Error;

use super::signer::SignerError;
use crate::client::ChainClientError;

/// Failure of a single anchor attempt.
#[derive(Debug, Error)]
pub enum AnchorError {
    /// The gateway address has no spendable outputs.
    #[error("no spendable outputs at the gateway address")]
    NoFunds,

    /// The selected output cannot cover the fee plus the minimum change.
    #[error("insufficient funds: need {needed} sats, have {available}")]
    InsufficientFunds { needed: u64, available: u64 },

    /// Parent of the selected output does not match what the chain reported.
    #[error("invalid parent tx {txid}: {reason}")]
    InvalidParent { txid: Txid, reason: String },

    #[error("signing: {0}")]
    Signing(#[from] SignerError),

    /// Chain query failed or the network rejected the transaction.
    #[error("anchor failed: {0}")]
    AnchorFailed(#[from] ChainClientError),
}
