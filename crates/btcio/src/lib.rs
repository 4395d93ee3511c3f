//! Bitcoin I/O for the anchoring gateway: chain access, fee rates, signing,
//! and assembly of the `OP_RETURN` anchor transaction.

pub mod client;
pub mod fees;
pub mod writer;

#[cfg(any(test, feature = "test-utils"))]
pub use client::MockChainClient;
pub use client::{ChainClient, ChainClientError, EsploraClient, Utxo};
#[cfg(any(test, feature = "test-utils"))]
pub use writer::MockAnchorer;
pub use writer::{
    builder::{AnchorConfig, AnchorTransactionBuilder, BITCOIN_DUST_LIMIT},
    error::AnchorError,
    signer::{AnchorSigner, SignerError, WifSigner},
    Anchorer,
};
