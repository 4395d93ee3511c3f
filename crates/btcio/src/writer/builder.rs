//! Builds, signs and broadcasts the transaction committing one Merkle root.
//!
//! The anchor spends the single largest UTXO at the gateway address into two
//! outputs: a zero-value `OP_RETURN <root>` and change back to the same
//! address. Every check that can fail runs before signing, so a rejected
//! attempt never reaches the network.

use std::sync::Arc;

use async_trait::async_trait;
use bitcoin::{
    absolute::LockTime, blockdata::script, consensus, opcodes::all::OP_RETURN,
    transaction::Version, Amount, OutPoint, ScriptBuf, Sequence, Transaction, TxIn, TxOut, Txid,
    Witness,
};
use gateway_primitives::{fees::DEFAULT_FIXED_FEE_SATS, FeePolicy, MerkleRoot};
use tracing::{debug, info, warn};

use super::{error::AnchorError, signer::AnchorSigner, Anchorer};
use crate::{
    client::{ChainClient, Utxo},
    fees::FeeQuoteProvider,
};

/// Outputs below this value are rejected by standard relay policy.
pub const BITCOIN_DUST_LIMIT: u64 = 546;

/// Upper bound of a P2PKH `scriptSig`: a 72-byte low-S signature with its
/// sighash byte, a 33-byte compressed key, and two push opcodes.
const P2PKH_SCRIPT_SIG_SIZE: u64 = 107;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnchorConfig {
    fee_policy: FeePolicy,
    /// Minimum acceptable change value; `0` disables the check.
    dust_limit_sats: u64,
    /// Fee used by [`FeePolicy::Oracle`] when the oracle cannot be reached.
    fallback_fee_sats: u64,
}

impl Default for AnchorConfig {
    fn default() -> Self {
        Self {
            fee_policy: FeePolicy::default(),
            dust_limit_sats: BITCOIN_DUST_LIMIT,
            fallback_fee_sats: DEFAULT_FIXED_FEE_SATS,
        }
    }
}

impl AnchorConfig {
    pub fn with_fee_policy(mut self, fee_policy: FeePolicy) -> Self {
        self.fee_policy = fee_policy;
        self
    }

    pub fn with_dust_limit_sats(mut self, dust_limit_sats: u64) -> Self {
        self.dust_limit_sats = dust_limit_sats;
        self
    }

    pub fn with_fallback_fee_sats(mut self, fallback_fee_sats: u64) -> Self {
        self.fallback_fee_sats = fallback_fee_sats;
        self
    }

    pub fn fee_policy(&self) -> FeePolicy {
        self.fee_policy
    }

    pub fn dust_limit_sats(&self) -> u64 {
        self.dust_limit_sats
    }

    pub fn fallback_fee_sats(&self) -> u64 {
        self.fallback_fee_sats
    }
}

/// `OP_RETURN <32-byte root>`.
pub fn anchor_script(root: &MerkleRoot) -> ScriptBuf {
    script::Builder::new()
        .push_opcode(OP_RETURN)
        .push_slice(root.as_bytes())
        .into_script()
}

/// Picks the single UTXO with the greatest value.
pub fn select_largest_utxo(utxos: &[Utxo]) -> Option<Utxo> {
    utxos.iter().max_by_key(|u| u.value_sats).copied()
}

/// Virtual size of `tx` once its single P2PKH input is signed.
pub fn estimate_signed_vsize(unsigned: &Transaction) -> u64 {
    unsigned.vsize() as u64 + P2PKH_SCRIPT_SIG_SIZE
}

fn build_unsigned(
    utxo: &Utxo,
    root: &MerkleRoot,
    change_script: ScriptBuf,
    change_sats: u64,
) -> Transaction {
    Transaction {
        version: Version::TWO,
        lock_time: LockTime::ZERO,
        input: vec![TxIn {
            previous_output: OutPoint::new(utxo.txid, utxo.vout),
            script_sig: ScriptBuf::new(),
            sequence: Sequence::ENABLE_RBF_NO_LOCKTIME,
            witness: Witness::new(),
        }],
        output: vec![
            TxOut {
                value: Amount::ZERO,
                script_pubkey: anchor_script(root),
            },
            TxOut {
                value: Amount::from_sat(change_sats),
                script_pubkey: change_script,
            },
        ],
    }
}

/// Turns a Merkle root into a broadcast anchor transaction.
#[derive(Debug)]
pub struct AnchorTransactionBuilder<C, S, F> {
    client: Arc<C>,
    signer: Arc<S>,
    fees: Arc<F>,
    config: AnchorConfig,
}

impl<C, S, F> AnchorTransactionBuilder<C, S, F>
where
    C: ChainClient,
    S: AnchorSigner,
    F: FeeQuoteProvider,
{
    pub fn new(client: Arc<C>, signer: Arc<S>, fees: Arc<F>, config: AnchorConfig) -> Self {
        Self {
            client,
            signer,
            fees,
            config,
        }
    }

    pub fn config(&self) -> &AnchorConfig {
        &self.config
    }

    async fn compute_fee(&self, vsize: u64) -> u64 {
        match self.config.fee_policy {
            FeePolicy::Fixed { sats } => sats,
            FeePolicy::Oracle { target } => match self.fees.quote().await {
                Ok(quote) => (quote.rate(target) * vsize as f64).ceil() as u64,
                Err(err) => {
                    warn!(
                        %err,
                        fallback_sats = self.config.fallback_fee_sats,
                        "fee oracle unavailable; using fallback fee"
                    );
                    self.config.fallback_fee_sats
                }
            },
        }
    }

    /// Fetches the parent of `utxo` and returns the output it spends.
    async fn fetch_prevout(&self, utxo: &Utxo) -> Result<TxOut, AnchorError> {
        let invalid = |reason: String| AnchorError::InvalidParent {
            txid: utxo.txid,
            reason,
        };

        let raw = self.client.get_raw_transaction(&utxo.txid).await?;
        let parent: Transaction =
            consensus::deserialize(&raw).map_err(|e| invalid(e.to_string()))?;

        let parent_txid = parent.compute_txid();
        if parent_txid != utxo.txid {
            return Err(invalid(format!("decoded txid {parent_txid}")));
        }

        let prevout = parent
            .output
            .get(utxo.vout as usize)
            .cloned()
            .ok_or_else(|| invalid(format!("no output {}", utxo.vout)))?;

        if prevout.value.to_sat() != utxo.value_sats {
            return Err(invalid(format!(
                "output {} holds {} sats, expected {}",
                utxo.vout,
                prevout.value.to_sat(),
                utxo.value_sats
            )));
        }

        Ok(prevout)
    }
}

#[async_trait]
impl<C, S, F> Anchorer for AnchorTransactionBuilder<C, S, F>
where
    C: ChainClient,
    S: AnchorSigner,
    F: FeeQuoteProvider,
{
    async fn anchor(&self, root: &MerkleRoot) -> Result<Txid, AnchorError> {
        let address = self.signer.address();
        debug!(%root, %address, "anchor attempt started");

        let utxos = self.client.list_unspent(address).await?;
        let utxo = select_largest_utxo(&utxos).ok_or(AnchorError::NoFunds)?;
        debug!(
            %root,
            txid = %utxo.txid,
            vout = utxo.vout,
            value_sats = utxo.value_sats,
            candidates = utxos.len(),
            "utxo fetched"
        );

        let template = build_unsigned(&utxo, root, address.script_pubkey(), utxo.value_sats);
        let vsize = estimate_signed_vsize(&template);
        let fee = self.compute_fee(vsize).await;
        let needed = fee.saturating_add(self.config.dust_limit_sats);
        let change = utxo
            .value_sats
            .checked_sub(fee)
            .filter(|change| *change >= self.config.dust_limit_sats)
            .ok_or(AnchorError::InsufficientFunds {
                needed,
                available: utxo.value_sats,
            })?;
        debug!(%root, fee, vsize, change, "fee computed");

        let prevout = self.fetch_prevout(&utxo).await?;
        let mut tx = build_unsigned(&utxo, root, address.script_pubkey(), change);
        debug!(%root, txid = %tx.compute_txid(), "anchor tx built");

        self.signer.sign(&mut tx, 0, &prevout)?;
        debug!(%root, wtxid = %tx.compute_wtxid(), "anchor tx signed");

        let raw = consensus::serialize(&tx);
        let txid = self.client.broadcast(&raw).await.inspect_err(|err| {
            debug!(%root, %err, "anchor broadcast rejected");
        })?;
        debug!(%root, %txid, "anchor tx broadcast");

        info!(%root, %txid, fee, "anchored merkle root");
        Ok(txid)
    }
}
