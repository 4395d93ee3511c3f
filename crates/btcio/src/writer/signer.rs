//! Single-key P2PKH signing of anchor transactions.

use std::fmt;

use bitcoin::{
    ecdsa,
    hashes::Hash,
    script::{self, PushBytesBuf},
    secp256k1::{All, Message, Secp256k1},
    sighash::{EcdsaSighashType, SighashCache},
    Address, Network, NetworkKind, PrivateKey, PublicKey, Transaction, TxOut,
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SignerError {
    /// Key material could not be decoded.
    #[error("invalid private key: {0}")]
    InvalidKey(String),

    /// Key was encoded for a different network than configured.
    #[error("key is for {actual:?}, expected {expected:?}")]
    NetworkMismatch {
        expected: NetworkKind,
        actual: NetworkKind,
    },

    /// Sighash computation rejected the input.
    #[error("sighash: {0}")]
    Sighash(String),

    #[error("input {index} out of range for tx with {inputs} inputs")]
    InputOutOfRange { index: usize, inputs: usize },
}

/// Signs anchor inputs and owns the address they pay change to.
pub trait AnchorSigner: Send + Sync {
    /// Address holding the gateway's funds.
    fn address(&self) -> &Address;

    /// Fills in the unlocking script of `input_index`, which spends `prevout`.
    fn sign(
        &self,
        tx: &mut Transaction,
        input_index: usize,
        prevout: &TxOut,
    ) -> Result<(), SignerError>;
}

/// [`AnchorSigner`] holding one WIF-encoded key, spending legacy P2PKH outputs.
pub struct WifSigner {
    secp: Secp256k1<All>,
    key: PrivateKey,
    public_key: PublicKey,
    address: Address,
}

impl fmt::Debug for WifSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WifSigner")
            .field("address", &self.address)
            .finish_non_exhaustive()
    }
}

impl WifSigner {
    pub fn new(key: PrivateKey) -> Self {
        let secp = Secp256k1::new();
        let public_key = key.public_key(&secp);
        let address = Address::p2pkh(public_key.pubkey_hash(), key.network);
        Self {
            secp,
            key,
            public_key,
            address,
        }
    }

    /// Decodes `wif` and checks it belongs to `network`.
    pub fn from_wif(wif: &str, network: Network) -> Result<Self, SignerError> {
        let key =
            PrivateKey::from_wif(wif.trim()).map_err(|e| SignerError::InvalidKey(e.to_string()))?;
        let expected = NetworkKind::from(network);
        if key.network != expected {
            return Err(SignerError::NetworkMismatch {
                expected,
                actual: key.network,
            });
        }
        Ok(Self::new(key))
    }

    pub fn public_key(&self) -> &PublicKey {
        &self.public_key
    }
}

impl AnchorSigner for WifSigner {
    fn address(&self) -> &Address {
        &self.address
    }

    fn sign(
        &self,
        tx: &mut Transaction,
        input_index: usize,
        prevout: &TxOut,
    ) -> Result<(), SignerError> {
        let inputs = tx.input.len();
        if input_index >= inputs {
            return Err(SignerError::InputOutOfRange {
                index: input_index,
                inputs,
            });
        }

        let sighash_type = EcdsaSighashType::All;
        let sighash = SighashCache::new(&*tx)
            .legacy_signature_hash(input_index, &prevout.script_pubkey, sighash_type.to_u32())
            .map_err(|e| SignerError::Sighash(e.to_string()))?;

        let msg = Message::from_digest(sighash.to_byte_array());
        let signature = ecdsa::Signature {
            signature: self.secp.sign_ecdsa(&msg, &self.key.inner),
            sighash_type,
        };
        let sig_bytes = PushBytesBuf::try_from(signature.serialize().to_vec())
            .map_err(|e| SignerError::Sighash(e.to_string()))?;

        tx.input[input_index].script_sig = script::Builder::new()
            .push_slice(sig_bytes)
            .push_key(&self.public_key)
            .into_script();
        Ok(())
    }
}
