//! Chain query and broadcast access.

use std::time::Duration;

use async_trait::async_trait;
use bitcoin::{Address, Txid};
use reqwest::{Response, StatusCode};
use serde::Deserialize;
use thiserror::Error;
use tracing::trace;

/// Spendable output owned by the gateway address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Utxo {
    pub txid: Txid,
    pub vout: u32,
    pub value_sats: u64,
}

/// Errors returned by a [`ChainClient`].
#[derive(Debug, Error)]
pub enum ChainClientError {
    /// Transport failure, including request timeouts.
    #[error("http: {0}")]
    Http(#[from] reqwest::Error),

    /// Endpoint answered with a non-success status.
    #[error("endpoint returned {status}: {body}")]
    Status { status: u16, body: String },

    /// Response body could not be interpreted.
    #[error("malformed response: {0}")]
    Decode(String),
}

/// Read/broadcast access to the Bitcoin network.
#[cfg_attr(any(test, feature = "test-utils"), mockall::automock)]
#[async_trait]
pub trait ChainClient: Send + Sync {
    /// Lists unspent outputs paying to `address`.
    async fn list_unspent(&self, address: &Address) -> Result<Vec<Utxo>, ChainClientError>;

    /// Fetches the consensus-encoded bytes of a transaction.
    async fn get_raw_transaction(&self, txid: &Txid) -> Result<Vec<u8>, ChainClientError>;

    /// Submits a consensus-encoded transaction, returning the txid the network reports.
    async fn broadcast(&self, raw_tx: &[u8]) -> Result<Txid, ChainClientError>;
}

#[derive(Debug, Deserialize)]
struct EsploraUtxo {
    txid: Txid,
    vout: u32,
    value: u64,
}

impl From<EsploraUtxo> for Utxo {
    fn from(value: EsploraUtxo) -> Self {
        Self {
            txid: value.txid,
            vout: value.vout,
            value_sats: value.value,
        }
    }
}

/// [`ChainClient`] backed by an Esplora REST endpoint.
#[derive(Debug, Clone)]
pub struct EsploraClient {
    http: reqwest::Client,
    base_url: String,
}

impl EsploraClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ChainClientError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        let base_url = base_url.into().trim_end_matches('/').to_owned();
        Ok(Self { http, base_url })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }
}

async fn check_status(resp: Response) -> Result<Response, ChainClientError> {
    let status = resp.status();
    if status == StatusCode::OK {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    Err(ChainClientError::Status {
        status: status.as_u16(),
        body,
    })
}

#[async_trait]
impl ChainClient for EsploraClient {
    async fn list_unspent(&self, address: &Address) -> Result<Vec<Utxo>, ChainClientError> {
        let url = self.url(&format!("address/{address}/utxo"));
        trace!(%url, "listing unspent outputs");
        let resp = check_status(self.http.get(&url).send().await?).await?;
        let utxos: Vec<EsploraUtxo> = resp.json().await?;
        Ok(utxos.into_iter().map(Utxo::from).collect())
    }

    async fn get_raw_transaction(&self, txid: &Txid) -> Result<Vec<u8>, ChainClientError> {
        let url = self.url(&format!("tx/{txid}/hex"));
        trace!(%url, "fetching raw transaction");
        let resp = check_status(self.http.get(&url).send().await?).await?;
        let body = resp.text().await?;
        hex::decode(body.trim()).map_err(|e| ChainClientError::Decode(e.to_string()))
    }

    async fn broadcast(&self, raw_tx: &[u8]) -> Result<Txid, ChainClientError> {
        let url = self.url("tx");
        let resp = self
            .http
            .post(&url)
            .body(hex::encode(raw_tx))
            .send()
            .await?;
        let body = check_status(resp).await?.text().await?;
        body.trim()
            .parse::<Txid>()
            .map_err(|e| ChainClientError::Decode(format!("bad txid {body:?}: {e}")))
    }
}
