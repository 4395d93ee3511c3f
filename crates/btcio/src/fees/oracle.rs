//! Recommended fee-rate source.

use std::time::Duration;

use async_trait::async_trait;
use gateway_primitives::ConfirmationTarget;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::trace;

/// Fee-rate tiers in sat/vB as published by the oracle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendedFees {
    pub fastest_fee: f64,
    pub half_hour_fee: f64,
    pub hour_fee: f64,
    pub economy_fee: f64,
    pub minimum_fee: f64,
}

impl RecommendedFees {
    pub fn rate(&self, target: ConfirmationTarget) -> f64 {
        match target {
            ConfirmationTarget::Fastest => self.fastest_fee,
            ConfirmationTarget::HalfHour => self.half_hour_fee,
            ConfirmationTarget::Hour => self.hour_fee,
            ConfirmationTarget::Economy => self.economy_fee,
        }
    }
}

#[derive(Debug, Error)]
pub enum FeeOracleError {
    /// Transport failure, including request timeouts.
    #[error("fee oracle request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Oracle answered with a non-success status.
    #[error("fee oracle returned status {0}")]
    Status(u16),

    /// Oracle could not be reached or gave no usable answer.
    #[error("fee oracle unavailable: {0}")]
    Unavailable(String),
}

/// Source of current recommended fee rates.
#[cfg_attr(any(test, feature = "test-utils"), mockall::automock)]
#[async_trait]
pub trait FeeOracle: Send + Sync {
    async fn recommended_fees(&self) -> Result<RecommendedFees, FeeOracleError>;
}

/// [`FeeOracle`] backed by the mempool.space REST API.
#[derive(Debug, Clone)]
pub struct MempoolFeeOracle {
    http: reqwest::Client,
    url: String,
}

impl MempoolFeeOracle {
    /// `base_url` is the API root, e.g. `https://mempool.space/api`.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, FeeOracleError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        let url = format!("{}/v1/fees/recommended", base_url.trim_end_matches('/'));
        Ok(Self { http, url })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl FeeOracle for MempoolFeeOracle {
    async fn recommended_fees(&self) -> Result<RecommendedFees, FeeOracleError> {
        trace!(url = %self.url, "fetching recommended fees");
        let resp = self.http.get(&self.url).send().await?;
        if !resp.status().is_success() {
            return Err(FeeOracleError::Status(resp.status().as_u16()));
        }
        Ok(resp.json().await?)
    }
}
