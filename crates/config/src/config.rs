use std::path::PathBuf;

use bitcoin::Network;
use gateway_primitives::{fees::DEFAULT_FIXED_FEE_SATS, FeePolicy};
use serde::{Deserialize, Serialize};

/// Default number of CIDs per batch.
const DEFAULT_BATCH_SIZE: usize = 5;

/// Default flush timer period in ms.
const DEFAULT_FLUSH_INTERVAL_MS: u64 = 60_000;

/// Default number of anchor attempts per batch.
const DEFAULT_MAX_RETRIES: u32 = 3;

/// Default delay before the first retry in ms.
const DEFAULT_INITIAL_RETRY_DELAY_MS: u64 = 300_000;

/// Default dead-letter file, relative to the data directory.
const DEFAULT_DEAD_LETTER_PATH: &str = "dead-letter-queue.log";

/// Default Esplora API root.
const DEFAULT_ESPLORA_URL: &str = "https://blockstream.info/testnet/api";

/// Default HTTP request timeout in ms.
const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 10_000;

/// Default minimum change output value.
const DEFAULT_DUST_LIMIT_SATS: u64 = 546;

/// Default fee oracle API root.
const DEFAULT_FEE_ORACLE_URL: &str = "https://mempool.space/api";

/// Default lifetime of a cached fee quote in ms.
const DEFAULT_FEE_CACHE_TTL_MS: u64 = 300_000;

const DEFAULT_BASE_FEE_SATS: u64 = 10;
const DEFAULT_FEE_PER_ATTACHMENT_SATS: u64 = 5;
const DEFAULT_SATS_PER_BYTE: f64 = 0.001;
const DEFAULT_ANCHOR_TX_VBYTES: u64 = 141;
const DEFAULT_PROFIT_MARGIN: f64 = 0.15;
const DEFAULT_FALLBACK_ANCHOR_FEE_SATS: u64 = 250;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchConfig {
    /// CIDs per batch; reaching it flushes immediately.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Flush timer period in ms.
    #[serde(default = "default_flush_interval_ms")]
    pub flush_interval_ms: u64,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            flush_interval_ms: DEFAULT_FLUSH_INTERVAL_MS,
        }
    }
}

fn default_batch_size() -> usize {
    DEFAULT_BATCH_SIZE
}

fn default_flush_interval_ms() -> u64 {
    DEFAULT_FLUSH_INTERVAL_MS
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Anchor attempts per batch before it is dead-lettered.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Delay before the first retry in ms; doubles for each later one.
    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,

    /// Dead-letter file. Relative paths resolve against the data directory.
    #[serde(default = "default_dead_letter_path")]
    pub dead_letter_path: PathBuf,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            initial_delay_ms: DEFAULT_INITIAL_RETRY_DELAY_MS,
            dead_letter_path: default_dead_letter_path(),
        }
    }
}

fn default_max_retries() -> u32 {
    DEFAULT_MAX_RETRIES
}

fn default_initial_delay_ms() -> u64 {
    DEFAULT_INITIAL_RETRY_DELAY_MS
}

fn default_dead_letter_path() -> PathBuf {
    DEFAULT_DEAD_LETTER_PATH.into()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BitcoinConfig {
    /// Network the gateway key and address belong to.
    #[serde(default = "default_network")]
    pub network: Network,

    /// Esplora REST API root used for UTXO lookup and broadcast.
    #[serde(default = "default_esplora_url")]
    pub esplora_url: String,

    /// Timeout for every HTTP request, in ms.
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

impl Default for BitcoinConfig {
    fn default() -> Self {
        Self {
            network: default_network(),
            esplora_url: default_esplora_url(),
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
        }
    }
}

fn default_network() -> Network {
    Network::Testnet
}

fn default_esplora_url() -> String {
    DEFAULT_ESPLORA_URL.to_owned()
}

fn default_request_timeout_ms() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_MS
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnchorConfig {
    #[serde(default)]
    pub fee_policy: FeePolicy,

    /// Minimum change value in sats; `0` disables the check.
    #[serde(default = "default_dust_limit_sats")]
    pub dust_limit_sats: u64,

    /// Fee paid under the oracle policy while the oracle is unreachable.
    #[serde(default = "default_anchor_fallback_fee_sats")]
    pub fallback_fee_sats: u64,
}

impl Default for AnchorConfig {
    fn default() -> Self {
        Self {
            fee_policy: FeePolicy::default(),
            dust_limit_sats: DEFAULT_DUST_LIMIT_SATS,
            fallback_fee_sats: DEFAULT_FIXED_FEE_SATS,
        }
    }
}

fn default_dust_limit_sats() -> u64 {
    DEFAULT_DUST_LIMIT_SATS
}

fn default_anchor_fallback_fee_sats() -> u64 {
    DEFAULT_FIXED_FEE_SATS
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeesConfig {
    /// Fee oracle API root.
    #[serde(default = "default_fee_oracle_url")]
    pub oracle_url: String,

    /// How long a fetched quote stays valid, in ms.
    #[serde(default = "default_fee_cache_ttl_ms")]
    pub cache_ttl_ms: u64,
}

impl Default for FeesConfig {
    fn default() -> Self {
        Self {
            oracle_url: default_fee_oracle_url(),
            cache_ttl_ms: DEFAULT_FEE_CACHE_TTL_MS,
        }
    }
}

fn default_fee_oracle_url() -> String {
    DEFAULT_FEE_ORACLE_URL.to_owned()
}

fn default_fee_cache_ttl_ms() -> u64 {
    DEFAULT_FEE_CACHE_TTL_MS
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricingConfig {
    #[serde(default = "default_base_fee_sats")]
    pub base_fee_sats: u64,

    #[serde(default = "default_fee_per_attachment_sats")]
    pub fee_per_attachment_sats: u64,

    #[serde(default = "default_sats_per_byte")]
    pub sats_per_byte: f64,

    /// Virtual size charged as one anchor transaction.
    #[serde(default = "default_anchor_tx_vbytes")]
    pub anchor_tx_vbytes: u64,

    /// Fractional markup over cost.
    #[serde(default = "default_profit_margin")]
    pub profit_margin: f64,

    /// Anchor cost charged when the fee oracle is unreachable.
    #[serde(default = "default_fallback_anchor_fee_sats")]
    pub fallback_anchor_fee_sats: u64,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            base_fee_sats: DEFAULT_BASE_FEE_SATS,
            fee_per_attachment_sats: DEFAULT_FEE_PER_ATTACHMENT_SATS,
            sats_per_byte: DEFAULT_SATS_PER_BYTE,
            anchor_tx_vbytes: DEFAULT_ANCHOR_TX_VBYTES,
            profit_margin: DEFAULT_PROFIT_MARGIN,
            fallback_anchor_fee_sats: DEFAULT_FALLBACK_ANCHOR_FEE_SATS,
        }
    }
}

fn default_base_fee_sats() -> u64 {
    DEFAULT_BASE_FEE_SATS
}

fn default_fee_per_attachment_sats() -> u64 {
    DEFAULT_FEE_PER_ATTACHMENT_SATS
}

fn default_sats_per_byte() -> f64 {
    DEFAULT_SATS_PER_BYTE
}

fn default_anchor_tx_vbytes() -> u64 {
    DEFAULT_ANCHOR_TX_VBYTES
}

fn default_profit_margin() -> f64 {
    DEFAULT_PROFIT_MARGIN
}

fn default_fallback_anchor_fee_sats() -> u64 {
    DEFAULT_FALLBACK_ANCHOR_FEE_SATS
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct LoggingConfig {
    /// Service label to append to the service name (e.g., "prod", "dev").
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_label: Option<String>,

    /// Directory path for file-based logging.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_dir: Option<PathBuf>,

    /// Prefix for log file names.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_file_prefix: Option<String>,

    /// Use JSON format for logs instead of compact format.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub json_format: Option<bool>,
}

/// Every section is optional; an empty file yields the defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub batch: BatchConfig,

    #[serde(default)]
    pub retry: RetryConfig,

    #[serde(default)]
    pub bitcoin: BitcoinConfig,

    #[serde(default)]
    pub anchor: AnchorConfig,

    #[serde(default)]
    pub fees: FeesConfig,

    #[serde(default)]
    pub pricing: PricingConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

#[cfg(test)]
mod test {
    use gateway_primitives::ConfirmationTarget;

    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = toml::from_str::<Config>("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.batch.batch_size, 5);
        assert_eq!(config.batch.flush_interval_ms, 60_000);
        assert_eq!(config.retry.max_retries, 3);
        assert_eq!(config.retry.initial_delay_ms, 300_000);
        assert_eq!(
            config.retry.dead_letter_path,
            PathBuf::from("dead-letter-queue.log")
        );
        assert_eq!(config.bitcoin.network, Network::Testnet);
        assert_eq!(config.anchor.fee_policy, FeePolicy::Fixed { sats: 10_000 });
        assert_eq!(config.anchor.dust_limit_sats, 546);
        assert_eq!(config.anchor.fallback_fee_sats, 10_000);
        assert_eq!(config.fees.cache_ttl_ms, 300_000);
        assert_eq!(config.pricing.anchor_tx_vbytes, 141);
    }

    #[test]
    fn test_config_load() {
        let config_string = r#"
            [batch]
            batch_size = 20
            flush_interval_ms = 5000

            [retry]
            max_retries = 5
            initial_delay_ms = 1000
            dead_letter_path = "/var/lib/gateway/dlq.log"

            [bitcoin]
            network = "signet"
            esplora_url = "https://mempool.space/signet/api"
            request_timeout_ms = 2500

            [anchor]
            fee_policy = { policy = "Oracle", target = "fastest" }
            dust_limit_sats = 0
            fallback_fee_sats = 4000

            [fees]
            oracle_url = "https://mempool.space/signet/api"
            cache_ttl_ms = 60000

            [pricing]
            base_fee_sats = 20
            profit_margin = 0.3

            [logging]
            service_label = "dev"
            log_dir = "/var/log/gateway"
            json_format = true
        "#;

        let config = toml::from_str::<Config>(config_string);
        assert!(
            config.is_ok(),
            "should be able to load TOML config but got: {:?}",
            config.err()
        );
        let config = config.unwrap();

        assert_eq!(config.batch.batch_size, 20);
        assert_eq!(config.retry.max_retries, 5);
        assert_eq!(config.bitcoin.network, Network::Signet);
        assert_eq!(
            config.anchor.fee_policy,
            FeePolicy::Oracle {
                target: ConfirmationTarget::Fastest
            }
        );
        assert_eq!(config.anchor.dust_limit_sats, 0);
        assert_eq!(config.anchor.fallback_fee_sats, 4000);
        assert_eq!(config.pricing.base_fee_sats, 20);
        assert_eq!(config.pricing.profit_margin, 0.3);
        assert_eq!(config.pricing.fee_per_attachment_sats, 5);
        assert_eq!(config.logging.service_label.as_deref(), Some("dev"));
        assert_eq!(config.logging.json_format, Some(true));
    }

    #[test]
    fn test_fixed_fee_policy_section() {
        let config = toml::from_str::<Config>(
            r#"
            [anchor.fee_policy]
            policy = "Fixed"
            sats = 2500
        "#,
        )
        .unwrap();
        assert_eq!(config.anchor.fee_policy, FeePolicy::Fixed { sats: 2500 });
        assert_eq!(config.anchor.dust_limit_sats, 546);
    }
}
