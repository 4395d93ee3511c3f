//! Configuration loading and translation into the library configs.

use std::{
    fs,
    num::NonZeroUsize,
    path::{Path, PathBuf},
    time::Duration,
};

use bitcoin::Network;
use gateway_btcio::WifSigner;
use gateway_config::Config;
use toml::{value::Table, Value};

use crate::{
    args::{Args, EnvArgs},
    errors::{ConfigError, InitError},
};

/// Loads the config file (if any) and applies the `-o` overrides on top.
pub(crate) fn load_config(args: &Args) -> Result<Config, InitError> {
    let mut config_toml = match &args.config {
        Some(path) => load_config_from_path(path)?,
        None => Value::Table(Table::new()),
    };

    let overrides = args
        .overrides
        .iter()
        .map(|o| parse_override(o))
        .collect::<Result<Vec<_>, ConfigError>>()?;

    let table = config_toml
        .as_table_mut()
        .ok_or(ConfigError::TraverseNonTableAt {
            key: "<root>".to_string(),
            path: "".to_string(),
        })?;

    for (path, val) in overrides {
        apply_override(&path, val, table)?;
    }

    let config = config_toml.try_into::<Config>()?;

    validate_config(config)
}

fn load_config_from_path(path: &Path) -> Result<Value, InitError> {
    let config_str = fs::read_to_string(path).map_err(|source| InitError::ReadFile {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(toml::from_str(&config_str)?)
}

fn validate_config(config: Config) -> Result<Config, InitError> {
    if config.batch.batch_size == 0 {
        return Err(invalid("batch.batch_size", "must be at least 1").into());
    }
    if config.batch.flush_interval_ms == 0 {
        return Err(invalid("batch.flush_interval_ms", "must be at least 1").into());
    }
    if config.pricing.sats_per_byte.is_nan() || config.pricing.sats_per_byte < 0.0 {
        return Err(invalid("pricing.sats_per_byte", "must be non-negative").into());
    }
    if config.pricing.profit_margin.is_nan() || config.pricing.profit_margin < 0.0 {
        return Err(invalid("pricing.profit_margin", "must be non-negative").into());
    }
    Ok(config)
}

fn invalid(key: &'static str, reason: &str) -> ConfigError {
    ConfigError::InvalidValue {
        key,
        reason: reason.to_owned(),
    }
}

/// Splits `a.b.c=value` into its key path and a TOML value.
///
/// The value is read as a TOML literal when it parses as one (`20`, `true`,
/// `"quoted"`); anything else becomes a bare string.
pub(crate) fn parse_override(s: &str) -> Result<(String, Value), ConfigError> {
    let (path, raw) = s
        .split_once('=')
        .ok_or_else(|| ConfigError::InvalidOverride(s.to_owned()))?;

    let path = path.trim();
    if path.is_empty() || path.split('.').any(|seg| seg.trim().is_empty()) {
        return Err(ConfigError::InvalidOverride(s.to_owned()));
    }

    let raw = raw.trim();
    let value = toml::from_str::<Table>(&format!("v = {raw}"))
        .ok()
        .and_then(|mut t| t.remove("v"))
        .unwrap_or_else(|| Value::String(raw.to_owned()));

    Ok((path.to_owned(), value))
}

/// Sets `val` at dotted `path` in `table`, creating missing sections.
pub(crate) fn apply_override(path: &str, val: Value, table: &mut Table) -> Result<(), ConfigError> {
    let mut segments: Vec<&str> = path.split('.').collect();
    let last = segments
        .pop()
        .ok_or_else(|| ConfigError::InvalidOverride(path.to_owned()))?;

    let mut cur = table;
    let mut walked = String::new();
    for key in segments {
        let entry = cur
            .entry(key.to_owned())
            .or_insert(Value::Table(Table::new()));
        cur = entry
            .as_table_mut()
            .ok_or_else(|| ConfigError::TraverseNonTableAt {
                key: key.to_owned(),
                path: walked.clone(),
            })?;
        if !walked.is_empty() {
            walked.push('.');
        }
        walked.push_str(key);
    }

    cur.insert(last.to_owned(), val);
    Ok(())
}

/// Resolves `path` against `datadir` unless it is already absolute.
pub(crate) fn resolve_in_datadir(datadir: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        datadir.join(path)
    }
}

/// Loads the anchoring key, preferring `--wif-file` over the environment.
pub(crate) fn load_signer(
    args: &Args,
    env: &EnvArgs,
    network: Network,
) -> Result<WifSigner, InitError> {
    let wif = match &args.wif_file {
        Some(path) => fs::read_to_string(path).map_err(|source| InitError::ReadFile {
            path: path.clone(),
            source,
        })?,
        None => env.bitcoin_wif.clone().ok_or(InitError::MissingKey)?,
    };
    Ok(WifSigner::from_wif(wif.trim(), network)?)
}

// Translations from the file layout to the library configs.

pub(crate) fn accumulator_config(
    config: &gateway_config::BatchConfig,
) -> Result<gateway_batcher::AccumulatorConfig, ConfigError> {
    let batch_size = NonZeroUsize::new(config.batch_size)
        .ok_or_else(|| invalid("batch.batch_size", "must be at least 1"))?;
    Ok(gateway_batcher::AccumulatorConfig::default()
        .with_batch_size(batch_size)
        .with_flush_interval(Duration::from_millis(config.flush_interval_ms)))
}

pub(crate) fn retry_config(config: &gateway_config::RetryConfig) -> gateway_batcher::RetryConfig {
    gateway_batcher::RetryConfig::default()
        .with_max_retries(config.max_retries)
        .with_initial_delay(Duration::from_millis(config.initial_delay_ms))
}

pub(crate) fn anchor_config(config: &gateway_config::AnchorConfig) -> gateway_btcio::AnchorConfig {
    gateway_btcio::AnchorConfig::default()
        .with_fee_policy(config.fee_policy)
        .with_dust_limit_sats(config.dust_limit_sats)
        .with_fallback_fee_sats(config.fallback_fee_sats)
}

pub(crate) fn pricing_config(
    config: &gateway_config::PricingConfig,
) -> gateway_pricing::PricingConfig {
    gateway_pricing::PricingConfig::default()
        .with_base_fee_sats(config.base_fee_sats)
        .with_fee_per_attachment_sats(config.fee_per_attachment_sats)
        .with_sats_per_byte(config.sats_per_byte)
        .with_anchor_tx_vbytes(config.anchor_tx_vbytes)
        .with_profit_margin(config.profit_margin)
        .with_fallback_anchor_fee_sats(config.fallback_anchor_fee_sats)
}
