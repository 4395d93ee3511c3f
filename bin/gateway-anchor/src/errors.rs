//! Error types for initialization and configuration.

use std::{io, path::PathBuf};

use gateway_btcio::{fees::FeeOracleError, ChainClientError, SignerError};
use thiserror::Error;

use crate::args::BITCOIN_WIF_ENV;

#[derive(Debug, Error)]
pub(crate) enum InitError {
    #[error("io: {0}")]
    Io(#[from] io::Error),

    #[error("failed to build runtime: {0}")]
    RuntimeBuild(#[source] io::Error),

    #[error("read {path}: {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("unparsable config: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("config: {0}")]
    MalformedConfig(#[from] ConfigError),

    #[error("no anchoring key: set {BITCOIN_WIF_ENV} or pass --wif-file")]
    MissingKey,

    #[error("anchoring key: {0}")]
    Signer(#[from] SignerError),

    #[error("chain client: {0}")]
    ChainClient(#[from] ChainClientError),

    #[error("fee oracle: {0}")]
    FeeOracle(#[from] FeeOracleError),

}

#[derive(Debug, Error)]
pub(crate) enum ConfigError {
    /// Tried to traverse into a primitive.
    #[error("can't traverse into non-table key '{key}' at '{path}'")]
    TraverseNonTableAt { key: String, path: String },

    /// Invalid override string.
    #[error("invalid override: '{0}'")]
    InvalidOverride(String),

    /// A value that parses but cannot be used.
    #[error("invalid value for {key}: {reason}")]
    InvalidValue { key: &'static str, reason: String },
}
