//! CLI argument parsing and environment variable handling.

use std::{env, fmt, path::PathBuf};

use argh::FromArgs;
use gateway_primitives::ConfirmationTarget;

/// Environment variable holding the anchoring key in WIF.
pub(crate) const BITCOIN_WIF_ENV: &str = "GATEWAY_BITCOIN_WIF";

/// Inputs taken from the environment. Mostly for sensitive data.
#[derive(Clone, Default)]
pub(crate) struct EnvArgs {
    pub(crate) bitcoin_wif: Option<String>,
}

impl EnvArgs {
    pub(crate) fn from_env() -> Self {
        Self {
            bitcoin_wif: env::var(BITCOIN_WIF_ENV).ok().filter(|s| !s.trim().is_empty()),
        }
    }
}

// The key must never reach the logs.
impl fmt::Debug for EnvArgs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EnvArgs")
            .field("bitcoin_wif", &self.bitcoin_wif.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

#[derive(Clone, Debug, FromArgs)]
#[argh(description = "CID batching and Bitcoin anchoring gateway")]
pub(crate) struct Args {
    #[argh(
        option,
        short = 'c',
        description = "path to configuration (defaults apply when omitted)"
    )]
    pub(crate) config: Option<PathBuf>,

    #[argh(
        option,
        short = 'd',
        description = "data directory that relative paths resolve against (default cwd)"
    )]
    pub(crate) datadir: Option<PathBuf>,

    #[argh(
        option,
        description = "file holding the anchoring key in WIF (overrides GATEWAY_BITCOIN_WIF)"
    )]
    pub(crate) wif_file: Option<PathBuf>,

    /// Generic overrides to the config toml.
    /// Will be used, for example, as `-o batch.batch_size=20 -o bitcoin.network=signet`
    #[argh(option, short = 'o', description = "generic config overrides")]
    pub(crate) overrides: Vec<String>,

    #[argh(subcommand)]
    pub(crate) subc: Subcommand,
}

impl Args {
    /// Resolved data directory.
    pub(crate) fn datadir(&self) -> PathBuf {
        self.datadir.clone().unwrap_or_else(|| PathBuf::from("."))
    }
}

#[derive(FromArgs, PartialEq, Debug, Clone)]
#[argh(subcommand)]
pub(crate) enum Subcommand {
    Run(SubcRun),
    Quote(SubcQuote),
}

/// Reads CIDs from stdin, one per line, and anchors them in batches.
#[derive(FromArgs, PartialEq, Debug, Clone)]
#[argh(
    subcommand,
    name = "run",
    description = "batch CIDs read from stdin and anchor them on bitcoin"
)]
pub(crate) struct SubcRun {}

#[derive(FromArgs, PartialEq, Debug, Clone)]
#[argh(
    subcommand,
    name = "quote",
    description = "print the service fee for a submission, in sats"
)]
pub(crate) struct SubcQuote {
    #[argh(option, short = 's', description = "message size in bytes")]
    pub(crate) message_size: u64,

    #[argh(
        option,
        short = 'a',
        description = "attachment size in bytes, repeat per attachment"
    )]
    pub(crate) attachment: Vec<u64>,

    #[argh(
        option,
        default = "0.0",
        description = "gateway load in [0, 1] (default 0)"
    )]
    pub(crate) stress: f64,

    #[argh(
        option,
        default = "ConfirmationTarget::HalfHour",
        from_str_fn(parse_target),
        description = "fee tier [fastest, half_hour, hour, economy] (default half_hour)"
    )]
    pub(crate) target: ConfirmationTarget,
}

fn parse_target(s: &str) -> Result<ConfirmationTarget, String> {
    match s {
        "fastest" => Ok(ConfirmationTarget::Fastest),
        "half_hour" => Ok(ConfirmationTarget::HalfHour),
        "hour" => Ok(ConfirmationTarget::Hour),
        "economy" => Ok(ConfirmationTarget::Economy),
        _ => Err(format!("unknown fee tier '{s}'")),
    }
}
