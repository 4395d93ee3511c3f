//! Gateway binary: batches CIDs, commits each batch to a Merkle root and
//! anchors the root on Bitcoin.

use anyhow::{anyhow, Result};
use argh::from_env;
use gateway_common::logging;
use gateway_config::Config;
use tokio::runtime;
use tracing::info;

use crate::{
    args::{Args, EnvArgs, Subcommand},
    errors::InitError,
};

mod args;
mod context;
mod errors;
mod services;

fn main() -> Result<()> {
    let args: Args = from_env();

    let config =
        context::load_config(&args).map_err(|e| anyhow!("Failed to load configuration: {e}"))?;

    let rt = runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_name("gateway-rt")
        .build()
        .map_err(InitError::RuntimeBuild)?;

    init_logging(&config);

    match &args.subc {
        Subcommand::Run(_) => {
            let signer = context::load_signer(&args, &EnvArgs::from_env(), config.bitcoin.network)
                .map_err(|e| anyhow!("Failed to load anchoring key: {e}"))?;
            rt.block_on(services::run_gateway(config, &args.datadir(), signer))?;
        }
        Subcommand::Quote(quote) => {
            rt.block_on(services::print_quote(&config, quote))?;
        }
    }

    info!("Exiting gateway-anchor");
    Ok(())
}

fn init_logging(config: &Config) {
    logging::init_logging_from_config(logging::LoggingInitConfig {
        service_base_name: "gateway-anchor",
        service_label: config.logging.service_label.as_deref(),
        log_dir: config.logging.log_dir.as_ref(),
        log_file_prefix: config.logging.log_file_prefix.as_deref(),
        json_format: config.logging.json_format,
        default_log_prefix: "gateway-anchor",
    });
}
