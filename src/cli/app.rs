use anyhow::Result;
use clap::Parser;
use tracing::{error, info};

use super::dispatch::dispatch;
use super::env::CliArgs;
use super::runtime::{init_logging, load_config, load_local_env_overrides, LoadedConfig};

pub async fn run() -> Result<()> {
    load_local_env_overrides();
    let cli = CliArgs::parse();

    init_logging(&cli.log_level, cli.debug)?;
    info!("Starting authpilot v{}", env!("CARGO_PKG_VERSION"));

    let LoadedConfig { config, path: _ } = load_config(cli.config.as_ref()).await?;

    match dispatch(&cli, &config).await {
        Ok(()) => {
            info!("Command completed successfully");
            Ok(())
        }
        Err(err) => {
            error!("Command failed: {err:#}");
            Err(err)
        }
    }
}
