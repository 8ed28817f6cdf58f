use anyhow::Result;

use super::check_config::cmd_check_config;
use super::commands::Commands;
use super::env::CliArgs;
use super::providers::cmd_providers;
use super::run::cmd_run;
use crate::config::AppConfig;

pub async fn dispatch(cli: &CliArgs, config: &AppConfig) -> Result<()> {
    match cli.command.clone() {
        Commands::Run(args) => cmd_run(args, config, cli.output).await,
        Commands::Providers => cmd_providers(config, cli.output),
        Commands::CheckConfig => cmd_check_config(config),
    }
}
