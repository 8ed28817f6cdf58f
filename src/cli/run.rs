use anyhow::{bail, Result};
use tracing::warn;

use super::commands::RunArgs;
use super::output::OutputFormat;
use crate::config::AppConfig;
use crate::report;
use crate::runner::{self, RunOptions};

pub async fn cmd_run(args: RunArgs, config: &AppConfig, output: OutputFormat) -> Result<()> {
    if config.providers.is_empty() {
        bail!("no providers configured; add one to the config file");
    }
    if let Some(name) = &args.provider {
        if config.provider(name).is_none() {
            bail!("provider '{name}' is not configured");
        }
    }

    let options = RunOptions {
        only: args.provider.clone(),
        dry_run: args.dry_run,
        auto_fix: args.auto_fix,
        report_dir: args.report_dir.clone(),
    };
    let reports = runner::run_providers(config, &options).await;

    for attempt in &reports {
        if let Err(err) = report::write_report(&args.report_dir, attempt) {
            warn!(provider = %attempt.provider, %err, "failed to persist attempt report");
        }
    }

    match output {
        OutputFormat::Human => report::print_human(&reports),
        OutputFormat::Json => report::print_json(&reports)?,
    }

    let failed = reports.iter().filter(|r| !r.is_success()).count();
    if failed > 0 {
        bail!("{failed} of {} provider flow(s) did not pass", reports.len());
    }
    Ok(())
}
