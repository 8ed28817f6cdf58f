use std::path::PathBuf;

use clap::{Args, Subcommand};

#[derive(Subcommand, Clone)]
pub enum Commands {
    /// Run authentication flows for configured providers
    Run(RunArgs),

    /// List configured providers and their phase sequences
    Providers,

    /// Validate the configuration file
    CheckConfig,
}

#[derive(Args, Clone)]
pub struct RunArgs {
    /// Only test the named provider
    #[arg(short, long)]
    pub provider: Option<String>,

    /// Use scripted in-process doubles instead of the driver and agent sidecars
    #[arg(long)]
    pub dry_run: bool,

    /// Apply proposed remediations automatically
    #[arg(long)]
    pub auto_fix: bool,

    /// Directory attempt reports are written to
    #[arg(long, value_name = "DIR", default_value = "reports")]
    pub report_dir: PathBuf,
}
