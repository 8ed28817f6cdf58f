use anyhow::Result;

use super::output::OutputFormat;
use crate::config::AppConfig;

pub fn cmd_providers(config: &AppConfig, output: OutputFormat) -> Result<()> {
    match output {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&config.providers)?);
        }
        OutputFormat::Human => {
            if config.providers.is_empty() {
                println!("no providers configured");
                return Ok(());
            }
            for provider in &config.providers {
                let phases: Vec<_> = provider
                    .phase_specs()
                    .iter()
                    .map(|p| p.name.clone())
                    .collect();
                println!(
                    "{}  home={}  provider={}  phases: {}",
                    provider.name,
                    provider.home_domain,
                    provider.provider_domain,
                    phases.join(" -> ")
                );
            }
        }
    }
    Ok(())
}
