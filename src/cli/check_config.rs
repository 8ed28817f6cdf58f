use anyhow::{bail, Result};

use crate::config::AppConfig;

pub fn cmd_check_config(config: &AppConfig) -> Result<()> {
    let problems = config.validate();
    if problems.is_empty() {
        println!(
            "configuration OK ({} provider(s) configured)",
            config.providers.len()
        );
        return Ok(());
    }

    for problem in &problems {
        eprintln!("problem: {problem}");
    }
    bail!("configuration has {} problem(s)", problems.len());
}
