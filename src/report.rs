//! Attempt report persistence and console output.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use flow_engine::{AttemptReport, AttemptStatus};
use humantime::format_duration;

/// Write one attempt report as pretty JSON, returning the file path.
pub fn write_report(dir: &Path, report: &AttemptReport) -> Result<PathBuf> {
    fs::create_dir_all(dir)
        .with_context(|| format!("failed to create report directory {}", dir.display()))?;
    let path = dir.join(format!("{}-{}.json", report.provider, report.attempt_id));
    let json = serde_json::to_string_pretty(report).context("failed to serialize report")?;
    fs::write(&path, json)
        .with_context(|| format!("failed to write report {}", path.display()))?;
    Ok(path)
}

pub fn status_label(status: AttemptStatus) -> &'static str {
    match status {
        AttemptStatus::Passed => "passed",
        AttemptStatus::Failed => "failed",
        AttemptStatus::Blocked => "blocked",
        AttemptStatus::Aborted => "aborted",
    }
}

/// Human-readable summary table.
pub fn print_human(reports: &[AttemptReport]) {
    println!(
        "{:<12} {:<8} {:<14} {:>7}  {:<10} {}",
        "PROVIDER", "STATUS", "PHASE", "ACTIONS", "DURATION", "MESSAGE"
    );
    for report in reports {
        let phase = report.phase_reached.as_deref().unwrap_or("-");
        let duration = format_duration(Duration::from_millis(report.duration_ms)).to_string();
        println!(
            "{:<12} {:<8} {:<14} {:>7}  {:<10} {}",
            report.provider.as_str(),
            status_label(report.status),
            phase,
            report.actions_in_final_phase,
            duration,
            report.message
        );
    }
}

/// Raw report records as a JSON array.
pub fn print_json(reports: &[AttemptReport]) -> Result<()> {
    let json = serde_json::to_string_pretty(reports).context("failed to serialize reports")?;
    println!("{json}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use authpilot_core_types::{AttemptId, ProviderId};
    use chrono::Utc;

    #[test]
    fn writes_report_file() {
        let dir = tempfile::tempdir().unwrap();
        let report = AttemptReport {
            attempt_id: AttemptId::new(),
            provider: ProviderId::from("github"),
            status: AttemptStatus::Passed,
            message: "all 4 phases verified".to_string(),
            phase_reached: None,
            actions_in_final_phase: 0,
            history: Vec::new(),
            started_at: Utc::now(),
            finished_at: Utc::now(),
            duration_ms: 4200,
        };

        let path = write_report(dir.path(), &report).unwrap();
        let contents = fs::read_to_string(path).unwrap();
        assert!(contents.contains("\"status\": \"passed\""));
        assert!(contents.contains("github"));
    }
}
