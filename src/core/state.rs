//! Step outcome and bookkeeping models

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::Duration;

/// Result of a step that did not abort the run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    /// Step succeeded; `captured` holds stdout when the step asked for it
    Completed { captured: Option<String> },
    /// A best-effort step failed and the run continues
    BestEffortFailure { error: String },
}

/// Final status of a step as reported in the summary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum StepStatus {
    Succeeded,
    /// Best-effort step failed, run continued
    Degraded,
    Failed,
}

/// Timing and status of one executed step
#[derive(Debug, Clone, Serialize)]
pub struct StepRecord {
    pub name: String,
    pub status: StepStatus,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,

    /// Error text for degraded or failed steps
    pub detail: Option<String>,
}

impl StepRecord {
    pub fn duration(&self) -> Duration {
        self.finished_at
            .signed_duration_since(self.started_at)
            .to_std()
            .unwrap_or_default()
    }
}

/// Everything a finished run produced
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunReport {
    pub steps: Vec<StepRecord>,
}

impl RunReport {
    pub fn push(&mut self, record: StepRecord) {
        self.steps.push(record);
    }

    /// Names of steps in execution order
    pub fn step_names(&self) -> Vec<&str> {
        self.steps.iter().map(|s| s.name.as_str()).collect()
    }

    pub fn degraded_steps(&self) -> usize {
        self.steps
            .iter()
            .filter(|s| s.status == StepStatus::Degraded)
            .count()
    }
}

/// Human friendly duration: `4s`, `2m 5s`, `1h 0m 3s`
pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    if secs < 60 {
        format!("{}s", secs)
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}
