//! Output and summary channels consumed by the pipeline host

use crate::core::error::DeployError;
use crate::core::source::ConfigSource;
use crate::core::state::{format_duration, StepRecord, StepStatus};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use uuid::Uuid;

pub const OUTPUT_DEPLOYED: &str = "deployed";
pub const OUTPUT_INSTALLED: &str = "installed";
pub const OUTPUT_FORGE_VERSION: &str = "forge-version";

/// Append-only record of outputs; later writes win on lookup
#[derive(Debug, Clone, Default)]
pub struct OutputSet {
    entries: Vec<(String, String)>,
}

impl OutputSet {
    pub fn push(&mut self, key: &str, value: &str) {
        self.entries.push((key.to_string(), value.to_string()));
    }

    /// Last value written for `key`
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .rev()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// Outputs and summary of one run, mirrored to files when the host provides them
#[derive(Debug, Default)]
pub struct Channels {
    outputs: OutputSet,
    summary: String,
    output_file: Option<PathBuf>,
    summary_file: Option<PathBuf>,
}

impl Channels {
    /// Channels kept in memory only
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Use `GITHUB_OUTPUT` and `GITHUB_STEP_SUMMARY` when set
    pub fn from_env(env: &dyn ConfigSource) -> Self {
        let path = |key: &str| {
            env.get(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .map(PathBuf::from)
        };

        Self {
            output_file: path("GITHUB_OUTPUT"),
            summary_file: path("GITHUB_STEP_SUMMARY"),
            ..Self::default()
        }
    }

    pub fn with_files(output_file: Option<PathBuf>, summary_file: Option<PathBuf>) -> Self {
        Self {
            output_file,
            summary_file,
            ..Self::default()
        }
    }

    pub fn outputs(&self) -> &OutputSet {
        &self.outputs
    }

    pub fn summary(&self) -> &str {
        &self.summary
    }

    /// Record an output value
    pub fn set_output(&mut self, key: &str, value: &str) -> Result<(), DeployError> {
        self.outputs.push(key, value);

        if let Some(path) = &self.output_file {
            append(path, &format_output_line(key, value)).map_err(|source| DeployError::Channel {
                channel: "output file",
                source,
            })?;
        }

        Ok(())
    }

    /// Append markdown to the summary
    pub fn append_summary(&mut self, text: &str) -> Result<(), DeployError> {
        let mut chunk = text.to_string();
        if !chunk.ends_with('\n') {
            chunk.push('\n');
        }
        self.summary.push_str(&chunk);

        if let Some(path) = &self.summary_file {
            append(path, &chunk).map_err(|source| DeployError::Channel {
                channel: "step summary",
                source,
            })?;
        }

        Ok(())
    }

    /// Summary bullet for a finished step
    pub fn summarize_step(&mut self, record: &StepRecord) -> Result<(), DeployError> {
        let line = match (&record.status, &record.detail) {
            (StepStatus::Succeeded, _) => format!(
                "- ✅ {} ({})",
                record.name,
                format_duration(record.duration())
            ),
            (StepStatus::Degraded, detail) => format!(
                "- ⚠️ {} (continuing): {}",
                record.name,
                detail.as_deref().unwrap_or("failed")
            ),
            (StepStatus::Failed, detail) => format!(
                "- ❌ {}: {}",
                record.name,
                detail.as_deref().unwrap_or("failed")
            ),
        };
        self.append_summary(&line)
    }

    /// Failure block written before exiting non-zero
    pub fn summarize_failure(&mut self, error: &str) -> Result<(), DeployError> {
        self.append_summary(&format!("\n**Forge run failed**\n\n```\n{}\n```", error))
    }
}

/// `key=value`, or the heredoc form when the value spans lines
fn format_output_line(key: &str, value: &str) -> String {
    if value.contains('\n') || value.contains('\r') {
        let delimiter = format!("ghadelimiter_{}", Uuid::new_v4());
        format!("{key}<<{delimiter}\n{value}\n{delimiter}\n")
    } else {
        format!("{key}={value}\n")
    }
}

fn append(path: &Path, text: &str) -> std::io::Result<()> {
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    file.write_all(text.as_bytes())
}
