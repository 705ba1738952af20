//! CLI output formatting

use crate::execution::{Branch, Criticality, Plan, SequenceEvent, StepAction};
use console::Emoji;

// Re-export style
pub use console::style;

// Emojis for output
pub static CHECK: Emoji<'_, '_> = Emoji("✅ ", "✓ ");
pub static CROSS: Emoji<'_, '_> = Emoji("❌ ", "✗ ");
pub static SPINNER: Emoji<'_, '_> = Emoji("⏳ ", "~ ");
pub static INFO: Emoji<'_, '_> = Emoji("ℹ️  ", "i ");
pub static WARN: Emoji<'_, '_> = Emoji("⚠️  ", "! ");
pub static ROCKET: Emoji<'_, '_> = Emoji("🚀 ", "> ");

/// Format a sequencer event for display
pub fn format_sequence_event(event: &SequenceEvent) -> String {
    match event {
        SequenceEvent::RunStarted { environment, steps } => format!(
            "{} Forge run for {} ({} steps)",
            ROCKET,
            style(environment).bold(),
            style(steps).cyan()
        ),
        SequenceEvent::StepStarted { name } => format!("{} {}", SPINNER, style(name).cyan()),
        SequenceEvent::StepCompleted { name } => format!("{} {}", CHECK, style(name).green()),
        SequenceEvent::StepDegraded { name, error } => format!(
            "{} {} (continuing): {}",
            WARN,
            style(name).yellow(),
            style(error).dim()
        ),
        SequenceEvent::StepFailed { name, error } => {
            format!("{} {}: {}", CROSS, style(name).red(), style(error).dim())
        }
        SequenceEvent::OutputRecorded { key, value } => format!(
            "{} output {} = {}",
            INFO,
            style(key).cyan(),
            style(value).dim()
        ),
        SequenceEvent::RunFinished { success } => {
            if *success {
                format!("{} Forge run completed {}", CHECK, style("successfully").green())
            } else {
                format!("{} Forge run {}", CROSS, style("failed").red())
            }
        }
    }
}

/// Human readable plan listing
pub fn format_plan(plan: &Plan) -> String {
    let mut lines = Vec::new();

    let branch = match plan.branch {
        Branch::Override => "override command".to_string(),
        Branch::DeployInstall { deploy, install } => format!("deploy: {}, install: {}", deploy, install),
    };
    lines.push(format!("{} Plan ({})", INFO, style(branch).dim()));

    for (i, step) in plan.steps.iter().enumerate() {
        let marker = match step.criticality {
            Criticality::Required => String::new(),
            Criticality::BestEffort => format!(" {}", style("[best effort]").dim()),
        };
        lines.push(format!("  {}. {}{}", i + 1, style(&step.name).bold(), marker));

        match &step.action {
            StepAction::Command(invocation) => {
                lines.push(format!("     {}", style(invocation.command_line()).cyan()));
            }
            StepAction::Script { script, shell } => {
                lines.push(format!("     {} script:", style(format!("{:?}", shell).to_lowercase()).cyan()));
                for line in script.lines() {
                    lines.push(format!("       {}", style(line).dim()));
                }
            }
        }
    }

    lines.join("\n")
}
