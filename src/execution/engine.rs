//! Sequencer - validates, then drives the step plan to completion

use crate::{
    core::{
        channels::{OUTPUT_DEPLOYED, OUTPUT_FORGE_VERSION, OUTPUT_INSTALLED},
        Channels, ConfigSource, DeployError, PreconditionError, ResolvedConfig, RunError, RunReport,
        StepOutcome, StepRecord, StepStatus,
    },
    execution::{
        plan::{build_plan, Branch, Criticality, StepAction, StepDescriptor, StepKind},
        runner::{CommandRunner, ExecutionResult, Platform},
        shell::run_script,
    },
};
use chrono::Utc;
use tracing::{debug, error, info, warn};

/// Account email used by the Forge CLI
pub const AUTH_EMAIL_VAR: &str = "FORGE_EMAIL";
/// API token used by the Forge CLI
pub const AUTH_TOKEN_VAR: &str = "FORGE_API_TOKEN";

/// Progress notifications for console rendering
#[derive(Debug, Clone)]
pub enum SequenceEvent {
    RunStarted { environment: String, steps: usize },
    StepStarted { name: String },
    StepCompleted { name: String },
    StepDegraded { name: String, error: String },
    StepFailed { name: String, error: String },
    OutputRecorded { key: String, value: String },
    RunFinished { success: bool },
}

pub type EventHandler = Box<dyn Fn(&SequenceEvent) + Send + Sync>;

/// Check the working directory and authentication before anything runs
pub fn validate(config: &ResolvedConfig, env: &dyn ConfigSource) -> Result<(), PreconditionError> {
    if !config.working_directory.is_dir() {
        return Err(PreconditionError::MissingWorkingDirectory(
            config.working_directory.clone(),
        ));
    }

    let missing: Vec<&'static str> = [AUTH_EMAIL_VAR, AUTH_TOKEN_VAR]
        .into_iter()
        .filter(|key| env.get(key).map_or(true, |v| v.trim().is_empty()))
        .collect();

    if !missing.is_empty() {
        return Err(PreconditionError::MissingAuthentication(missing));
    }

    Ok(())
}

/// Runs one Forge invocation end to end
pub struct Sequencer<R> {
    runner: R,
    platform: Platform,
    event_handlers: Vec<EventHandler>,
}

impl<R: CommandRunner> Sequencer<R> {
    pub fn new(runner: R) -> Self {
        Self {
            runner,
            platform: Platform::current(),
            event_handlers: Vec::new(),
        }
    }

    pub fn with_platform(mut self, platform: Platform) -> Self {
        self.platform = platform;
        self
    }

    pub fn add_event_handler<F>(&mut self, handler: F)
    where
        F: Fn(&SequenceEvent) + Send + Sync + 'static,
    {
        self.event_handlers.push(Box::new(handler));
    }

    fn emit(&self, event: SequenceEvent) {
        for handler in &self.event_handlers {
            handler(&event);
        }
    }

    /// Resolve inputs from `inputs`, then execute
    ///
    /// Invalid inputs fail the run the same way a failed step does: the
    /// error lands in the summary and no subprocess is started.
    pub async fn run(
        &self,
        inputs: &dyn ConfigSource,
        env: &dyn ConfigSource,
        channels: &mut Channels,
    ) -> Result<RunReport, DeployError> {
        let result = match ResolvedConfig::resolve(inputs) {
            Ok(config) => self.execute_steps(&config, env, channels).await,
            Err(err) => Err(err.into()),
        };
        self.finish(result, channels)
    }

    /// Execute the run; on failure the error is also written to the summary
    pub async fn execute(
        &self,
        config: &ResolvedConfig,
        env: &dyn ConfigSource,
        channels: &mut Channels,
    ) -> Result<RunReport, DeployError> {
        let result = self.execute_steps(config, env, channels).await;
        self.finish(result, channels)
    }

    fn finish(
        &self,
        result: Result<RunReport, DeployError>,
        channels: &mut Channels,
    ) -> Result<RunReport, DeployError> {
        if let Err(err) = &result {
            error!("Forge run failed: {}", err);
            summary_best_effort(channels.summarize_failure(&err.to_string()));
        }

        self.emit(SequenceEvent::RunFinished {
            success: result.is_ok(),
        });
        result
    }

    async fn execute_steps(
        &self,
        config: &ResolvedConfig,
        env: &dyn ConfigSource,
        channels: &mut Channels,
    ) -> Result<RunReport, DeployError> {
        summary_best_effort(channels.append_summary(&format!("### Forge ({})\n", config.environment)));
        for warning in &config.warnings {
            summary_best_effort(channels.append_summary(&format!("- ⚠️ {}", warning)));
        }

        validate(config, env)?;
        let plan = build_plan(config, self.platform)?;

        info!(
            "Starting Forge run in {} ({} steps)",
            config.working_directory.display(),
            plan.steps.len()
        );
        self.emit(SequenceEvent::RunStarted {
            environment: config.environment.clone(),
            steps: plan.steps.len(),
        });

        if let Branch::DeployInstall { deploy, install } = plan.branch {
            if !deploy {
                self.set_output(channels, OUTPUT_DEPLOYED, "false")?;
            }
            if !install {
                self.set_output(channels, OUTPUT_INSTALLED, "false")?;
            }
        }

        let mut report = RunReport::default();

        for step in &plan.steps {
            let started_at = Utc::now();
            info!("Step: {}", step.name);
            self.emit(SequenceEvent::StepStarted {
                name: step.name.clone(),
            });

            let outcome = self.run_step(step, config).await;
            let finished_at = Utc::now();

            let make_record = |status: StepStatus, detail: Option<String>| StepRecord {
                name: step.name.clone(),
                status,
                started_at,
                finished_at,
                detail,
            };

            match outcome {
                Ok(StepOutcome::Completed { captured }) => {
                    self.record_outputs(step.kind, captured.as_deref(), channels)?;
                    let record = make_record(StepStatus::Succeeded, None);
                    summary_best_effort(channels.summarize_step(&record));
                    report.push(record);
                    self.emit(SequenceEvent::StepCompleted {
                        name: step.name.clone(),
                    });
                }
                Ok(StepOutcome::BestEffortFailure { error }) => {
                    warn!("{} failed, continuing: {}", step.name, error);
                    let record = make_record(StepStatus::Degraded, Some(error.clone()));
                    summary_best_effort(channels.summarize_step(&record));
                    report.push(record);
                    self.emit(SequenceEvent::StepDegraded {
                        name: step.name.clone(),
                        error,
                    });
                }
                Err(source) => {
                    let record = make_record(StepStatus::Failed, Some(source.to_string()));
                    summary_best_effort(channels.summarize_step(&record));
                    report.push(record);
                    self.emit(SequenceEvent::StepFailed {
                        name: step.name.clone(),
                        error: source.to_string(),
                    });
                    return Err(DeployError::Execution {
                        step: step.name.clone(),
                        source,
                    });
                }
            }
        }

        let result_line = format!(
            "\n**Result:** deployed: {}, installed: {}",
            channels.outputs().get(OUTPUT_DEPLOYED).unwrap_or("false"),
            channels.outputs().get(OUTPUT_INSTALLED).unwrap_or("false"),
        );
        summary_best_effort(channels.append_summary(&result_line));
        info!("Forge run finished ({} degraded steps)", report.degraded_steps());

        Ok(report)
    }

    /// Run a single step, folding best-effort failures into the outcome
    async fn run_step(
        &self,
        step: &StepDescriptor,
        config: &ResolvedConfig,
    ) -> Result<StepOutcome, RunError> {
        let result = match &step.action {
            StepAction::Command(invocation) => {
                debug!("{}: {}", step.name, invocation.command_line());
                self.runner.run(invocation).await
            }
            StepAction::Script { script, shell } => run_script(
                &self.runner,
                script,
                *shell,
                self.platform,
                &config.working_directory,
            )
            .await
            .map(|_| ExecutionResult::default()),
        };

        let outcome = match result {
            Ok(output) if step.kind == StepKind::VersionProbe => {
                match non_blank(output.stdout.as_deref()) {
                    Some(version) => StepOutcome::Completed {
                        captured: Some(version.to_string()),
                    },
                    None => StepOutcome::BestEffortFailure {
                        error: match non_blank(output.stderr.as_deref()) {
                            Some(stderr) => format!("forge --version printed no version: {}", stderr),
                            None => "forge --version reported nothing".to_string(),
                        },
                    },
                }
            }
            Ok(output) => StepOutcome::Completed {
                captured: output.stdout,
            },
            Err(err) if step.criticality == Criticality::BestEffort => {
                StepOutcome::BestEffortFailure {
                    error: err.to_string(),
                }
            }
            Err(err) => return Err(err),
        };

        Ok(outcome)
    }

    fn record_outputs(
        &self,
        kind: StepKind,
        captured: Option<&str>,
        channels: &mut Channels,
    ) -> Result<(), DeployError> {
        match (kind, captured) {
            (StepKind::VersionProbe, Some(version)) => {
                info!("Forge CLI version: {}", version);
                self.set_output(channels, OUTPUT_FORGE_VERSION, version)
            }
            (StepKind::Deploy, _) => self.set_output(channels, OUTPUT_DEPLOYED, "true"),
            (StepKind::Install, _) => self.set_output(channels, OUTPUT_INSTALLED, "true"),
            _ => Ok(()),
        }
    }

    fn set_output(&self, channels: &mut Channels, key: &str, value: &str) -> Result<(), DeployError> {
        channels.set_output(key, value)?;
        self.emit(SequenceEvent::OutputRecorded {
            key: key.to_string(),
            value: value.to_string(),
        });
        Ok(())
    }
}

/// The summary is advisory; failing to write it never changes the run
fn summary_best_effort(result: Result<(), DeployError>) {
    if let Err(err) = result {
        warn!("Could not write step summary: {}", err);
    }
}

fn non_blank(text: Option<&str>) -> Option<&str> {
    text.map(str::trim).filter(|t| !t.is_empty())
}
