//! Test utility functions for forge-deploy

#![allow(dead_code)]

use async_trait::async_trait;
use forge_deploy::core::{Channels, DeployError, MapSource, ResolvedConfig, RunError, RunReport};
use forge_deploy::execution::{
    CommandRunner, ExecutionResult, Invocation, Platform, SequenceEvent, Sequencer, AUTH_EMAIL_VAR,
    AUTH_TOKEN_VAR,
};
use std::collections::HashMap;
use std::io;
use std::path::Path;
use std::sync::{Arc, Mutex};

/// What the mock does for a matching invocation
#[derive(Debug, Clone)]
enum Behavior {
    Exit(i32),
    NotFound,
    Stdout(String),
    Stderr(String),
}

/// Scripted runner that records every invocation
///
/// Invocations are matched by a short key: `npm` for the CLI install,
/// the first argument for `forge` calls (`deploy`, `install`, `settings`,
/// `--version`, ...) and the program name for anything else.
#[derive(Clone, Default)]
pub struct MockRunner {
    calls: Arc<Mutex<Vec<Invocation>>>,
    behaviors: Arc<Mutex<HashMap<String, Behavior>>>,
}

impl MockRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the matching step exit with `code`
    pub fn fail(self, key: &str, code: i32) -> Self {
        self.set(key, Behavior::Exit(code))
    }

    /// Make the matching program look uninstalled
    pub fn missing(self, key: &str) -> Self {
        self.set(key, Behavior::NotFound)
    }

    /// Return `stdout` when the matching step captures output
    pub fn stdout(self, key: &str, stdout: &str) -> Self {
        self.set(key, Behavior::Stdout(stdout.to_string()))
    }

    /// Exit zero with only `stderr` when the matching step captures output
    pub fn stderr(self, key: &str, stderr: &str) -> Self {
        self.set(key, Behavior::Stderr(stderr.to_string()))
    }

    fn set(self, key: &str, behavior: Behavior) -> Self {
        self.behaviors.lock().unwrap().insert(key.to_string(), behavior);
        self
    }

    /// All invocations in order
    pub fn calls(&self) -> Vec<Invocation> {
        self.calls.lock().unwrap().clone()
    }

    /// Match keys of all invocations in order
    pub fn call_keys(&self) -> Vec<String> {
        self.calls().iter().map(key_of).collect()
    }

    /// The forge invocation whose first argument is `subcommand`
    pub fn forge_call(&self, subcommand: &str) -> Option<Invocation> {
        self.calls()
            .into_iter()
            .find(|c| c.program == "forge" && c.args.first().map(String::as_str) == Some(subcommand))
    }
}

fn key_of(invocation: &Invocation) -> String {
    match invocation.program.as_str() {
        "forge" | "forge.cmd" => invocation.args.first().cloned().unwrap_or_default(),
        "npm" | "npm.cmd" => "npm".to_string(),
        other => other.to_string(),
    }
}

#[async_trait]
impl CommandRunner for MockRunner {
    async fn run(&self, invocation: &Invocation) -> Result<ExecutionResult, RunError> {
        self.calls.lock().unwrap().push(invocation.clone());

        let behavior = self.behaviors.lock().unwrap().get(&key_of(invocation)).cloned();
        match behavior {
            Some(Behavior::Exit(code)) => Err(RunError::Exit {
                command_line: invocation.command_line(),
                code,
            }),
            Some(Behavior::NotFound) => Err(RunError::Spawn {
                program: invocation.program.clone(),
                source: io::Error::new(io::ErrorKind::NotFound, "program not found"),
            }),
            Some(Behavior::Stdout(stdout)) => Ok(ExecutionResult {
                stdout: invocation.capture.then_some(stdout),
                stderr: invocation.capture.then(String::new),
            }),
            Some(Behavior::Stderr(stderr)) => Ok(ExecutionResult {
                stdout: invocation.capture.then(String::new),
                stderr: invocation.capture.then_some(stderr),
            }),
            None => Ok(ExecutionResult {
                stdout: invocation.capture.then(String::new),
                stderr: invocation.capture.then(String::new),
            }),
        }
    }
}

/// Environment holding both Forge credentials
pub fn auth_env() -> MapSource {
    MapSource::new()
        .with_var(AUTH_EMAIL_VAR, "ci@example.com")
        .with_var(AUTH_TOKEN_VAR, "super-secret-token")
}

/// Resolve inputs, running in `dir`
pub fn config_in(dir: &Path, inputs: &[(&str, &str)]) -> ResolvedConfig {
    try_config_in(dir, inputs).expect("inputs should resolve")
}

pub fn try_config_in(
    dir: &Path,
    inputs: &[(&str, &str)],
) -> Result<ResolvedConfig, forge_deploy::core::ConfigError> {
    let source = inputs.iter().fold(
        MapSource::new().with_input("working-directory", dir.to_string_lossy()),
        |source, (name, value)| source.with_input(name, *value),
    );
    ResolvedConfig::resolve(&source)
}

/// Outcome of a sequencer run in tests
pub struct RunResult {
    pub result: Result<RunReport, DeployError>,
    pub channels: Channels,
    pub events: Vec<SequenceEvent>,
}

impl RunResult {
    pub fn output(&self, key: &str) -> Option<&str> {
        self.channels.outputs().get(key)
    }

    pub fn report(&self) -> &RunReport {
        self.result.as_ref().expect("run should succeed")
    }

    pub fn error(&self) -> &DeployError {
        self.result.as_ref().err().expect("run should fail")
    }
}

/// Run the sequencer on POSIX with the given runner and environment
pub async fn run_sequencer(runner: MockRunner, config: &ResolvedConfig, env: &MapSource) -> RunResult {
    run_sequencer_on(runner, config, env, Platform::Posix).await
}

pub async fn run_sequencer_on(
    runner: MockRunner,
    config: &ResolvedConfig,
    env: &MapSource,
    platform: Platform,
) -> RunResult {
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = events.clone();

    let mut sequencer = Sequencer::new(runner).with_platform(platform);
    sequencer.add_event_handler(move |event| sink.lock().unwrap().push(event.clone()));

    let mut channels = Channels::in_memory();
    let result = sequencer.execute(config, env, &mut channels).await;

    let events = events.lock().unwrap().clone();
    RunResult {
        result,
        channels,
        events,
    }
}
