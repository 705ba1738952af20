//! Subprocess execution - argument vectors only, never through a shell

use crate::core::error::RunError;
use async_trait::async_trait;
use serde::Serialize;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, warn};

/// Host platform family, decides executable names and shell lookup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Platform {
    Posix,
    Windows,
}

impl Platform {
    pub fn current() -> Self {
        if cfg!(windows) {
            Platform::Windows
        } else {
            Platform::Posix
        }
    }

    /// npm-installed tools are `.cmd` shims on Windows
    pub fn node_executable(&self, name: &str) -> String {
        match self {
            Platform::Windows => format!("{}.cmd", name),
            Platform::Posix => name.to_string(),
        }
    }
}

/// One program run: what to start, where, and whether to keep its output
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    pub cwd: PathBuf,

    /// Extra variables layered over the inherited environment
    pub env: Vec<(String, String)>,

    /// Capture stdout/stderr instead of streaming them
    pub capture: bool,
}

impl Invocation {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
            cwd: PathBuf::from("."),
            env: Vec::new(),
            capture: false,
        }
    }

    pub fn in_dir(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.cwd = cwd.into();
        self
    }

    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    pub fn capturing(mut self) -> Self {
        self.capture = true;
        self
    }

    /// Printable command line for diagnostics
    pub fn command_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .map(|part| {
                if part.is_empty() || part.chars().any(char::is_whitespace) {
                    format!("{:?}", part)
                } else {
                    part.to_string()
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Outcome of a successful run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutionResult {
    pub stdout: Option<String>,
    pub stderr: Option<String>,
}

/// Runs invocations; non-zero exits are errors
#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run(&self, invocation: &Invocation) -> Result<ExecutionResult, RunError>;
}

/// Runner backed by real subprocesses
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

#[async_trait]
impl CommandRunner for SystemRunner {
    async fn run(&self, invocation: &Invocation) -> Result<ExecutionResult, RunError> {
        debug!("Running: {}", invocation.command_line());

        let mut command = Command::new(&invocation.program);
        command
            .args(&invocation.args)
            .current_dir(&invocation.cwd)
            .envs(invocation.env.iter().map(|(k, v)| (k, v)))
            .stdin(Stdio::inherit())
            .kill_on_drop(true);

        if invocation.capture {
            command.stdout(Stdio::piped()).stderr(Stdio::piped());
        } else {
            command.stdout(Stdio::inherit()).stderr(Stdio::inherit());
        }

        let child = command.spawn().map_err(|source| RunError::Spawn {
            program: invocation.program.clone(),
            source,
        })?;

        let output = child.wait_with_output().await.map_err(|source| RunError::Wait {
            program: invocation.program.clone(),
            source,
        })?;

        let (stdout, stderr) = if invocation.capture {
            (
                Some(String::from_utf8_lossy(&output.stdout).into_owned()),
                Some(String::from_utf8_lossy(&output.stderr).into_owned()),
            )
        } else {
            (None, None)
        };

        match output.status.code() {
            Some(0) => Ok(ExecutionResult { stdout, stderr }),
            Some(code) => {
                if let Some(stderr) = stderr.as_deref().filter(|s| !s.trim().is_empty()) {
                    warn!("{} exited with code {}: {}", invocation.program, code, stderr.trim());
                }
                Err(RunError::Exit {
                    command_line: invocation.command_line(),
                    code,
                })
            }
            None => Err(RunError::Signal {
                command_line: invocation.command_line(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_line_quotes_spaced_args() {
        let invocation = Invocation::new(
            "forge",
            vec!["deploy".to_string(), "--tag".to_string(), "v 2".to_string()],
        );
        assert_eq!(invocation.command_line(), r#"forge deploy --tag "v 2""#);
    }

    #[test]
    fn test_node_executable_names() {
        assert_eq!(Platform::Posix.node_executable("npm"), "npm");
        assert_eq!(Platform::Windows.node_executable("forge"), "forge.cmd");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_captures_stdout_with_env_and_cwd() {
        let dir = tempfile::tempdir().unwrap();
        let invocation = Invocation::new(
            "sh",
            vec!["-c".to_string(), r#"printf '%s' "$GREETING"; pwd"#.to_string()],
        )
        .in_dir(dir.path())
        .with_env("GREETING", "hello ")
        .capturing();

        let result = SystemRunner.run(&invocation).await.unwrap();
        let stdout = result.stdout.unwrap();
        assert!(stdout.starts_with("hello "));
        let reported = stdout.trim_start_matches("hello ").trim();
        assert_eq!(
            std::fs::canonicalize(reported).unwrap(),
            std::fs::canonicalize(dir.path()).unwrap()
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_non_zero_exit_is_error_with_code() {
        let invocation = Invocation::new("sh", vec!["-c".to_string(), "exit 3".to_string()]);
        match SystemRunner.run(&invocation).await {
            Err(RunError::Exit { code, command_line }) => {
                assert_eq!(code, 3);
                assert_eq!(command_line, r#"sh -c "exit 3""#);
            }
            other => panic!("expected exit error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_missing_executable_is_spawn_not_found() {
        let invocation = Invocation::new("definitely-not-a-real-forge-binary", vec![]);
        let err = SystemRunner.run(&invocation).await.unwrap_err();
        assert!(err.is_not_found(), "unexpected error: {:?}", err);
    }
}
