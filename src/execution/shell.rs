//! Pre-run script execution through a selected interpreter

use crate::core::config::ShellKind;
use crate::core::error::RunError;
use crate::execution::runner::{CommandRunner, Invocation, Platform};
use std::path::Path;
use tracing::{debug, info};

/// Git for Windows bash locations, probed in order before a bare `bash`
pub const WINDOWS_BASH_CANDIDATES: &[&str] = &[
    r"C:\Program Files\Git\bin\bash.exe",
    r"C:\Program Files\Git\usr\bin\bash.exe",
    r"C:\Program Files (x86)\Git\bin\bash.exe",
    r"C:\Program Files (x86)\Git\usr\bin\bash.exe",
    "bash",
];

/// An interpreter and the flags placed before the script text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interpreter {
    pub program: &'static str,
    pub flags: &'static [&'static str],
    pub env: &'static [(&'static str, &'static str)],
}

const BASH_FLAGS: &[&str] = &["-l", "-c"];

// Git Bash login shells cd to $HOME unless told otherwise.
const GIT_BASH_ENV: &[(&str, &str)] = &[("CHERE_INVOKING", "1")];

const PWSH: Interpreter = Interpreter {
    program: "pwsh",
    flags: &["-NoLogo", "-NoProfile", "-NonInteractive", "-Command"],
    env: &[],
};

const WINDOWS_POWERSHELL: Interpreter = Interpreter {
    program: "powershell",
    flags: &[
        "-NoLogo",
        "-NoProfile",
        "-NonInteractive",
        "-ExecutionPolicy",
        "Bypass",
        "-Command",
    ],
    env: &[],
};

/// Ordered interpreters to try; later entries are used only when earlier
/// ones are not installed
pub fn interpreter_candidates(shell: ShellKind, platform: Platform) -> Vec<Interpreter> {
    match (shell, platform) {
        (ShellKind::Pwsh, _) => vec![PWSH],
        (ShellKind::PowerShell, _) => vec![WINDOWS_POWERSHELL],
        (ShellKind::Bash, Platform::Posix) => vec![Interpreter {
            program: "bash",
            flags: BASH_FLAGS,
            env: &[],
        }],
        (ShellKind::Bash, Platform::Windows) => WINDOWS_BASH_CANDIDATES
            .iter()
            .map(|&program| Interpreter {
                program,
                flags: BASH_FLAGS,
                env: GIT_BASH_ENV,
            })
            .collect(),
    }
}

impl Interpreter {
    pub fn invocation(&self, script: &str, cwd: &Path) -> Invocation {
        let mut args: Vec<String> = self.flags.iter().map(|f| f.to_string()).collect();
        args.push(script.to_string());

        self.env.iter().fold(
            Invocation::new(self.program, args).in_dir(cwd),
            |invocation, (key, value)| invocation.with_env(*key, *value),
        )
    }
}

/// Run `script` with the first available interpreter for `shell`
///
/// Blank scripts succeed without starting anything. Only a missing
/// executable moves on to the next candidate; a script that runs and
/// fails is returned as is.
pub async fn run_script(
    runner: &dyn CommandRunner,
    script: &str,
    shell: ShellKind,
    platform: Platform,
    cwd: &Path,
) -> Result<(), RunError> {
    if script.trim().is_empty() {
        debug!("Pre-run script is empty, nothing to do");
        return Ok(());
    }

    let candidates = interpreter_candidates(shell, platform);
    let probing = candidates.len() > 1;
    let mut tried = Vec::new();

    for interpreter in &candidates {
        let invocation = interpreter.invocation(script, cwd);
        match runner.run(&invocation).await {
            Ok(_) => {
                info!("Pre-run script finished using {}", interpreter.program);
                return Ok(());
            }
            Err(err) if probing && err.is_not_found() => {
                debug!("Interpreter {} not found, trying next", interpreter.program);
                tried.push(interpreter.program.to_string());
            }
            Err(err) => return Err(err),
        }
    }

    Err(RunError::InterpreterNotFound { tried })
}
