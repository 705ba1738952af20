//! Step planning and execution

pub mod engine;
pub mod plan;
pub mod runner;
pub mod shell;

pub use engine::{validate, EventHandler, SequenceEvent, Sequencer, AUTH_EMAIL_VAR, AUTH_TOKEN_VAR};
pub use plan::{build_plan, deploy_args, install_args, Branch, Criticality, Plan, StepAction, StepDescriptor, StepKind};
pub use runner::{CommandRunner, ExecutionResult, Invocation, Platform, SystemRunner};
pub use shell::{interpreter_candidates, run_script, Interpreter, WINDOWS_BASH_CANDIDATES};
