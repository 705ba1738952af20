//! forge-deploy - non-interactive Forge CLI deploy and install for CI pipelines

pub mod cli;
pub mod core;
pub mod execution;

// Re-export commonly used types
pub use core::{Channels, ConfigSource, DeployError, MapSource, ProcessEnv, ResolvedConfig};
pub use execution::{CommandRunner, Invocation, Sequencer, SequenceEvent, SystemRunner};
