//! Core models for a Forge run
//!
//! Input resolution, argument tokenizing, output channels and the
//! error types shared by the execution layer.

pub mod channels;
pub mod config;
pub mod error;
pub mod source;
pub mod state;
pub mod tokenizer;

pub use channels::{Channels, OutputSet};
pub use config::{DeployOptions, InstallOptions, ResolvedConfig, ShellKind};
pub use error::*;
pub use source::{ConfigSource, LayeredSource, MapSource, ProcessEnv};
pub use state::*;
pub use tokenizer::tokenize;
