//! Command-line interface

pub mod commands;
pub mod output;

use clap::{Parser, Subcommand};
use commands::PlanCommand;
use std::ffi::OsString;
use std::path::PathBuf;

/// Deploy and install Forge apps from CI
#[derive(Debug, Parser, Clone)]
#[command(name = "forge-deploy")]
#[command(author = "forge-deploy contributors")]
#[command(version)]
#[command(about = "Non-interactive Forge CLI deploy and install for CI pipelines", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// YAML file of inputs, consulted before INPUT_* environment variables
    #[arg(short, long, global = true)]
    pub inputs: Option<PathBuf>,
}

/// Available commands
#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Run the configured steps (default)
    Run,

    /// Resolve inputs and print the steps without running them
    Plan(PlanCommand),
}

impl Cli {
    /// Parse CLI arguments from environment
    pub fn from_args() -> Self {
        Self::parse()
    }

    /// Parse CLI arguments from a slice
    pub fn try_parse_from<I, T>(itr: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        <Self as Parser>::try_parse_from(itr)
    }

    pub fn command(&self) -> Command {
        self.command.clone().unwrap_or(Command::Run)
    }
}
