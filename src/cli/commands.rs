//! CLI command definitions

use clap::Args;

/// Print the resolved step plan
#[derive(Debug, Args, Clone)]
pub struct PlanCommand {
    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}
