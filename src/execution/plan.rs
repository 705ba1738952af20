//! Step plan - the ordered list of steps a run will execute
//!
//! Building a plan is pure: every argument vector is synthesized and every
//! free-form string tokenized before the first subprocess starts, so a
//! malformed `deploy-args` fails the run without side effects.

use crate::core::config::{DeployOptions, InstallOptions, ResolvedConfig, ShellKind};
use crate::core::error::ConfigError;
use crate::core::tokenizer::tokenize;
use crate::execution::runner::{Invocation, Platform};
use serde::Serialize;

/// npm package providing the `forge` executable
pub const FORGE_CLI_PACKAGE: &str = "@forge/cli";

/// What a step is, used to route its outputs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StepKind {
    PreRun,
    InstallCli,
    VersionProbe,
    UsageAnalytics,
    Override,
    Deploy,
    Install,
}

/// Whether a failure aborts the run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Criticality {
    Required,
    BestEffort,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StepAction {
    Command(Invocation),
    Script { script: String, shell: ShellKind },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepDescriptor {
    pub kind: StepKind,
    pub name: String,
    pub criticality: Criticality,
    pub action: StepAction,
}

/// Which execution branch the run takes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Branch {
    Override,
    DeployInstall { deploy: bool, install: bool },
}

#[derive(Debug, Clone, Serialize)]
pub struct Plan {
    pub branch: Branch,
    pub steps: Vec<StepDescriptor>,
}

impl Plan {
    pub fn kinds(&self) -> Vec<StepKind> {
        self.steps.iter().map(|s| s.kind).collect()
    }

    pub fn step(&self, kind: StepKind) -> Option<&StepDescriptor> {
        self.steps.iter().find(|s| s.kind == kind)
    }
}

fn tokenize_input(input: &str, value: &str) -> Result<Vec<String>, ConfigError> {
    tokenize(value).map_err(|source| ConfigError::Tokenize {
        input: input.to_string(),
        source,
    })
}

/// `deploy --non-interactive -e <env> [--no-verify] [--tag t] [--major-version v] <extra>`
pub fn deploy_args(environment: &str, options: &DeployOptions) -> Result<Vec<String>, ConfigError> {
    let mut args: Vec<String> = vec![
        "deploy".into(),
        "--non-interactive".into(),
        "-e".into(),
        environment.into(),
    ];

    if options.no_verify {
        args.push("--no-verify".into());
    }
    if let Some(tag) = &options.tag {
        args.extend(["--tag".to_string(), tag.clone()]);
    }
    if let Some(version) = &options.major_version {
        args.extend(["--major-version".to_string(), version.clone()]);
    }

    args.extend(tokenize_input("deploy-args", &options.args)?);
    Ok(args)
}

/// `install --non-interactive -e <env> --site s --product p [--upgrade]
/// [--confirm-scopes] [--major-version v] <extra>`
pub fn install_args(environment: &str, options: &InstallOptions) -> Result<Vec<String>, ConfigError> {
    let site = options
        .site
        .as_deref()
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| ConfigError::MissingInput("site".to_string()))?;
    let product = options
        .product
        .as_deref()
        .filter(|p| !p.trim().is_empty())
        .ok_or_else(|| ConfigError::MissingInput("product".to_string()))?;

    let mut args: Vec<String> = vec![
        "install".into(),
        "--non-interactive".into(),
        "-e".into(),
        environment.into(),
        "--site".into(),
        site.into(),
        "--product".into(),
        product.to_lowercase(),
    ];

    if options.upgrade {
        args.push("--upgrade".into());
    }
    if options.confirm_scopes {
        args.push("--confirm-scopes".into());
    }
    if let Some(version) = &options.major_version {
        args.extend(["--major-version".to_string(), version.clone()]);
    }

    args.extend(tokenize_input("install-args", &options.args)?);
    Ok(args)
}

/// Build the full step list for `config`
pub fn build_plan(config: &ResolvedConfig, platform: Platform) -> Result<Plan, ConfigError> {
    let cwd = &config.working_directory;
    let forge = platform.node_executable("forge");
    let forge_step = |kind: StepKind, name: &str, criticality: Criticality, args: Vec<String>| StepDescriptor {
        kind,
        name: name.to_string(),
        criticality,
        action: StepAction::Command(Invocation::new(forge.clone(), args).in_dir(cwd)),
    };

    let mut steps = Vec::new();

    if !config.pre_run.trim().is_empty() {
        steps.push(StepDescriptor {
            kind: StepKind::PreRun,
            name: "Pre-run script".to_string(),
            criticality: Criticality::Required,
            action: StepAction::Script {
                script: config.pre_run.clone(),
                shell: config.pre_run_shell,
            },
        });
    }

    steps.push(StepDescriptor {
        kind: StepKind::InstallCli,
        name: format!("Install Forge CLI ({})", config.forge_cli_version),
        criticality: Criticality::Required,
        action: StepAction::Command(
            Invocation::new(
                platform.node_executable("npm"),
                vec![
                    "install".to_string(),
                    "-g".to_string(),
                    format!("{}@{}", FORGE_CLI_PACKAGE, config.forge_cli_version),
                ],
            )
            .in_dir(cwd),
        ),
    });

    steps.push(StepDescriptor {
        kind: StepKind::VersionProbe,
        name: "Check Forge CLI version".to_string(),
        criticality: Criticality::BestEffort,
        action: StepAction::Command(
            Invocation::new(forge.clone(), vec!["--version".to_string()])
                .in_dir(cwd)
                .capturing(),
        ),
    });

    if config.usage_analytics {
        steps.push(forge_step(
            StepKind::UsageAnalytics,
            "Enable usage analytics",
            Criticality::BestEffort,
            ["settings", "set", "usage-analytics", "true"]
                .map(String::from)
                .to_vec(),
        ));
    }

    let branch = if let Some(run) = &config.run {
        steps.push(forge_step(
            StepKind::Override,
            "Run forge command",
            Criticality::Required,
            tokenize_input("run", run)?,
        ));
        Branch::Override
    } else {
        if config.deploy.enabled {
            steps.push(forge_step(
                StepKind::Deploy,
                "Deploy",
                Criticality::Required,
                deploy_args(&config.environment, &config.deploy)?,
            ));
        }
        if config.install.enabled {
            steps.push(forge_step(
                StepKind::Install,
                "Install",
                Criticality::Required,
                install_args(&config.environment, &config.install)?,
            ));
        }
        Branch::DeployInstall {
            deploy: config.deploy.enabled,
            install: config.install.enabled,
        }
    };

    Ok(Plan { branch, steps })
}
