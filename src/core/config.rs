//! Input resolution - raw strings from a `ConfigSource` into typed values

use crate::core::error::{ConfigError, InvalidBoolean};
use crate::core::source::{input_key, runner_input_key, ConfigSource};
use serde::Serialize;
use std::path::PathBuf;
use tracing::{debug, warn};

/// How a single input is looked up
#[derive(Debug, Clone, Copy)]
pub struct InputOptions<'a> {
    /// Fail when the final value is empty
    pub required: bool,

    /// Used when the input is absent or empty
    pub default_value: &'a str,

    /// Strip surrounding whitespace before judging emptiness
    pub trim: bool,
}

impl Default for InputOptions<'_> {
    fn default() -> Self {
        Self {
            required: false,
            default_value: "",
            trim: true,
        }
    }
}

impl<'a> InputOptions<'a> {
    pub fn required() -> Self {
        Self {
            required: true,
            ..Self::default()
        }
    }

    pub fn with_default(default_value: &'a str) -> Self {
        Self {
            default_value,
            ..Self::default()
        }
    }

    pub fn untrimmed(mut self) -> Self {
        self.trim = false;
        self
    }
}

/// Parse a boolean token; empty input yields `default`
pub fn to_bool(value: &str, default: bool) -> Result<bool, InvalidBoolean> {
    let token = value.trim();
    if token.is_empty() {
        return Ok(default);
    }

    match token.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "y" | "on" => Ok(true),
        "0" | "false" | "no" | "n" | "off" => Ok(false),
        _ => Err(InvalidBoolean(token.to_string())),
    }
}

/// Reads named inputs from a source
pub struct InputResolver<'a> {
    source: &'a dyn ConfigSource,
}

impl<'a> InputResolver<'a> {
    pub fn new(source: &'a dyn ConfigSource) -> Self {
        Self { source }
    }

    fn raw(&self, name: &str) -> Option<String> {
        self.source
            .get(&input_key(name))
            .or_else(|| self.source.get(&runner_input_key(name)))
    }

    /// Resolve an input to a string
    pub fn input(&self, name: &str, options: InputOptions<'_>) -> Result<String, ConfigError> {
        let raw = self.raw(name).unwrap_or_default();
        let value = if options.trim {
            raw.trim().to_string()
        } else {
            raw
        };

        let value = if value.is_empty() {
            options.default_value.to_string()
        } else {
            value
        };

        if options.required && value.trim().is_empty() {
            return Err(ConfigError::MissingInput(name.to_string()));
        }

        Ok(value)
    }

    /// Resolve an optional input; empty becomes `None`
    pub fn optional(&self, name: &str) -> Result<Option<String>, ConfigError> {
        let value = self.input(name, InputOptions::default())?;
        Ok(Some(value).filter(|v| !v.is_empty()))
    }

    /// Resolve an input that must be present when `required` holds
    pub fn required_if(&self, name: &str, required: bool) -> Result<Option<String>, ConfigError> {
        let options = InputOptions {
            required,
            ..InputOptions::default()
        };
        let value = self.input(name, options)?;
        Ok(Some(value).filter(|v| !v.is_empty()))
    }

    /// Resolve a boolean input
    pub fn boolean(&self, name: &str, default: bool) -> Result<bool, ConfigError> {
        let value = self.input(name, InputOptions::default())?;
        to_bool(&value, default).map_err(|InvalidBoolean(value)| ConfigError::InvalidBoolean {
            input: name.to_string(),
            value,
        })
    }
}

/// Interpreter used for the pre-run script
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ShellKind {
    Bash,
    Pwsh,
    PowerShell,
}

impl ShellKind {
    /// Shell by name, case-insensitive; blank means bash
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "pwsh" => Some(ShellKind::Pwsh),
            "powershell" => Some(ShellKind::PowerShell),
            "bash" | "" => Some(ShellKind::Bash),
            _ => None,
        }
    }

    pub fn is_powershell(&self) -> bool {
        matches!(self, ShellKind::Pwsh | ShellKind::PowerShell)
    }
}

/// Options for `forge deploy`
#[derive(Debug, Clone, Serialize)]
pub struct DeployOptions {
    pub enabled: bool,
    pub no_verify: bool,
    pub tag: Option<String>,
    pub major_version: Option<String>,
    pub args: String,
}

/// Options for `forge install`
#[derive(Debug, Clone, Serialize)]
pub struct InstallOptions {
    pub enabled: bool,
    pub site: Option<String>,
    pub product: Option<String>,
    pub upgrade: bool,
    pub confirm_scopes: bool,
    pub major_version: Option<String>,
    pub args: String,
}

/// All inputs of one run, typed and validated
#[derive(Debug, Clone, Serialize)]
pub struct ResolvedConfig {
    pub working_directory: PathBuf,
    pub forge_cli_version: String,
    pub pre_run: String,
    pub pre_run_shell: ShellKind,
    pub usage_analytics: bool,
    pub environment: String,

    /// Override command; replaces deploy and install when set
    pub run: Option<String>,

    pub deploy: DeployOptions,
    pub install: InstallOptions,

    /// Inputs that were accepted with a fallback, reported in the summary
    pub warnings: Vec<String>,
}

impl ResolvedConfig {
    /// Resolve every input from `source`
    pub fn resolve(source: &dyn ConfigSource) -> Result<Self, ConfigError> {
        let inputs = InputResolver::new(source);

        let working_directory = inputs.input("working-directory", InputOptions::with_default("."))?;
        let forge_cli_version = inputs.input("forge-cli-version", InputOptions::with_default("latest"))?;
        let pre_run = inputs.input("pre-run", InputOptions::default().untrimmed())?;
        let mut warnings = Vec::new();

        let shell = inputs.input("pre-run-shell", InputOptions::with_default("bash"))?;
        let pre_run_shell = ShellKind::parse(&shell).unwrap_or_else(|| {
            let warning = format!("Unknown pre-run-shell '{}', using bash", shell);
            warn!("{}", warning);
            warnings.push(warning);
            ShellKind::Bash
        });
        let usage_analytics = inputs.boolean("usage-analytics", true)?;
        let environment = inputs.input("environment", InputOptions::with_default("staging"))?;
        let run = inputs.optional("run")?;

        let deploy = DeployOptions {
            enabled: inputs.boolean("deploy", true)?,
            no_verify: inputs.boolean("no-verify", false)?,
            tag: inputs.optional("deploy-tag")?,
            major_version: inputs.optional("deploy-major-version")?,
            args: inputs.input("deploy-args", InputOptions::default())?,
        };

        let install_enabled = inputs.boolean("install", false)?;
        let install_required = install_enabled && run.is_none();
        let install = InstallOptions {
            enabled: install_enabled,
            site: inputs.required_if("site", install_required)?,
            product: inputs.required_if("product", install_required)?,
            upgrade: inputs.boolean("upgrade", true)?,
            confirm_scopes: inputs.boolean("confirm-scopes", true)?,
            major_version: inputs.optional("install-major-version")?,
            args: inputs.input("install-args", InputOptions::default())?,
        };

        let config = Self {
            working_directory: PathBuf::from(working_directory),
            forge_cli_version,
            pre_run,
            pre_run_shell,
            usage_analytics,
            environment,
            run,
            deploy,
            install,
            warnings,
        };
        debug!("Resolved configuration: {:?}", config);

        Ok(config)
    }
}
