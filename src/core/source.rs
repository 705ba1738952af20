//! Configuration sources - where raw input strings come from

use anyhow::{Context, Result};
use regex::Regex;
use serde_yaml::Value;
use std::collections::HashMap;
use std::path::Path;
use std::sync::OnceLock;

/// A flat key -> string namespace
pub trait ConfigSource {
    /// Look up the raw value stored under `key`
    fn get(&self, key: &str) -> Option<String>;
}

/// The real process environment
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl ConfigSource for ProcessEnv {
    fn get(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

/// In-memory source, keyed by the already-normalized key
#[derive(Debug, Clone, Default)]
pub struct MapSource {
    values: HashMap<String, String>,
}

impl MapSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a value under a raw key (e.g. `FORGE_EMAIL`)
    pub fn with_var(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }

    /// Insert a value under the normalized key for input `name`
    pub fn with_input(self, name: &str, value: impl Into<String>) -> Self {
        let key = input_key(name);
        self.with_var(key, value)
    }

    /// Load an inputs file: a YAML mapping of input name to scalar value
    pub fn from_inputs_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read inputs file {}", path.display()))?;
        Self::from_inputs_yaml(&content)
            .with_context(|| format!("Invalid inputs file {}", path.display()))
    }

    /// Parse inputs from YAML text
    pub fn from_inputs_yaml(yaml: &str) -> Result<Self> {
        let mapping: HashMap<String, Value> = serde_yaml::from_str(yaml)?;
        let mut source = Self::new();

        for (name, value) in mapping {
            let rendered = match value {
                Value::Null => String::new(),
                Value::Bool(b) => b.to_string(),
                Value::Number(n) => n.to_string(),
                Value::String(s) => s,
                _ => anyhow::bail!("Input '{}' must be a scalar value", name),
            };
            source = source.with_input(&name, rendered);
        }

        Ok(source)
    }
}

impl ConfigSource for MapSource {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }
}

/// Several sources consulted in order, first hit wins
#[derive(Default)]
pub struct LayeredSource {
    layers: Vec<Box<dyn ConfigSource>>,
}

impl LayeredSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_layer(mut self, layer: impl ConfigSource + 'static) -> Self {
        self.layers.push(Box::new(layer));
        self
    }
}

impl ConfigSource for LayeredSource {
    fn get(&self, key: &str) -> Option<String> {
        self.layers.iter().find_map(|layer| layer.get(key))
    }
}

/// Normalized key for an input: `working-directory` -> `INPUT_WORKING_DIRECTORY`
pub fn input_key(name: &str) -> String {
    static SEPARATORS: OnceLock<Regex> = OnceLock::new();
    let separators = SEPARATORS.get_or_init(|| Regex::new(r"[^A-Za-z0-9]+").unwrap());
    format!("INPUT_{}", separators.replace_all(name, "_").to_uppercase())
}

/// Key as written by hosted runners, which keep hyphens: `INPUT_WORKING-DIRECTORY`
pub fn runner_input_key(name: &str) -> String {
    format!("INPUT_{}", name.replace(' ', "_").to_uppercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_key_normalization() {
        assert_eq!(input_key("working-directory"), "INPUT_WORKING_DIRECTORY");
        assert_eq!(input_key("forge-cli-version"), "INPUT_FORGE_CLI_VERSION");
        assert_eq!(input_key("pre run--shell"), "INPUT_PRE_RUN_SHELL");
        assert_eq!(input_key("site"), "INPUT_SITE");
    }

    #[test]
    fn test_runner_input_key_keeps_hyphens() {
        assert_eq!(runner_input_key("deploy-tag"), "INPUT_DEPLOY-TAG");
    }

    #[test]
    fn test_layered_first_hit_wins() {
        let source = LayeredSource::new()
            .with_layer(MapSource::new().with_input("environment", "production"))
            .with_layer(
                MapSource::new()
                    .with_input("environment", "staging")
                    .with_input("site", "example.atlassian.net"),
            );

        assert_eq!(source.get("INPUT_ENVIRONMENT"), Some("production".to_string()));
        assert_eq!(source.get("INPUT_SITE"), Some("example.atlassian.net".to_string()));
        assert_eq!(source.get("INPUT_PRODUCT"), None);
    }

    #[test]
    fn test_inputs_yaml_renders_scalars() {
        let yaml = r#"
environment: production
install: true
deploy-major-version: 3
deploy-tag:
"#;
        let source = MapSource::from_inputs_yaml(yaml).unwrap();
        assert_eq!(source.get("INPUT_ENVIRONMENT"), Some("production".to_string()));
        assert_eq!(source.get("INPUT_INSTALL"), Some("true".to_string()));
        assert_eq!(source.get("INPUT_DEPLOY_MAJOR_VERSION"), Some("3".to_string()));
        assert_eq!(source.get("INPUT_DEPLOY_TAG"), Some(String::new()));
    }

    #[test]
    fn test_inputs_yaml_rejects_nested_values() {
        let yaml = r#"
deploy-args:
  - --foo
"#;
        assert!(MapSource::from_inputs_yaml(yaml).is_err());
    }
}
