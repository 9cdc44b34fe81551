//! Substitution mapping sources.
//!
//! Sources are layered from lowest to highest precedence:
//!
//! 1. the whole process environment, when `inherit_env` is set
//! 2. a variables file (YAML, JSON or TOML)
//! 3. environment variables starting with the variable prefix
//! 4. explicit `KEY=VALUE` assignments

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::debug;

use crate::error::{CoreError, CoreResult};

/// Default prefix for variables taken from the environment.
pub const DEFAULT_ENV_PREFIX: &str = "STACKUP_VAR_";

/// Where substitution values come from.
#[derive(Debug, Clone)]
pub struct VariableSources {
    /// Seed the mapping with every process environment variable
    pub inherit_env: bool,
    /// Variables file
    pub vars_file: Option<PathBuf>,
    /// Prefix selecting environment variables (stripped from the name)
    pub env_prefix: Option<String>,
    /// Raw `KEY=VALUE` assignments, applied last
    pub assignments: Vec<String>,
}

impl Default for VariableSources {
    fn default() -> Self {
        Self {
            inherit_env: false,
            vars_file: None,
            env_prefix: Some(DEFAULT_ENV_PREFIX.to_string()),
            assignments: Vec::new(),
        }
    }
}

impl VariableSources {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inherit_env(mut self, enabled: bool) -> Self {
        self.inherit_env = enabled;
        self
    }

    pub fn vars_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.vars_file = Some(path.into());
        self
    }

    pub fn env_prefix(mut self, prefix: Option<String>) -> Self {
        self.env_prefix = prefix;
        self
    }

    pub fn assign(mut self, assignment: impl Into<String>) -> Self {
        self.assignments.push(assignment.into());
        self
    }

    /// Resolve against the current process environment.
    ///
    /// Environment entries whose name or value is not valid UTF-8 are skipped.
    pub fn resolve(&self) -> CoreResult<BTreeMap<String, String>> {
        if !self.reads_env() {
            return self.resolve_with_env(std::iter::empty());
        }
        self.resolve_with_env(std::env::vars_os().filter_map(|(key, value)| {
            match (key.into_string(), value.into_string()) {
                (Ok(key), Ok(value)) => Some((key, value)),
                (Ok(key), Err(_)) => {
                    debug!("Skipping {}: value is not UTF-8", key);
                    None
                }
                (Err(key), _) => {
                    debug!("Skipping {:?}: name is not UTF-8", key);
                    None
                }
            }
        }))
    }

    fn reads_env(&self) -> bool {
        self.inherit_env || self.env_prefix.as_deref().map_or(false, |p| !p.is_empty())
    }

    /// Resolve against an explicit environment.
    pub fn resolve_with_env<I>(&self, env: I) -> CoreResult<BTreeMap<String, String>>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let env: Vec<(String, String)> = env.into_iter().collect();
        let mut mapping = BTreeMap::new();

        if self.inherit_env {
            mapping.extend(env.iter().cloned());
            debug!("Inherited {} environment variable(s)", env.len());
        }

        if let Some(path) = &self.vars_file {
            let from_file = load_vars_file(path)?;
            debug!("Loaded {} variable(s) from {:?}", from_file.len(), path);
            mapping.extend(from_file);
        }

        if let Some(prefix) = self.env_prefix.as_deref().filter(|p| !p.is_empty()) {
            for (key, value) in &env {
                if let Some(name) = key.strip_prefix(prefix).filter(|n| !n.is_empty()) {
                    mapping.insert(name.to_string(), value.clone());
                }
            }
        }

        for assignment in &self.assignments {
            let (key, value) = parse_assignment(assignment)?;
            mapping.insert(key, value);
        }

        Ok(mapping)
    }
}

/// Split `KEY=VALUE` at the first `=`.
pub fn parse_assignment(input: &str) -> CoreResult<(String, String)> {
    let (key, value) = input
        .split_once('=')
        .ok_or_else(|| CoreError::InvalidVariable {
            input: input.to_string(),
            message: "expected KEY=VALUE".to_string(),
        })?;

    let key = key.trim();
    if key.is_empty() {
        return Err(CoreError::InvalidVariable {
            input: input.to_string(),
            message: "variable name is empty".to_string(),
        });
    }

    Ok((key.to_string(), value.to_string()))
}

/// Load a flat table of scalar values.
///
/// `.toml` files are parsed as TOML; everything else as YAML, which also
/// accepts JSON.
pub fn load_vars_file(path: &Path) -> CoreResult<BTreeMap<String, String>> {
    let content = fs::read_to_string(path).map_err(|e| CoreError::VariablesFile {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    let is_toml = path
        .extension()
        .map_or(false, |ext| ext.eq_ignore_ascii_case("toml"));

    let parsed: Result<BTreeMap<String, Option<String>>, String> = if is_toml {
        toml::from_str::<toml::Table>(&content)
            .map(|table| {
                table
                    .into_iter()
                    .map(|(key, value)| (key, toml_scalar_to_string(&value)))
                    .collect()
            })
            .map_err(|e| e.to_string())
    } else if content.trim().is_empty() {
        Ok(BTreeMap::new())
    } else {
        serde_yaml::from_str::<BTreeMap<String, Value>>(&content)
            .map(|table| {
                table
                    .into_iter()
                    .map(|(key, value)| (key, scalar_to_string(&value)))
                    .collect()
            })
            .map_err(|e| e.to_string())
    };

    let table = parsed.map_err(|message| CoreError::VariablesFile {
        path: path.to_path_buf(),
        message,
    })?;

    table
        .into_iter()
        .map(|(key, value)| {
            let value = value.ok_or_else(|| CoreError::VariablesFile {
                path: path.to_path_buf(),
                message: format!("value of '{}' is not a scalar", key),
            })?;
            Ok((key, value))
        })
        .collect()
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null => Some(String::new()),
        Value::Array(_) | Value::Object(_) => None,
    }
}

fn toml_scalar_to_string(value: &toml::Value) -> Option<String> {
    match value {
        toml::Value::String(s) => Some(s.clone()),
        toml::Value::Integer(i) => Some(i.to_string()),
        toml::Value::Float(f) => Some(f.to_string()),
        toml::Value::Boolean(b) => Some(b.to_string()),
        toml::Value::Datetime(dt) => Some(dt.to_string()),
        toml::Value::Array(_) | toml::Value::Table(_) => None,
    }
}
