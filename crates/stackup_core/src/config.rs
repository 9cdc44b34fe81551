//! Deploy configuration.

use std::collections::BTreeMap;
use std::path::PathBuf;

use stackup_runner::ComposeConfig;

use crate::error::{CoreError, CoreResult};
use crate::variables::VariableSources;

/// Default template path, relative to the working directory.
pub const DEFAULT_TEMPLATE: &str = "docker-compose.yml";

/// Everything one deploy run needs, assembled before anything executes.
#[derive(Debug, Clone)]
pub struct DeployConfig {
    /// Template rendered in place
    pub template_path: PathBuf,
    /// Substitution mapping
    pub mapping: BTreeMap<String, String>,
    /// Compose invocation
    pub compose: ComposeConfig,
    /// Echo the rendered text to stdout before writing it
    pub echo_rendered: bool,
    /// Pass the template to compose as `-f <template>` when no file is set
    pub pass_compose_file: bool,
}

impl DeployConfig {
    pub fn builder() -> DeployConfigBuilder {
        DeployConfigBuilder::new()
    }

    /// Compose configuration pointing at the rendered template.
    pub fn compose_invocation(&self) -> ComposeConfig {
        let mut compose = self.compose.clone();
        if self.pass_compose_file && compose.compose_file.is_none() {
            compose.compose_file = Some(self.template_path.clone());
        }
        compose
    }
}

/// Builder for [`DeployConfig`].
#[derive(Debug, Clone)]
pub struct DeployConfigBuilder {
    template_path: Option<PathBuf>,
    sources: VariableSources,
    variables: BTreeMap<String, String>,
    compose: ComposeConfig,
    echo_rendered: bool,
    pass_compose_file: bool,
}

impl Default for DeployConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl DeployConfigBuilder {
    pub fn new() -> Self {
        Self {
            template_path: None,
            sources: VariableSources::default(),
            variables: BTreeMap::new(),
            compose: ComposeConfig::default(),
            echo_rendered: true,
            pass_compose_file: true,
        }
    }

    pub fn template_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.template_path = Some(path.into());
        self
    }

    pub fn sources(mut self, sources: VariableSources) -> Self {
        self.sources = sources;
        self
    }

    /// Set a value directly; wins over every source.
    pub fn variable(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.variables.insert(key.into(), value.into());
        self
    }

    pub fn compose(mut self, compose: ComposeConfig) -> Self {
        self.compose = compose;
        self
    }

    pub fn echo_rendered(mut self, enabled: bool) -> Self {
        self.echo_rendered = enabled;
        self
    }

    pub fn pass_compose_file(mut self, enabled: bool) -> Self {
        self.pass_compose_file = enabled;
        self
    }

    /// Resolve sources against the process environment and build.
    pub fn build(self) -> CoreResult<DeployConfig> {
        let mapping = self.sources.resolve()?;
        self.finish(mapping)
    }

    /// Build using an explicit environment instead of the process one.
    pub fn build_with_env<I>(self, env: I) -> CoreResult<DeployConfig>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mapping = self.sources.resolve_with_env(env)?;
        self.finish(mapping)
    }

    fn finish(self, mut mapping: BTreeMap<String, String>) -> CoreResult<DeployConfig> {
        let template_path = self
            .template_path
            .ok_or_else(|| CoreError::MissingArgument("template path".to_string()))?;

        mapping.extend(self.variables);

        Ok(DeployConfig {
            template_path,
            mapping,
            compose: self.compose,
            echo_rendered: self.echo_rendered,
            pass_compose_file: self.pass_compose_file,
        })
    }
}
