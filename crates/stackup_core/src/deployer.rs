//! Render-then-compose pipeline.

use stackup_runner::{ComposeRunner, InvocationReport};
use stackup_templates::{RenderReport, TemplateRenderer};
use tracing::{info, info_span, Instrument};

use crate::config::DeployConfig;
use crate::error::CoreResult;

/// Outcome of a full deploy.
#[derive(Debug, Clone)]
pub struct DeployReport {
    pub render: RenderReport,
    pub invocation: InvocationReport,
}

/// Runs the two deploy steps in order.
///
/// Rendering, including the write back to disk, always completes before the
/// compose tool is started, since the tool reads the rendered file.
pub struct Deployer<R: ComposeRunner> {
    runner: R,
    renderer: TemplateRenderer,
}

impl<R: ComposeRunner> Deployer<R> {
    pub fn new(runner: R) -> Self {
        Self {
            runner,
            renderer: TemplateRenderer::new(),
        }
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    /// Render the template in place.
    pub fn render(&self, config: &DeployConfig) -> CoreResult<RenderReport> {
        let _span = info_span!("render", template = ?config.template_path).entered();
        info!(
            "Rendering {:?} with {} variable(s)",
            config.template_path,
            config.mapping.len()
        );

        let report = if config.echo_rendered {
            self.renderer
                .render_file(&config.template_path, &config.mapping)?
        } else {
            self.renderer.render_file_to(
                &config.template_path,
                &config.mapping,
                &mut std::io::sink(),
            )?
        };
        Ok(report)
    }

    /// Run the compose tool against the (already rendered) template.
    pub async fn invoke(&self, config: &DeployConfig) -> CoreResult<InvocationReport> {
        let compose = config.compose_invocation();
        let report = self.runner.invoke(&compose).await?;
        Ok(report)
    }

    /// Render, then run the compose tool.
    pub async fn deploy(&self, config: &DeployConfig) -> CoreResult<DeployReport> {
        let render = self.render(config)?;
        let invocation = self
            .invoke(config)
            .instrument(info_span!("up", template = ?render.path))
            .await?;

        info!(
            "Deploy finished: {} placeholder(s) substituted, {} line(s) forwarded",
            render.substituted, invocation.lines_forwarded
        );

        Ok(DeployReport { render, invocation })
    }
}
