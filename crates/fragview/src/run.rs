use anyhow::{Context, Result};
use renderer::{Renderer, RendererConfig};
use shadersource::{SourceClient, SourceHandle};
use tracing_subscriber::EnvFilter;

use crate::cli::Cli;

pub fn initialise_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

/// Fetches the fragment source, then hands everything to the renderer.
///
/// A failed fetch is terminal: one diagnostic is emitted and the render
/// loop is never started. Compile and link failures inside the renderer
/// behave the same way.
pub fn run(cli: Cli) -> Result<()> {
    let handle = SourceHandle::from_input(&cli.shader)?;
    tracing::info!(%handle, "bootstrapping fragview");

    let client = SourceClient::new().context("failed to construct shader source client")?;
    let fragment_source = match client.fetch(&handle) {
        Ok(text) => text,
        Err(err) => {
            tracing::error!(error = %err, "failed to fetch shader source; renderer not started");
            return Err(err.into());
        }
    };
    tracing::debug!(bytes = fragment_source.len(), "fetched fragment shader");

    let defaults = RendererConfig::default();
    let config = RendererConfig {
        surface_size: cli.size.unwrap_or(defaults.surface_size),
        window_title: cli.title.unwrap_or(defaults.window_title),
        fragment_source,
        target_fps: cli.fps.filter(|fps| *fps > 0.0),
    };

    Renderer::new(config).run()
}
