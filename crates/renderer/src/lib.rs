//! Renderer crate for fragview.
//!
//! Compiles a user-supplied GLSL fragment shader, pairs it with a fixed
//! pass-through vertex stage over a full-screen quad, and drives a
//! continuous redraw loop that feeds the shader a resolution, an
//! elapsed-time clock, and two placeholder input textures. The overall flow:
//!
//! ```text
//!   CLI / fragview
//!        │ RendererConfig (fetched fragment text)
//!        ▼
//!   Renderer::run ─▶ compile + link (CPU) ─▶ winit window ─▶ RenderSession
//!                                                   │
//!                                                   └─▶ per-tick: uniforms ─▶ draw
//! ```
//!
//! Compilation and linking happen before any window or GPU resource exists,
//! so a broken shader can never reach the frame loop. `RenderSession` owns
//! every GPU handle and is passed explicitly to the window loop; each tick
//! mutates only the two time-varying uniform values.

mod compile;
mod error;
mod gpu;
mod runtime;
mod types;
mod window;

use anyhow::Result;

pub use error::{RenderError, StageKind};
pub use runtime::{FrameClock, FramePacer, LoopPhase, TimeSample};
pub use types::RendererConfig;

/// High-level entry point that owns the chosen configuration.
///
/// The heavy lifting lives in `compile` and the window loop; `Renderer`
/// sequences them so the invariant "linked before running" holds by
/// construction.
pub struct Renderer {
    config: RendererConfig,
}

impl Renderer {
    /// Builds a renderer for the supplied configuration.
    pub fn new(config: RendererConfig) -> Self {
        Self { config }
    }

    /// Compiles, links, and runs the redraw loop until the window closes.
    ///
    /// A compile or link failure returns before a window is opened; the
    /// error carries the stage and the compiler diagnostic.
    pub fn run(&self) -> Result<()> {
        let vertex = compile::compile_vertex_stage()?;
        let fragment = compile::compile_fragment_stage(&self.config.fragment_source)?;
        let program = compile::link(vertex, fragment)?;
        tracing::info!("shader program linked");

        window::run_windowed(&self.config, &program)
    }
}
