//! GPU plumbing for the full-screen shader session.
//!
//! - `context` owns wgpu instance/device/surface wiring and reconfigures the
//!   swapchain when the window resizes.
//! - `geometry` uploads the immutable four-vertex quad.
//! - `channels` materialises the two fixed placeholder input textures.
//! - `pipeline` bakes a linked program into a render pipeline with the
//!   uniform and channel bind group layouts.
//! - `uniforms` mirrors the injected std140 frame-parameter block.
//! - `state` glues everything into the `RenderSession` the window loop
//!   drives each tick.

mod channels;
mod context;
mod geometry;
mod pipeline;
mod state;
pub(crate) mod uniforms;

pub(crate) use context::GpuContext;
pub(crate) use state::RenderSession;
