use std::sync::Arc;
use std::time::Instant;

use anyhow::{anyhow, Context, Result};
use tracing::error;
use winit::dpi::PhysicalSize;
use winit::event::{Event, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::window::WindowBuilder;

use crate::compile::LinkedProgram;
use crate::gpu::{GpuContext, RenderSession};
use crate::runtime::{FrameClock, FramePacer, LoopPhase};
use crate::types::RendererConfig;

/// Opens the preview window and drives the event loop until close.
///
/// The linked program is handed in ready-made, so by the time the loop
/// enters `Running` the shader is known-good; the loop itself only ever
/// reads handles and mutates the two time-varying uniforms.
pub(crate) fn run_windowed(config: &RendererConfig, program: &LinkedProgram) -> Result<()> {
    let event_loop = EventLoop::new().context("failed to initialize event loop")?;
    let window_size = PhysicalSize::new(config.surface_size.0, config.surface_size.1);
    let window = WindowBuilder::new()
        .with_title(&config.window_title)
        .with_inner_size(window_size)
        .build(&event_loop)
        .context("failed to create preview window")?;
    let window = Arc::new(window);

    let context = GpuContext::new(window.as_ref(), window.inner_size())?;
    let mut session = RenderSession::new(context, program)?;

    let mut phase = LoopPhase::default();
    let mut clock = FrameClock::new();
    let mut pacer = FramePacer::new(config.target_fps);

    // Setup is complete and the program is linked; the loop may now tick.
    phase.start();
    window.request_redraw();

    event_loop
        .run(move |event, elwt| {
            match event {
                Event::WindowEvent { window_id, event } if window_id == window.id() => {
                    match event {
                        WindowEvent::CloseRequested | WindowEvent::Destroyed => {
                            phase.stop();
                            elwt.exit();
                        }
                        WindowEvent::Resized(new_size) => {
                            session.resize(new_size);
                        }
                        WindowEvent::ScaleFactorChanged {
                            mut inner_size_writer,
                            ..
                        } => {
                            // Keep the current physical size when the scale factor changes.
                            let _ = inner_size_writer.request_inner_size(session.size());
                        }
                        WindowEvent::RedrawRequested => {
                            if !phase.is_running() {
                                return;
                            }
                            match session.render_frame(clock.sample()) {
                                Ok(()) => pacer.mark_rendered(Instant::now()),
                                Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                                    session.resize(session.size());
                                }
                                Err(wgpu::SurfaceError::OutOfMemory) => {
                                    error!("surface out of memory; stopping render loop");
                                    phase.stop();
                                    elwt.exit();
                                }
                                Err(wgpu::SurfaceError::Timeout) => {
                                    tracing::warn!("surface timeout; retrying next frame");
                                }
                                Err(other) => {
                                    tracing::warn!("surface error: {other:?}; retrying next frame");
                                }
                            }
                        }
                        _ => {}
                    }
                }
                Event::AboutToWait => {
                    // Reschedule only while running; after `stop` no further
                    // redraw is requested and pending ones are ignored above.
                    if !phase.is_running() {
                        elwt.set_control_flow(ControlFlow::Wait);
                        return;
                    }
                    let now = Instant::now();
                    if pacer.ready_for_frame(now) {
                        window.request_redraw();
                        elwt.set_control_flow(ControlFlow::Wait);
                    } else if let Some(deadline) = pacer.next_deadline() {
                        elwt.set_control_flow(ControlFlow::WaitUntil(deadline));
                    }
                }
                _ => {}
            }
        })
        .map_err(|err| anyhow!("event loop error: {err}"))
}
