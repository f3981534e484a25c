use std::time::{Duration, Instant};

use anyhow::Result;
use tracing::debug;
use winit::dpi::PhysicalSize;

use crate::compile::LinkedProgram;
use crate::runtime::TimeSample;

use super::channels;
use super::context::GpuContext;
use super::geometry::QuadGeometry;
use super::pipeline::{PipelineLayouts, ShaderPipeline};
use super::uniforms::FrameUniforms;

/// Everything a tick needs, owned in one place and passed explicitly to the
/// window loop: the graphics context, the quad, the two placeholder
/// channels, the linked pipeline, and the uniform state.
///
/// All handles are written once here and only read during ticks; the loop
/// never mutates anything but the two time-varying uniform values.
pub(crate) struct RenderSession {
    context: GpuContext,
    geometry: QuadGeometry,
    pipeline: ShaderPipeline,
    uniform_buffer: wgpu::Buffer,
    uniform_bind_group: wgpu::BindGroup,
    uniforms: FrameUniforms,
    update_resolution: bool,
    update_time: bool,
    last_stats: Instant,
    frames_since_stats: u32,
}

impl RenderSession {
    /// Builds the session from an initialised context and a linked program.
    ///
    /// Uniform handles are resolved by name up front; a name the shader does
    /// not declare simply disables that per-tick update rather than failing.
    pub(crate) fn new(context: GpuContext, program: &LinkedProgram) -> Result<Self> {
        let layouts = PipelineLayouts::new(&context.device);

        let geometry = QuadGeometry::quad(&context.device)?;
        let channel_resources = channels::default_channels(&context.device, &context.queue);

        let uniform_buffer = context.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("frame uniforms"),
            size: std::mem::size_of::<FrameUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let uniform_bind_group = context.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("frame uniform bind group"),
            layout: &layouts.uniform_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        let pipeline = ShaderPipeline::new(
            &context.device,
            &layouts,
            context.surface_format,
            program,
            channel_resources,
        );

        let update_resolution = resolve_or_skip(program, "iResolution");
        let update_time = resolve_or_skip(program, "iTime");
        for unit in 0..channels::CHANNEL_COUNT {
            resolve_or_skip(program, &format!("iChannel{unit}"));
        }

        let uniforms = FrameUniforms::new(context.size.width, context.size.height);
        context
            .queue
            .write_buffer(&uniform_buffer, 0, bytemuck::bytes_of(&uniforms));

        Ok(Self {
            context,
            geometry,
            pipeline,
            uniform_buffer,
            uniform_bind_group,
            uniforms,
            update_resolution,
            update_time,
            last_stats: Instant::now(),
            frames_since_stats: 0,
        })
    }

    pub(crate) fn size(&self) -> PhysicalSize<u32> {
        self.context.size
    }

    pub(crate) fn resize(&mut self, new_size: PhysicalSize<u32>) {
        self.context.resize(new_size);
    }

    /// Renders one frame.
    ///
    /// The steps run in a fixed order every tick and every binding is
    /// re-issued unconditionally, so no state can leak from a previous
    /// frame: clear to opaque black, activate the pipeline, bind the quad,
    /// refresh the resolution/time uniforms, bind both channel textures,
    /// draw the four-vertex strip.
    pub(crate) fn render_frame(&mut self, sample: TimeSample) -> Result<(), wgpu::SurfaceError> {
        let frame = self.context.surface.get_current_texture()?;
        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        if self.update_resolution {
            self.uniforms
                .set_resolution(self.context.size.width as f32, self.context.size.height as f32);
        }
        if self.update_time {
            self.uniforms.set_time(sample.seconds);
        }
        self.context
            .queue
            .write_buffer(&self.uniform_buffer, 0, bytemuck::bytes_of(&self.uniforms));

        let mut encoder = self
            .context
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("frame encoder"),
            });
        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("frame pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    depth_slice: None,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                occlusion_query_set: None,
                timestamp_writes: None,
            });
            render_pass.set_pipeline(&self.pipeline.pipeline);
            render_pass.set_vertex_buffer(0, self.geometry.buffer.slice(..));
            render_pass.set_bind_group(0, &self.uniform_bind_group, &[]);
            render_pass.set_bind_group(1, &self.pipeline.channel_bind_group, &[]);
            render_pass.draw(0..self.geometry.vertex_count, 0..1);
        }
        self.context.queue.submit(std::iter::once(encoder.finish()));
        frame.present();

        self.frames_since_stats += 1;
        let elapsed = self.last_stats.elapsed();
        if elapsed >= Duration::from_secs(1) {
            debug!(
                fps = (self.frames_since_stats as f32 / elapsed.as_secs_f32()).round(),
                frame = sample.frame_index,
                time = sample.seconds,
                "render stats"
            );
            self.frames_since_stats = 0;
            self.last_stats = Instant::now();
        }

        Ok(())
    }
}

/// Resolves a uniform by name, logging when the shader left it undeclared.
/// Missing names are tolerated: the corresponding update is skipped forever.
fn resolve_or_skip(program: &LinkedProgram, name: &str) -> bool {
    match program.resolve_uniform(name) {
        Some(_) => true,
        None => {
            debug!(uniform = name, "shader does not declare uniform; updates skipped");
            false
        }
    }
}
