use std::borrow::Cow;

use wgpu::naga::ShaderStage;

use crate::compile::LinkedProgram;
use crate::error::StageKind;

use super::channels::{ChannelResources, CHANNEL_COUNT};
use super::geometry::QuadVertex;

/// Bind group layouts shared by every pipeline built for a session.
///
/// Group 0 carries the frame-parameter uniform block, group 1 the channel
/// texture/sampler pairs, matching the `set`/`binding` qualifiers the
/// fragment wrapper injects.
pub(crate) struct PipelineLayouts {
    pub uniform_layout: wgpu::BindGroupLayout,
    pub channel_layout: wgpu::BindGroupLayout,
}

impl PipelineLayouts {
    pub(crate) fn new(device: &wgpu::Device) -> Self {
        let uniform_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("uniform layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let channel_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("channel layout"),
            entries: &build_channel_layout_entries(),
        });

        Self {
            uniform_layout,
            channel_layout,
        }
    }
}

/// The executable program: compiled modules baked into a render pipeline,
/// plus the bind group exposing the channel placeholders.
pub(crate) struct ShaderPipeline {
    pub pipeline: wgpu::RenderPipeline,
    pub channel_bind_group: wgpu::BindGroup,
    pub _channel_resources: Vec<ChannelResources>,
}

impl ShaderPipeline {
    /// Hands the linked GLSL to the device and assembles the pipeline.
    ///
    /// Both stages already passed the naga front-end during linking, so
    /// module creation here sees known-good source.
    pub(crate) fn new(
        device: &wgpu::Device,
        layouts: &PipelineLayouts,
        surface_format: wgpu::TextureFormat,
        program: &LinkedProgram,
        channels: Vec<ChannelResources>,
    ) -> Self {
        let vertex_module = create_stage_module(device, program, StageKind::Vertex);
        let fragment_module = create_stage_module(device, program, StageKind::Fragment);

        let channel_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("channel bind group"),
            layout: &layouts.channel_layout,
            entries: &build_channel_entries(&channels),
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("shader pipeline layout"),
            bind_group_layouts: &[&layouts.uniform_layout, &layouts.channel_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("shader pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &vertex_module,
                entry_point: Some("main"),
                buffers: &[QuadVertex::layout()],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleStrip,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            fragment: Some(wgpu::FragmentState {
                module: &fragment_module,
                entry_point: Some("main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: surface_format,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            multiview: None,
            cache: None,
        });

        Self {
            pipeline,
            channel_bind_group,
            _channel_resources: channels,
        }
    }
}

fn create_stage_module(
    device: &wgpu::Device,
    program: &LinkedProgram,
    stage: StageKind,
) -> wgpu::ShaderModule {
    let (label, source, naga_stage) = match stage {
        StageKind::Vertex => (
            "fragview vertex",
            program.vertex.source.as_str(),
            ShaderStage::Vertex,
        ),
        StageKind::Fragment => (
            "fragview fragment",
            program.fragment.source.as_str(),
            ShaderStage::Fragment,
        ),
    };
    device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(label),
        source: wgpu::ShaderSource::Glsl {
            shader: Cow::Borrowed(source),
            stage: naga_stage,
            defines: &[],
        },
    })
}

pub(crate) fn build_channel_entries(
    resources: &[ChannelResources],
) -> Vec<wgpu::BindGroupEntry<'_>> {
    let mut entries = Vec::with_capacity(resources.len() * 2);
    for (index, resource) in resources.iter().enumerate() {
        entries.push(wgpu::BindGroupEntry {
            binding: (index as u32) * 2,
            resource: wgpu::BindingResource::TextureView(&resource.view),
        });
        entries.push(wgpu::BindGroupEntry {
            binding: (index as u32) * 2 + 1,
            resource: wgpu::BindingResource::Sampler(&resource.sampler),
        });
    }
    entries
}

pub(crate) fn build_channel_layout_entries() -> Vec<wgpu::BindGroupLayoutEntry> {
    let mut entries = Vec::with_capacity(CHANNEL_COUNT * 2);
    for index in 0..CHANNEL_COUNT as u32 {
        entries.push(wgpu::BindGroupLayoutEntry {
            binding: index * 2,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Texture {
                sample_type: wgpu::TextureSampleType::Float { filterable: true },
                view_dimension: wgpu::TextureViewDimension::D2,
                multisampled: false,
            },
            count: None,
        });
        entries.push(wgpu::BindGroupLayoutEntry {
            binding: index * 2 + 1,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
            count: None,
        });
    }
    entries
}
