use anyhow::Result;
use bytemuck::{Pod, Zeroable};
use wgpu::util::DeviceExt;

/// One corner of the full-screen quad: a bare 2D clip-space position.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub(crate) struct QuadVertex {
    pub position: [f32; 2],
}

impl QuadVertex {
    /// Two tightly packed floats per vertex, no normalization.
    pub(crate) fn layout() -> wgpu::VertexBufferLayout<'static> {
        const ATTRIBUTES: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![0 => Float32x2];
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<QuadVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &ATTRIBUTES,
        }
    }
}

/// The four clip-space corners in triangle-strip order.
pub(crate) const QUAD_VERTICES: [QuadVertex; 4] = [
    QuadVertex { position: [-1.0, -1.0] },
    QuadVertex { position: [1.0, -1.0] },
    QuadVertex { position: [-1.0, 1.0] },
    QuadVertex { position: [1.0, 1.0] },
];

/// Immutable vertex data uploaded once into device memory.
///
/// There is no mutation API: the quad never changes for the lifetime of the
/// session, and every draw references the same buffer handle.
pub(crate) struct QuadGeometry {
    pub buffer: wgpu::Buffer,
    pub vertex_count: u32,
}

impl QuadGeometry {
    /// Uploads the full-screen quad.
    pub(crate) fn quad(device: &wgpu::Device) -> Result<Self> {
        Self::upload(device, &QUAD_VERTICES)
    }

    /// Uploads an arbitrary triangle-strip vertex run.
    pub(crate) fn upload(device: &wgpu::Device, vertices: &[QuadVertex]) -> Result<Self> {
        if vertices.is_empty() {
            anyhow::bail!("geometry upload requires at least one vertex");
        }
        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("fullscreen quad"),
            contents: bytemuck::cast_slice(vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        Ok(Self {
            buffer,
            vertex_count: vertices.len() as u32,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quad_spans_the_clip_space_corners_in_strip_order() {
        let positions: Vec<[f32; 2]> = QUAD_VERTICES.iter().map(|v| v.position).collect();
        assert_eq!(
            positions,
            vec![[-1.0, -1.0], [1.0, -1.0], [-1.0, 1.0], [1.0, 1.0]]
        );
    }

    #[test]
    fn vertex_layout_is_two_packed_floats() {
        let layout = QuadVertex::layout();
        assert_eq!(layout.array_stride, 8);
        assert_eq!(layout.attributes.len(), 1);
        assert_eq!(layout.attributes[0].format, wgpu::VertexFormat::Float32x2);
        assert_eq!(layout.attributes[0].offset, 0);
        assert_eq!(layout.attributes[0].shader_location, 0);
    }
}
