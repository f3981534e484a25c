use wgpu::util::{DeviceExt, TextureDataOrder};

/// The host feeds the fragment shader two auxiliary input channels
/// (`iChannel0` and `iChannel1`).
pub(crate) const CHANNEL_COUNT: usize = 2;

/// Fixed fill colors for the channel placeholders: opaque red on unit 0,
/// opaque blue on unit 1.
pub(crate) const CHANNEL_COLORS: [[u8; 4]; CHANNEL_COUNT] =
    [[255, 0, 0, 255], [0, 0, 255, 255]];

/// Texture, view, and sampler backing one input channel.
///
/// Created once during session setup and never written again; every frame
/// rebinds the same resources.
pub(crate) struct ChannelResources {
    pub _texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub sampler: wgpu::Sampler,
}

/// Builds a 1x1 solid-color placeholder with linear filtering.
///
/// Texture creation with valid 1x1 data cannot fail on a working device, so
/// this is a plain constructor rather than a fallible operation.
pub(crate) fn create_solid_color(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    index: u32,
    rgba: [u8; 4],
) -> ChannelResources {
    let texture = device.create_texture_with_data(
        queue,
        &wgpu::TextureDescriptor {
            label: Some(&format!("placeholder channel texture #{index}")),
            size: wgpu::Extent3d {
                width: 1,
                height: 1,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8Unorm,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        },
        TextureDataOrder::LayerMajor,
        &rgba,
    );

    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
        label: Some(&format!("placeholder channel sampler #{index}")),
        address_mode_u: wgpu::AddressMode::ClampToEdge,
        address_mode_v: wgpu::AddressMode::ClampToEdge,
        address_mode_w: wgpu::AddressMode::ClampToEdge,
        mag_filter: wgpu::FilterMode::Linear,
        min_filter: wgpu::FilterMode::Linear,
        mipmap_filter: wgpu::FilterMode::Linear,
        ..Default::default()
    });

    ChannelResources {
        _texture: texture,
        view,
        sampler,
    }
}

/// Builds the fixed red/blue placeholder pair, indexed by texture unit.
pub(crate) fn default_channels(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
) -> Vec<ChannelResources> {
    CHANNEL_COLORS
        .iter()
        .enumerate()
        .map(|(index, rgba)| create_solid_color(device, queue, index as u32, *rgba))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_zero_is_red_and_channel_one_is_blue() {
        assert_eq!(CHANNEL_COLORS[0], [255, 0, 0, 255]);
        assert_eq!(CHANNEL_COLORS[1], [0, 0, 255, 255]);
        assert_eq!(CHANNEL_COLORS.len(), CHANNEL_COUNT);
    }
}
