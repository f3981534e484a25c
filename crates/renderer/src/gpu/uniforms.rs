use bytemuck::{Pod, Zeroable};

/// CPU mirror of the `FrameParams` uniform block injected by the fragment
/// wrapper in `compile.rs`. Field order and padding must match the std140
/// layout the GLSL header declares: `iResolution` at offset 0, `iTime` at
/// offset 8, block size 16.
#[repr(C, align(16))]
#[derive(Clone, Copy, Debug)]
pub(crate) struct FrameUniforms {
    pub resolution: [f32; 2],
    pub time: f32,
    _padding: f32,
}

unsafe impl Zeroable for FrameUniforms {}
unsafe impl Pod for FrameUniforms {}

impl FrameUniforms {
    pub(crate) fn new(width: u32, height: u32) -> Self {
        Self {
            resolution: [width as f32, height as f32],
            time: 0.0,
            _padding: 0.0,
        }
    }

    pub(crate) fn set_resolution(&mut self, width: f32, height: f32) {
        self.resolution = [width, height];
    }

    pub(crate) fn set_time(&mut self, seconds: f32) {
        self.time = seconds;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::mem::{align_of, size_of};

    /// Sanity-checks that the CPU mirror of the uniform block matches the
    /// layout baked into the GLSL header.
    #[test]
    fn frame_uniforms_follow_std140_layout() {
        let uniforms = FrameUniforms::new(1920, 1080);
        let base = &uniforms as *const _ as usize;

        assert_eq!(align_of::<FrameUniforms>(), 16);
        assert_eq!(size_of::<FrameUniforms>(), 16);
        assert_eq!((&uniforms.resolution as *const _ as usize) - base, 0);
        assert_eq!((&uniforms.time as *const _ as usize) - base, 8);
    }

    #[test]
    fn setters_touch_only_their_fields() {
        let mut uniforms = FrameUniforms::new(640, 480);
        uniforms.set_time(2.5);
        assert_eq!(uniforms.resolution, [640.0, 480.0]);
        assert_eq!(uniforms.time, 2.5);

        uniforms.set_resolution(800.0, 600.0);
        assert_eq!(uniforms.resolution, [800.0, 600.0]);
        assert_eq!(uniforms.time, 2.5);
    }
}
