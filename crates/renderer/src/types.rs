/// Immutable configuration passed to the renderer at start-up.
///
/// Mirrors the CLI flags: which fragment source to compile (already fetched
/// as text by the caller), how large the window should be, and whether the
/// frame rate is capped.
#[derive(Clone, Debug)]
pub struct RendererConfig {
    /// Window size in physical pixels.
    pub surface_size: (u32, u32),
    /// Title for the preview window.
    pub window_title: String,
    /// Fragment shader source text, exactly as fetched.
    pub fragment_source: String,
    /// Optional FPS cap; `None` renders on every redraw callback.
    pub target_fps: Option<f32>,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            surface_size: (1280, 720),
            window_title: "fragview".to_string(),
            fragment_source: String::new(),
            target_fps: None,
        }
    }
}
