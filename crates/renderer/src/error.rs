use std::fmt;

/// Which programmable stage a diagnostic belongs to.
///
/// Compilation failures are reported per stage so a valid vertex shader
/// paired with a broken fragment shader stays diagnosable on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageKind {
    Vertex,
    Fragment,
}

impl fmt::Display for StageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StageKind::Vertex => f.write_str("vertex"),
            StageKind::Fragment => f.write_str("fragment"),
        }
    }
}

/// Errors that terminate a rendering session before the first frame.
///
/// None of these are retried: a failed device request or an unusable shader
/// means the run is over and the operator fixes the input and restarts.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    /// The environment could not produce a graphics device or surface.
    #[error("graphics context unavailable: {reason}")]
    ContextUnavailable { reason: String },

    /// The device compiler rejected one stage; `log` carries the full
    /// diagnostic rendered against the wrapped source.
    #[error("{stage} shader failed to compile:\n{log}")]
    Compile { stage: StageKind, log: String },

    /// The stage interfaces are incompatible.
    #[error("shader program failed to link:\n{log}")]
    Link { log: String },
}

impl RenderError {
    pub(crate) fn context(reason: impl Into<String>) -> Self {
        RenderError::ContextUnavailable {
            reason: reason.into(),
        }
    }
}
