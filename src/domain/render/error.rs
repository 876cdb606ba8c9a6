/// Classification of a failed render, mirrored in diagnostics and UI copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderErrorKind {
    InvalidInput,
    ProviderFailure,
    Timeout,
}

/// Error surfaced to the render caller. Every variant's `Display` output is a
/// message suitable for direct display; provider error codes are already
/// resolved to user phrasing by the time a `ProviderFailure` is built.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("{0}")]
    InvalidInput(String),

    #[error("{0}")]
    ProviderFailure(String),

    #[error("Timed out waiting for the video. Please try again.")]
    Timeout,
}

impl RenderError {
    pub fn kind(&self) -> RenderErrorKind {
        match self {
            Self::InvalidInput(_) => RenderErrorKind::InvalidInput,
            Self::ProviderFailure(_) => RenderErrorKind::ProviderFailure,
            Self::Timeout => RenderErrorKind::Timeout,
        }
    }
}
