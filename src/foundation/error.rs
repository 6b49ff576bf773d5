use crate::host::scene::HostError;

/// Convenience result type used across QuadGrab.
pub type QuadgrabResult<T> = Result<T, QuadgrabError>;

/// Top-level error taxonomy used by pipeline APIs.
///
/// Per-channel bake failures are not part of this taxonomy: they are recorded as
/// [`crate::BakeFailure`] values inside a [`crate::CaptureResult`].
#[derive(thiserror::Error, Debug)]
pub enum QuadgrabError {
    /// Invalid capture configuration. Raised before any scene mutation.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A caller-supplied surface handle exists but is not a usable quad.
    #[error("invalid surface: {0}")]
    InvalidSurface(String),

    /// Preview assembly was requested for a run where no channel succeeded.
    #[error("no usable capture: {0}")]
    NoUsableCapture(String),

    /// A scene primitive (create/delete/bind) failed on the host side.
    #[error("host error: {0}")]
    Host(#[from] HostError),

    /// Errors when serializing or deserializing data structures.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl QuadgrabError {
    /// Build a [`QuadgrabError::Configuration`] value.
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Build a [`QuadgrabError::InvalidSurface`] value.
    pub fn invalid_surface(msg: impl Into<String>) -> Self {
        Self::InvalidSurface(msg.into())
    }

    /// Build a [`QuadgrabError::NoUsableCapture`] value.
    pub fn no_usable_capture(msg: impl Into<String>) -> Self {
        Self::NoUsableCapture(msg.into())
    }

    /// Build a [`QuadgrabError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
