use thiserror::Error;

/// Errors raised while setting up the renderer or generating the mesh.
///
/// Everything here is fatal: setup aborts, the error is logged once and the
/// frame loop never starts.
#[derive(Debug, Error)]
pub enum Error {
    /// Graphics context, device or pipeline could not be created
    #[error("setup failed: {0}")]
    SetupFailure(String),

    #[error("failed to create surface: {0}")]
    Surface(#[from] wgpu::CreateSurfaceError),

    #[error("failed to load texture: {0}")]
    Texture(#[from] image::ImageError),

    /// Torus parameters rejected before any GPU allocation
    #[error("invalid torus parameter `{parameter}`: {reason}")]
    InvalidParameter {
        parameter: &'static str,
        reason: String,
    },
}

impl Error {
    pub fn setup(msg: impl Into<String>) -> Self {
        Error::SetupFailure(msg.into())
    }

    pub fn invalid(parameter: &'static str, reason: impl Into<String>) -> Self {
        Error::InvalidParameter { parameter, reason: reason.into() }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
