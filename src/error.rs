use thiserror::Error;

use crate::{
    domain::{TailoringError, ValidationError},
    render::RenderingError,
    tenant::ConfigurationError,
};

/// Any error raised by the tailoring engine.
#[derive(Debug, Error)]
pub enum Error {
    /// A catalog definition is malformed.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// A tenant has no engine registered.
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    /// A document could not be rendered.
    #[error(transparent)]
    Rendering(#[from] RenderingError),

    /// A tailoring edit addressed a requirement that does not exist.
    #[error(transparent)]
    Tailoring(#[from] TailoringError),
}
