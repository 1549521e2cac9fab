//! Validation errors for model values.

use thiserror::Error;

/// Errors raised when a model value violates an invariant.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    /// A fixed music length policy was selected without a value.
    #[error("Music length policy '{0}' requires a value")]
    MissingPolicyValue(&'static str),

    /// A numeric attribute is out of range or not finite.
    #[error("Invalid value for {field}: {value}")]
    InvalidAttribute { field: &'static str, value: f64 },

    /// The video has no usable frame rate for a frame-based operation.
    #[error("Video '{0}' has no usable frame rate")]
    MissingFrameRate(String),
}

impl ModelError {
    /// Create an invalid attribute error.
    pub fn invalid(field: &'static str, value: f64) -> Self {
        Self::InvalidAttribute { field, value }
    }
}

/// Result type for model validation.
pub type ModelResult<T> = Result<T, ModelError>;
