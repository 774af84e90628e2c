use wall_kernel::KernelError;

/// Errors raised while building or placing wall parts.
#[derive(Debug, Clone, thiserror::Error)]
pub enum WallError {
    #[error("invalid parameter: {reason}")]
    Validation { reason: String },

    #[error("precondition failed: {reason}")]
    Precondition { reason: String },

    #[error("kernel error: {0}")]
    Kernel(#[from] KernelError),

    #[error("configuration error: {reason}")]
    Config { reason: String },
}

pub type Result<T> = std::result::Result<T, WallError>;

/// Shorthand for a `Validation` error.
pub(crate) fn invalid(reason: impl Into<String>) -> WallError {
    WallError::Validation {
        reason: reason.into(),
    }
}

/// Check that every named dimension is finite and strictly positive.
pub(crate) fn require_positive(values: &[(&str, f64)]) -> Result<()> {
    for (name, value) in values {
        if !(value.is_finite() && *value > 0.0) {
            return Err(invalid(format!("{name} must be positive, got {value}")));
        }
    }
    Ok(())
}
