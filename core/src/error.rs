use thiserror::Error;

/// Errors raised by the scf solver and its building blocks.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ScfError {
    /// Matrix or tensor shapes don't fit together.
    #[error("dimension mismatch: {0}")]
    DimensionMismatch(String),
    /// The symmetric eigendecomposition didn't converge.
    #[error("symmetric eigensolver did not converge for a {size}x{size} matrix")]
    NonConvergentEigensolver { size: usize },
    /// Something was requested before the solver computed it.
    #[error("{0} is not available before the solver has been initialized")]
    State(&'static str),
    #[error("invalid scf option: {0}")]
    InvalidOption(String),
    /// Two point ions sit on top of each other, so their repulsion diverges.
    #[error("ions {first} and {second} share the same position")]
    CoincidentIons { first: usize, second: usize },
}

impl ScfError {
    pub(crate) fn dimension(message: impl Into<String>) -> Self {
        Self::DimensionMismatch(message.into())
    }
}

pub type Result<T, E = ScfError> = std::result::Result<T, E>;
