use thiserror::Error;

/// Failure kinds surfaced across the core boundary. Every error is local to a
/// single request; nothing here leaves shared state behind.
#[derive(Debug, Error)]
pub enum TensorError {
    /// Raw user text failed to parse as a symbolic expression.
    #[error("parse error: {0}")]
    Parse(String),

    /// A coordinate index outside [0, dim) was requested.
    #[error("coordinate index {index} out of range for dimension {dim}")]
    IndexOutOfRange { index: usize, dim: usize },

    /// The metric determinant simplified to zero; the inverse is undefined.
    #[error("metric is singular: determinant simplifies to zero")]
    SingularMetric,

    /// A supplied component array does not match the coordinate dimension.
    #[error("dimension mismatch: expected {expected}, found {found}")]
    DimensionMismatch { expected: usize, found: usize },

    /// A coordinate symbol appears more than once in the coordinate system.
    #[error("duplicate coordinate symbol `{0}`")]
    DuplicateCoordinate(String),

    /// Simplification exceeded the per-request work budget.
    #[error("expression grew past the simplification budget ({nodes} nodes)")]
    ExpressionTooLarge { nodes: usize },
}

pub type Result<T> = std::result::Result<T, TensorError>;
