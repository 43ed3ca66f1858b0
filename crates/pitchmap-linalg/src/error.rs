use thiserror::Error;

/// An error type for the matrix kernel and the linear solver.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LinalgError {
    /// The operand shapes are incompatible.
    #[error("Dimension mismatch: ({0}x{1}) is incompatible with ({2}x{3})")]
    DimensionMismatch(usize, usize, usize, usize),

    /// A pivot or determinant fell below the singularity threshold.
    #[error("Matrix is singular or near-singular (|value| = {0:e})")]
    Singular(f64),

    /// The data buffer does not match the requested shape.
    #[error("Invalid buffer length {0} for a ({1}x{2}) matrix")]
    InvalidBuffer(usize, usize, usize),
}
