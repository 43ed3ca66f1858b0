use pitchmap_linalg::LinalgError;
use thiserror::Error;

/// An error type for homography estimation and projective mapping.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum HomographyError {
    /// Fewer correspondences than the estimator needs.
    #[error("At least {required} calibration points are required, got {actual}")]
    InsufficientPoints {
        /// Minimum number of correspondences.
        required: usize,
        /// Number of correspondences provided.
        actual: usize,
    },

    /// The video and field point sequences differ in length.
    #[error("Number of video points ({video}) must match number of field points ({field})")]
    MismatchedLengths {
        /// Number of video points.
        video: usize,
        /// Number of field points.
        field: usize,
    },

    /// A pivot or determinant fell below the singularity threshold.
    ///
    /// Raised for collinear, duplicate or otherwise degenerate correspondences.
    #[error("Degenerate point configuration (|value| = {0:e}); add more or better spread points")]
    Singular(f64),

    /// The homogeneous divisor of a point mapping is numerically zero.
    #[error("Degenerate projection: homogeneous divisor {0:e} is numerically zero")]
    DegenerateProjection(f64),

    /// Any other failure of the matrix kernel.
    #[error("Linear algebra error: {0}")]
    Linalg(LinalgError),
}

impl From<LinalgError> for HomographyError {
    fn from(err: LinalgError) -> Self {
        match err {
            LinalgError::Singular(value) => HomographyError::Singular(value),
            other => HomographyError::Linalg(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_linalg_error() {
        assert_eq!(
            HomographyError::from(LinalgError::Singular(1e-12)),
            HomographyError::Singular(1e-12)
        );
        assert_eq!(
            HomographyError::from(LinalgError::DimensionMismatch(2, 3, 2, 3)),
            HomographyError::Linalg(LinalgError::DimensionMismatch(2, 3, 2, 3))
        );
    }
}
