#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]

mod error;
pub use error::LinalgError;

/// Dense row-major matrices of arbitrary shape.
pub mod mat;

/// Closed-form helpers for 3x3 matrices stored as `[[f64; 3]; 3]`.
pub mod mat33;

/// Gaussian elimination with partial pivoting.
pub mod solve;

pub use mat::Matrix;
pub use mat33::Mat33;
pub use solve::{solve, solve_normal_equations};

/// Magnitude below which a pivot, determinant or homogeneous divisor is treated as zero.
///
/// Every zero test in the engine goes through this single value.
pub const EPSILON: f64 = 1e-10;
