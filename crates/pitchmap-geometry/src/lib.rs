#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]

mod error;
pub use error::HomographyError;

/// 2d points and video/field correspondences.
pub mod point;

/// Similarity normalization of point sets.
pub mod normalize;

/// Homography estimation from point correspondences.
pub mod homography;

/// Forward and backward projective mapping of single points.
pub mod mapping;

/// Robust homography estimation.
pub mod ransac;

/// Perspective-correct projection of field-space shapes into the camera image.
pub mod shapes;

/// Uncalibrated fallback projection.
pub mod heuristic;

/// Calibration sessions holding the current homography.
pub mod session;

pub use homography::{
    estimate_homography, estimate_homography_with, CalibrationResult, EstimationMethod,
    EstimatorConfig, Homography,
};
pub use mapping::ProjectiveMapper;
pub use point::{Correspondence, Point2};
