use rand::prelude::*;

use crate::{
    homography::{estimate_homography, reprojection_error, MIN_CORRESPONDENCES},
    mapping, CalibrationResult, HomographyError, Point2,
};

/// Errors returned by the robust estimator.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum RansacError {
    /// The input correspondences are invalid.
    #[error("Invalid input: {0}")]
    InvalidInput(HomographyError),
    /// No sampled model gathered enough inliers.
    #[error("RANSAC found no model with at least {required} inliers (best: {best})")]
    NoConsensus {
        /// Minimum number of inliers requested.
        required: usize,
        /// Inlier count of the best model.
        best: usize,
    },
    /// Re-estimation on the consensus set failed.
    #[error("Refinement on the inlier set failed: {0}")]
    Refinement(HomographyError),
}

/// Parameters for RANSAC model estimation.
#[derive(Clone, Copy, Debug)]
pub struct RansacParams {
    /// Maximum number of RANSAC iterations.
    pub max_iterations: usize,
    /// Inlier threshold on the field-plane reprojection distance.
    pub threshold: f64,
    /// Minimum number of inliers required for acceptance.
    pub min_inliers: usize,
    /// Optional RNG seed for deterministic runs.
    pub random_seed: Option<u64>,
}

impl Default for RansacParams {
    fn default() -> Self {
        Self {
            max_iterations: 2000,
            threshold: 5.0,
            min_inliers: MIN_CORRESPONDENCES,
            random_seed: Some(0),
        }
    }
}

/// Result of a robust homography fit.
#[derive(Clone, Debug)]
pub struct RansacResult {
    /// Homography refined on the inliers; the reprojection error covers all correspondences.
    pub calibration: CalibrationResult,
    /// Per-correspondence inlier mask.
    pub inliers: Vec<bool>,
    /// Total inlier count.
    pub inlier_count: usize,
}

/// Estimate a homography with RANSAC using the 4-point normalized DLT.
///
/// Degenerate minimal samples are skipped. The best model (most inliers, then
/// lowest summed error) is re-estimated on its inlier set.
pub fn ransac_homography(
    video: &[Point2],
    field: &[Point2],
    params: &RansacParams,
) -> Result<RansacResult, RansacError> {
    let n = video.len().min(field.len());
    if n < MIN_CORRESPONDENCES {
        return Err(RansacError::InvalidInput(
            HomographyError::InsufficientPoints {
                required: MIN_CORRESPONDENCES,
                actual: n,
            },
        ));
    }
    if video.len() != field.len() {
        return Err(RansacError::InvalidInput(
            HomographyError::MismatchedLengths {
                video: video.len(),
                field: field.len(),
            },
        ));
    }

    let mut rng = match params.random_seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => {
            let mut tr = rand::rng();
            StdRng::from_rng(&mut tr)
        }
    };

    let mut best_inliers = Vec::new();
    let mut best_count = 0usize;
    let mut best_score = f64::INFINITY;

    for _ in 0..params.max_iterations {
        let sample = rand::seq::index::sample(&mut rng, n, MIN_CORRESPONDENCES);
        let s1 = sample.iter().map(|idx| video[idx]).collect::<Vec<_>>();
        let s2 = sample.iter().map(|idx| field[idx]).collect::<Vec<_>>();
        let model = match estimate_homography(&s1, &s2) {
            Ok(calib) => calib.homography,
            Err(_) => continue,
        };

        let mut inliers = vec![false; n];
        let mut count = 0usize;
        let mut score = 0.0f64;
        for i in 0..n {
            let Ok(projected) = mapping::forward(&model, video[i]) else {
                continue;
            };
            let d = projected.distance(&field[i]);
            if d <= params.threshold {
                inliers[i] = true;
                count += 1;
                score += d;
            }
        }

        if count > best_count || (count == best_count && score < best_score) {
            best_inliers = inliers;
            best_count = count;
            best_score = score;
        }

        // all points agree, nothing left to improve
        if best_count == n && best_score < f64::EPSILON {
            break;
        }
    }

    let required = params.min_inliers.max(MIN_CORRESPONDENCES);
    if best_count < required {
        return Err(RansacError::NoConsensus {
            required,
            best: best_count,
        });
    }

    let (in_video, in_field): (Vec<_>, Vec<_>) = video
        .iter()
        .zip(field)
        .zip(&best_inliers)
        .filter(|(_, is_inlier)| **is_inlier)
        .map(|((v, f), _)| (*v, *f))
        .unzip();

    let refined = estimate_homography(&in_video, &in_field).map_err(RansacError::Refinement)?;
    let all_error = reprojection_error(&refined.homography, video, field)
        .map_err(RansacError::Refinement)?;

    log::debug!(
        "ransac kept {best_count}/{n} correspondences, reprojection error {all_error:.6}"
    );

    Ok(RansacResult {
        calibration: CalibrationResult {
            homography: refined.homography,
            reprojection_error: all_error,
        },
        inliers: best_inliers,
        inlier_count: best_count,
    })
}
