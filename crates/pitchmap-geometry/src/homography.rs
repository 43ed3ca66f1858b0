use pitchmap_linalg::{
    mat33::{self, Mat33},
    solve_normal_equations, Matrix, EPSILON,
};
use serde::{Deserialize, Serialize};

use crate::{
    mapping,
    normalize::{normalize_points, NormalizedPoints},
    HomographyError, Point2,
};

/// Minimum number of correspondences needed to estimate a homography.
pub const MIN_CORRESPONDENCES: usize = 4;

/// A 3x3 projective transform between two planes, defined up to scale.
///
/// Immutable once created: recalibration produces a new value.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Homography {
    matrix: Mat33,
}

impl Homography {
    /// Wrap a 3x3 matrix. Any non-zero scale is accepted.
    pub const fn new(matrix: Mat33) -> Self {
        Self { matrix }
    }

    /// The identity transform.
    pub const fn identity() -> Self {
        Self::new(mat33::IDENTITY)
    }

    /// The underlying matrix.
    #[inline]
    pub fn matrix(&self) -> &Mat33 {
        &self.matrix
    }

    /// Compute the inverse transform.
    ///
    /// # Errors
    ///
    /// Returns [`HomographyError::Singular`] if `|det(H)| < EPSILON`.
    pub fn inverse(&self) -> Result<Self, HomographyError> {
        Ok(Self::new(mat33::invert_mat33(&self.matrix)?))
    }

    /// Rescale the matrix so that its bottom-right entry is one.
    ///
    /// # Errors
    ///
    /// Returns [`HomographyError::Singular`] if the bottom-right entry is numerically zero.
    pub fn normalized(&self) -> Result<Self, HomographyError> {
        let mut matrix = self.matrix;
        mat33::normalize_mat33_inplace(&mut matrix)?;
        Ok(Self::new(matrix))
    }

    /// Multiply every entry by `k`. The transform itself is unchanged for `k != 0`.
    pub fn scaled(&self, k: f64) -> Self {
        Self::new(mat33::scale_mat33(&self.matrix, k))
    }

    /// The determinant of the matrix.
    pub fn determinant(&self) -> f64 {
        mat33::det_mat33(&self.matrix)
    }
}

impl From<Mat33> for Homography {
    fn from(matrix: Mat33) -> Self {
        Self::new(matrix)
    }
}

impl From<Homography> for Mat33 {
    fn from(h: Homography) -> Self {
        h.matrix
    }
}

/// Output of a calibration.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CalibrationResult {
    /// The video to field homography, scaled so that `H[2][2] == 1`.
    pub homography: Homography,
    /// RMS distance, in field units, between each field point and its projected video point.
    pub reprojection_error: f64,
}

/// Method used to solve the homogeneous DLT system.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EstimationMethod {
    /// Fix `h33 = 1` and solve the 8 unknowns in the least-squares sense
    /// through the normal equations and Gaussian elimination.
    #[default]
    NormalEquations,
    /// Take the right singular vector of the smallest singular value of the design matrix.
    Svd,
}

/// Configuration of the homography estimator.
#[derive(Clone, Debug, Default)]
pub struct EstimatorConfig {
    /// Solve method for the DLT system.
    pub method: EstimationMethod,
}

/// Estimate the video to field homography with the default configuration.
///
/// See [`estimate_homography_with`].
///
/// Example:
///
/// ```
/// use pitchmap_geometry::{estimate_homography, Point2};
///
/// let video = [[0.0, 0.0], [800.0, 0.0], [800.0, 600.0], [0.0, 600.0]].map(Point2::from);
/// let field = [[0.0, 0.0], [105.0, 0.0], [105.0, 68.0], [0.0, 68.0]].map(Point2::from);
/// let calib = estimate_homography(&video, &field).unwrap();
/// assert!(calib.reprojection_error < 0.01);
/// ```
pub fn estimate_homography(
    video: &[Point2],
    field: &[Point2],
) -> Result<CalibrationResult, HomographyError> {
    estimate_homography_with(video, field, &EstimatorConfig::default())
}

/// Estimate the homography mapping `video` points onto `field` points.
///
/// Normalized DLT: both point sets are normalized independently, the `2N x 9`
/// design matrix is built from the normalized correspondences and solved with
/// the configured method, and the result is denormalized with
/// `H = T_field⁻¹ · H_norm · T_video` and rescaled so that `H[2][2] == 1`.
///
/// # Arguments
///
/// * `video` - The points observed in the camera image.
/// * `field` - The matching points on the field plane.
/// * `config` - The estimator configuration.
///
/// # Errors
///
/// * [`HomographyError::InsufficientPoints`] with fewer than 4 correspondences.
/// * [`HomographyError::MismatchedLengths`] if `video` and `field` differ in length.
/// * [`HomographyError::Singular`] for collinear, duplicate or otherwise degenerate input.
/// * [`HomographyError::DegenerateProjection`] if a video point maps to infinity.
pub fn estimate_homography_with(
    video: &[Point2],
    field: &[Point2],
    config: &EstimatorConfig,
) -> Result<CalibrationResult, HomographyError> {
    let actual = video.len().min(field.len());
    if actual < MIN_CORRESPONDENCES {
        return Err(HomographyError::InsufficientPoints {
            required: MIN_CORRESPONDENCES,
            actual,
        });
    }

    if video.len() != field.len() {
        return Err(HomographyError::MismatchedLengths {
            video: video.len(),
            field: field.len(),
        });
    }

    let src = normalize_points(video)?;
    let dst = normalize_points(field)?;

    let mat_a = design_matrix(&src, &dst);
    let h_norm = match config.method {
        EstimationMethod::NormalEquations => solve_dlt_normal_equations(&mat_a)?,
        EstimationMethod::Svd => solve_dlt_svd(&mat_a)?,
    };

    // denormalize: H = T_dst^-1 * H_norm * T_src
    let h = mat33::mul_mat33(&dst.inverse, &mat33::mul_mat33(&h_norm, &src.transform));
    let homography = Homography::new(h).normalized()?;

    let reprojection_error = reprojection_error(&homography, video, field)?;

    log::debug!(
        "estimated homography from {} correspondences ({:?}), reprojection error {:.6}",
        video.len(),
        config.method,
        reprojection_error
    );

    Ok(CalibrationResult {
        homography,
        reprojection_error,
    })
}

/// Root-mean-square distance between each field point and the forward projection of its video point.
///
/// # Errors
///
/// * [`HomographyError::MismatchedLengths`] if the slices differ in length.
/// * [`HomographyError::DegenerateProjection`] if a video point maps to infinity.
pub fn reprojection_error(
    homography: &Homography,
    video: &[Point2],
    field: &[Point2],
) -> Result<f64, HomographyError> {
    if video.len() != field.len() {
        return Err(HomographyError::MismatchedLengths {
            video: video.len(),
            field: field.len(),
        });
    }
    if video.is_empty() {
        return Ok(0.0);
    }

    let mut sum_sq = 0.0;
    for (v, f) in video.iter().zip(field) {
        let projected = mapping::forward(homography, *v)?;
        let d = projected.distance(f);
        sum_sq += d * d;
    }

    Ok((sum_sq / video.len() as f64).sqrt())
}

// Two rows per correspondence (x, y) -> (x', y'):
//   [-x, -y, -1,  0,  0,  0, x*x', y*x', x']
//   [ 0,  0,  0, -x, -y, -1, x*y', y*y', y']
fn design_matrix(src: &NormalizedPoints, dst: &NormalizedPoints) -> Matrix {
    let n = src.points.len();
    let mut mat_a = Matrix::zeros(2 * n, 9);
    for (i, (p, q)) in src.points.iter().zip(&dst.points).enumerate() {
        let (x, y) = (p.x, p.y);
        let (xp, yp) = (q.x, q.y);

        mat_a.set(2 * i, 0, -x);
        mat_a.set(2 * i, 1, -y);
        mat_a.set(2 * i, 2, -1.0);
        mat_a.set(2 * i, 6, x * xp);
        mat_a.set(2 * i, 7, y * xp);
        mat_a.set(2 * i, 8, xp);

        mat_a.set(2 * i + 1, 3, -x);
        mat_a.set(2 * i + 1, 4, -y);
        mat_a.set(2 * i + 1, 5, -1.0);
        mat_a.set(2 * i + 1, 6, x * yp);
        mat_a.set(2 * i + 1, 7, y * yp);
        mat_a.set(2 * i + 1, 8, yp);
    }
    mat_a
}

fn solve_dlt_normal_equations(mat_a: &Matrix) -> Result<Mat33, HomographyError> {
    // fixing h33 = 1 moves the last column to the right-hand side
    let lhs = Matrix::from_fn(mat_a.rows(), 8, |i, j| mat_a.get(i, j));
    let rhs = (0..mat_a.rows())
        .map(|i| -mat_a.get(i, 8))
        .collect::<Vec<_>>();

    let h = solve_normal_equations(&lhs, &rhs)?;

    Ok([[h[0], h[1], h[2]], [h[3], h[4], h[5]], [h[6], h[7], 1.0]])
}

fn solve_dlt_svd(mat_a: &Matrix) -> Result<Mat33, HomographyError> {
    let mat = faer::Mat::<f64>::from_fn(mat_a.rows(), mat_a.cols(), |i, j| mat_a.get(i, j));
    let svd = mat.svd();

    // singular values are sorted in decreasing order; with 2N >= 8 rows index 7
    // is the second smallest of the nine, counting the implicit zero when N == 4.
    // A second vanishing value means the null space is not unique.
    let second_smallest = svd.s_diagonal().read(7);
    if second_smallest < EPSILON {
        return Err(HomographyError::Singular(second_smallest));
    }

    let v = svd.v();
    let h_norm = [
        [v.read(0, 8), v.read(1, 8), v.read(2, 8)],
        [v.read(3, 8), v.read(4, 8), v.read(5, 8)],
        [v.read(6, 8), v.read(7, 8), v.read(8, 8)],
    ];

    let det = mat33::det_mat33(&h_norm);
    if det.abs() < EPSILON {
        return Err(HomographyError::Singular(det.abs()));
    }

    Ok(h_norm)
}
