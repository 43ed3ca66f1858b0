use pitchmap_linalg::EPSILON;

use crate::{Homography, HomographyError, Point2};

/// Map a point through a homography.
///
/// With `w = h20·x + h21·y + h22` the result is
/// `((h00·x + h01·y + h02) / w, (h10·x + h11·y + h12) / w)`.
///
/// # Errors
///
/// Returns [`HomographyError::DegenerateProjection`] if `|w| < EPSILON`.
pub fn forward(homography: &Homography, p: Point2) -> Result<Point2, HomographyError> {
    let h = homography.matrix();
    let w = h[2][0] * p.x + h[2][1] * p.y + h[2][2];
    if w.abs() < EPSILON {
        return Err(HomographyError::DegenerateProjection(w));
    }
    Ok(Point2::new(
        (h[0][0] * p.x + h[0][1] * p.y + h[0][2]) / w,
        (h[1][0] * p.x + h[1][1] * p.y + h[1][2]) / w,
    ))
}

/// Map a point through the inverse of a homography.
///
/// # Errors
///
/// * [`HomographyError::Singular`] if the homography cannot be inverted.
/// * [`HomographyError::DegenerateProjection`] if the point maps to infinity.
pub fn backward(homography: &Homography, p: Point2) -> Result<Point2, HomographyError> {
    let inverse = homography.inverse()?;
    forward(&inverse, p)
}

/// Real-world distance between two camera-observed points.
///
/// Both points are mapped forward into the field plane and their Euclidean
/// distance is returned in field units.
///
/// # Errors
///
/// Returns [`HomographyError::DegenerateProjection`] if either point maps to infinity.
pub fn distance(homography: &Homography, p1: Point2, p2: Point2) -> Result<f64, HomographyError> {
    let q1 = forward(homography, p1)?;
    let q2 = forward(homography, p2)?;
    Ok(q1.distance(&q2))
}

/// A homography together with its precomputed inverse.
///
/// The video to field direction is `forward`, field to video is `backward`.
/// Cheap to clone and safe to share between threads.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ProjectiveMapper {
    homography: Homography,
    inverse: Homography,
}

impl ProjectiveMapper {
    /// Create a mapper from a video to field homography.
    ///
    /// # Errors
    ///
    /// Returns [`HomographyError::Singular`] if the homography cannot be inverted.
    ///
    /// Example:
    ///
    /// ```
    /// use pitchmap_geometry::{Homography, Point2, ProjectiveMapper};
    ///
    /// let h = Homography::new([[0.5, 0.0, 0.0], [0.0, 0.5, 0.0], [0.0, 0.0, 1.0]]);
    /// let mapper = ProjectiveMapper::new(h).unwrap();
    /// assert_eq!(mapper.forward(Point2::new(10.0, 4.0)).unwrap(), Point2::new(5.0, 2.0));
    /// assert_eq!(mapper.backward(Point2::new(5.0, 2.0)).unwrap(), Point2::new(10.0, 4.0));
    /// ```
    pub fn new(homography: Homography) -> Result<Self, HomographyError> {
        let inverse = homography.inverse()?;
        Ok(Self {
            homography,
            inverse,
        })
    }

    /// The video to field homography.
    pub fn homography(&self) -> &Homography {
        &self.homography
    }

    /// The field to video homography.
    pub fn inverse(&self) -> &Homography {
        &self.inverse
    }

    /// Map a video point into the field plane.
    pub fn forward(&self, p: Point2) -> Result<Point2, HomographyError> {
        forward(&self.homography, p)
    }

    /// Map a field point into the video image.
    pub fn backward(&self, p: Point2) -> Result<Point2, HomographyError> {
        forward(&self.inverse, p)
    }

    /// Field distance between two video points.
    pub fn distance(&self, p1: Point2, p2: Point2) -> Result<f64, HomographyError> {
        distance(&self.homography, p1, p2)
    }

    /// Map many video points into the field plane; a failure only affects its own entry.
    pub fn forward_batch(&self, points: &[Point2]) -> Vec<Result<Point2, HomographyError>> {
        points.iter().map(|p| self.forward(*p)).collect()
    }

    /// Map many field points into the video image; a failure only affects its own entry.
    pub fn backward_batch(&self, points: &[Point2]) -> Vec<Result<Point2, HomographyError>> {
        points.iter().map(|p| self.backward(*p)).collect()
    }
}
