use pitchmap_linalg::{mat33::Mat33, EPSILON};

use crate::{HomographyError, Point2};

/// A point set moved to its centroid and isotropically rescaled.
#[derive(Clone, Debug)]
pub struct NormalizedPoints {
    /// The transformed points, centred on the origin with RMS distance `sqrt(2)`.
    pub points: Vec<Point2>,
    /// The similarity transform applied to the input points.
    pub transform: Mat33,
    /// The inverse of `transform`.
    pub inverse: Mat33,
}

/// Normalize a point set for numerical conditioning (Hartley normalization).
///
/// Computes the centroid `(cx, cy)` and the scale `s = sqrt(2) / rms` where
/// `rms` is the root-mean-square distance of the points to the centroid. The
/// similarity `T = [[s, 0, -s*cx], [0, s, -s*cy], [0, 0, 1]]` maps the points to
/// a set with zero mean and RMS distance `sqrt(2)` to the origin.
///
/// # Errors
///
/// * [`HomographyError::InsufficientPoints`] if `points` is empty.
/// * [`HomographyError::Singular`] if all the points coincide.
pub fn normalize_points(points: &[Point2]) -> Result<NormalizedPoints, HomographyError> {
    if points.is_empty() {
        return Err(HomographyError::InsufficientPoints {
            required: 1,
            actual: 0,
        });
    }

    let n = points.len() as f64;
    let (sum_x, sum_y) = points
        .iter()
        .fold((0.0, 0.0), |(sx, sy), p| (sx + p.x, sy + p.y));
    let centroid = Point2::new(sum_x / n, sum_y / n);

    let mean_sq = points
        .iter()
        .map(|p| {
            let d = *p - centroid;
            d.x * d.x + d.y * d.y
        })
        .sum::<f64>()
        / n;
    let rms = mean_sq.sqrt();
    if rms < EPSILON {
        return Err(HomographyError::Singular(rms));
    }

    let s = std::f64::consts::SQRT_2 / rms;
    let transform = [
        [s, 0.0, -s * centroid.x],
        [0.0, s, -s * centroid.y],
        [0.0, 0.0, 1.0],
    ];
    let inverse = [
        [1.0 / s, 0.0, centroid.x],
        [0.0, 1.0 / s, centroid.y],
        [0.0, 0.0, 1.0],
    ];

    let normalized = points
        .iter()
        .map(|p| Point2::new(s * (p.x - centroid.x), s * (p.y - centroid.y)))
        .collect();

    Ok(NormalizedPoints {
        points: normalized,
        transform,
        inverse,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use pitchmap_linalg::mat33::{mul_mat33, IDENTITY};

    #[test]
    fn test_normalize_centroid_and_scale() -> Result<(), HomographyError> {
        let points = [
            Point2::new(0.0, 0.0),
            Point2::new(800.0, 0.0),
            Point2::new(800.0, 600.0),
            Point2::new(0.0, 600.0),
            Point2::new(123.0, 456.0),
        ];
        let norm = normalize_points(&points)?;

        let n = norm.points.len() as f64;
        let mean_x = norm.points.iter().map(|p| p.x).sum::<f64>() / n;
        let mean_y = norm.points.iter().map(|p| p.y).sum::<f64>() / n;
        let rms = (norm.points.iter().map(|p| p.x * p.x + p.y * p.y).sum::<f64>() / n).sqrt();

        assert_relative_eq!(mean_x, 0.0, epsilon = 1e-12);
        assert_relative_eq!(mean_y, 0.0, epsilon = 1e-12);
        assert_relative_eq!(rms, std::f64::consts::SQRT_2, epsilon = 1e-12);
        Ok(())
    }

    #[test]
    fn test_normalize_transform_matches_points() -> Result<(), HomographyError> {
        let points = [
            Point2::new(10.0, 20.0),
            Point2::new(30.0, -5.0),
            Point2::new(-7.0, 12.0),
        ];
        let norm = normalize_points(&points)?;

        for (p, q) in points.iter().zip(&norm.points) {
            let t = &norm.transform;
            assert_relative_eq!(t[0][0] * p.x + t[0][2], q.x, epsilon = 1e-12);
            assert_relative_eq!(t[1][1] * p.y + t[1][2], q.y, epsilon = 1e-12);
        }

        let prod = mul_mat33(&norm.inverse, &norm.transform);
        for i in 0..3 {
            for j in 0..3 {
                assert_relative_eq!(prod[i][j], IDENTITY[i][j], epsilon = 1e-12);
            }
        }
        Ok(())
    }

    #[test]
    fn test_normalize_coincident_points() {
        let points = [Point2::new(3.0, 3.0); 4];
        assert!(matches!(
            normalize_points(&points),
            Err(HomographyError::Singular(_))
        ));
        assert!(normalize_points(&[]).is_err());
    }
}
