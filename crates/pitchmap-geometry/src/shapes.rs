use serde::{Deserialize, Serialize};

use crate::{
    heuristic::{HeuristicParams, HeuristicProjector},
    HomographyError, Point2, ProjectiveMapper,
};

/// Minimum number of projected samples for a closed curve.
pub const MIN_CURVE_POINTS: usize = 3;

/// Minimum number of projected samples for each cylinder ring.
pub const MIN_RING_POINTS: usize = 2;

/// Upper bound on the boundary samples of a curved shape.
pub const MAX_CURVE_POINTS: usize = 1024;

/// An annotation shape.
///
/// Lengths are in meters. Positions are field-plane coordinates when given to
/// [`ShapeProjector`], and camera pixels when given to [`annotate`].
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Shape {
    /// A circle lying on the field.
    Circle {
        /// Center of the circle.
        center: Point2,
        /// Radius in meters.
        radius: f64,
    },
    /// A field-aligned rectangle spanned by two opposite corners.
    Rectangle {
        /// First corner.
        corner1: Point2,
        /// Opposite corner.
        corner2: Point2,
    },
    /// A vertical cylinder standing on the field.
    Cylinder {
        /// Center of the base circle.
        center: Point2,
        /// Base radius in meters.
        base_radius: f64,
        /// Height in meters.
        height: f64,
    },
}

/// Camera-space geometry ready to be rendered.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProjectedShape {
    /// A closed polygon.
    Polygon {
        /// The polygon vertices in order.
        points: Vec<Point2>,
    },
    /// A cylinder outline.
    Cylinder {
        /// Projected base ring.
        base: Vec<Point2>,
        /// Projected top ring.
        top: Vec<Point2>,
        /// Vertical silhouette segments as `[base, top]` pairs.
        sides: Vec<[Point2; 2]>,
    },
}

/// How a projected shape was obtained.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectionMode {
    /// Through the calibrated homography.
    Calibrated,
    /// Through the flat y-based heuristic; no homography was usable.
    Uncalibrated,
}

/// A projected shape tagged with the path that produced it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Projection {
    /// The camera-space geometry.
    pub shape: ProjectedShape,
    /// Calibrated or heuristic.
    pub mode: ProjectionMode,
}

/// Boundary sampling density for curved shapes.
#[derive(Clone, Copy, Debug)]
pub struct ShapeSampling {
    /// Number of samples along a full circle.
    pub samples: usize,
}

impl Default for ShapeSampling {
    fn default() -> Self {
        Self { samples: 48 }
    }
}

impl ShapeSampling {
    /// The sample count, clamped to `[MIN_CURVE_POINTS, MAX_CURVE_POINTS]`.
    pub fn count(&self) -> usize {
        self.samples.clamp(MIN_CURVE_POINTS, MAX_CURVE_POINTS)
    }
}

/// Errors raised by the calibrated shape projection.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ShapeError {
    /// Too many samples mapped to infinity.
    #[error("Only {actual} of the shape samples could be projected, at least {required} are needed")]
    TooFewPoints {
        /// Minimum usable samples.
        required: usize,
        /// Usable samples.
        actual: usize,
    },
    /// A shape anchor could not be mapped into the field plane.
    #[error("Cannot map shape anchor into the field: {0}")]
    Anchor(#[from] HomographyError),
}

/// Sample points on a circle, counter-clockwise starting at angle zero.
pub fn circle_samples(center: Point2, rx: f64, ry: f64, n: usize) -> Vec<Point2> {
    (0..n)
        .map(|i| {
            let theta = 2.0 * std::f64::consts::PI * i as f64 / n as f64;
            Point2::new(center.x + rx * theta.cos(), center.y + ry * theta.sin())
        })
        .collect()
}

/// The four corners of the axis-aligned rectangle spanned by two opposite corners.
pub fn rectangle_corners(corner1: Point2, corner2: Point2) -> [Point2; 4] {
    [
        corner1,
        Point2::new(corner2.x, corner1.y),
        corner2,
        Point2::new(corner1.x, corner2.y),
    ]
}

/// Pair the left-most and right-most base samples with their top counterparts.
///
/// Rings are matched by index and must have the same length.
pub fn silhouette_sides(base: &[Point2], top: &[Point2]) -> Vec<[Point2; 2]> {
    let pairs = base.iter().zip(top).map(|(b, t)| [*b, *t]);

    let left = pairs.clone().min_by(|a, b| a[0].x.total_cmp(&b[0].x));
    let right = pairs.max_by(|a, b| a[0].x.total_cmp(&b[0].x));

    match (left, right) {
        (Some(l), Some(r)) if l != r => vec![l, r],
        (Some(l), _) => vec![l],
        _ => Vec::new(),
    }
}

/// Projects field-space shapes into the camera image through a calibrated homography.
#[derive(Clone, Copy, Debug)]
pub struct ShapeProjector<'a> {
    mapper: &'a ProjectiveMapper,
    sampling: ShapeSampling,
}

impl<'a> ShapeProjector<'a> {
    /// Create a projector over a calibrated mapper.
    pub fn new(mapper: &'a ProjectiveMapper, sampling: ShapeSampling) -> Self {
        Self { mapper, sampling }
    }

    /// Project a shape given in field coordinates.
    ///
    /// Boundary samples are generated in the field plane and each one is
    /// mapped into the camera with the inverse homography; samples whose
    /// homogeneous divisor vanishes are dropped.
    ///
    /// # Errors
    ///
    /// Returns [`ShapeError::TooFewPoints`] when fewer than 3 samples of a
    /// closed curve, or fewer than 2 samples of a cylinder ring, survive.
    pub fn project(&self, shape: &Shape) -> Result<ProjectedShape, ShapeError> {
        match *shape {
            Shape::Circle { center, radius } => {
                let samples = circle_samples(center, radius, radius, self.sampling.count());
                let points = self.project_closed(&samples)?;
                Ok(ProjectedShape::Polygon { points })
            }
            Shape::Rectangle { corner1, corner2 } => {
                let points = self.project_closed(&rectangle_corners(corner1, corner2))?;
                Ok(ProjectedShape::Polygon { points })
            }
            Shape::Cylinder {
                center,
                base_radius,
                height,
            } => self.project_cylinder(center, base_radius, height),
        }
    }

    fn project_closed(&self, samples: &[Point2]) -> Result<Vec<Point2>, ShapeError> {
        let points = samples
            .iter()
            .filter_map(|p| self.mapper.backward(*p).ok())
            .collect::<Vec<_>>();
        if points.len() < MIN_CURVE_POINTS {
            return Err(ShapeError::TooFewPoints {
                required: MIN_CURVE_POINTS,
                actual: points.len(),
            });
        }
        Ok(points)
    }

    // Camera-space length of a one meter step at a field point, averaged over both field axes.
    fn local_scale(&self, p: Point2, at: Point2) -> Option<f64> {
        let dx = self.mapper.backward(p + Point2::new(1.0, 0.0)).ok()?;
        let dy = self.mapper.backward(p + Point2::new(0.0, 1.0)).ok()?;
        Some(0.5 * (dx.distance(&at) + dy.distance(&at)))
    }

    fn project_cylinder(
        &self,
        center: Point2,
        base_radius: f64,
        height: f64,
    ) -> Result<ProjectedShape, ShapeError> {
        let samples = circle_samples(center, base_radius, base_radius, self.sampling.count());

        // the homography only covers the ground plane, so each top sample is its
        // base sample lifted by the height at the local image scale; a sample
        // is kept only if both rings could be projected
        let (base, top): (Vec<_>, Vec<_>) = samples
            .iter()
            .filter_map(|p| {
                let b = self.mapper.backward(*p).ok()?;
                let scale = self.local_scale(*p, b)?;
                Some((b, Point2::new(b.x, b.y - height * scale)))
            })
            .unzip();

        if base.len() < MIN_RING_POINTS {
            return Err(ShapeError::TooFewPoints {
                required: MIN_RING_POINTS,
                actual: base.len(),
            });
        }

        let sides = silhouette_sides(&base, &top);

        Ok(ProjectedShape::Cylinder { base, top, sides })
    }
}

/// Project an annotation whose anchors were placed in the camera image.
///
/// With a mapper, the anchors are mapped into the field plane, the shape is
/// built there and projected back through the inverse homography. Without a
/// mapper, or when any step of that path fails, the uncalibrated heuristic is
/// used instead. The result records which path produced it.
pub fn annotate(
    mapper: Option<&ProjectiveMapper>,
    shape_in_camera: &Shape,
    sampling: ShapeSampling,
    heuristic: &HeuristicParams,
) -> Projection {
    if let Some(mapper) = mapper {
        match project_calibrated(mapper, shape_in_camera, sampling) {
            Ok(shape) => {
                return Projection {
                    shape,
                    mode: ProjectionMode::Calibrated,
                }
            }
            Err(err) => log::warn!("calibrated projection failed, using heuristic: {err}"),
        }
    }

    Projection {
        shape: HeuristicProjector::new(*heuristic).project(shape_in_camera, sampling),
        mode: ProjectionMode::Uncalibrated,
    }
}

fn project_calibrated(
    mapper: &ProjectiveMapper,
    shape_in_camera: &Shape,
    sampling: ShapeSampling,
) -> Result<ProjectedShape, ShapeError> {
    let field_shape = match *shape_in_camera {
        Shape::Circle { center, radius } => Shape::Circle {
            center: mapper.forward(center)?,
            radius,
        },
        Shape::Rectangle { corner1, corner2 } => Shape::Rectangle {
            corner1: mapper.forward(corner1)?,
            corner2: mapper.forward(corner2)?,
        },
        Shape::Cylinder {
            center,
            base_radius,
            height,
        } => Shape::Cylinder {
            center: mapper.forward(center)?,
            base_radius,
            height,
        },
    };
    ShapeProjector::new(mapper, sampling).project(&field_shape)
}
