//! Flat perspective approximation for uncalibrated views.
//!
//! Objects lower in the frame are assumed closer to the camera and drawn
//! larger; circles are flattened into ellipses by a fixed ratio. Shape anchors
//! are camera pixels, lengths are meters.

use serde::{Deserialize, Serialize};

use crate::{
    shapes::{
        circle_samples, rectangle_corners, silhouette_sides, ProjectedShape, Shape, ShapeSampling,
    },
    Point2,
};

/// Parameters of the uncalibrated heuristic.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeuristicParams {
    /// Height of the video frame in pixels.
    pub frame_height: f64,
    /// Pixels per meter at unit scale.
    pub pixels_per_meter: f64,
    /// Scale applied at the top of the frame.
    pub min_scale: f64,
    /// Scale applied at the bottom of the frame.
    pub max_scale: f64,
    /// Vertical to horizontal radius ratio of a projected circle.
    pub ellipse_ratio: f64,
}

impl Default for HeuristicParams {
    fn default() -> Self {
        Self {
            frame_height: 720.0,
            pixels_per_meter: 10.0,
            min_scale: 0.5,
            max_scale: 1.5,
            ellipse_ratio: 0.35,
        }
    }
}

/// Projects camera-anchored shapes without a homography.
#[derive(Clone, Copy, Debug)]
pub struct HeuristicProjector {
    params: HeuristicParams,
}

impl HeuristicProjector {
    /// Create a projector.
    pub fn new(params: HeuristicParams) -> Self {
        Self { params }
    }

    /// Perspective scale at image row `y`, interpolated linearly from top to bottom.
    pub fn scale_at(&self, y: f64) -> f64 {
        let p = &self.params;
        let t = if p.frame_height > 0.0 {
            (y / p.frame_height).clamp(0.0, 1.0)
        } else {
            1.0
        };
        p.min_scale + (p.max_scale - p.min_scale) * t
    }

    /// Length in pixels of `meters` at image row `y`.
    pub fn pixels_at(&self, meters: f64, y: f64) -> f64 {
        meters * self.params.pixels_per_meter * self.scale_at(y)
    }

    /// Project a shape whose anchors are camera pixels.
    pub fn project(&self, shape: &Shape, sampling: ShapeSampling) -> ProjectedShape {
        let n = sampling.count();
        match *shape {
            Shape::Circle { center, radius } => {
                let rx = self.pixels_at(radius, center.y);
                ProjectedShape::Polygon {
                    points: circle_samples(center, rx, rx * self.params.ellipse_ratio, n),
                }
            }
            Shape::Rectangle { corner1, corner2 } => ProjectedShape::Polygon {
                points: rectangle_corners(corner1, corner2).to_vec(),
            },
            Shape::Cylinder {
                center,
                base_radius,
                height,
            } => {
                let rx = self.pixels_at(base_radius, center.y);
                let ry = rx * self.params.ellipse_ratio;
                let lift = self.pixels_at(height, center.y);

                let base = circle_samples(center, rx, ry, n);
                let top = circle_samples(Point2::new(center.x, center.y - lift), rx, ry, n);
                let sides = silhouette_sides(&base, &top);
                ProjectedShape::Cylinder { base, top, sides }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_scale_at() {
        let h = HeuristicProjector::new(HeuristicParams::default());
        assert_relative_eq!(h.scale_at(0.0), 0.5);
        assert_relative_eq!(h.scale_at(360.0), 1.0);
        assert_relative_eq!(h.scale_at(720.0), 1.5);
        // clamped outside the frame
        assert_relative_eq!(h.scale_at(-50.0), 0.5);
        assert_relative_eq!(h.scale_at(5000.0), 1.5);
    }

    #[test]
    fn test_circle_lower_is_larger() {
        let h = HeuristicProjector::new(HeuristicParams::default());
        let sampling = ShapeSampling { samples: 4 };
        let width = |y: f64| match h.project(
            &Shape::Circle {
                center: Point2::new(100.0, y),
                radius: 2.0,
            },
            sampling,
        ) {
            ProjectedShape::Polygon { points } => points[0].x - points[2].x,
            _ => unreachable!(),
        };
        assert_relative_eq!(width(0.0), 20.0, epsilon = 1e-9);
        assert_relative_eq!(width(720.0), 60.0, epsilon = 1e-9);
    }

    #[test]
    fn test_ellipse_is_flattened() {
        let h = HeuristicProjector::new(HeuristicParams::default());
        let ProjectedShape::Polygon { points } = h.project(
            &Shape::Circle {
                center: Point2::new(0.0, 360.0),
                radius: 1.0,
            },
            ShapeSampling { samples: 4 },
        ) else {
            panic!("expected a polygon");
        };
        assert_relative_eq!(points[0].x, 10.0, epsilon = 1e-9);
        assert_relative_eq!(points[1].y - 360.0, 3.5, epsilon = 1e-9);
    }

    #[test]
    fn test_cylinder_top_above_base() {
        let h = HeuristicProjector::new(HeuristicParams::default());
        let ProjectedShape::Cylinder { base, top, sides } = h.project(
            &Shape::Cylinder {
                center: Point2::new(300.0, 360.0),
                base_radius: 1.0,
                height: 2.0,
            },
            ShapeSampling::default(),
        ) else {
            panic!("expected a cylinder");
        };
        assert_eq!(base.len(), top.len());
        assert_relative_eq!(base[0].y - top[0].y, 20.0, epsilon = 1e-9);
        assert_eq!(sides.len(), 2);
    }

    #[test]
    fn test_rectangle_passthrough() {
        let h = HeuristicProjector::new(HeuristicParams::default());
        let shape = Shape::Rectangle {
            corner1: Point2::new(10.0, 20.0),
            corner2: Point2::new(50.0, 80.0),
        };
        assert_eq!(
            h.project(&shape, ShapeSampling::default()),
            ProjectedShape::Polygon {
                points: vec![
                    Point2::new(10.0, 20.0),
                    Point2::new(50.0, 20.0),
                    Point2::new(50.0, 80.0),
                    Point2::new(10.0, 80.0),
                ]
            }
        );
    }
}
