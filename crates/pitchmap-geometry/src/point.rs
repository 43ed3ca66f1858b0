use serde::{Deserialize, Serialize};
use std::ops::{Add, Mul, Sub};

/// A point on a plane.
///
/// Serialized as a two-element array `[x, y]`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct Point2 {
    /// The x coordinate.
    pub x: f64,
    /// The y coordinate.
    pub y: f64,
}

impl Point2 {
    /// Create a new point.
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean norm of the point seen as a vector from the origin.
    pub fn norm(&self) -> f64 {
        self.x.hypot(self.y)
    }

    /// Euclidean distance to another point.
    pub fn distance(&self, other: &Point2) -> f64 {
        (*self - *other).norm()
    }
}

impl From<[f64; 2]> for Point2 {
    fn from(p: [f64; 2]) -> Self {
        Self::new(p[0], p[1])
    }
}

impl From<Point2> for [f64; 2] {
    fn from(p: Point2) -> Self {
        [p.x, p.y]
    }
}

impl Add for Point2 {
    type Output = Point2;

    fn add(self, rhs: Point2) -> Point2 {
        Point2::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Point2 {
    type Output = Point2;

    fn sub(self, rhs: Point2) -> Point2 {
        Point2::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f64> for Point2 {
    type Output = Point2;

    fn mul(self, k: f64) -> Point2 {
        Point2::new(self.x * k, self.y * k)
    }
}

/// A reference point observed in the video image paired with its known field position.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Correspondence {
    /// Position in the camera image, in pixels.
    pub video: Point2,
    /// Position on the field plane, in field units (meters).
    pub field: Point2,
}

impl Correspondence {
    /// Create a new correspondence.
    pub fn new(video: impl Into<Point2>, field: impl Into<Point2>) -> Self {
        Self {
            video: video.into(),
            field: field.into(),
        }
    }

    /// Split a sequence of correspondences into video points and field points.
    pub fn unzip(correspondences: &[Correspondence]) -> (Vec<Point2>, Vec<Point2>) {
        correspondences.iter().map(|c| (c.video, c.field)).unzip()
    }
}
