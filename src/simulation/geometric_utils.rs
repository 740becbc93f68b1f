//! Geometric utility types and functions for positions, rays and circle tests.

use std::ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign};

use geo::algorithm::Distance;
use geo::{Euclidean, Line, Point};
use serde::{Deserialize, Serialize};

/// A 2D vector used for positions, directions and displacements.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vector2 {
    /// Horizontal component.
    pub x: f32,
    /// Vertical component.
    pub y: f32,
}

impl Vector2 {
    /// The zero vector.
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };

    /// Creates a vector from its components.
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Unit vector pointing along `angle` (radians).
    pub fn from_angle(angle: f32) -> Self {
        Self::new(angle.cos(), angle.sin())
    }

    /// Euclidean length.
    pub fn len(self) -> f32 {
        self.len2().sqrt()
    }

    /// Squared length.
    pub fn len2(self) -> f32 {
        self.x * self.x + self.y * self.y
    }

    /// Dot product.
    pub fn dot(self, other: Self) -> f32 {
        self.x * other.x + self.y * other.y
    }

    /// Distance to another point.
    pub fn distance_to(self, other: Self) -> f32 {
        (self - other).len()
    }

    /// Squared distance to another point.
    pub fn distance2_to(self, other: Self) -> f32 {
        (self - other).len2()
    }

    /// Angle of the vector in radians, measured from the positive x axis.
    pub fn angle(self) -> f32 {
        self.y.atan2(self.x)
    }

    /// Rotates the vector counter-clockwise by `theta` radians.
    pub fn rotate(self, theta: f32) -> Self {
        let (sin, cos) = theta.sin_cos();
        Self::new(self.x * cos - self.y * sin, self.x * sin + self.y * cos)
    }

    /// Returns the unit vector, or `None` for the zero vector.
    pub fn unit(self) -> Option<Self> {
        let len = self.len();
        if len == 0.0 {
            None
        } else {
            Some(self * (1.0 / len))
        }
    }

    /// Rescales the vector to `length`. The zero vector has no direction and is
    /// returned unchanged.
    pub fn set_length(self, length: f32) -> Self {
        match self.unit() {
            Some(unit) => unit * length,
            None => self,
        }
    }
}

impl Add for Vector2 {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl AddAssign for Vector2 {
    fn add_assign(&mut self, rhs: Self) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl Sub for Vector2 {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl SubAssign for Vector2 {
    fn sub_assign(&mut self, rhs: Self) {
        self.x -= rhs.x;
        self.y -= rhs.y;
    }
}

impl Mul<f32> for Vector2 {
    type Output = Self;

    fn mul(self, rhs: f32) -> Self {
        Self::new(self.x * rhs, self.y * rhs)
    }
}

impl Neg for Vector2 {
    type Output = Self;

    fn neg(self) -> Self {
        Self::new(-self.x, -self.y)
    }
}

/// Calculates the minimum distance between a line segment and a circle center.
///
/// # Arguments
///
/// * `line_start` - Starting point of the line segment
/// * `line_end` - Ending point of the line segment
/// * `circle_center` - Center point of the circle
///
/// # Returns
///
/// The minimum Euclidean distance from the circle center to the line segment.
pub fn line_circle_distance(line_start: Vector2, line_end: Vector2, circle_center: Vector2) -> f32 {
    let p = Point::new(circle_center.x, circle_center.y);
    let line = Line::new(
        Point::new(line_start.x, line_start.y),
        Point::new(line_end.x, line_end.y),
    );
    Euclidean.distance(&p, &line)
}

/// Points where the segment `[start, end]` crosses the boundary of a circle.
///
/// Returns zero, one or two points. A segment that starts inside the circle
/// yields only its exit point.
pub fn segment_circle_intersections(
    start: Vector2,
    end: Vector2,
    center: Vector2,
    radius: f32,
) -> Vec<Vector2> {
    if line_circle_distance(start, end, center) > radius {
        return Vec::new();
    }

    let d = end - start;
    let f = start - center;
    let a = d.len2();
    if a == 0.0 {
        return Vec::new();
    }
    let b = 2.0 * f.dot(d);
    let c = f.len2() - radius * radius;
    let discriminant = b * b - 4.0 * a * c;
    if discriminant < 0.0 {
        return Vec::new();
    }

    let root = discriminant.sqrt();
    [(-b - root) / (2.0 * a), (-b + root) / (2.0 * a)]
        .into_iter()
        .filter(|t| (0.0..=1.0).contains(t))
        .map(|t| start + d * t)
        .collect()
}

/// Whether `point` lies strictly inside the circle.
pub fn point_in_circle(point: Vector2, center: Vector2, radius: f32) -> bool {
    point.distance2_to(center) < radius * radius
}

/// Keeps a circle of `radius` inside the `[0, width] x [0, height]` box.
pub fn clamp_to_bounds(pos: Vector2, radius: f32, width: f32, height: f32) -> Vector2 {
    let clamp_axis = |v: f32, extent: f32| {
        if 2.0 * radius >= extent {
            extent / 2.0
        } else {
            v.clamp(radius, extent - radius)
        }
    };
    Vector2::new(clamp_axis(pos.x, width), clamp_axis(pos.y, height))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_length_keeps_zero_vector() {
        assert_eq!(Vector2::ZERO.set_length(3.0), Vector2::ZERO);
        let v = Vector2::new(3.0, 4.0).set_length(10.0);
        assert!((v.len() - 10.0).abs() < 1e-5);
    }

    #[test]
    fn segment_through_circle_hits_twice() {
        let hits = segment_circle_intersections(
            Vector2::new(-5.0, 0.0),
            Vector2::new(5.0, 0.0),
            Vector2::ZERO,
            1.0,
        );
        assert_eq!(hits.len(), 2);
        assert!((hits[0].x + 1.0).abs() < 1e-5);
        assert!((hits[1].x - 1.0).abs() < 1e-5);
    }

    #[test]
    fn segment_missing_circle_has_no_hits() {
        let hits = segment_circle_intersections(
            Vector2::new(-5.0, 2.0),
            Vector2::new(5.0, 2.0),
            Vector2::ZERO,
            1.0,
        );
        assert!(hits.is_empty());
    }

    #[test]
    fn clamp_pulls_circle_inside() {
        let p = clamp_to_bounds(Vector2::new(-3.0, 12.0), 1.0, 10.0, 10.0);
        assert_eq!(p, Vector2::new(1.0, 9.0));
    }
}
