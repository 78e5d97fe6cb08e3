//! Vector math and scalar helpers.
//!
//! Everything here is a pure value type. World space is Y-up; screen space is
//! Y-down. The conversion between the two lives in [`crate::camera`].

#[cfg(test)]
#[path = "geom_test.rs"]
mod geom_test;

use std::ops::{Add, Div, Mul, Neg, Sub};

use serde::{Deserialize, Serialize};

/// A point or displacement in either screen or world space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vector {
    pub x: f64,
    pub y: f64,
}

impl Vector {
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };

    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Clamp each component into the rectangle spanned by `start` and `end`.
    #[must_use]
    pub fn clamped(self, start: Vector, end: Vector) -> Self {
        Self::new(clamp(self.x, start.x, end.x), clamp(self.y, start.y, end.y))
    }

    /// Mirror across the X axis.
    #[must_use]
    pub fn flip_y(self) -> Self {
        Self::new(self.x, -self.y)
    }

    /// Rotate counter-clockwise by `radians`.
    #[must_use]
    pub fn rotated(self, radians: f64) -> Self {
        let (sin, cos) = radians.sin_cos();
        Self::new(self.x * cos - self.y * sin, self.x * sin + self.y * cos)
    }

    #[must_use]
    pub fn length(self) -> f64 {
        self.x.hypot(self.y)
    }

    #[must_use]
    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl Add for Vector {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Vector {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f64> for Vector {
    type Output = Self;

    fn mul(self, rhs: f64) -> Self {
        Self::new(self.x * rhs, self.y * rhs)
    }
}

impl Div<f64> for Vector {
    type Output = Self;

    fn div(self, rhs: f64) -> Self {
        Self::new(self.x / rhs, self.y / rhs)
    }
}

impl Neg for Vector {
    type Output = Self;

    fn neg(self) -> Self {
        Self::new(-self.x, -self.y)
    }
}

/// Axis-aligned rectangle. `start` is the component-wise minimum corner.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub start: Vector,
    pub end: Vector,
}

impl Rect {
    #[must_use]
    pub const fn new(start: Vector, end: Vector) -> Self {
        Self { start, end }
    }

    /// Build a normalized rectangle from two arbitrary corners.
    #[must_use]
    pub fn from_corners(a: Vector, b: Vector) -> Self {
        Self {
            start: Vector::new(a.x.min(b.x), a.y.min(b.y)),
            end: Vector::new(a.x.max(b.x), a.y.max(b.y)),
        }
    }

    /// Rectangle of the given size centered on `center`.
    #[must_use]
    pub fn centered(center: Vector, size: Vector) -> Self {
        let half = size / 2.0;
        Self::new(center - half, center + half)
    }

    #[must_use]
    pub fn width(&self) -> f64 {
        self.end.x - self.start.x
    }

    #[must_use]
    pub fn height(&self) -> f64 {
        self.end.y - self.start.y
    }

    #[must_use]
    pub fn size(&self) -> Vector {
        Vector::new(self.width(), self.height())
    }

    #[must_use]
    pub fn center(&self) -> Vector {
        (self.start + self.end) / 2.0
    }

    /// Inclusive containment test.
    #[must_use]
    pub fn contains(&self, p: Vector) -> bool {
        p.x >= self.start.x && p.x <= self.end.x && p.y >= self.start.y && p.y <= self.end.y
    }

    /// Clamp both corners into `bounds`. A rectangle entirely outside
    /// `bounds` collapses onto its nearest edge.
    #[must_use]
    pub fn clamped(&self, bounds: &Rect) -> Self {
        Self {
            start: self.start.clamped(bounds.start, bounds.end),
            end: self.end.clamped(bounds.start, bounds.end),
        }
    }

    /// Grow the rectangle by `amount` on every side.
    #[must_use]
    pub fn padded(&self, amount: f64) -> Self {
        let pad = Vector::new(amount, amount);
        Self::new(self.start - pad, self.end + pad)
    }
}

/// Clamp `value` into `[min, max]`.
///
/// Unlike [`f64::clamp`] this never panics: an inverted range resolves to
/// `min` and a NaN input resolves to `min`.
#[must_use]
pub fn clamp(value: f64, min: f64, max: f64) -> f64 {
    if value.is_nan() || value < min {
        return min;
    }
    if value > max {
        return max.max(min);
    }
    value
}

/// Wrap `value` into the half-open range `[min, max)`.
///
/// An empty or inverted range, or a non-finite input, resolves to `min`.
#[must_use]
pub fn wrap(value: f64, min: f64, max: f64) -> f64 {
    let range = max - min;
    if !value.is_finite() || range <= 0.0 || !range.is_finite() {
        return min;
    }
    let wrapped = min + (value - min).rem_euclid(range);
    // rem_euclid can round up to `range` for tiny negative offsets.
    if wrapped >= max { min } else { wrapped }
}

/// Centre of the `cell`-sized grid cell containing `p`.
#[must_use]
pub fn snap_to_cell(p: Vector, cell: f64) -> Vector {
    if cell.is_nan() || cell <= 0.0 || !p.is_finite() {
        return p;
    }
    let snap = |v: f64| (v / cell).floor() * cell + cell / 2.0;
    Vector::new(snap(p.x), snap(p.y))
}
