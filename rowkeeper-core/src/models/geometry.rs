//! Geometric primitives for hit testing
//!
//! Coordinates are in host pixels with the origin at the top-left of the
//! list viewport. Rectangles are half-open: the top and left edges are
//! inside, the bottom and right edges are not.

use serde::{Deserialize, Serialize};

/// A pointer position
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    /// Horizontal coordinate
    pub x: f64,
    /// Vertical coordinate
    pub y: f64,
}

impl Point {
    /// Creates a new point
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point
    #[must_use]
    pub fn distance_to(self, other: Self) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    /// Component-wise difference `self - other`
    #[must_use]
    pub fn offset_from(self, other: Self) -> Self {
        Self::new(self.x - other.x, self.y - other.y)
    }
}

/// A row or header bounding box
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    /// Left edge (inclusive)
    pub x: f64,
    /// Top edge (inclusive)
    pub y: f64,
    /// Width in pixels
    pub width: f64,
    /// Height in pixels
    pub height: f64,
}

impl Rect {
    /// Creates a new rectangle
    #[must_use]
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Top-left corner
    #[must_use]
    pub const fn origin(&self) -> Point {
        Point::new(self.x, self.y)
    }

    /// Right edge (exclusive)
    #[must_use]
    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    /// Bottom edge (exclusive)
    #[must_use]
    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    /// Vertical midpoint, the boundary between "insert before" and "insert after"
    #[must_use]
    pub fn mid_y(&self) -> f64 {
        self.y + self.height / 2.0
    }

    /// Returns true if the point lies inside the rectangle
    #[must_use]
    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.x && point.x < self.right() && self.contains_y(point.y)
    }

    /// Returns true if `y` lies within the rectangle's vertical span
    #[must_use]
    pub fn contains_y(&self, y: f64) -> bool {
        y >= self.y && y < self.bottom()
    }
}
