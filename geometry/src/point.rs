//! Integer 2-D points.

use serde::{Deserialize, Serialize};

/// A point in two-dimensional space with integer coordinates.
#[derive(
    Debug, Copy, Clone, Default, Hash, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord,
)]
pub struct Point {
    /// The x-coordinate of the point.
    pub x: i64,
    /// The y-coordinate of the point.
    pub y: i64,
}

impl Point {
    /// Creates a new [`Point`] from `(x, y)` coordinates.
    pub const fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }

    /// Returns the origin, `(0, 0)`.
    ///
    /// # Examples
    ///
    /// ```
    /// # use geometry::prelude::*;
    /// assert_eq!(Point::zero(), Point::new(0, 0));
    /// ```
    #[inline]
    pub const fn zero() -> Self {
        Self { x: 0, y: 0 }
    }

    /// Squared Euclidean distance to `other`.
    ///
    /// Kept squared (rather than taking a square root) wherever possible so
    /// that routing cost comparisons stay in exact integer arithmetic; the
    /// few places that need the true distance call [`Point::distance`].
    pub const fn distance_squared(&self, other: Point) -> i64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }

    /// Euclidean distance to `other`.
    pub fn distance(&self, other: Point) -> f64 {
        (self.distance_squared(other) as f64).sqrt()
    }

    /// Manhattan (L1) distance to `other`.
    pub const fn manhattan_distance(&self, other: Point) -> i64 {
        (self.x - other.x).abs() + (self.y - other.y).abs()
    }
}

impl std::ops::Add<Point> for Point {
    type Output = Self;
    fn add(self, rhs: Point) -> Self::Output {
        Self::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl std::ops::AddAssign<Point> for Point {
    fn add_assign(&mut self, rhs: Point) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl std::ops::Sub<Point> for Point {
    type Output = Self;
    fn sub(self, rhs: Point) -> Self::Output {
        Self::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl std::ops::Neg for Point {
    type Output = Self;
    fn neg(self) -> Self::Output {
        Self::new(-self.x, -self.y)
    }
}

impl From<(i64, i64)> for Point {
    fn from(value: (i64, i64)) -> Self {
        Self::new(value.0, value.1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distance_squared_matches_pythagoras() {
        let a = Point::new(0, 0);
        let b = Point::new(3, 4);
        assert_eq!(a.distance_squared(b), 25);
        assert_eq!(a.distance(b), 5.0);
    }

    #[test]
    fn manhattan_distance_is_taxicab() {
        let a = Point::new(-2, 3);
        let b = Point::new(5, -1);
        assert_eq!(a.manhattan_distance(b), 7 + 4);
    }

    #[test]
    fn arithmetic_operators() {
        let a = Point::new(1, 2);
        let b = Point::new(3, -1);
        assert_eq!(a + b, Point::new(4, 1));
        assert_eq!(a - b, Point::new(-2, 3));
        assert_eq!(-a, Point::new(-1, -2));
    }
}
