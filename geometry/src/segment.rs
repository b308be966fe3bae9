//! Line segments between two integer points, and the orientation tests the
//! router's visibility-graph and labeling passes are built from.

use serde::{Deserialize, Serialize};

use crate::corner::Corner;
use crate::point::Point;
use crate::rect::Rect;
use crate::sign::Sign;

/// A directed line segment between two points.
#[derive(Debug, Copy, Clone, Serialize, Deserialize, Hash, PartialEq, Eq)]
pub struct Segment {
    /// The segment's start point.
    pub a: Point,
    /// The segment's end point.
    pub b: Point,
}

impl Segment {
    /// Creates a new segment from `a` to `b`.
    pub const fn new(a: Point, b: Point) -> Self {
        Self { a, b }
    }

    /// The reversed segment, from `b` to `a`.
    pub const fn reversed(&self) -> Self {
        Self::new(self.b, self.a)
    }

    /// The squared length of the segment.
    pub const fn length_squared(&self) -> i64 {
        self.a.distance_squared(self.b)
    }

    /// The `z`-component of the cross product of `(self.b - self.a)` and
    /// `(p - self.a)`.
    ///
    /// Positive when `p` is to the left of the directed segment (in a
    /// coordinate system where `y` grows downward, "left" is the
    /// counter-clockwise side), negative when to the right, zero when
    /// collinear.
    pub const fn cross(&self, p: Point) -> i64 {
        let (dx, dy) = (self.b.x - self.a.x, self.b.y - self.a.y);
        let (px, py) = (p.x - self.a.x, p.y - self.a.y);
        dx * py - dy * px
    }

    /// The [`Sign`] of [`Segment::cross`].
    pub const fn orientation(&self, p: Point) -> Sign {
        Sign::of(self.cross(p))
    }

    /// Returns `true` if `p` lies on the (closed) segment, including its
    /// endpoints.
    pub fn contains_point(&self, p: Point) -> bool {
        if self.cross(p) != 0 {
            return false;
        }
        p.x >= self.a.x.min(self.b.x)
            && p.x <= self.a.x.max(self.b.x)
            && p.y >= self.a.y.min(self.b.y)
            && p.y <= self.a.y.max(self.b.y)
    }

    /// Returns `true` iff `self` shares an endpoint with `other`.
    pub fn shares_endpoint(&self, other: &Segment) -> bool {
        self.a == other.a || self.a == other.b || self.b == other.a || self.b == other.b
    }

    /// Returns `true` iff `self` and `other` cross at an interior point of
    /// both segments (the standard orientation-based test), or overlap
    /// collinearly. Segments that only touch at a shared endpoint are *not*
    /// considered intersecting — the router relies on this: a segment that
    /// terminates at an obstacle corner is not "blocked" by that corner.
    pub fn intersects_segment(&self, other: &Segment) -> bool {
        if self.shares_endpoint(other) {
            return false;
        }

        let d1 = other.orientation(self.a);
        let d2 = other.orientation(self.b);
        let d3 = self.orientation(other.a);
        let d4 = self.orientation(other.b);

        if d1 != d2 && d3 != d4 && !d1.is_zero() && !d2.is_zero() && !d3.is_zero() && !d4.is_zero()
        {
            return true;
        }

        // Collinear overlap cases.
        (d1.is_zero() && other.contains_point(self.a))
            || (d2.is_zero() && other.contains_point(self.b))
            || (d3.is_zero() && self.contains_point(other.a))
            || (d4.is_zero() && self.contains_point(other.b))
    }

    /// Returns `true` iff this segment lies entirely within the ellipse
    /// (the "threshold oval") with foci `start` and `end` whose total focal
    /// distance is `threshold`; `threshold <= 0` disables pruning (always
    /// returns `true`).
    pub fn within_oval(&self, start: Point, end: Point, threshold: f64) -> bool {
        if threshold <= 0.0 {
            return true;
        }
        let within = |p: Point| p.distance(start) + p.distance(end) <= threshold;
        within(self.a) && within(self.b)
    }
}

impl Rect {
    /// The two diagonals of this rectangle, from [`Corner::TopLeft`] to
    /// [`Corner::BottomRight`] and from [`Corner::BottomLeft`] to
    /// [`Corner::TopRight`].
    pub fn diagonals(&self) -> [Segment; 2] {
        [
            Segment::new(self.corner(Corner::TopLeft), self.corner(Corner::BottomRight)),
            Segment::new(self.corner(Corner::BottomLeft), self.corner(Corner::TopRight)),
        ]
    }

    /// The four edges of this rectangle, in [`Corner::ALL`] order paired
    /// with their clockwise neighbor (top, right, bottom, left).
    pub fn edges(&self) -> [Segment; 4] {
        let [tl, tr, bl, br] = self.corners();
        [
            Segment::new(tl, tr),
            Segment::new(tr, br),
            Segment::new(br, bl),
            Segment::new(bl, tl),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cross_product_sign_indicates_side() {
        let seg = Segment::new(Point::new(0, 0), Point::new(10, 0));
        assert!(seg.orientation(Point::new(5, 5)).is_pos());
        assert!(seg.orientation(Point::new(5, -5)).is_neg());
        assert!(seg.orientation(Point::new(5, 0)).is_zero());
    }

    #[test]
    fn crossing_segments_intersect() {
        let a = Segment::new(Point::new(0, 0), Point::new(10, 10));
        let b = Segment::new(Point::new(0, 10), Point::new(10, 0));
        assert!(a.intersects_segment(&b));
    }

    #[test]
    fn segments_sharing_only_an_endpoint_do_not_intersect() {
        let a = Segment::new(Point::new(0, 0), Point::new(10, 0));
        let b = Segment::new(Point::new(10, 0), Point::new(10, 10));
        assert!(!a.intersects_segment(&b));
    }

    #[test]
    fn parallel_non_touching_segments_do_not_intersect() {
        let a = Segment::new(Point::new(0, 0), Point::new(10, 0));
        let b = Segment::new(Point::new(0, 5), Point::new(10, 5));
        assert!(!a.intersects_segment(&b));
    }

    #[test]
    fn diagonals_cross_at_center() {
        let rect = Rect::new(0, 0, 10, 10);
        let [d1, d2] = rect.diagonals();
        assert!(d1.intersects_segment(&d2) || d1.contains_point(rect.center()));
    }

    #[test]
    fn threshold_zero_disables_pruning() {
        let seg = Segment::new(Point::new(-1000, -1000), Point::new(1000, 1000));
        assert!(seg.within_oval(Point::new(0, 0), Point::new(1, 1), 0.0));
    }
}
