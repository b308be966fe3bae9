//! Rectangular obstacles and their four corner vertices.

use geometry::prelude::*;
use slotmap::new_key_type;

use crate::vertex::VertexId;

new_key_type! {
    /// A stable reference to an [`Obstacle`] stored in a [`Router`](crate::router::Router)'s arena.
    pub struct ObstacleId;
}

/// An axis-aligned rectangular obstacle, plus the four [`VertexId`]s of the
/// corner vertices paths are allowed to bend at.
///
/// Obstacles never move or resize in place: [`Router::update_obstacle`](crate::router::Router::update_obstacle)
/// is specified as remove-then-add. The only "growth" an obstacle
/// experiences is the transient, vertex-local inflation applied during
/// [`grow_obstacles`](crate::router::Router::grow_obstacles) passes, which is
/// driven through the corner vertices themselves (see [`Vertex::grow`](crate::vertex::Vertex::grow)).
#[derive(Debug, Clone)]
pub struct Obstacle {
    /// The obstacle's rectangle.
    pub rect: Rect,
    /// The top-left corner vertex.
    pub top_left: VertexId,
    /// The top-right corner vertex.
    pub top_right: VertexId,
    /// The bottom-left corner vertex.
    pub bottom_left: VertexId,
    /// The bottom-right corner vertex.
    pub bottom_right: VertexId,
    /// Transient: set for the duration of a single path's solve to mean
    /// "ignore this obstacle when testing visibility-graph intersections
    /// because it contains that path's own endpoint".
    pub exclude: bool,
}

impl Obstacle {
    /// Creates a new obstacle over `rect`, with corner vertices supplied by
    /// the caller (the [`Router`](crate::router::Router) allocates these in
    /// its vertex arena so they can be shared across paths).
    pub fn new(
        rect: Rect,
        top_left: VertexId,
        top_right: VertexId,
        bottom_left: VertexId,
        bottom_right: VertexId,
    ) -> Self {
        Self {
            rect,
            top_left,
            top_right,
            bottom_left,
            bottom_right,
            exclude: false,
        }
    }

    /// Returns the [`VertexId`] of the corner at `corner`.
    pub fn corner_vertex(&self, corner: Corner) -> VertexId {
        match corner {
            Corner::TopLeft => self.top_left,
            Corner::TopRight => self.top_right,
            Corner::BottomLeft => self.bottom_left,
            Corner::BottomRight => self.bottom_right,
        }
    }

    /// Returns the four corner vertex ids, in [`Corner::ALL`] order.
    pub fn corner_vertices(&self) -> [VertexId; 4] {
        [
            self.top_left,
            self.top_right,
            self.bottom_left,
            self.bottom_right,
        ]
    }

    /// Strict-interior containment: excludes the boundary.
    pub fn contains_proper(&self, p: Point) -> bool {
        self.rect.contains_proper(p)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slotmap::SlotMap;

    #[test]
    fn corner_vertex_lookup_matches_fields() {
        let mut verts: SlotMap<VertexId, ()> = SlotMap::with_key();
        let tl = verts.insert(());
        let tr = verts.insert(());
        let bl = verts.insert(());
        let br = verts.insert(());
        let obstacle = Obstacle::new(Rect::new(0, 0, 10, 10), tl, tr, bl, br);
        assert_eq!(obstacle.corner_vertex(Corner::TopLeft), tl);
        assert_eq!(obstacle.corner_vertex(Corner::BottomRight), br);
        assert_eq!(obstacle.corner_vertices(), [tl, tr, bl, br]);
    }
}
