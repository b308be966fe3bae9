//! Vertices: obstacle corners and path endpoints, carrying the routing
//! state the multi-pass solve mutates in place.

use std::hash::BuildHasherDefault;

use geometry::prelude::*;
use indexmap::{IndexMap, IndexSet};
use rustc_hash::FxHasher;
use slotmap::new_key_type;

use crate::obstacle::ObstacleId;
use crate::path::PathId;

/// A deterministic, insertion-ordered set keyed with a fast non-cryptographic
/// hasher — used everywhere vertex/path/obstacle iteration order must be
/// stable (see the crate-level determinism notes).
pub type FxIndexSet<T> = IndexSet<T, BuildHasherDefault<FxHasher>>;
/// The analogous insertion-ordered map.
pub type FxIndexMap<K, V> = IndexMap<K, V, BuildHasherDefault<FxHasher>>;

new_key_type! {
    /// A stable reference to a [`Vertex`] stored in a [`Router`](crate::router::Router)'s arena.
    pub struct VertexId;
}

/// Whether a path bends toward ([`VertexKind::Innie`]) or away from
/// ([`VertexKind::Outie`]) the center of the obstacle it corners.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VertexKind {
    /// Not yet labeled this solve.
    #[default]
    NotSet,
    /// The path bends toward the obstacle's center at this vertex.
    Innie,
    /// The path bends away from the obstacle's center at this vertex.
    Outie,
}

/// Per-path, per-solve shortest-path workspace.
///
/// Reset (via [`Vertex::reset_graph_scratch`]) at the start of every
/// individual path's visibility-graph construction, since the same shared
/// corner vertex is reused as Dijkstra scratch space by each path in turn.
#[derive(Debug, Clone)]
pub struct GraphScratch {
    /// Vertices adjacent to this one in the path currently being solved's
    /// visibility graph.
    pub neighbors: FxIndexSet<VertexId>,
    /// Whether this vertex has been finalized by Dijkstra.
    pub is_permanent: bool,
    /// The predecessor vertex in the shortest-path tree, if any.
    pub label: Option<VertexId>,
    /// The accumulated shortest-path cost from the path's start vertex.
    /// `f64::INFINITY` until a neighbor relaxation reaches this vertex.
    pub cost: f64,
}

impl Default for GraphScratch {
    fn default() -> Self {
        Self {
            neighbors: FxIndexSet::default(),
            is_permanent: false,
            label: None,
            cost: f64::INFINITY,
        }
    }
}

/// Cross-path, per-solve routing state: set once per [`Router::solve`](crate::router::Router::solve)
/// call and shared by every path that touches this vertex during that call.
#[derive(Debug, Clone, Default)]
pub struct RoutingScratch {
    /// INNIE/OUTIE classification for the (first) path that labeled this
    /// vertex during this solve.
    pub kind: VertexKind,
    /// Current fan-out usage count while [`bend_paths`](crate::router::Router::bend_paths)
    /// materializes points; incremented for INNIEs, decremented for OUTIEs.
    pub count: i64,
    /// Total number of working paths that bend at this vertex this solve.
    pub total_count: i64,
    /// The per-path fan-out offset at this vertex.
    pub offset: f64,
    /// Distance to the nearest non-owning obstacle, or `0` if not yet
    /// computed this solve.
    pub nearest_obstacle: i64,
    /// Whether [`nearest_obstacle`](Self::nearest_obstacle) has been computed
    /// this solve (distinguishes "computed, found nothing nearby" from
    /// "not yet checked").
    pub nearest_obstacle_checked: bool,
    /// The working paths that bend at this vertex this solve.
    pub paths: FxIndexSet<PathId>,
    /// Cached `cos(angle)` of each path's bend at this vertex, used by
    /// [`order_paths`](crate::router::Router::order_paths).
    pub cached_cosines: FxIndexMap<PathId, f64>,
}

/// A point in the visibility graph: either one of an obstacle's four
/// corners, or a path endpoint.
#[derive(Debug, Clone)]
pub struct Vertex {
    /// The vertex's true, un-displaced coordinates.
    pub orig: Point,
    /// The obstacle this vertex corners, or `None` for a path endpoint.
    pub obstacle: Option<ObstacleId>,
    /// Which corner of [`obstacle`](Self::obstacle) this vertex occupies.
    /// Meaningless (left as [`Position::NONE`]) for path endpoints.
    pub position_on_obstacle: Position,
    /// Per-path Dijkstra scratch state.
    pub graph: GraphScratch,
    /// Cross-path, per-solve routing state.
    pub routing: RoutingScratch,
    grown_by: Option<Point>,
}

impl Vertex {
    /// Creates a path-endpoint vertex (no owning obstacle).
    pub fn endpoint(p: Point) -> Self {
        Self {
            orig: p,
            obstacle: None,
            position_on_obstacle: Position::NONE,
            graph: GraphScratch::default(),
            routing: RoutingScratch::default(),
            grown_by: None,
        }
    }

    /// Creates an obstacle-corner vertex.
    pub fn corner(p: Point, obstacle: ObstacleId, position_on_obstacle: Position) -> Self {
        Self {
            orig: p,
            obstacle: Some(obstacle),
            position_on_obstacle,
            graph: GraphScratch::default(),
            routing: RoutingScratch::default(),
            grown_by: None,
        }
    }

    /// The vertex's current coordinates: its original position, displaced
    /// outward if [`grow`](Self::grow) is currently in effect.
    pub fn point(&self) -> Point {
        self.orig + self.grown_by.unwrap_or(Point::zero())
    }

    /// Temporarily displaces this vertex outward (away from its owning
    /// obstacle's interior) by `amount`, along the direction given by
    /// [`position_on_obstacle`](Self::position_on_obstacle).
    ///
    /// Calling [`shrink`](Self::shrink) afterward restores `(x, y)` exactly
    /// — growing then shrinking is a no-op on position.
    pub fn grow(&mut self, amount: f64) {
        self.grown_by = Some(self.displacement(amount));
    }

    /// Undoes a [`grow`](Self::grow) call.
    pub fn shrink(&mut self) {
        self.grown_by = None;
    }

    /// Returns `true` if this vertex is currently grown.
    pub fn is_grown(&self) -> bool {
        self.grown_by.is_some()
    }

    /// Computes the integer displacement `amount` would produce along this
    /// vertex's compass direction, without applying it. Used both by
    /// [`grow`](Self::grow) and by the final bend-point placement in
    /// [`bend_paths`](crate::router::Router::bend_paths), which displaces a
    /// vertex's *output point* by `modifier * offset` the same way.
    pub fn displacement(&self, amount: f64) -> Point {
        let (dx, dy) = self.position_on_obstacle.direction();
        Point::new(
            (dx as f64 * amount).round() as i64,
            (dy as f64 * amount).round() as i64,
        )
    }

    /// Resets per-path Dijkstra scratch state. Called before each path
    /// (re)builds its visibility graph.
    pub fn reset_graph_scratch(&mut self) {
        self.graph = GraphScratch::default();
    }

    /// Resets cross-path routing scratch state, restoring `offset` to the
    /// router's default spacing. Called once per vertex at the start of a
    /// full [`Router::solve`](crate::router::Router::solve) call.
    pub fn reset_routing_scratch(&mut self, default_spacing: f64) {
        self.routing = RoutingScratch {
            offset: default_spacing,
            ..RoutingScratch::default()
        };
    }

    /// Updates `offset` from a newly-discovered `nearest_obstacle` distance,
    /// per the relation in the data model: `offset = (nearest/2 - 1) / total_count`.
    pub fn apply_nearest_obstacle(&mut self, nearest: i64) {
        self.routing.nearest_obstacle = nearest;
        self.routing.nearest_obstacle_checked = true;
        if nearest > 0 && self.routing.total_count > 0 {
            self.routing.offset =
                (nearest as f64 / 2.0 - 1.0) / self.routing.total_count as f64;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slotmap::SlotMap;

    #[test]
    fn grow_then_shrink_is_a_position_no_op() {
        let mut obstacles: SlotMap<ObstacleId, ()> = SlotMap::with_key();
        let obstacle = obstacles.insert(());
        let mut v = Vertex::corner(
            Point::new(10, 10),
            obstacle,
            Position::NORTH | Position::WEST,
        );
        let before = v.point();
        v.grow(5.0);
        assert_ne!(v.point(), before);
        v.shrink();
        assert_eq!(v.point(), before);
    }

    #[test]
    fn grow_displaces_away_from_obstacle_interior() {
        let mut obstacles: SlotMap<ObstacleId, ()> = SlotMap::with_key();
        let obstacle = obstacles.insert(());
        let mut v = Vertex::corner(
            Point::new(10, 10),
            obstacle,
            Position::NORTH | Position::WEST,
        );
        v.grow(5.0);
        // NORTH | WEST is the top-left corner: growth moves it up and left,
        // i.e. decreases both x and y.
        assert_eq!(v.point(), Point::new(5, 5));
    }

    #[test]
    fn nearest_obstacle_updates_offset() {
        let mut v = Vertex::endpoint(Point::zero());
        v.routing.total_count = 2;
        v.apply_nearest_obstacle(10);
        assert_eq!(v.routing.offset, (10.0 / 2.0 - 1.0) / 2.0);
    }
}
