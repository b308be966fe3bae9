//! A single routing request: endpoints, visibility-graph workspace, and the
//! per-path Dijkstra search that produces a shortest obstacle-avoiding
//! segment chain.

use std::any::Any;
use std::fmt;

use geometry::prelude::*;
use slotmap::{new_key_type, SlotMap};

use crate::error::RouterError;
use crate::obstacle::{Obstacle, ObstacleId};
use crate::vertex::{FxIndexSet, Vertex, VertexId};

/// Bounding-oval heuristic constant for a cold-start visibility-graph
/// search (no prior solution to estimate a tighter threshold from).
pub const OVAL_CONSTANT: f64 = 1.13;
/// Multiplier applied to a path's previous cost ratio when resolving, to
/// leave headroom for a slightly longer route before re-pruning too
/// aggressively.
pub const EPSILON: f64 = 1.04;

new_key_type! {
    /// A stable reference to a [`Path`] stored in a [`Router`](crate::router::Router)'s arena.
    pub struct PathId;
}

/// A tagged visibility-graph work item: a candidate segment between two
/// known vertices, plus up to two obstacles the blocking test for *this*
/// segment should disregard (typically the obstacle(s) whose corners the
/// segment was generated from hugging).
///
/// Every segment this algorithm ever considers connects two vertices that
/// already exist in the arena (a path endpoint or an obstacle corner), so
/// the work item carries [`VertexId`]s rather than raw coordinates — this
/// is the one place the design deliberately diverges from the literal
/// `segment: Segment` field, since geometry is always recoverable from the
/// two ids via the vertex arena and carrying ids also makes linking newly
/// discovered vertices a direct arena mutation instead of a point lookup.
#[derive(Debug, Clone, Copy)]
pub struct WorkItem {
    /// The segment's first endpoint.
    pub from: VertexId,
    /// The segment's second endpoint.
    pub to: VertexId,
    /// An obstacle to ignore when testing this segment for blocking.
    pub exclude_a: Option<ObstacleId>,
    /// A second obstacle to ignore when testing this segment for blocking.
    pub exclude_b: Option<ObstacleId>,
}

impl WorkItem {
    fn segment(&self, vertices: &SlotMap<VertexId, Vertex>) -> Segment {
        Segment::new(vertices[self.from].point(), vertices[self.to].point())
    }
}

/// One routing request: a start vertex, an end vertex, and everything the
/// per-path solve needs to find and remember a shortest obstacle-avoiding
/// route between them.
pub struct Path {
    /// The path's start vertex (always a plain endpoint, no owning obstacle).
    pub start: VertexId,
    /// The path's end vertex.
    pub end: VertexId,
    /// User-mandated intermediate points this path must pass through, in
    /// order. Non-empty only on a router's user-visible parent paths —
    /// router-internal working children route point-to-point.
    pub bend_points: Vec<Point>,
    /// The internal, point-to-point working paths routed between
    /// consecutive bend points (and this path's own endpoints), present
    /// only when `bend_points` is non-empty.
    pub children: Vec<PathId>,
    /// Obstacles discovered while building this path's current visibility
    /// graph.
    pub visible_obstacles: FxIndexSet<ObstacleId>,
    /// Vertices discovered while building this path's current visibility
    /// graph (always includes `start` and `end`).
    pub visible_vertices: FxIndexSet<VertexId>,
    /// Obstacles that contain one of this path's endpoints, excluded from
    /// blocking tests for the duration of the solve.
    pub excluded_obstacles: FxIndexSet<ObstacleId>,
    /// The shortest-path vertex chain found by Dijkstra, start to end.
    pub segments: Vec<VertexId>,
    /// `segments`, further split by corner insertions from the grow/deflect
    /// passes.
    pub grown_segments: Vec<VertexId>,
    /// The final materialized point list. The only field a caller needs.
    pub points: Vec<Point>,
    /// Whether this path needs to be (re)solved on the next `solve()`.
    pub is_dirty: bool,
    /// Whether this path's INNIE/OUTIE labels are flipped from the
    /// convention established at its first labeled vertex.
    pub is_inverted: bool,
    /// Depth-first traversal marker used by labeling and ordering.
    pub is_marked: bool,
    /// Current visibility-graph pruning threshold; `0.0` disables pruning.
    pub threshold: f64,
    /// Ratio of the last successful solve's cost to straight-line
    /// endpoint distance; seeds the next resolve's threshold.
    pub prev_cost_ratio: f64,
    /// A path spawned when labeling detected a second irreconcilable
    /// disagreement along this path.
    pub sub_path: Option<PathId>,
    /// Opaque caller payload, not interpreted by this crate.
    pub data: Option<Box<dyn Any + Send>>,
}

impl fmt::Debug for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Path")
            .field("start", &self.start)
            .field("end", &self.end)
            .field("bend_points", &self.bend_points)
            .field("points", &self.points)
            .field("is_dirty", &self.is_dirty)
            .field("is_inverted", &self.is_inverted)
            .field("sub_path", &self.sub_path)
            .finish_non_exhaustive()
    }
}

impl Path {
    /// Creates a new dirty path between two plain endpoint vertices.
    pub fn new(start: VertexId, end: VertexId) -> Self {
        Self {
            start,
            end,
            bend_points: Vec::new(),
            children: Vec::new(),
            visible_obstacles: FxIndexSet::default(),
            visible_vertices: FxIndexSet::default(),
            excluded_obstacles: FxIndexSet::default(),
            segments: Vec::new(),
            grown_segments: Vec::new(),
            points: Vec::new(),
            is_dirty: true,
            is_inverted: false,
            is_marked: false,
            threshold: 0.0,
            prev_cost_ratio: 0.0,
            sub_path: None,
            data: None,
        }
    }

    /// The path's requested start point.
    pub fn start_point(&self, vertices: &SlotMap<VertexId, Vertex>) -> Point {
        vertices[self.start].orig
    }

    /// The path's requested end point.
    pub fn end_point(&self, vertices: &SlotMap<VertexId, Vertex>) -> Point {
        vertices[self.end].orig
    }

    /// The resolved point list, start to end.
    pub fn points(&self) -> &[Point] {
        &self.points
    }

    /// The user-mandated bend points, in order.
    pub fn bend_points(&self) -> &[Point] {
        &self.bend_points
    }

    /// Replaces the user-mandated bend points and marks this path dirty.
    pub fn set_bend_points(&mut self, bend_points: Vec<Point>) {
        self.bend_points = bend_points;
        self.is_dirty = true;
    }

    /// Finds and records (via Dijkstra over a freshly built visibility
    /// graph) a shortest obstacle-avoiding route between `start` and `end`,
    /// retrying once with pruning disabled if the first attempt fails or
    /// exceeds its threshold.
    pub fn solve(
        &mut self,
        obstacle_order: &[ObstacleId],
        obstacles: &mut SlotMap<ObstacleId, Obstacle>,
        vertices: &mut SlotMap<VertexId, Vertex>,
        spacing: i64,
    ) -> Result<(), RouterError> {
        let straight_line = self.start_point(vertices).distance(self.end_point(vertices));
        self.threshold = if self.prev_cost_ratio > 0.0 {
            self.prev_cost_ratio * EPSILON * straight_line
        } else {
            straight_line * OVAL_CONSTANT
        };

        let mut cost = self.attempt(obstacle_order, obstacles, vertices, spacing)?;

        let over_threshold = match cost {
            Some(c) => self.threshold > 0.0 && c > self.threshold,
            None => true,
        };
        if over_threshold && self.threshold > 0.0 {
            tracing::debug!(path_start = ?self.start, "retrying visibility graph with pruning disabled");
            self.threshold = 0.0;
            cost = self.attempt(obstacle_order, obstacles, vertices, spacing)?;
        }

        match cost {
            Some(c) => {
                self.prev_cost_ratio = if straight_line > 0.0 {
                    c / straight_line
                } else {
                    1.0
                };
                self.grown_segments = self.segments.clone();
                self.is_dirty = false;
            }
            None => {
                tracing::debug!(path_start = ?self.start, "no route found; leaving points empty");
                self.segments.clear();
                self.grown_segments.clear();
                self.points.clear();
                self.is_dirty = false;
            }
        }
        Ok(())
    }

    fn attempt(
        &mut self,
        obstacle_order: &[ObstacleId],
        obstacles: &mut SlotMap<ObstacleId, Obstacle>,
        vertices: &mut SlotMap<VertexId, Vertex>,
        spacing: i64,
    ) -> Result<Option<f64>, RouterError> {
        self.create_visibility_graph(obstacle_order, obstacles, vertices, spacing)?;
        let cost = self.label_graph(vertices);
        if let Some(cost) = cost {
            self.segments = self.reconstruct_chain(vertices);
            Ok(Some(cost))
        } else {
            Ok(None)
        }
    }

    /// Builds this path's visibility graph against the current obstacle
    /// set, populating `visible_obstacles`, `visible_vertices`, and each
    /// visible vertex's `graph.neighbors`.
    pub fn create_visibility_graph(
        &mut self,
        obstacle_order: &[ObstacleId],
        obstacles: &mut SlotMap<ObstacleId, Obstacle>,
        vertices: &mut SlotMap<VertexId, Vertex>,
        spacing: i64,
    ) -> Result<(), RouterError> {
        self.visible_obstacles.clear();
        self.visible_vertices.clear();
        self.visible_vertices.insert(self.start);
        self.visible_vertices.insert(self.end);
        vertices[self.start].reset_graph_scratch();
        vertices[self.end].reset_graph_scratch();

        let start_point = vertices[self.start].point();
        let end_point = vertices[self.end].point();

        let mut stack = vec![WorkItem {
            from: self.start,
            to: self.end,
            exclude_a: None,
            exclude_b: None,
        }];

        while let Some(item) = stack.pop() {
            let segment = item.segment(vertices);
            if self.threshold > 0.0 && !segment.within_oval(start_point, end_point, self.threshold) {
                continue;
            }

            let blocking = first_blocking_obstacle(
                segment,
                obstacle_order,
                obstacles,
                item.exclude_a,
                item.exclude_b,
                spacing,
            );

            match blocking {
                None => {
                    vertices[item.from].graph.neighbors.insert(item.to);
                    vertices[item.to].graph.neighbors.insert(item.from);
                    self.visible_vertices.insert(item.from);
                    self.visible_vertices.insert(item.to);
                }
                Some(oid) => {
                    if self.visible_obstacles.insert(oid) {
                        self.discover_obstacle(
                            oid,
                            start_point,
                            end_point,
                            obstacles,
                            vertices,
                            &mut stack,
                        )?;
                    }
                }
            }
        }
        Ok(())
    }

    fn discover_obstacle(
        &mut self,
        oid: ObstacleId,
        start_point: Point,
        end_point: Point,
        obstacles: &SlotMap<ObstacleId, Obstacle>,
        vertices: &mut SlotMap<VertexId, Vertex>,
        stack: &mut Vec<WorkItem>,
    ) -> Result<(), RouterError> {
        let o = obstacles[oid].clone();
        for vid in o.corner_vertices() {
            if self.visible_vertices.insert(vid) {
                vertices[vid].reset_graph_scratch();
            }
        }

        for &(ca, cb) in PERIMETER_EDGES {
            stack.push(WorkItem {
                from: o.corner_vertex(ca),
                to: o.corner_vertex(cb),
                exclude_a: Some(oid),
                exclude_b: None,
            });
        }

        let others: Vec<ObstacleId> = self
            .visible_obstacles
            .iter()
            .copied()
            .filter(|&x| x != oid)
            .collect();
        for other in others {
            let o2 = &obstacles[other];
            for (ca, cb) in candidate_corner_pairs(&o.rect, &o2.rect) {
                stack.push(WorkItem {
                    from: o.corner_vertex(ca),
                    to: o2.corner_vertex(cb),
                    exclude_a: Some(oid),
                    exclude_b: Some(other),
                });
            }
        }

        for (vid, point) in [(self.start, start_point), (self.end, end_point)] {
            let pos = o.rect.position(point);
            if pos.is_empty() {
                // The endpoint lies at/inside this obstacle's boundary.
                // Genuinely malformed input is excluded from routing
                // entirely by the router before the solve starts; this is
                // the documented degenerate case and is skipped rather
                // than treated as an internal error.
                continue;
            }
            let corners = corners_for_position(pos)?;
            for c in corners {
                stack.push(WorkItem {
                    from: vid,
                    to: o.corner_vertex(c),
                    exclude_a: Some(oid),
                    exclude_b: None,
                });
            }
        }
        Ok(())
    }

    /// Runs Dijkstra over the current visibility graph, relaxing by a
    /// linear scan for the minimum-cost non-permanent vertex rather than a
    /// binary heap, so that equal-cost ties resolve in the same order a
    /// heap-free reference implementation would produce. Returns the
    /// shortest-path cost to `end`, or `None` if some vertex was reached
    /// with no neighbors before the search could complete.
    pub fn label_graph(&mut self, vertices: &mut SlotMap<VertexId, Vertex>) -> Option<f64> {
        for &vid in &self.visible_vertices {
            vertices[vid].reset_graph_scratch();
        }
        vertices[self.start].graph.cost = 0.0;

        let mut current = self.start;
        let mut permanent = 0usize;
        let total = self.visible_vertices.len();

        loop {
            vertices[current].graph.is_permanent = true;
            permanent += 1;
            if current == self.end || permanent == total {
                break;
            }

            let current_point = vertices[current].point();
            let current_cost = vertices[current].graph.cost;
            let neighbors: Vec<VertexId> =
                vertices[current].graph.neighbors.iter().copied().collect();
            if neighbors.is_empty() {
                return None;
            }
            for n in neighbors {
                let candidate = current_cost + current_point.distance(vertices[n].point());
                let nv = &mut vertices[n];
                if !nv.graph.is_permanent && candidate < nv.graph.cost {
                    nv.graph.cost = candidate;
                    nv.graph.label = Some(current);
                }
            }

            let mut next: Option<(VertexId, f64)> = None;
            for &vid in &self.visible_vertices {
                let vv = &vertices[vid];
                if vv.graph.is_permanent || !vv.graph.cost.is_finite() {
                    continue;
                }
                if next.map_or(true, |(_, c)| vv.graph.cost < c) {
                    next = Some((vid, vv.graph.cost));
                }
            }
            match next {
                Some((vid, _)) => current = vid,
                None => return None,
            }
        }
        Some(vertices[self.end].graph.cost)
    }

    fn reconstruct_chain(&self, vertices: &SlotMap<VertexId, Vertex>) -> Vec<VertexId> {
        let mut chain = vec![self.end];
        let mut current = self.end;
        while current != self.start {
            match vertices[current].graph.label {
                Some(prev) => {
                    chain.push(prev);
                    current = prev;
                }
                None => break,
            }
        }
        chain.reverse();
        chain
    }
}

/// Clockwise obstacle perimeter, as corner pairs.
const PERIMETER_EDGES: &[(Corner, Corner)] = &[
    (Corner::TopLeft, Corner::TopRight),
    (Corner::TopRight, Corner::BottomRight),
    (Corner::BottomRight, Corner::BottomLeft),
    (Corner::BottomLeft, Corner::TopLeft),
];

/// Enumerates the visibility-graph closure for a pair of obstacles: every
/// corner pair that could participate in a tight path hugging the pair's
/// outer hull. Every disjoint pair of axis-aligned rectangles falls into
/// exactly one of: overlapping, vertically separated, or horizontally
/// separated.
fn candidate_corner_pairs(o1: &Rect, o2: &Rect) -> Vec<(Corner, Corner)> {
    use Corner::*;
    let mut pairs = Vec::new();
    if o1.intersects_rect(o2) {
        for c in Corner::ALL {
            pairs.push((c, c));
        }
        if o1.left() == o2.left() || o1.right() == o2.right() {
            pairs.push((TopLeft, BottomLeft));
            pairs.push((BottomLeft, TopLeft));
            pairs.push((TopRight, BottomRight));
            pairs.push((BottomRight, TopRight));
        }
        if o1.top() == o2.top() || o1.bottom() == o2.bottom() {
            pairs.push((TopLeft, TopRight));
            pairs.push((TopRight, TopLeft));
            pairs.push((BottomLeft, BottomRight));
            pairs.push((BottomRight, BottomLeft));
        }
    } else if o1.bottom() <= o2.top() {
        pairs.push((BottomLeft, TopLeft));
        pairs.push((BottomRight, TopRight));
        pairs.push((BottomLeft, TopRight));
        pairs.push((BottomRight, TopLeft));
    } else if o2.bottom() <= o1.top() {
        pairs.push((TopLeft, BottomLeft));
        pairs.push((TopRight, BottomRight));
        pairs.push((TopLeft, BottomRight));
        pairs.push((TopRight, BottomLeft));
    } else if o1.right() <= o2.left() {
        pairs.push((TopRight, TopLeft));
        pairs.push((BottomRight, BottomLeft));
        pairs.push((TopRight, BottomLeft));
        pairs.push((BottomRight, TopLeft));
    } else {
        pairs.push((TopLeft, TopRight));
        pairs.push((BottomLeft, BottomRight));
        pairs.push((TopLeft, BottomRight));
        pairs.push((BottomLeft, TopRight));
    }
    pairs
}

/// Maps a vertex's compass position relative to an obstacle to the corners
/// a candidate segment from that vertex should target: a diagonal position
/// targets the two corners along the facing diagonal, a cardinal position
/// targets the two corners on that side, and a position lying on a
/// boundary edge targets that edge's two corners.
fn corners_for_position(pos: Position) -> Result<Vec<Corner>, RouterError> {
    use Corner::*;
    let n = pos.contains(Position::NORTH);
    let s = pos.contains(Position::SOUTH);
    let e = pos.contains(Position::EAST);
    let w = pos.contains(Position::WEST);
    match (n, s, e, w) {
        (true, false, false, true) => Ok(vec![TopLeft, TopRight, BottomLeft]),
        (true, false, true, false) => Ok(vec![TopRight, TopLeft, BottomRight]),
        (false, true, false, true) => Ok(vec![BottomLeft, BottomRight, TopLeft]),
        (false, true, true, false) => Ok(vec![BottomRight, BottomLeft, TopRight]),
        (true, false, false, false) => Ok(vec![TopLeft, TopRight]),
        (false, true, false, false) => Ok(vec![BottomLeft, BottomRight]),
        (false, false, true, false) => Ok(vec![TopRight, BottomRight]),
        (false, false, false, true) => Ok(vec![TopLeft, BottomLeft]),
        _ => Err(RouterError::InternalInvariant(format!(
            "vertex position {pos:?} relative to obstacle matched no visibility-graph case"
        ))),
    }
}

/// Blocking test: a segment is blocked by `o` if it crosses either of `o`'s
/// diagonals (grown by `spacing`), or if either endpoint lies strictly
/// inside `o` — unless the segment shares an (ungrown) corner of `o`, which
/// is why that segment exists in the first place.
fn segment_blocked_by(segment: Segment, o: &Obstacle, spacing: i64) -> bool {
    let corners = o.rect.corners();
    if corners.contains(&segment.a) || corners.contains(&segment.b) {
        return false;
    }
    if o.contains_proper(segment.a) || o.contains_proper(segment.b) {
        return true;
    }
    let grown = o.rect.expand_all(spacing);
    grown
        .diagonals()
        .iter()
        .any(|d| segment.intersects_segment(d))
}

fn first_blocking_obstacle(
    segment: Segment,
    obstacle_order: &[ObstacleId],
    obstacles: &SlotMap<ObstacleId, Obstacle>,
    exclude_a: Option<ObstacleId>,
    exclude_b: Option<ObstacleId>,
    spacing: i64,
) -> Option<ObstacleId> {
    for &oid in obstacle_order {
        if Some(oid) == exclude_a || Some(oid) == exclude_b {
            continue;
        }
        let o = &obstacles[oid];
        if o.exclude {
            continue;
        }
        if segment_blocked_by(segment, o, spacing) {
            return Some(oid);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::obstacle::Obstacle;

    fn make_obstacle(
        obstacles: &mut SlotMap<ObstacleId, Obstacle>,
        vertices: &mut SlotMap<VertexId, Vertex>,
        rect: Rect,
    ) -> ObstacleId {
        obstacles.insert_with_key(|oid| {
            let tl = vertices.insert(Vertex::corner(
                rect.corner(Corner::TopLeft),
                oid,
                Corner::TopLeft.position(),
            ));
            let tr = vertices.insert(Vertex::corner(
                rect.corner(Corner::TopRight),
                oid,
                Corner::TopRight.position(),
            ));
            let bl = vertices.insert(Vertex::corner(
                rect.corner(Corner::BottomLeft),
                oid,
                Corner::BottomLeft.position(),
            ));
            let br = vertices.insert(Vertex::corner(
                rect.corner(Corner::BottomRight),
                oid,
                Corner::BottomRight.position(),
            ));
            Obstacle::new(rect, tl, tr, bl, br)
        })
    }

    #[test]
    fn straight_line_when_unobstructed() {
        let mut obstacles: SlotMap<ObstacleId, Obstacle> = SlotMap::with_key();
        let mut vertices: SlotMap<VertexId, Vertex> = SlotMap::with_key();
        let start = vertices.insert(Vertex::endpoint(Point::new(0, 0)));
        let end = vertices.insert(Vertex::endpoint(Point::new(10, 0)));
        let mut path = Path::new(start, end);
        let order: Vec<ObstacleId> = Vec::new();
        path.solve(&order, &mut obstacles, &mut vertices, 4).unwrap();
        assert_eq!(path.segments, vec![start, end]);
    }

    #[test]
    fn routes_around_a_single_blocking_obstacle() {
        let mut obstacles: SlotMap<ObstacleId, Obstacle> = SlotMap::with_key();
        let mut vertices: SlotMap<VertexId, Vertex> = SlotMap::with_key();
        let oid = make_obstacle(&mut obstacles, &mut vertices, Rect::new(4, -4, 2, 8));
        let start = vertices.insert(Vertex::endpoint(Point::new(0, 0)));
        let end = vertices.insert(Vertex::endpoint(Point::new(10, 0)));
        let mut path = Path::new(start, end);
        let order = vec![oid];
        path.solve(&order, &mut obstacles, &mut vertices, 4).unwrap();
        assert!(path.segments.len() >= 3);
        assert_eq!(*path.segments.first().unwrap(), start);
        assert_eq!(*path.segments.last().unwrap(), end);
    }

    #[test]
    fn corners_for_position_rejects_empty_position() {
        assert!(corners_for_position(Position::NONE).is_err());
    }
}
