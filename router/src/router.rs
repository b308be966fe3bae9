//! The `Router`: owns every obstacle, vertex, and path, and drives the
//! multi-pass `solve()` pipeline.

use slotmap::SlotMap;

use geometry::prelude::*;

use crate::error::RouterError;
use crate::obstacle::{Obstacle, ObstacleId};
use crate::path::{Path, PathId};
use crate::vertex::{FxIndexSet, Vertex, VertexId, VertexKind};

/// Fixed bound on grow/deflect passes per `solve()` call.
pub const NUM_GROW_PASSES: usize = 2;
/// Default minimum separation between a path and any obstacle corner.
pub const DEFAULT_SPACING: i64 = 4;

/// Owns all obstacles, vertices, and paths, and drives the multi-pass solve
/// described at the crate root.
///
/// Obstacles, vertices, and paths live in `slotmap` arenas so that the
/// naturally cyclic references between them (a vertex points back to its
/// owning obstacle; a path's segments point into the vertex arena; a vertex
/// records which paths touch it) are plain `Copy` keys rather than borrows
/// or reference-counted cells.
pub struct Router {
    obstacles: SlotMap<ObstacleId, Obstacle>,
    /// Insertion-order-stable enumeration of live obstacles; `slotmap`
    /// iteration order is not itself guaranteed stable under removal, and
    /// the visibility-graph closure and first-blocking-obstacle tests are
    /// order-sensitive.
    obstacle_order: FxIndexSet<ObstacleId>,
    vertices: SlotMap<VertexId, Vertex>,
    paths: SlotMap<PathId, Path>,
    user_paths: FxIndexSet<PathId>,
    working_paths: FxIndexSet<PathId>,
    spacing: i64,
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

impl Router {
    /// Creates an empty router with the default spacing.
    pub fn new() -> Self {
        Self {
            obstacles: SlotMap::with_key(),
            obstacle_order: FxIndexSet::default(),
            vertices: SlotMap::with_key(),
            paths: SlotMap::with_key(),
            user_paths: FxIndexSet::default(),
            working_paths: FxIndexSet::default(),
            spacing: DEFAULT_SPACING,
        }
    }

    /// The current default minimum separation.
    pub fn spacing(&self) -> i64 {
        self.spacing
    }

    /// Sets the default minimum separation used wherever an "offset" or
    /// "buffer" is needed.
    pub fn set_spacing(&mut self, spacing: i64) {
        self.spacing = spacing;
    }

    /// Inserts a new obstacle, marking dirty every working path whose
    /// current point list touches it. Returns whether any path was
    /// dirtied.
    pub fn add_obstacle(&mut self, rect: Rect) -> bool {
        let oid = self.insert_obstacle(rect);
        self.obstacle_order.insert(oid);
        let mut dirtied = false;
        let ids: Vec<PathId> = self.working_paths.iter().copied().collect();
        for pid in ids {
            if self.path_touches_rect(pid, rect) {
                self.paths[pid].is_dirty = true;
                dirtied = true;
            }
        }
        tracing::debug!(?rect, dirtied, "obstacle added");
        dirtied
    }

    /// Removes the first-added obstacle whose rectangle equals `rect`
    /// (insertion order, since duplicate rectangles are not rejected),
    /// marking dirty every working path that referenced it.
    pub fn remove_obstacle(&mut self, rect: Rect) -> bool {
        let Some(oid) = self
            .obstacle_order
            .iter()
            .copied()
            .find(|&oid| self.obstacles[oid].rect == rect)
        else {
            return false;
        };

        let corners = self.obstacles[oid].corner_vertices();
        self.obstacle_order.shift_remove(&oid);

        let mut dirtied = false;
        let ids: Vec<PathId> = self.working_paths.iter().copied().collect();
        for pid in ids {
            let touched = self.paths[pid].visible_obstacles.contains(&oid)
                || self.paths[pid].segments.iter().any(|v| corners.contains(v));
            if touched {
                self.paths[pid].is_dirty = true;
                dirtied = true;
            }
        }

        self.obstacles.remove(oid);
        for vid in corners {
            self.vertices.remove(vid);
        }
        tracing::debug!(?rect, dirtied, "obstacle removed");
        dirtied
    }

    /// Equivalent to `remove_obstacle(old)` followed by `add_obstacle(new)`.
    pub fn update_obstacle(&mut self, old: Rect, new: Rect) -> bool {
        let removed = self.remove_obstacle(old);
        let added = self.add_obstacle(new);
        removed || added
    }

    /// Adds a new user-visible path between `start` and `end`, with no
    /// bendpoints. Returns its id.
    pub fn add_path(&mut self, start: Point, end: Point) -> PathId {
        let sv = self.vertices.insert(Vertex::endpoint(start));
        let ev = self.vertices.insert(Vertex::endpoint(end));
        let pid = self.paths.insert(Path::new(sv, ev));
        self.user_paths.insert(pid);
        pid
    }

    /// Removes a user-visible path and any bendpoint-induced children.
    pub fn remove_path(&mut self, id: PathId) {
        if let Some(path) = self.paths.get(id) {
            for child in path.children.clone() {
                self.working_paths.shift_remove(&child);
                self.paths.remove(child);
            }
        }
        self.user_paths.shift_remove(&id);
        self.paths.remove(id);
    }

    /// Replaces `id`'s mandatory bend points and marks it dirty.
    pub fn set_bend_points(&mut self, id: PathId, bend_points: Vec<Point>) {
        if let Some(path) = self.paths.get_mut(id) {
            path.set_bend_points(bend_points);
        }
    }

    /// Moves `id`'s start point and marks it dirty.
    pub fn set_start_point(&mut self, id: PathId, point: Point) {
        let Some(path) = self.paths.get(id) else {
            return;
        };
        let vid = path.start;
        self.vertices[vid].orig = point;
        self.paths[id].is_dirty = true;
    }

    /// Moves `id`'s end point and marks it dirty.
    pub fn set_end_point(&mut self, id: PathId, point: Point) {
        let Some(path) = self.paths.get(id) else {
            return;
        };
        let vid = path.end;
        self.vertices[vid].orig = point;
        self.paths[id].is_dirty = true;
    }

    /// The resolved point list for a user-visible path.
    pub fn points(&self, id: PathId) -> &[Point] {
        self.paths[id].points()
    }

    /// Runs the full multi-pass solve and returns the (stable, insertion
    /// ordered) list of user-visible path ids.
    pub fn solve(&mut self) -> Result<Vec<PathId>, RouterError> {
        let _span = tracing::info_span!("solve").entered();

        self.sync_children();
        self.solve_dirty_paths()?;
        self.count_vertices();
        self.check_vertex_intersections();
        self.grow_obstacles();
        self.label_paths();
        let order = self.order_paths();
        self.bend_paths(&order);
        self.recombine_subpaths();
        self.recombine_children();

        Ok(self.user_paths.iter().copied().collect())
    }

    fn insert_obstacle(&mut self, rect: Rect) -> ObstacleId {
        self.obstacles.insert_with_key(|oid| {
            let tl = self
                .vertices
                .insert(Vertex::corner(rect.corner(Corner::TopLeft), oid, Corner::TopLeft.position()));
            let tr = self.vertices.insert(Vertex::corner(
                rect.corner(Corner::TopRight),
                oid,
                Corner::TopRight.position(),
            ));
            let bl = self.vertices.insert(Vertex::corner(
                rect.corner(Corner::BottomLeft),
                oid,
                Corner::BottomLeft.position(),
            ));
            let br = self.vertices.insert(Vertex::corner(
                rect.corner(Corner::BottomRight),
                oid,
                Corner::BottomRight.position(),
            ));
            Obstacle::new(rect, tl, tr, bl, br)
        })
    }

    fn path_touches_rect(&self, pid: PathId, rect: Rect) -> bool {
        let points = &self.paths[pid].points;
        if points.iter().any(|&p| rect.contains_point(p)) {
            return true;
        }
        points.windows(2).any(|w| {
            let seg = Segment::new(w[0], w[1]);
            rect.diagonals().iter().any(|d| seg.intersects_segment(d))
        })
    }

    /// Rebuilds each user path's internal point-to-point working children
    /// to match its current bend-point list: N bendpoints means N+1
    /// children, routed between consecutive control points.
    fn sync_children(&mut self) {
        let user_ids: Vec<PathId> = self.user_paths.iter().copied().collect();
        for pid in user_ids {
            let path = &self.paths[pid];
            let needed = path.bend_points.len() + 1;
            if path.children.len() == needed && !path.is_dirty {
                continue;
            }

            let old_children = std::mem::take(&mut self.paths[pid].children);
            for c in old_children {
                self.working_paths.shift_remove(&c);
                self.paths.remove(c);
            }

            let start_point = self.vertices[self.paths[pid].start].orig;
            let end_point = self.vertices[self.paths[pid].end].orig;
            let mut control_points = vec![start_point];
            control_points.extend(self.paths[pid].bend_points.iter().copied());
            control_points.push(end_point);

            let vids: Vec<VertexId> = control_points
                .iter()
                .map(|&p| self.vertices.insert(Vertex::endpoint(p)))
                .collect();

            let mut children = Vec::with_capacity(vids.len().saturating_sub(1));
            for w in vids.windows(2) {
                let child_id = self.paths.insert(Path::new(w[0], w[1]));
                self.working_paths.insert(child_id);
                children.push(child_id);
            }
            self.paths[pid].children = children;
            self.paths[pid].is_dirty = false;
        }
    }

    fn solve_dirty_paths(&mut self) -> Result<(), RouterError> {
        let _span = tracing::debug_span!("solve_dirty_paths").entered();
        let order: Vec<ObstacleId> = self.obstacle_order.iter().copied().collect();
        let pids: Vec<PathId> = self.working_paths.iter().copied().collect();

        for pid in pids {
            let start = self.vertices[self.paths[pid].start].orig;
            let end = self.vertices[self.paths[pid].end].orig;

            let mut excluded = Vec::new();
            for &oid in &order {
                if self.obstacles[oid].contains_proper(start) || self.obstacles[oid].contains_proper(end) {
                    self.obstacles[oid].exclude = true;
                    excluded.push(oid);
                }
            }
            self.paths[pid].excluded_obstacles = excluded.iter().copied().collect();

            if self.paths[pid].is_dirty {
                tracing::trace!(?pid, "solving dirty path");
                self.paths[pid].solve(&order, &mut self.obstacles, &mut self.vertices, self.spacing)?;
            }

            for oid in excluded {
                self.obstacles[oid].exclude = false;
            }
        }
        Ok(())
    }

    fn count_vertices(&mut self) {
        let _span = tracing::debug_span!("count_vertices").entered();
        for v in self.vertices.values_mut() {
            v.reset_routing_scratch(self.spacing as f64);
        }
        for &pid in &self.working_paths {
            let segments = &self.paths[pid].segments;
            if segments.len() < 3 {
                continue;
            }
            for &vid in &segments[1..segments.len() - 1] {
                self.vertices[vid].routing.total_count += 1;
            }
        }
    }

    fn check_vertex_intersections(&mut self) {
        let _span = tracing::debug_span!("check_vertex_intersections").entered();
        let order: Vec<ObstacleId> = self.obstacle_order.iter().copied().collect();
        let mut intermediate: FxIndexSet<VertexId> = FxIndexSet::default();
        for &pid in &self.working_paths {
            let segments = &self.paths[pid].segments;
            if segments.len() < 3 {
                continue;
            }
            for &vid in &segments[1..segments.len() - 1] {
                intermediate.insert(vid);
            }
        }

        for vid in intermediate {
            if self.vertices[vid].routing.nearest_obstacle_checked {
                continue;
            }
            let total_count = self.vertices[vid].routing.total_count.max(1);
            let side = 2 * total_count * self.spacing + 1;
            let center = self.vertices[vid].orig;
            let owner = self.vertices[vid].obstacle;
            let (dx, dy) = self.vertices[vid].position_on_obstacle.direction();
            let probe = Rect::new(center.x - side / 2, center.y - side / 2, side, side);

            let mut nearest: Option<i64> = None;
            for &oid in &order {
                if Some(oid) == owner {
                    continue;
                }
                let orect = self.obstacles[oid].rect;
                if !probe.intersects_rect(&orect) {
                    continue;
                }
                let x_dist = match dx.signum() {
                    1 => orect.left() - center.x,
                    -1 => center.x - orect.right(),
                    _ => i64::MAX,
                };
                let y_dist = match dy.signum() {
                    1 => orect.top() - center.y,
                    -1 => center.y - orect.bottom(),
                    _ => i64::MAX,
                };
                let candidate = x_dist.max(y_dist);
                nearest = Some(nearest.map_or(candidate, |n| n.min(candidate)));
            }
            if let Some(n) = nearest {
                self.vertices[vid].apply_nearest_obstacle(n);
            }
        }
    }

    fn grow_obstacles(&mut self) {
        let _span = tracing::debug_span!("grow_obstacles").entered();
        let order: Vec<ObstacleId> = self.obstacle_order.iter().copied().collect();
        for pass in 0..NUM_GROW_PASSES {
            for vertex in self.vertices.values_mut() {
                if vertex.obstacle.is_some() {
                    let amount = vertex.routing.offset * vertex.routing.total_count.max(1) as f64;
                    vertex.grow(amount);
                }
            }

            let mut changed = false;
            let pids: Vec<PathId> = self.working_paths.iter().copied().collect();
            for pid in pids {
                if self.deflect_path(pid, &order) {
                    changed = true;
                }
            }

            for vertex in self.vertices.values_mut() {
                vertex.shrink();
            }

            tracing::trace!(pass, changed, "grow pass complete");
            if !changed {
                break;
            }
        }
    }

    fn deflect_path(&mut self, pid: PathId, order: &[ObstacleId]) -> bool {
        let mut points_now = self.paths[pid].grown_segments.clone();
        if points_now.len() < 2 {
            return false;
        }
        let mut changed = false;
        let guard = self.spacing.max(1);
        let mut i = 0;
        let mut iterations = 0usize;
        while i + 1 < points_now.len() && iterations < 1000 {
            iterations += 1;
            let a = points_now[i];
            let b = points_now[i + 1];
            let seg = Segment::new(self.vertices[a].point(), self.vertices[b].point());

            let mut inserted = None;
            'search: for &oid in order {
                let grown = self.obstacles[oid].rect.expand_all(self.spacing);
                for diag in grown.diagonals() {
                    if !seg.intersects_segment(&diag) {
                        continue;
                    }
                    let candidate = if seg.a.distance(diag.a) < seg.a.distance(diag.b) {
                        diag.a
                    } else {
                        diag.b
                    };
                    let near_a = (candidate.x - seg.a.x).abs() <= guard && (candidate.y - seg.a.y).abs() <= guard;
                    let near_b = (candidate.x - seg.b.x).abs() <= guard && (candidate.y - seg.b.y).abs() <= guard;
                    if near_a || near_b {
                        continue;
                    }
                    let corner_vid = Corner::ALL.into_iter().map(|c| self.obstacles[oid].corner_vertex(c)).find(
                        |&vid| self.vertices[vid].point() == candidate,
                    );
                    if let Some(vid) = corner_vid {
                        inserted = Some(vid);
                        break 'search;
                    }
                }
            }

            match inserted {
                Some(vid) => {
                    points_now.insert(i + 1, vid);
                    changed = true;
                }
                None => i += 1,
            }
        }
        self.paths[pid].grown_segments = points_now;
        changed
    }

    fn label_paths(&mut self) {
        let _span = tracing::debug_span!("label_paths").entered();
        for path in self.paths.values_mut() {
            path.is_marked = false;
        }
        for v in self.vertices.values_mut() {
            v.routing.kind = VertexKind::NotSet;
            v.routing.paths.clear();
        }

        let mut stack: Vec<PathId> = self.working_paths.iter().copied().collect();
        while let Some(pid) = stack.pop() {
            if self.paths[pid].is_marked {
                continue;
            }
            self.label_single_path(pid, &mut stack);
        }
    }

    fn label_single_path(&mut self, pid: PathId, stack: &mut Vec<PathId>) {
        self.paths[pid].is_marked = true;
        let segments = self.paths[pid].grown_segments.clone();
        if segments.len() < 3 {
            return;
        }

        let mut is_inverted = self.paths[pid].is_inverted;
        let mut disagreements = 0usize;
        let mut split_at = None;

        for idx in 1..segments.len() - 1 {
            let prev = segments[idx - 1];
            let vid = segments[idx];
            let Some(obstacle) = self.vertices[vid].obstacle else {
                continue;
            };
            let center = self.obstacles[obstacle].rect.center();
            let incoming = Segment::new(self.vertices[prev].point(), self.vertices[vid].point());
            let raw_kind = match incoming.orientation(center) {
                Sign::Pos => VertexKind::Innie,
                Sign::Neg => VertexKind::Outie,
                Sign::Zero => previous_kind(&self.vertices, &segments[1..idx]),
            };
            let effective = if is_inverted { flip(raw_kind) } else { raw_kind };

            let existing = self.vertices[vid].routing.kind;
            if existing == VertexKind::NotSet {
                self.vertices[vid].routing.kind = effective;
            } else if existing != effective {
                disagreements += 1;
                if disagreements == 1 {
                    is_inverted = !is_inverted;
                    for &prior in &segments[1..idx] {
                        if self.vertices[prior].obstacle.is_some() {
                            let flipped = flip(self.vertices[prior].routing.kind);
                            self.vertices[prior].routing.kind = flipped;
                        }
                    }
                    self.vertices[vid].routing.kind = flip(effective);
                } else {
                    split_at = Some(idx);
                    break;
                }
            }

            let sharers: Vec<PathId> = {
                let rv = &mut self.vertices[vid].routing;
                rv.paths.insert(pid);
                rv.paths.iter().copied().collect()
            };
            for other in sharers {
                if other != pid && !self.paths[other].is_marked {
                    stack.push(other);
                }
            }
        }

        self.paths[pid].is_inverted = is_inverted;
        if let Some(idx) = split_at {
            tracing::trace!(?pid, idx, "splitting path into subpath");
            self.split_into_subpath(pid, idx, stack);
        }
    }

    fn split_into_subpath(&mut self, pid: PathId, idx: usize, stack: &mut Vec<PathId>) {
        let segments = self.paths[pid].grown_segments.clone();
        let split_vertex = segments[idx];
        let end = self.paths[pid].end;

        let mut sub = Path::new(split_vertex, end);
        sub.grown_segments = segments[idx..].to_vec();
        sub.segments = sub.grown_segments.clone();
        sub.is_dirty = false;
        let sub_id = self.paths.insert(sub);
        self.working_paths.insert(sub_id);
        stack.push(sub_id);

        self.paths[pid].grown_segments.truncate(idx + 1);
        self.paths[pid].segments = self.paths[pid].grown_segments.clone();
        self.paths[pid].end = split_vertex;
        self.paths[pid].sub_path = Some(sub_id);
    }

    fn order_paths(&mut self) -> Vec<PathId> {
        let _span = tracing::debug_span!("order_paths").entered();
        self.cache_cosines();
        let mut ordered = Vec::new();
        let mut visited: FxIndexSet<PathId> = FxIndexSet::default();
        let ids: Vec<PathId> = self.working_paths.iter().copied().collect();
        for pid in ids {
            self.visit_for_ordering(pid, &mut visited, &mut ordered);
        }
        ordered
    }

    fn cache_cosines(&mut self) {
        for &pid in &self.working_paths {
            let segments = self.paths[pid].grown_segments.clone();
            if segments.len() < 3 {
                continue;
            }
            for idx in 1..segments.len() - 1 {
                let a = self.vertices[segments[idx - 1]].point();
                let b = self.vertices[segments[idx]].point();
                let c = self.vertices[segments[idx + 1]].point();
                let v1 = (a.x as f64 - b.x as f64, a.y as f64 - b.y as f64);
                let v2 = (c.x as f64 - b.x as f64, c.y as f64 - b.y as f64);
                let mag = (v1.0 * v1.0 + v1.1 * v1.1).sqrt() * (v2.0 * v2.0 + v2.1 * v2.1).sqrt();
                let cos = if mag > 0.0 {
                    (v1.0 * v2.0 + v1.1 * v2.1) / mag
                } else {
                    1.0
                };
                self.vertices[segments[idx]].routing.cached_cosines.insert(pid, cos);
            }
        }
    }

    fn visit_for_ordering(&mut self, pid: PathId, visited: &mut FxIndexSet<PathId>, ordered: &mut Vec<PathId>) {
        if !visited.insert(pid) {
            return;
        }
        let segments = self.paths[pid].grown_segments.clone();
        let is_inverted = self.paths[pid].is_inverted;

        if segments.len() >= 3 {
            for idx in 1..segments.len() - 1 {
                let vid = segments[idx];
                let my_cos = *self.vertices[vid].routing.cached_cosines.get(&pid).unwrap_or(&0.0);
                let sharers: Vec<PathId> = self.vertices[vid].routing.paths.iter().copied().collect();
                for other in sharers {
                    if other == pid || visited.contains(&other) {
                        continue;
                    }
                    let other_cos = *self.vertices[vid].routing.cached_cosines.get(&other).unwrap_or(&0.0);
                    let should_precede = if is_inverted {
                        other_cos > my_cos
                    } else {
                        other_cos < my_cos
                    };
                    if should_precede {
                        self.visit_for_ordering(other, visited, ordered);
                    }
                }
            }
        }
        ordered.push(pid);
    }

    fn bend_paths(&mut self, order: &[PathId]) {
        let _span = tracing::debug_span!("bend_paths").entered();
        for v in self.vertices.values_mut() {
            v.routing.count = 0;
        }

        for &pid in order {
            let segments = self.paths[pid].grown_segments.clone();
            if segments.is_empty() {
                self.paths[pid].points = Vec::new();
                continue;
            }

            let mut points = Vec::with_capacity(segments.len());
            points.push(self.vertices[segments[0]].orig);

            if segments.len() > 2 {
                for &vid in &segments[1..segments.len() - 1] {
                    let modifier = {
                        let rv = &mut self.vertices[vid].routing;
                        match rv.kind {
                            VertexKind::Outie => {
                                let m = rv.total_count as f64;
                                rv.total_count -= 1;
                                m
                            }
                            VertexKind::Innie | VertexKind::NotSet => {
                                rv.count += 1;
                                rv.count as f64
                            }
                        }
                    };
                    let offset = self.vertices[vid].routing.offset;
                    let displacement = self.vertices[vid].displacement(modifier * offset);
                    points.push(self.vertices[vid].orig + displacement);
                }
            }

            points.push(self.vertices[*segments.last().unwrap()].orig);
            self.paths[pid].points = points;
        }
    }

    fn recombine_subpaths(&mut self) {
        let chain_heads: Vec<PathId> = self
            .working_paths
            .iter()
            .copied()
            .filter(|&pid| !self.paths.values().any(|p| p.sub_path == Some(pid)))
            .collect();
        for head in chain_heads {
            self.recombine_chain(head);
        }
    }

    fn recombine_chain(&mut self, pid: PathId) {
        loop {
            let Some(sub_id) = self.paths[pid].sub_path.take() else {
                break;
            };
            let next_sub = self.paths[sub_id].sub_path;
            let sub_points = self.paths[sub_id].points.clone();
            let sub_segments = self.paths[sub_id].segments.clone();
            let sub_grown_segments = self.paths[sub_id].grown_segments.clone();
            let sub_visible: Vec<ObstacleId> = self.paths[sub_id].visible_obstacles.iter().copied().collect();
            let sub_end = self.paths[sub_id].end;

            if !sub_points.is_empty() {
                if !self.paths[pid].points.is_empty() {
                    self.paths[pid].points.pop();
                }
                self.paths[pid].points.extend(sub_points);
            }
            // `segments`/`grown_segments` share the split vertex as the
            // parent's last entry and the subpath's first; drop the
            // duplicate the same way `points` is merged above, so a later
            // non-dirty solve's `bend_paths` walks the whole chain instead
            // of stopping at the old split point.
            if !sub_segments.is_empty() {
                self.paths[pid].segments.pop();
                self.paths[pid].segments.extend(sub_segments);
            }
            if !sub_grown_segments.is_empty() {
                self.paths[pid].grown_segments.pop();
                self.paths[pid].grown_segments.extend(sub_grown_segments);
            }
            for o in sub_visible {
                self.paths[pid].visible_obstacles.insert(o);
            }
            self.paths[pid].end = sub_end;
            self.paths[pid].sub_path = next_sub;

            self.working_paths.shift_remove(&sub_id);
            self.paths.remove(sub_id);
        }
    }

    fn recombine_children(&mut self) {
        let user_ids: Vec<PathId> = self.user_paths.iter().copied().collect();
        for pid in user_ids {
            let children = self.paths[pid].children.clone();
            if children.is_empty() {
                continue;
            }
            let mut points = Vec::new();
            for (i, &cid) in children.iter().enumerate() {
                let mut cp = self.paths[cid].points.clone();
                if cp.is_empty() {
                    points.clear();
                    break;
                }
                if i + 1 < children.len() {
                    cp.pop();
                }
                points.extend(cp);
            }
            self.paths[pid].points = points;
        }
    }
}

fn previous_kind(vertices: &SlotMap<VertexId, Vertex>, chain: &[VertexId]) -> VertexKind {
    for &vid in chain.iter().rev() {
        let kind = vertices[vid].routing.kind;
        if kind != VertexKind::NotSet {
            return kind;
        }
    }
    VertexKind::Innie
}

fn flip(kind: VertexKind) -> VertexKind {
    match kind {
        VertexKind::Innie => VertexKind::Outie,
        VertexKind::Outie => VertexKind::Innie,
        VertexKind::NotSet => VertexKind::NotSet,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_world_straight_line() {
        let mut router = Router::new();
        let pid = router.add_path(Point::new(0, 0), Point::new(10, 0));
        router.solve().unwrap();
        assert_eq!(router.points(pid), &[Point::new(0, 0), Point::new(10, 0)]);
    }

    #[test]
    fn single_obstacle_forces_a_detour() {
        let mut router = Router::new();
        router.add_obstacle(Rect::new(4, -4, 2, 8));
        let pid = router.add_path(Point::new(0, 0), Point::new(10, 0));
        router.solve().unwrap();
        let points = router.points(pid);
        assert_eq!(*points.first().unwrap(), Point::new(0, 0));
        assert_eq!(*points.last().unwrap(), Point::new(10, 0));
        assert!(points.len() >= 3);
    }

    #[test]
    fn bendpoint_is_visited() {
        let mut router = Router::new();
        let pid = router.add_path(Point::new(0, 0), Point::new(10, 0));
        router.set_bend_points(pid, vec![Point::new(5, 5)]);
        router.solve().unwrap();
        let points = router.points(pid);
        assert!(points.contains(&Point::new(5, 5)));
        assert_eq!(*points.first().unwrap(), Point::new(0, 0));
        assert_eq!(*points.last().unwrap(), Point::new(10, 0));
    }

    #[test]
    fn adding_then_removing_an_obstacle_restores_the_original_route() {
        let mut router = Router::new();
        let pid = router.add_path(Point::new(0, 0), Point::new(10, 0));
        router.solve().unwrap();
        let before = router.points(pid).to_vec();

        let rect = Rect::new(4, -4, 2, 8);
        router.add_obstacle(rect);
        router.remove_obstacle(rect);
        router.solve().unwrap();
        let after = router.points(pid).to_vec();
        assert_eq!(before, after);
    }

    #[test]
    fn update_obstacle_with_identical_rect_is_a_no_op() {
        let mut router = Router::new();
        router.add_obstacle(Rect::new(4, -4, 2, 8));
        let pid = router.add_path(Point::new(0, 0), Point::new(10, 0));
        router.solve().unwrap();
        let before = router.points(pid).to_vec();

        router.update_obstacle(Rect::new(4, -4, 2, 8), Rect::new(4, -4, 2, 8));
        router.solve().unwrap();
        assert_eq!(before, router.points(pid).to_vec());
    }

    #[test]
    fn endpoint_inside_obstacle_is_excluded_rather_than_blocking() {
        let mut router = Router::new();
        router.add_obstacle(Rect::new(-5, -5, 20, 20));
        let pid = router.add_path(Point::new(0, 0), Point::new(3, 3));
        router.solve().unwrap();
        let points = router.points(pid);
        assert_eq!(*points.first().unwrap(), Point::new(0, 0));
        assert_eq!(*points.last().unwrap(), Point::new(3, 3));
    }

    #[test]
    fn recombine_chain_restores_the_full_segment_list_after_a_split() {
        let mut router = Router::new();
        let v0 = router.vertices.insert(Vertex::endpoint(Point::new(0, 0)));
        let v1 = router.vertices.insert(Vertex::endpoint(Point::new(5, 0)));
        let v2 = router.vertices.insert(Vertex::endpoint(Point::new(10, 0)));

        let pid = router.paths.insert(Path::new(v0, v2));
        router.paths[pid].segments = vec![v0, v1, v2];
        router.paths[pid].grown_segments = vec![v0, v1, v2];
        router.working_paths.insert(pid);

        router.split_into_subpath(pid, 1, &mut Vec::new());
        let sub_id = router.paths[pid].sub_path.unwrap();
        router.paths[pid].points = vec![Point::new(0, 0), Point::new(5, 0)];
        router.paths[sub_id].points = vec![Point::new(5, 0), Point::new(10, 0)];

        router.recombine_chain(pid);

        assert_eq!(router.paths[pid].end, v2);
        assert_eq!(router.paths[pid].segments, vec![v0, v1, v2]);
        assert_eq!(router.paths[pid].grown_segments, vec![v0, v1, v2]);
        assert_eq!(
            router.paths[pid].points,
            vec![Point::new(0, 0), Point::new(5, 0), Point::new(10, 0)]
        );
    }
}
