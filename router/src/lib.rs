//! An orthogonal, obstacle-avoiding path router.
//!
//! Given a set of rectangular obstacles and a set of paths (each a start
//! point, an end point, and optional mandatory bend points), [`Router::solve`]
//! produces, for every path, a list of axis-aligned segments connecting
//! start to end that avoids every obstacle by at least the router's
//! [`spacing`](Router::spacing), and keeps paths that share a corner or run
//! parallel to one another visually separated by fanning them out along the
//! shared obstacle edge.
//!
//! The core algorithm is a per-path visibility graph (obstacle corners plus
//! the path's own endpoints) searched with Dijkstra, followed by
//! router-wide passes that grow obstacles outward just enough to keep
//! fanned-out paths from overlapping, classify each bend as hugging an
//! obstacle's near side or far side, and finally materialize the fan-out
//! offsets into concrete points.
//!
//! [`solve_for`] is a convenience entry point for callers who only need a
//! single path solved once, without retaining a [`Router`].
#![warn(missing_docs)]

pub mod error;
pub mod facade;
pub mod obstacle;
pub mod path;
pub mod router;
pub mod vertex;

pub use error::RouterError;
pub use facade::solve_for;
pub use obstacle::{Obstacle, ObstacleId};
pub use path::{Path, PathId};
pub use router::Router;
pub use vertex::{Vertex, VertexId, VertexKind};

pub use geometry::prelude::*;
