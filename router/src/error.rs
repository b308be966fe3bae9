//! Error types returned at the edges of this crate.

use thiserror::Error;

/// Errors that can be returned while configuring or solving a routing
/// problem.
///
/// Geometric infeasibility (no route found, a found route exceeding the
/// pruning threshold) is **not** an error: it is represented by an empty
/// point list. These variants are reserved for malformed caller input and
/// for internal invariant violations — see the crate's error handling
/// design notes for the full taxonomy.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RouterError {
    /// The caller supplied geometrically malformed input: a rectangle with
    /// non-positive width/height, or a tuple of the wrong arity.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A vertex's position relative to an obstacle fell through every case
    /// the visibility-graph closure rules cover. This indicates a bug in
    /// this crate, or input so pathological (e.g. zero-area obstacles) that
    /// the geometric case analysis no longer applies.
    #[error("internal invariant violated: {0}")]
    InternalInvariant(String),
}
