//! Integer 2-D geometric primitives for orthogonal, obstacle-avoiding routing.
//!
//! Everything here is axis-aligned and integer-coordinate: there is no
//! rotation, no floating-point position, and no support for non-rectangular
//! shapes. That is a deliberate restriction of the domain this crate serves
//! (see the `router` crate), not an oversight.
#![warn(missing_docs)]

extern crate self as geometry;

pub mod contains;
pub mod corner;
pub mod intersect;
pub mod point;
pub mod position;
pub mod prelude;
pub mod rect;
pub mod segment;
pub mod sign;
