//! A single-call convenience wrapper around [`Router`] for callers that
//! only need one path solved once.

use geometry::prelude::*;

use crate::error::RouterError;
use crate::router::Router;

/// Solves a single path from `(x1, y1)` to `(x2, y2)`, around `obstacles`
/// (each `(x, y, width, height)`) and through `bendpoints` (in order),
/// using default spacing.
///
/// Returns [`RouterError::InvalidInput`] if any obstacle has non-positive
/// width or height.
pub fn solve_for(
    obstacles: &[(i64, i64, i64, i64)],
    bendpoints: &[(i64, i64)],
    x1: i64,
    y1: i64,
    x2: i64,
    y2: i64,
) -> Result<Vec<Point>, RouterError> {
    let mut router = Router::new();
    for &(x, y, width, height) in obstacles {
        if width <= 0 || height <= 0 {
            return Err(RouterError::InvalidInput(format!(
                "obstacle ({x}, {y}, {width}, {height}) must have positive width and height"
            )));
        }
        router.add_obstacle(Rect::new(x, y, width, height));
    }

    let pid = router.add_path(Point::new(x1, y1), Point::new(x2, y2));
    if !bendpoints.is_empty() {
        router.set_bend_points(pid, bendpoints.iter().map(|&(x, y)| Point::new(x, y)).collect());
    }

    router.solve()?;
    Ok(router.points(pid).to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn straight_line_with_no_obstacles() {
        let points = solve_for(&[], &[], 0, 0, 10, 0).unwrap();
        assert_eq!(points, vec![Point::new(0, 0), Point::new(10, 0)]);
    }

    #[test]
    fn routes_around_a_single_obstacle() {
        let points = solve_for(&[(4, -4, 2, 8)], &[], 0, 0, 10, 0).unwrap();
        assert_eq!(*points.first().unwrap(), Point::new(0, 0));
        assert_eq!(*points.last().unwrap(), Point::new(10, 0));
        assert!(points.len() > 2);
    }

    #[test]
    fn rejects_a_degenerate_obstacle() {
        let err = solve_for(&[(0, 0, 0, 5)], &[], 0, 0, 10, 0).unwrap_err();
        assert!(matches!(err, RouterError::InvalidInput(_)));
    }

    #[test]
    fn routes_through_a_mandatory_bendpoint() {
        let points = solve_for(&[], &[(5, 5)], 0, 0, 10, 0).unwrap();
        assert!(points.contains(&Point::new(5, 5)));
    }
}
