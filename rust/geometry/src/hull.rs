// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! 2D convex hull (Andrew's monotone chain)

use nalgebra::Point2;

/// Cross product of (b - a) x (c - a); positive for a left turn
#[inline]
pub fn cross(a: &Point2<f64>, b: &Point2<f64>, c: &Point2<f64>) -> f64 {
    (b.x - a.x) * (c.y - a.y) - (b.y - a.y) * (c.x - a.x)
}

/// Compute the convex hull of a 2D point set.
///
/// Points are sorted by x then y; a point is popped from a chain whenever the
/// last two edges do not make a strict left turn (`cross <= 0`), so collinear
/// and duplicate points collapse. The result is counter-clockwise, open (the
/// first point is not repeated) and every vertex is one of the inputs.
///
/// Fewer than three distinct non-collinear points yield fewer than three
/// vertices; callers decide whether that counts as a polygon.
pub fn convex_hull(points: &[Point2<f64>]) -> Vec<Point2<f64>> {
    let mut pts: Vec<Point2<f64>> = points
        .iter()
        .filter(|p| p.x.is_finite() && p.y.is_finite())
        .cloned()
        .collect();
    pts.sort_by(|a, b| a.x.total_cmp(&b.x).then(a.y.total_cmp(&b.y)));
    pts.dedup();

    if pts.len() < 3 {
        return pts;
    }

    let mut lower: Vec<Point2<f64>> = Vec::with_capacity(pts.len());
    for p in &pts {
        while lower.len() >= 2 && cross(&lower[lower.len() - 2], &lower[lower.len() - 1], p) <= 0.0
        {
            lower.pop();
        }
        lower.push(*p);
    }

    let mut upper: Vec<Point2<f64>> = Vec::with_capacity(pts.len());
    for p in pts.iter().rev() {
        while upper.len() >= 2 && cross(&upper[upper.len() - 2], &upper[upper.len() - 1], p) <= 0.0
        {
            upper.pop();
        }
        upper.push(*p);
    }

    // Shared endpoints appear at the tail of each chain
    lower.pop();
    upper.pop();
    lower.extend(upper);
    lower
}

/// Check whether a point lies inside or on a counter-clockwise convex polygon
pub fn contains_point(hull: &[Point2<f64>], p: &Point2<f64>, tolerance: f64) -> bool {
    if hull.len() < 3 {
        return false;
    }
    (0..hull.len()).all(|i| {
        let a = &hull[i];
        let b = &hull[(i + 1) % hull.len()];
        cross(a, b, p) >= -tolerance
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pts(raw: &[(f64, f64)]) -> Vec<Point2<f64>> {
        raw.iter().map(|&(x, y)| Point2::new(x, y)).collect()
    }

    #[test]
    fn collinear_points_collapse() {
        let hull = convex_hull(&pts(&[(0.0, 0.0), (1.0, 0.0), (2.0, 0.0), (1.0, 1.0)]));
        assert_eq!(hull, pts(&[(0.0, 0.0), (2.0, 0.0), (1.0, 1.0)]));
    }

    #[test]
    fn interior_point_is_dropped() {
        let hull = convex_hull(&pts(&[
            (0.0, 0.0),
            (1.0, 0.0),
            (0.5, 0.5),
            (1.0, 1.0),
            (0.0, 1.0),
        ]));
        assert_eq!(hull.len(), 4);
        assert!(!hull.contains(&Point2::new(0.5, 0.5)));
    }

    #[test]
    fn all_collinear_is_not_a_polygon() {
        let hull = convex_hull(&pts(&[(0.0, 0.0), (1.0, 1.0), (2.0, 2.0), (3.0, 3.0)]));
        assert_eq!(hull.len(), 2);
    }

    #[test]
    fn duplicates_are_ignored() {
        let hull = convex_hull(&pts(&[
            (0.0, 0.0),
            (0.0, 0.0),
            (4.0, 0.0),
            (4.0, 0.0),
            (0.0, 3.0),
        ]));
        assert_eq!(hull.len(), 3);
    }

    #[test]
    fn hull_properties_hold_for_scattered_points() {
        // Deterministic pseudo-random scatter
        let mut seed = 7u64;
        let mut next = || {
            seed = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            ((seed >> 33) as f64 / (1u64 << 31) as f64) * 100.0 - 50.0
        };
        let input: Vec<Point2<f64>> = (0..300).map(|_| Point2::new(next(), next())).collect();
        let hull = convex_hull(&input);

        assert!(hull.len() >= 3);
        // Every hull vertex is an input point
        for v in &hull {
            assert!(input.contains(v));
        }
        // Every input point is inside or on the hull
        for p in &input {
            assert!(contains_point(&hull, p, 1e-9));
        }
        // Strictly counter-clockwise turns all the way round
        for i in 0..hull.len() {
            let a = &hull[i];
            let b = &hull[(i + 1) % hull.len()];
            let c = &hull[(i + 2) % hull.len()];
            assert!(cross(a, b, c) > 0.0);
        }
    }
}
