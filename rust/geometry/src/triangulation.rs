// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Cap triangulation for plan outlines

use crate::hull::cross;
use crate::{Error, Point2, Result};

const TURN_EPSILON: f64 = 1e-10;

/// Every non-collinear corner turns the same way
fn turns_one_way(points: &[Point2<f64>]) -> bool {
    let n = points.len();
    let mut turns = (0..n)
        .map(|i| cross(&points[i], &points[(i + 1) % n], &points[(i + 2) % n]))
        .filter(|t| t.abs() > TURN_EPSILON);
    match turns.next() {
        Some(first) => turns.all(|t| t.signum() == first.signum()),
        None => true,
    }
}

fn earcut(points: &[Point2<f64>]) -> Result<Vec<usize>> {
    let flat: Vec<f64> = points.iter().flat_map(|p| [p.x, p.y]).collect();
    let indices = earcutr::earcut(&flat, &[], 2)
        .map_err(|e| Error::TriangulationError(format!("earcut: {:?}", e)))?;
    if indices.is_empty() {
        return Err(Error::TriangulationError(format!(
            "no ears found in {}-gon",
            points.len()
        )));
    }
    Ok(indices)
}

/// Triangle indices (three per triangle) into `points`, a simple polygon
/// without holes. Convex outlines are fanned from the first vertex.
pub fn triangulate_polygon(points: &[Point2<f64>]) -> Result<Vec<usize>> {
    match points.len() {
        n @ 0..=2 => Err(Error::TriangulationError(format!(
            "{} points do not enclose an area",
            n
        ))),
        3 => Ok(vec![0, 1, 2]),
        n if turns_one_way(points) => Ok((1..n - 1).flat_map(|i| [0, i, i + 1]).collect()),
        _ => earcut(points),
    }
}

/// Shoelace area; counter-clockwise is positive
pub fn signed_area(points: &[Point2<f64>]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }
    let doubled: f64 = points
        .iter()
        .zip(points.iter().cycle().skip(1))
        .map(|(a, b)| a.x * b.y - b.x * a.y)
        .sum();
    doubled / 2.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pts(coords: &[(f64, f64)]) -> Vec<Point2<f64>> {
        coords.iter().map(|&(x, y)| Point2::new(x, y)).collect()
    }

    #[test]
    fn plot_rectangle_is_fanned() {
        let plot = pts(&[(0.0, 0.0), (30.0, 0.0), (30.0, 12.0), (0.0, 12.0)]);
        assert_eq!(triangulate_polygon(&plot).unwrap(), vec![0, 1, 2, 0, 2, 3]);
    }

    #[test]
    fn courtyard_notch_needs_earcut() {
        // U-shaped block: eight corners, six triangles
        let block = pts(&[
            (0.0, 0.0),
            (9.0, 0.0),
            (9.0, 9.0),
            (6.0, 9.0),
            (6.0, 3.0),
            (3.0, 3.0),
            (3.0, 9.0),
            (0.0, 9.0),
        ]);
        let indices = triangulate_polygon(&block).unwrap();
        assert_eq!(indices.len(), 6 * 3);
        assert!(indices.iter().all(|&i| i < block.len()));
    }

    #[test]
    fn segment_cannot_be_triangulated() {
        let err = triangulate_polygon(&pts(&[(0.0, 0.0), (4.0, 0.0)])).unwrap_err();
        assert!(err.to_string().contains("2 points"));
    }

    #[test]
    fn area_sign_follows_winding() {
        let ccw = pts(&[(0.0, 0.0), (5.0, 0.0), (5.0, 2.0), (0.0, 2.0)]);
        assert_eq!(signed_area(&ccw), 10.0);
        let cw: Vec<_> = ccw.into_iter().rev().collect();
        assert_eq!(signed_area(&cw), -10.0);
    }
}
