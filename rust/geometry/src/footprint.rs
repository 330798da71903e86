// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Plan-view footprints
//!
//! A footprint is the convex hull of a mesh's world-space vertices projected
//! onto the horizontal plane. Large meshes are sampled with a fixed stride so
//! that at most `max_samples` vertices are read.

use crate::axis::UpAxis;
use crate::hull::convex_hull;
use crate::triangulation::signed_area;
use nalgebra::{Point2, Point3};

/// Default vertex budget per mesh
pub const DEFAULT_FOOTPRINT_SAMPLES: usize = 2000;

/// Counter-clockwise, open convex polygon with at least three vertices
#[derive(Debug, Clone, PartialEq)]
pub struct Footprint {
    points: Vec<Point2<f64>>,
}

impl Footprint {
    /// Wrap a hull; `None` when fewer than three vertices survived
    pub fn from_hull(points: Vec<Point2<f64>>) -> Option<Self> {
        if points.len() < 3 {
            return None;
        }
        Some(Self { points })
    }

    pub fn points(&self) -> &[Point2<f64>] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn area(&self) -> f64 {
        signed_area(&self.points)
    }

    /// Area-weighted centroid
    pub fn centroid(&self) -> Point2<f64> {
        let n = self.points.len();
        let (mut cx, mut cy, mut twice_area) = (0.0, 0.0, 0.0);
        for i in 0..n {
            let a = self.points[i];
            let b = self.points[(i + 1) % n];
            let w = a.x * b.y - b.x * a.y;
            cx += (a.x + b.x) * w;
            cy += (a.y + b.y) * w;
            twice_area += w;
        }
        if twice_area.abs() <= f64::EPSILON {
            let sum = self
                .points
                .iter()
                .fold(nalgebra::Vector2::zeros(), |acc, p| acc + p.coords);
            return Point2::from(sum / n as f64);
        }
        Point2::new(cx / (3.0 * twice_area), cy / (3.0 * twice_area))
    }
}

/// Sampling stride: `max(1, floor(vertex_count / max_samples))`
#[inline]
pub fn footprint_stride(vertex_count: usize, max_samples: usize) -> usize {
    if max_samples == 0 {
        return vertex_count.max(1);
    }
    (vertex_count / max_samples).max(1)
}

/// Extract the footprint of world-space vertex positions
pub fn extract_footprint(
    positions: &[Point3<f64>],
    up: UpAxis,
    max_samples: usize,
) -> Option<Footprint> {
    let stride = footprint_stride(positions.len(), max_samples);
    let projected: Vec<Point2<f64>> = positions
        .iter()
        .step_by(stride)
        .map(|p| up.project(p))
        .collect();

    Footprint::from_hull(convex_hull(&projected))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn block(x0: f64, z0: f64, w: f64, d: f64, h: f64) -> Vec<Point3<f64>> {
        let mut points = Vec::new();
        for x in [x0, x0 + w] {
            for z in [z0, z0 + d] {
                for y in [0.0, h] {
                    points.push(Point3::new(x, y, z));
                }
            }
        }
        points
    }

    #[test]
    fn box_footprint_is_its_plan_rectangle() {
        let footprint = extract_footprint(&block(0.0, 0.0, 10.0, 4.0, 30.0), UpAxis::Y, 2000).unwrap();
        assert_eq!(footprint.len(), 4);
        assert_relative_eq!(footprint.area(), 40.0, epsilon = 1e-9);
        let c = footprint.centroid();
        // Plan coordinates keep world x first, then z
        assert_relative_eq!(c.x, 5.0, epsilon = 1e-9);
        assert_relative_eq!(c.y, 2.0, epsilon = 1e-9);
    }

    #[test]
    fn y_up_hull_starts_at_lowest_world_x() {
        let footprint = extract_footprint(&block(4.0, -6.0, 3.0, 2.0, 9.0), UpAxis::Y, 2000).unwrap();
        assert_eq!(footprint.points()[0], Point2::new(4.0, -6.0));
        assert_eq!(footprint.points()[1], Point2::new(7.0, -6.0));
    }

    #[test]
    fn vertical_wall_has_no_footprint() {
        let wall = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(5.0, 0.0, 0.0),
            Point3::new(5.0, 3.0, 0.0),
            Point3::new(0.0, 3.0, 0.0),
        ];
        assert!(extract_footprint(&wall, UpAxis::Y, 2000).is_none());
    }

    #[test]
    fn stride_caps_samples() {
        assert_eq!(footprint_stride(10, 2000), 1);
        assert_eq!(footprint_stride(4000, 2000), 2);
        assert_eq!(footprint_stride(4001, 2000), 2);
        assert_eq!(footprint_stride(5999, 2000), 2);
        assert_eq!(footprint_stride(6000, 2000), 3);
    }

    #[test]
    fn footprint_is_counter_clockwise() {
        let footprint = extract_footprint(&block(3.0, -2.0, 7.0, 9.0, 12.0), UpAxis::Z, 2000).unwrap();
        assert_relative_eq!(footprint.area(), 7.0 * 12.0, epsilon = 1e-9);
    }
}
