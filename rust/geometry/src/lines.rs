// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Highlight line sets

use nalgebra::Point3;

/// Disjoint line segments packed into one buffer (two vertices per segment)
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LineSet {
    /// Segment endpoints (x, y, z), pairwise
    pub positions: Vec<f32>,
}

impl LineSet {
    /// Build one combined line set; `None` when no finite segment remains
    pub fn from_segments(segments: &[[Point3<f64>; 2]]) -> Option<Self> {
        let mut positions = Vec::with_capacity(segments.len() * 6);
        for [a, b] in segments {
            let finite = [a, b]
                .iter()
                .all(|p| p.x.is_finite() && p.y.is_finite() && p.z.is_finite());
            if !finite {
                continue;
            }
            for p in [a, b] {
                positions.push(p.x as f32);
                positions.push(p.y as f32);
                positions.push(p.z as f32);
            }
        }

        if positions.is_empty() {
            return None;
        }
        Some(Self { positions })
    }

    /// Closed outline as consecutive segments (last point joins the first)
    pub fn from_loop(points: &[Point3<f64>]) -> Option<Self> {
        if points.len() < 2 {
            return None;
        }
        let segments: Vec<[Point3<f64>; 2]> = (0..points.len())
            .map(|i| [points[i], points[(i + 1) % points.len()]])
            .collect();
        Self::from_segments(&segments)
    }

    /// Open polyline as consecutive segments
    pub fn from_polyline(points: &[Point3<f64>]) -> Option<Self> {
        let segments: Vec<[Point3<f64>; 2]> = points.windows(2).map(|w| [w[0], w[1]]).collect();
        Self::from_segments(&segments)
    }

    /// Append another set
    pub fn extend(&mut self, other: &LineSet) {
        self.positions.extend_from_slice(&other.positions);
    }

    /// Move every endpoint through `f`
    pub fn map_points(&mut self, f: impl Fn(&Point3<f64>) -> Point3<f64>) {
        for c in self.positions.chunks_exact_mut(3) {
            let p = f(&Point3::new(c[0].into(), c[1].into(), c[2].into()));
            c.copy_from_slice(&[p.x as f32, p.y as f32, p.z as f32]);
        }
    }

    pub fn segment_count(&self) -> usize {
        self.positions.len() / 6
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}
