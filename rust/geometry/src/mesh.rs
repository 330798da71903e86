// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Overlay volume meshes
//!
//! Buffers are f32 and flat so a renderer can upload them as-is; construction
//! and transforms work in f64.

use crate::bounds::Aabb;
use nalgebra::{Point3, Vector3};

/// Indexed triangle soup with per-vertex normals
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mesh {
    /// Flat xyz triples
    pub positions: Vec<f32>,
    /// Flat xyz triples, one per position
    pub normals: Vec<f32>,
    /// Counter-clockwise triangles
    pub indices: Vec<u32>,
}

fn pack(out: &mut Vec<f32>, x: f64, y: f64, z: f64) {
    out.extend_from_slice(&[x as f32, y as f32, z as f32]);
}

impl Mesh {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-sized for `vertices` vertices and `triangles` triangles
    pub fn with_capacity(vertices: usize, triangles: usize) -> Self {
        Self {
            positions: Vec::with_capacity(vertices * 3),
            normals: Vec::with_capacity(vertices * 3),
            indices: Vec::with_capacity(triangles * 3),
        }
    }

    /// Append a vertex and return its index
    pub fn push_vertex(&mut self, position: &Point3<f64>, normal: &Vector3<f64>) -> u32 {
        let index = self.vertex_count() as u32;
        pack(&mut self.positions, position.x, position.y, position.z);
        pack(&mut self.normals, normal.x, normal.y, normal.z);
        index
    }

    pub fn push_triangle(&mut self, triangle: [u32; 3]) {
        self.indices.extend_from_slice(&triangle);
    }

    /// Planar quad with a shared normal, corners in counter-clockwise order
    pub fn push_quad(&mut self, corners: [Point3<f64>; 4], normal: &Vector3<f64>) {
        let [a, b, c, d] = corners.map(|p| self.push_vertex(&p, normal));
        self.push_triangle([a, b, c]);
        self.push_triangle([a, c, d]);
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len() / 3
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Positions widened back to f64
    pub fn points(&self) -> impl Iterator<Item = Point3<f64>> + '_ {
        self.positions
            .chunks_exact(3)
            .map(|c| Point3::new(c[0].into(), c[1].into(), c[2].into()))
    }

    /// Empty box for an empty mesh
    pub fn bounds(&self) -> Aabb {
        Aabb::from_points(self.points())
    }

    /// Re-express the mesh in another frame. Normals are renormalized after
    /// `direction`; ones that collapse are kept as mapped.
    pub fn map_vertices<P, D>(&mut self, point: P, direction: D)
    where
        P: Fn(&Point3<f64>) -> Point3<f64>,
        D: Fn(&Vector3<f64>) -> Vector3<f64>,
    {
        for c in self.positions.chunks_exact_mut(3) {
            let p = point(&Point3::new(c[0].into(), c[1].into(), c[2].into()));
            c.copy_from_slice(&[p.x as f32, p.y as f32, p.z as f32]);
        }
        for c in self.normals.chunks_exact_mut(3) {
            let n = direction(&Vector3::new(c[0].into(), c[1].into(), c[2].into()));
            let n = n.try_normalize(1e-12).unwrap_or(n);
            c.copy_from_slice(&[n.x as f32, n.y as f32, n.z as f32]);
        }
    }

    /// Normal of vertex `index`
    pub fn normal(&self, index: usize) -> Option<Vector3<f64>> {
        let c = self.normals.get(index * 3..index * 3 + 3)?;
        Some(Vector3::new(c[0].into(), c[1].into(), c[2].into()))
    }
}
