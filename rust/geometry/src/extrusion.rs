// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Extrusion of violation outlines into solid volumes

use crate::error::{Error, Result};
use crate::mesh::Mesh;
use crate::triangulation::{signed_area, triangulate_polygon};
use nalgebra::{Point2, Point3, Unit, Vector3};

const POINT_EPSILON: f64 = 1e-9;

/// Drop a duplicated closing point and consecutive duplicates
pub fn clean_polygon(points: &[Point3<f64>]) -> Vec<Point3<f64>> {
    let mut cleaned: Vec<Point3<f64>> = Vec::with_capacity(points.len());
    for p in points {
        if !(p.x.is_finite() && p.y.is_finite() && p.z.is_finite()) {
            continue;
        }
        if cleaned
            .last()
            .map_or(true, |last| (last - p).norm() > POINT_EPSILON)
        {
            cleaned.push(*p);
        }
    }
    if cleaned.len() > 1 && (cleaned[0] - cleaned[cleaned.len() - 1]).norm() <= POINT_EPSILON {
        cleaned.pop();
    }
    cleaned
}

/// Orthonormal plan basis (u, v) with u x v = up. Outlines are re-wound to be
/// counter-clockwise in this frame, so plan polygons of either handedness
/// (Y-up footprints are clockwise seen from above) extrude the same way.
fn plan_basis(up: &Unit<Vector3<f64>>) -> (Vector3<f64>, Vector3<f64>) {
    let helper = if up.x.abs() < 0.9 { Vector3::x() } else { Vector3::y() };
    let v = up.cross(&helper).normalize();
    let u = v.cross(up).normalize();
    (u, v)
}

/// Extrude a polygon upward by `height`.
///
/// The polygon may be closed (first point repeated) and need not be planar:
/// every vertex is projected onto the plane through its lowest point
/// perpendicular to `up`, and the solid spans from that plane to
/// `height` above it.
pub fn extrude_polygon(
    points: &[Point3<f64>],
    height: f64,
    up: &Unit<Vector3<f64>>,
) -> Result<Mesh> {
    if !(height.is_finite() && height > 0.0) {
        return Err(Error::InvalidExtrusion(format!(
            "height must be positive, got {}",
            height
        )));
    }

    let cleaned = clean_polygon(points);
    if cleaned.len() < 3 {
        return Err(Error::DegenerateGeometry(format!(
            "polygon has {} distinct points",
            cleaned.len()
        )));
    }

    let (u, v) = plan_basis(up);
    let base = cleaned
        .iter()
        .map(|p| p.coords.dot(up))
        .fold(f64::INFINITY, f64::min);

    let mut outline: Vec<Point2<f64>> = cleaned
        .iter()
        .map(|p| Point2::new(p.coords.dot(&u), p.coords.dot(&v)))
        .collect();
    let area = signed_area(&outline);
    if area.abs() <= POINT_EPSILON {
        return Err(Error::DegenerateGeometry("polygon has zero area".to_string()));
    }
    if area < 0.0 {
        outline.reverse();
    }

    let triangles = triangulate_polygon(&outline)?;
    let lift = |p: &Point2<f64>, h: f64| Point3::from(u * p.x + v * p.y + up.into_inner() * h);

    let n = outline.len();
    let top = base + height;
    let mut mesh = Mesh::with_capacity(n * 6, triangles.len() / 3 * 2 + n * 2);

    // Bottom cap faces down, so its triangles flip
    for (level, normal, flip) in [(base, -up.into_inner(), true), (top, up.into_inner(), false)] {
        let offset = mesh.vertex_count() as u32;
        for p in &outline {
            mesh.push_vertex(&lift(p, level), &normal);
        }
        for tri in triangles.chunks_exact(3) {
            let [a, b, c] = [tri[0], tri[1], tri[2]].map(|i| offset + i as u32);
            mesh.push_triangle(if flip { [a, c, b] } else { [a, b, c] });
        }
    }

    // Walls face outward for a counter-clockwise outline
    for (p0, p1) in outline.iter().zip(outline.iter().cycle().skip(1)) {
        let edge = u * (p1.x - p0.x) + v * (p1.y - p0.y);
        let Some(normal) = edge.cross(up).try_normalize(1e-12) else {
            continue;
        };
        mesh.push_quad(
            [lift(p0, base), lift(p1, base), lift(p1, top), lift(p0, top)],
            &normal,
        );
    }

    Ok(mesh)
}
