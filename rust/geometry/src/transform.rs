// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Rigid scene placement
//!
//! An imported model is placed once: scaled to metres, rotated so that its up
//! axis matches the engine, centered horizontally and grounded at zero height.
//! Overlays stay in the model's local frame and are parented under a node that
//! carries this transform, so the math here must round-trip exactly.

use crate::axis::UpAxis;
use crate::bounds::Aabb;
use nalgebra::{Matrix4, Point3, UnitQuaternion, Vector3};

/// Position / rotation / scale triple applied to the imported subtree
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SceneTransform {
    pub position: Vector3<f64>,
    pub rotation: UnitQuaternion<f64>,
    pub scale: Vector3<f64>,
}

impl SceneTransform {
    pub fn identity() -> Self {
        Self {
            position: Vector3::zeros(),
            rotation: UnitQuaternion::identity(),
            scale: Vector3::new(1.0, 1.0, 1.0),
        }
    }

    /// Compute the placement for a model.
    ///
    /// `samples` are local-frame vertices. After scaling and rotating them,
    /// the horizontal center of their bounds moves to the origin and their
    /// lowest point moves to height zero along `up`.
    pub fn place(
        rotation: UnitQuaternion<f64>,
        scale: f64,
        samples: &[Point3<f64>],
        up: UpAxis,
    ) -> Self {
        let scale = if scale.is_finite() && scale > 0.0 { scale } else { 1.0 };
        let mut transform = Self {
            position: Vector3::zeros(),
            rotation,
            scale: Vector3::new(scale, scale, scale),
        };

        let placed = Aabb::from_points(samples.iter().map(|p| transform.apply(p)));
        if placed.is_empty() {
            return transform;
        }

        let center = placed.center();
        let (a, b) = up.horizontal();
        let mut offset = Vector3::zeros();
        offset[a] = -center[a];
        offset[b] = -center[b];
        offset[up.index()] = -placed.min[up.index()];
        transform.position = offset;
        transform
    }

    /// Uniform scale factor (x component; the scale is always uniform when built by `place`)
    #[inline]
    pub fn scale_factor(&self) -> f64 {
        self.scale.x
    }

    /// Local -> world
    #[inline]
    pub fn apply(&self, local: &Point3<f64>) -> Point3<f64> {
        let scaled = Point3::new(
            local.x * self.scale.x,
            local.y * self.scale.y,
            local.z * self.scale.z,
        );
        self.rotation * scaled + self.position
    }

    /// World -> local
    #[inline]
    pub fn inverse_apply(&self, world: &Point3<f64>) -> Point3<f64> {
        let unrotated = self.rotation.inverse() * (world - self.position);
        Point3::new(
            unrotated.x / self.scale.x,
            unrotated.y / self.scale.y,
            unrotated.z / self.scale.z,
        )
    }

    /// Local-frame direction that maps onto the given world direction
    #[inline]
    pub fn local_direction(&self, world: &Vector3<f64>) -> Vector3<f64> {
        self.rotation.inverse() * world
    }

    /// 4x4 matrix equal to translation * rotation * scale
    pub fn to_matrix(&self) -> Matrix4<f64> {
        Matrix4::new_translation(&self.position)
            * self.rotation.to_homogeneous()
            * Matrix4::new_nonuniform_scaling(&self.scale)
    }
}

impl Default for SceneTransform {
    fn default() -> Self {
        Self::identity()
    }
}
