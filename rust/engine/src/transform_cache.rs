// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Transform cache and placement outputs
//!
//! The placement of a generation is recorded exactly once. Overlays and
//! sibling subsystems (plan-view camera, visibility markers) replay it from
//! here instead of re-deriving it.

use crate::error::{Error, Result};
use serde::{Serialize, Serializer};
use sitecheck_geometry::{Aabb, AxisDecision, BoundingSphere, SceneTransform};

/// Everything a sibling subsystem needs to replay a placement
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub transform: SceneTransform,
    /// World-space bounds of the placed model
    pub bounds: Aabb,
    pub sphere: BoundingSphere,
    pub scale_factor: f64,
    pub axis: AxisDecision,
}

impl Placement {
    pub fn new(transform: SceneTransform, bounds: Aabb, axis: AxisDecision) -> Self {
        Self {
            transform,
            bounds,
            sphere: bounds.bounding_sphere(),
            scale_factor: transform.scale_factor(),
            axis,
        }
    }
}

#[derive(Serialize)]
struct PlacementRepr {
    position: [f64; 3],
    /// Quaternion as (x, y, z, w)
    rotation: [f64; 4],
    scale: [f64; 3],
    scale_factor: f64,
    bounds_min: Option<[f64; 3]>,
    bounds_max: Option<[f64; 3]>,
    sphere_center: [f64; 3],
    sphere_radius: f64,
    axis_method: &'static str,
    source_up: &'static str,
    flatness_ratios: Option<[f64; 3]>,
}

impl Serialize for Placement {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let t = &self.transform;
        let q = t.rotation.coords;
        let empty = self.bounds.is_empty();
        PlacementRepr {
            position: t.position.into(),
            rotation: [q.x, q.y, q.z, q.w],
            scale: t.scale.into(),
            scale_factor: self.scale_factor,
            bounds_min: (!empty).then(|| self.bounds.min.coords.into()),
            bounds_max: (!empty).then(|| self.bounds.max.coords.into()),
            sphere_center: self.sphere.center.coords.into(),
            sphere_radius: self.sphere.radius,
            axis_method: self.axis.method.as_str(),
            source_up: self.axis.source_up.as_str(),
            flatness_ratios: self.axis.ratios,
        }
        .serialize(serializer)
    }
}

/// Write-once placement store, scoped to one model generation
#[derive(Debug, Clone, Default)]
pub struct TransformCache {
    entry: Option<(u64, Placement)>,
}

impl TransformCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the placement for `generation`. A newer generation replaces the
    /// entry; recording twice for the same generation is refused.
    pub fn record(&mut self, generation: u64, placement: Placement) -> Result<()> {
        match &self.entry {
            Some((current, _)) if *current == generation => {
                Err(Error::TransformAlreadyRecorded(generation))
            }
            _ => {
                tracing::debug!(
                    generation,
                    scale = placement.scale_factor,
                    radius = placement.sphere.radius,
                    "recorded scene placement"
                );
                self.entry = Some((generation, placement));
                Ok(())
            }
        }
    }

    pub fn get(&self) -> Option<&Placement> {
        self.entry.as_ref().map(|(_, p)| p)
    }

    /// Placement only if it belongs to `generation`
    pub fn get_for(&self, generation: u64) -> Option<&Placement> {
        self.entry
            .as_ref()
            .filter(|(g, _)| *g == generation)
            .map(|(_, p)| p)
    }

    pub fn generation(&self) -> Option<u64> {
        self.entry.as_ref().map(|(g, _)| *g)
    }

    pub fn clear(&mut self) {
        self.entry = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sitecheck_geometry::{AxisMethod, Point3, UnitQuaternion, UpAxis};

    fn placement(scale: f64) -> Placement {
        let transform = SceneTransform::place(
            UnitQuaternion::identity(),
            scale,
            &[Point3::new(0.0, 0.0, 0.0), Point3::new(10.0, 10.0, 10.0)],
            UpAxis::Y,
        );
        let bounds = Aabb::new(Point3::new(-5.0, 0.0, -5.0), Point3::new(5.0, 10.0, 5.0));
        let axis = AxisDecision {
            rotation: UnitQuaternion::identity(),
            method: AxisMethod::Interchange,
            source_up: UpAxis::Y,
            ratios: None,
        };
        Placement::new(transform, bounds, axis)
    }

    #[test]
    fn records_once_per_generation() {
        let mut cache = TransformCache::new();
        cache.record(1, placement(1.0)).unwrap();
        assert!(matches!(
            cache.record(1, placement(2.0)),
            Err(Error::TransformAlreadyRecorded(1))
        ));
        assert_eq!(cache.get().unwrap().scale_factor, 1.0);

        cache.record(2, placement(2.0)).unwrap();
        assert_eq!(cache.generation(), Some(2));
        assert!(cache.get_for(1).is_none());
        assert_eq!(cache.get_for(2).unwrap().scale_factor, 2.0);
    }

    #[test]
    fn placement_serializes_flat_arrays() {
        let json = serde_json::to_value(placement(0.001)).unwrap();
        assert_eq!(json["scale_factor"], 0.001);
        assert_eq!(json["rotation"].as_array().unwrap().len(), 4);
        assert_eq!(json["axis_method"], "interchange");
        assert_eq!(json["bounds_max"][1], 10.0);
    }
}
