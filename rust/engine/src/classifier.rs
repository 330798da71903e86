// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Mesh classification
//!
//! Walks the loaded scene once per generation and turns every mesh into an
//! [`ImportedMesh`]: resolved name and object id, owning layer and its role,
//! world bounds after placement and a plan-view footprint.

use crate::config::{ReviewConfig, RoleNames};
use crate::keys::MeshKey;
use crate::transform_cache::Placement;
use crate::warnings::ReviewWarning;
use serde::Serialize;
use sitecheck_core::{LayerTable, LoadedModel, ModelFormat, LAYER_PATH_SEPARATOR};
use sitecheck_geometry::{extract_footprint, Aabb, Footprint, Point3, SceneTransform, UpAxis};
use slotmap::{SecondaryMap, SlotMap};

const LAYER_NAME_KEYS: &[&str] = &["layer", "layer_name", "layerName"];

/// Semantic role of a layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LayerRole {
    Building,
    SetbackRestriction,
    SightCorridor,
    Other,
}

impl LayerRole {
    /// Role of a layer path. Segments are compared case-insensitively against
    /// the configured names; the innermost matching segment decides.
    pub fn classify(layer_path: &str, roles: &RoleNames) -> LayerRole {
        let matches = |names: &[String], segment: &str| {
            names.iter().any(|n| n.trim().to_lowercase() == segment)
        };
        for segment in layer_path.rsplit(LAYER_PATH_SEPARATOR) {
            let segment = segment.trim().to_lowercase();
            if segment.is_empty() {
                continue;
            }
            if matches(&roles.building, &segment) {
                return LayerRole::Building;
            }
            if matches(&roles.setback, &segment) {
                return LayerRole::SetbackRestriction;
            }
            if matches(&roles.corridor, &segment) {
                return LayerRole::SightCorridor;
            }
        }
        LayerRole::Other
    }
}

/// A mesh after classification, scoped to one generation
#[derive(Debug, Clone)]
pub struct ImportedMesh {
    /// Position in subtree traversal order
    pub ordinal: usize,
    pub node_name: String,
    pub display_name: Option<String>,
    pub object_id: Option<String>,
    pub layer_index: Option<usize>,
    pub layer_name: Option<String>,
    pub role: LayerRole,
    /// World-space bounds after placement
    pub bounds: Aabb,
    /// Plan-view convex hull in world coordinates
    pub footprint: Option<Footprint>,
    pub vertex_count: usize,
    pub triangle_count: usize,
}

impl ImportedMesh {
    /// Name for reports and warnings
    pub fn label(&self) -> String {
        self.display_name
            .clone()
            .or_else(|| Some(self.node_name.clone()).filter(|n| !n.trim().is_empty()))
            .unwrap_or_else(|| format!("mesh #{}", self.ordinal))
    }

    /// Height of the bounds along `up`, zero when empty
    pub fn height(&self, up: UpAxis) -> f64 {
        if self.bounds.is_empty() {
            0.0
        } else {
            self.bounds.max[up.index()] - self.bounds.min[up.index()]
        }
    }
}

/// Trim and lowercase, the comparison form for names
pub fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Everything derived from one successful import. Replaced wholesale on
/// re-import, never patched.
#[derive(Debug, Clone)]
pub struct ModelGeneration {
    pub id: u64,
    pub source_name: String,
    pub format: ModelFormat,
    pub layers: LayerTable,
    pub up: UpAxis,
    meshes: SlotMap<MeshKey, ImportedMesh>,
    order: Vec<MeshKey>,
    base_colors: SecondaryMap<MeshKey, [f32; 4]>,
    placement: Placement,
}

impl ModelGeneration {
    pub fn get(&self, key: MeshKey) -> Option<&ImportedMesh> {
        self.meshes.get(key)
    }

    /// Meshes in traversal order
    pub fn iter(&self) -> impl Iterator<Item = (MeshKey, &ImportedMesh)> {
        self.order.iter().filter_map(|&k| self.meshes.get(k).map(|m| (k, m)))
    }

    pub fn keys(&self) -> &[MeshKey] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Keys of meshes with `role`, in traversal order
    pub fn keys_with_role(&self, role: LayerRole) -> Vec<MeshKey> {
        self.iter()
            .filter(|(_, m)| m.role == role)
            .map(|(k, _)| k)
            .collect()
    }

    pub fn placement(&self) -> &Placement {
        &self.placement
    }

    pub fn transform(&self) -> &SceneTransform {
        &self.placement.transform
    }

    /// Color the mesh was loaded with
    pub fn base_color(&self, key: MeshKey) -> Option<[f32; 4]> {
        self.base_colors.get(key).copied()
    }

    /// Every recorded original color, in traversal order
    pub fn base_colors(&self) -> Vec<(MeshKey, [f32; 4])> {
        self.order
            .iter()
            .filter_map(|&k| self.base_colors.get(k).map(|c| (k, *c)))
            .collect()
    }

    /// Give up the arena so the next generation can recycle it
    pub fn into_arena(self) -> SlotMap<MeshKey, ImportedMesh> {
        self.meshes
    }

    pub fn role_counts(&self) -> [(LayerRole, usize); 4] {
        let count = |role| self.iter().filter(|(_, m)| m.role == role).count();
        [
            (LayerRole::Building, count(LayerRole::Building)),
            (LayerRole::SetbackRestriction, count(LayerRole::SetbackRestriction)),
            (LayerRole::SightCorridor, count(LayerRole::SightCorridor)),
            (LayerRole::Other, count(LayerRole::Other)),
        ]
    }
}

/// Classifies a loaded model under a fixed placement
pub struct MeshClassifier<'a> {
    config: &'a ReviewConfig,
}

impl<'a> MeshClassifier<'a> {
    pub fn new(config: &'a ReviewConfig) -> Self {
        Self { config }
    }

    /// Build generation `id` in a fresh arena
    pub fn classify(
        &self,
        id: u64,
        model: &LoadedModel,
        placement: Placement,
    ) -> (ModelGeneration, Vec<ReviewWarning>) {
        self.classify_into(SlotMap::with_key(), id, model, placement)
    }

    /// Build generation `id` reusing a previous generation's arena. Clearing
    /// bumps every slot version, so keys handed out earlier stop resolving.
    /// The placement's bounds are recomputed from the classified meshes.
    pub fn classify_into(
        &self,
        mut meshes: SlotMap<MeshKey, ImportedMesh>,
        id: u64,
        model: &LoadedModel,
        placement: Placement,
    ) -> (ModelGeneration, Vec<ReviewWarning>) {
        meshes.clear();
        let up = self.config.engine_up;
        let transform = placement.transform;
        let mut order = Vec::new();
        let mut base_colors = SecondaryMap::new();
        let mut warnings = Vec::new();
        let mut model_bounds = Aabb::empty();

        for instance in model.mesh_instances() {
            let sources = instance.attribute_sources();
            let display_name = sources
                .resolve_text(&self.config.name_keys)
                .or_else(|| Some(instance.node.name.trim().to_string()).filter(|n| !n.is_empty()));
            let object_id = sources.resolve_text(&self.config.object_id_keys);
            let layer_index = instance
                .mesh
                .layer_index
                .or_else(|| sources.resolve_index(&self.config.layer_index_keys));
            let layer_name = layer_index
                .and_then(|i| model.layers.get(i))
                .map(|l| l.full_path.clone())
                .or_else(|| sources.resolve_text(LAYER_NAME_KEYS));
            let role = layer_name
                .as_deref()
                .map(|path| LayerRole::classify(path, &self.config.roles))
                .unwrap_or(LayerRole::Other);

            let world: Vec<Point3<f64>> = instance.points().map(|p| transform.apply(&p)).collect();
            let bounds = Aabb::from_points(world.iter().copied());
            model_bounds = model_bounds.union(&bounds);
            let footprint = extract_footprint(&world, up, self.config.max_footprint_samples);

            let mesh = ImportedMesh {
                ordinal: instance.ordinal,
                node_name: instance.node.name.clone(),
                display_name,
                object_id,
                layer_index,
                layer_name,
                role,
                bounds,
                footprint,
                vertex_count: instance.mesh.vertex_count(),
                triangle_count: instance.mesh.indices.len() / 3,
            };

            if mesh.display_name.is_none() && mesh.layer_name.is_none() && mesh.layer_index.is_none() {
                warnings.push(ReviewWarning::Unclassified { mesh: mesh.label() }.emit());
            }

            let key = meshes.insert(mesh);
            if let Some(color) = instance.mesh.color {
                base_colors.insert(key, color);
            }
            order.push(key);
        }

        let placement = Placement::new(transform, model_bounds, placement.axis);
        tracing::info!(
            generation = id,
            mesh_count = order.len(),
            unclassified = warnings.len(),
            "classified model"
        );

        let generation = ModelGeneration {
            id,
            source_name: model.source_name.clone(),
            format: model.format,
            layers: model.layers.clone(),
            up,
            meshes,
            order,
            base_colors,
            placement,
        };
        (generation, warnings)
    }
}
