// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Decoded scene subtree
//!
//! Both decoders produce the same shape: a tree of named nodes with local
//! transforms, optional triangle meshes on the nodes, three attribute bags per
//! mesh and a layer table. Coordinates stay in the model's own frame and
//! units; placement happens later.

use crate::attributes::{AttributeBag, AttributeSources};
use crate::format::ModelFormat;
use nalgebra::{Matrix4, Point3};
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

/// Separator between nested layer names in a full layer path
pub const LAYER_PATH_SEPARATOR: &str = "::";

/// One entry of the model's layer table
#[derive(Debug, Clone, PartialEq)]
pub struct Layer {
    pub index: usize,
    /// Full path, nested layers joined with `::`
    pub full_path: String,
}

impl Layer {
    /// Path segments, outermost first, trimmed
    pub fn segments(&self) -> SmallVec<[&str; 4]> {
        self.full_path
            .split(LAYER_PATH_SEPARATOR)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect()
    }

    /// Innermost layer name
    pub fn leaf(&self) -> &str {
        self.segments().last().copied().unwrap_or("")
    }
}

/// Layer table with name interning
#[derive(Debug, Clone, Default)]
pub struct LayerTable {
    layers: Vec<Layer>,
    by_path: FxHashMap<String, usize>,
}

impl LayerTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a layer at an explicit index
    pub fn insert(&mut self, index: usize, full_path: impl Into<String>) {
        let full_path = full_path.into();
        self.by_path.insert(full_path.clone(), index);
        self.layers.push(Layer { index, full_path });
    }

    /// Index of `full_path`, registering it at the next free index if new
    pub fn intern(&mut self, full_path: &str) -> usize {
        if let Some(&index) = self.by_path.get(full_path) {
            return index;
        }
        let index = self.layers.iter().map(|l| l.index + 1).max().unwrap_or(0);
        self.insert(index, full_path);
        index
    }

    pub fn get(&self, index: usize) -> Option<&Layer> {
        self.layers.iter().find(|l| l.index == index)
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Layer> {
        self.layers.iter()
    }
}

/// Triangle mesh attached to a scene node
#[derive(Debug, Clone, Default)]
pub struct SceneMesh {
    /// Flat xyz positions in the node's frame
    pub positions: Vec<f32>,
    pub indices: Vec<u32>,
    /// Attributes set on the object itself
    pub object_attributes: AttributeBag,
    /// Attributes carried by the geometry
    pub geometry_attributes: AttributeBag,
    pub layer_index: Option<usize>,
    /// Authored RGBA base color
    pub color: Option<[f32; 4]>,
}

impl SceneMesh {
    pub fn vertex_count(&self) -> usize {
        self.positions.len() / 3
    }

    pub fn points(&self) -> impl Iterator<Item = Point3<f64>> + '_ {
        self.positions
            .chunks_exact(3)
            .map(|c| Point3::new(c[0] as f64, c[1] as f64, c[2] as f64))
    }
}

#[derive(Debug, Clone)]
pub struct SceneNode {
    pub name: String,
    /// Local transform relative to the parent node
    pub transform: Matrix4<f64>,
    pub attributes: AttributeBag,
    pub mesh: Option<SceneMesh>,
    pub children: Vec<SceneNode>,
}

impl SceneNode {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            transform: Matrix4::identity(),
            attributes: AttributeBag::default(),
            mesh: None,
            children: Vec::new(),
        }
    }

    /// Every mesh in depth-first pre-order, with transforms accumulated from
    /// this node down
    pub fn mesh_instances(&self) -> Vec<MeshInstance<'_>> {
        let mut out = Vec::new();
        self.collect_instances(&Matrix4::identity(), &mut out);
        out
    }

    fn collect_instances<'a>(&'a self, parent: &Matrix4<f64>, out: &mut Vec<MeshInstance<'a>>) {
        let world = parent * self.transform;
        if let Some(mesh) = &self.mesh {
            out.push(MeshInstance {
                ordinal: out.len(),
                node: self,
                mesh,
                transform: world,
            });
        }
        for child in &self.children {
            child.collect_instances(&world, out);
        }
    }
}

/// A mesh together with its accumulated model-frame transform
#[derive(Debug, Clone, Copy)]
pub struct MeshInstance<'a> {
    /// Position in traversal order
    pub ordinal: usize,
    pub node: &'a SceneNode,
    pub mesh: &'a SceneMesh,
    pub transform: Matrix4<f64>,
}

impl<'a> MeshInstance<'a> {
    /// Vertices in the model's local frame
    pub fn points(&self) -> impl Iterator<Item = Point3<f64>> + 'a {
        let transform = self.transform;
        self.mesh.points().map(move |p| transform.transform_point(&p))
    }

    pub fn attribute_sources(&self) -> AttributeSources<'a> {
        AttributeSources {
            object: &self.mesh.object_attributes,
            geometry: &self.mesh.geometry_attributes,
            node: &self.node.attributes,
        }
    }
}

/// Result of a successful load
#[derive(Debug, Clone)]
pub struct LoadedModel {
    pub format: ModelFormat,
    /// Display name of the source (file name or caller-provided label)
    pub source_name: String,
    pub root: SceneNode,
    pub layers: LayerTable,
    /// Model unit in metres
    pub unit_scale: f64,
}

impl LoadedModel {
    pub fn mesh_instances(&self) -> Vec<MeshInstance<'_>> {
        self.root.mesh_instances()
    }

    pub fn mesh_count(&self) -> usize {
        self.mesh_instances().len()
    }

    pub fn vertex_count(&self) -> usize {
        self.mesh_instances()
            .iter()
            .map(|m| m.mesh.vertex_count())
            .sum()
    }

    /// Strided local-frame vertex sample over all meshes, at most `max_samples`
    pub fn sample_points(&self, max_samples: usize) -> Vec<Point3<f64>> {
        let total = self.vertex_count();
        let stride = if max_samples == 0 {
            total.max(1)
        } else {
            total.div_ceil(max_samples).max(1)
        };
        self.mesh_instances()
            .iter()
            .flat_map(|m| m.points())
            .filter(|p| p.x.is_finite() && p.y.is_finite() && p.z.is_finite())
            .step_by(stride)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Vector3;

    fn triangle() -> SceneMesh {
        SceneMesh {
            positions: vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0],
            indices: vec![0, 1, 2],
            ..Default::default()
        }
    }

    #[test]
    fn instances_are_pre_order_with_accumulated_transforms() {
        let mut root = SceneNode::new("root");
        root.transform = Matrix4::new_translation(&Vector3::new(10.0, 0.0, 0.0));
        let mut group = SceneNode::new("group");
        group.transform = Matrix4::new_translation(&Vector3::new(0.0, 5.0, 0.0));
        let mut a = SceneNode::new("a");
        a.mesh = Some(triangle());
        let mut b = SceneNode::new("b");
        b.mesh = Some(triangle());
        group.children.push(a);
        root.children.push(group);
        root.children.push(b);

        let instances = root.mesh_instances();
        assert_eq!(instances.len(), 2);
        assert_eq!(instances[0].node.name, "a");
        assert_eq!(instances[1].ordinal, 1);
        let first = instances[0].points().next().unwrap();
        assert_eq!(first, Point3::new(10.0, 5.0, 0.0));
        let second = instances[1].points().next().unwrap();
        assert_eq!(second, Point3::new(10.0, 0.0, 0.0));
    }

    #[test]
    fn layer_segments_and_interning() {
        let mut table = LayerTable::new();
        table.insert(0, "Default");
        let idx = table.intern("Site:: Buildings ::Tower");
        assert_eq!(idx, 1);
        assert_eq!(table.intern("Site:: Buildings ::Tower"), 1);
        let layer = table.get(1).unwrap();
        assert_eq!(layer.segments().as_slice(), &["Site", "Buildings", "Tower"]);
        assert_eq!(layer.leaf(), "Tower");
    }

    #[test]
    fn sample_points_respects_budget() {
        let mut root = SceneNode::new("root");
        let mut mesh = SceneMesh::default();
        for i in 0..1000 {
            mesh.positions.extend_from_slice(&[i as f32, 0.0, 0.0]);
        }
        root.mesh = Some(mesh);
        let model = LoadedModel {
            format: ModelFormat::Native,
            source_name: "test".into(),
            root,
            layers: LayerTable::new(),
            unit_scale: 1.0,
        };
        assert_eq!(model.sample_points(100).len(), 100);
        assert_eq!(model.sample_points(5000).len(), 1000);
        // 1000 / 300 rounds the stride up to 4
        assert_eq!(model.sample_points(300).len(), 250);
    }

    #[test]
    fn sample_budget_holds_just_below_twice_the_cap() {
        let mut root = SceneNode::new("root");
        let mut mesh = SceneMesh::default();
        for i in 0..9999 {
            mesh.positions.extend_from_slice(&[i as f32, (i % 7) as f32, 0.0]);
        }
        root.mesh = Some(mesh);
        let model = LoadedModel {
            format: ModelFormat::Native,
            source_name: "dense".into(),
            root,
            layers: LayerTable::new(),
            unit_scale: 1.0,
        };
        let samples = model.sample_points(5000);
        assert_eq!(samples.len(), 5000);
        assert_eq!(samples[1], Point3::new(2.0, 2.0, 0.0));
    }
}
