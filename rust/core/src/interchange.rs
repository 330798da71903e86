// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Interchange-format (glTF / GLB) decoding
//!
//! Node and mesh `extras` become attribute bags. An `extras.layer` string on a
//! node is interned into the layer table so interchange models can be
//! classified by layer the same way native ones are.

use crate::attributes::AttributeBag;
use crate::error::{Error, Result};
use crate::format::ModelFormat;
use crate::scene::{LayerTable, LoadedModel, SceneMesh, SceneNode};
use gltf::mesh::Mode;
use nalgebra::Matrix4;

const LAYER_KEYS: &[&str] = &["layer", "layerName", "layer_name"];

/// Decode a `.gltf` (with embedded buffers) or `.glb` payload
pub fn decode_gltf(source_name: &str, bytes: &[u8]) -> Result<LoadedModel> {
    let (document, buffers, _images) = gltf::import_slice(bytes)?;

    let scene = document
        .default_scene()
        .or_else(|| document.scenes().next())
        .ok_or(Error::EmptyModel)?;

    let mut layers = LayerTable::new();
    let mut root = SceneNode::new(scene.name().unwrap_or(source_name));
    root.attributes = extras_bag(scene.extras());
    for node in scene.nodes() {
        root.children.push(convert_node(&node, &buffers, &mut layers)?);
    }

    tracing::debug!(
        source = source_name,
        nodes = document.nodes().count(),
        layers = layers.len(),
        "decoded glTF scene"
    );

    Ok(LoadedModel {
        format: ModelFormat::Interchange,
        source_name: source_name.to_string(),
        root,
        layers,
        unit_scale: 1.0,
    })
}

fn convert_node(
    node: &gltf::Node<'_>,
    buffers: &[gltf::buffer::Data],
    layers: &mut LayerTable,
) -> Result<SceneNode> {
    let mut out = SceneNode::new(node.name().unwrap_or(""));
    out.transform = Matrix4::from(node.transform().matrix()).cast::<f64>();
    out.attributes = extras_bag(node.extras());

    if let Some(mesh) = node.mesh() {
        let mut scene_mesh = read_mesh(&mesh, buffers);
        if out.name.is_empty() {
            if let Some(name) = mesh.name() {
                out.name = name.to_string();
            }
        }
        scene_mesh.layer_index = out
            .attributes
            .find_text(LAYER_KEYS)
            .or_else(|| scene_mesh.geometry_attributes.find_text(LAYER_KEYS))
            .map(|path| layers.intern(&path));
        out.mesh = Some(scene_mesh);
    }

    for child in node.children() {
        out.children.push(convert_node(&child, buffers, layers)?);
    }
    Ok(out)
}

/// Merge every triangle primitive of a mesh into one buffer
fn read_mesh(mesh: &gltf::Mesh<'_>, buffers: &[gltf::buffer::Data]) -> SceneMesh {
    let mut out = SceneMesh {
        geometry_attributes: extras_bag(mesh.extras()),
        ..Default::default()
    };

    for primitive in mesh.primitives() {
        if primitive.mode() != Mode::Triangles {
            tracing::debug!(mode = ?primitive.mode(), "skipping non-triangle primitive");
            continue;
        }
        let reader = primitive.reader(|buffer| buffers.get(buffer.index()).map(|d| d.0.as_slice()));
        let Some(positions) = reader.read_positions() else {
            continue;
        };

        let base = (out.positions.len() / 3) as u32;
        let mut count = 0u32;
        for p in positions {
            out.positions.extend_from_slice(&p);
            count += 1;
        }
        match reader.read_indices() {
            Some(indices) => {
                let indices: Vec<u32> = indices.into_u32().collect();
                let dropped = append_triangles(&mut out.indices, &indices, base, count);
                if dropped > 0 {
                    tracing::warn!(
                        mesh = mesh.name().unwrap_or(""),
                        dropped,
                        vertices = count,
                        "dropped triangles with out-of-range indices"
                    );
                }
            }
            None => out.indices.extend(base..base + count),
        }

        if out.color.is_none() {
            out.color = Some(primitive.material().pbr_metallic_roughness().base_color_factor());
        }
    }

    out
}

/// Append whole triangles offset by `base`; a triangle touching a vertex at or
/// past `count` is dropped along with its partners. Returns the drop count.
fn append_triangles(out: &mut Vec<u32>, indices: &[u32], base: u32, count: u32) -> usize {
    let mut dropped = 0;
    for tri in indices.chunks_exact(3) {
        if tri.iter().all(|&i| i < count) {
            out.extend(tri.iter().map(|&i| base + i));
        } else {
            dropped += 1;
        }
    }
    dropped
}

fn extras_bag(extras: &gltf::json::Extras) -> AttributeBag {
    extras
        .as_ref()
        .and_then(|raw| serde_json::from_str::<serde_json::Value>(raw.get()).ok())
        .map(|value| AttributeBag::from_json(&value))
        .unwrap_or_default()
}
