// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Native-format decoding
//!
//! The binary CAD format needs an external decoder, which callers register
//! through [`NativeDecoder`]. [`DocumentDecoder`] reads the JSON document
//! those decoders typically emit:
//!
//! ```json
//! {
//!   "units": "millimeters",
//!   "layers": [{ "name": "Tower", "fullPath": "Site::Buildings::Tower" }],
//!   "objects": [{
//!     "attributes": { "name": "Tower A", "layerIndex": 0 },
//!     "geometry": { "vertices": [[0,0,0], [1,0,0], [1,1,0]], "faces": [[0,1,2]] }
//!   }]
//! }
//! ```

use crate::attributes::{AttributeBag, AttributeValue};
use crate::error::{Error, Result};
use crate::format::ModelFormat;
use crate::scene::{LayerTable, LoadedModel, SceneMesh, SceneNode};
use crate::units::unit_scale_or_metres;
use serde::Deserialize;
use serde_json::Value;

/// Decoder for the native CAD format
pub trait NativeDecoder: Send + Sync {
    /// Short name for logs
    fn name(&self) -> &str;

    fn decode(&self, source_name: &str, bytes: &[u8]) -> Result<LoadedModel>;
}

const LAYER_INDEX_KEYS: &[&str] = &["layerIndex", "layer_index"];
const NAME_KEYS: &[&str] = &["name"];

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Document {
    #[serde(default)]
    units: Option<String>,
    #[serde(default)]
    layers: Vec<DocumentLayer>,
    #[serde(default)]
    objects: Vec<DocumentObject>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DocumentLayer {
    #[serde(default)]
    index: Option<usize>,
    #[serde(default)]
    name: String,
    #[serde(default)]
    full_path: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DocumentObject {
    #[serde(default)]
    attributes: Value,
    #[serde(default)]
    geometry: Option<DocumentGeometry>,
}

#[derive(Debug, Deserialize)]
struct DocumentGeometry {
    #[serde(default)]
    vertices: Vec<[f64; 3]>,
    #[serde(default)]
    faces: Vec<Vec<u32>>,
    /// Anything else on the geometry is kept as geometry-level attributes
    #[serde(flatten)]
    extra: serde_json::Map<String, Value>,
}

/// JSON document decoder for the native format
#[derive(Debug, Clone, Copy, Default)]
pub struct DocumentDecoder;

impl NativeDecoder for DocumentDecoder {
    fn name(&self) -> &str {
        "json-document"
    }

    fn decode(&self, source_name: &str, bytes: &[u8]) -> Result<LoadedModel> {
        let document: Document = serde_json::from_slice(bytes)?;

        let mut layers = LayerTable::new();
        for (position, layer) in document.layers.iter().enumerate() {
            let path = layer
                .full_path
                .as_deref()
                .filter(|p| !p.trim().is_empty())
                .unwrap_or(&layer.name);
            layers.insert(layer.index.unwrap_or(position), path);
        }

        let mut root = SceneNode::new(source_name);
        for (position, object) in document.objects.into_iter().enumerate() {
            let attributes = AttributeBag::from_json(&object.attributes);
            let mut node = SceneNode::new(attributes.find_text(NAME_KEYS).unwrap_or_default());

            if let Some(geometry) = object.geometry {
                node.mesh = Some(build_mesh(position, geometry, attributes)?);
            } else {
                node.attributes = attributes;
            }
            root.children.push(node);
        }

        tracing::debug!(
            source = source_name,
            objects = root.children.len(),
            layers = layers.len(),
            "decoded native document"
        );

        Ok(LoadedModel {
            format: ModelFormat::Native,
            source_name: source_name.to_string(),
            root,
            layers,
            unit_scale: unit_scale_or_metres(document.units.as_deref()),
        })
    }
}

fn build_mesh(position: usize, geometry: DocumentGeometry, attributes: AttributeBag) -> Result<SceneMesh> {
    let vertex_count = geometry.vertices.len() as u32;
    let mut indices = Vec::with_capacity(geometry.faces.len() * 3);
    for face in &geometry.faces {
        if let Some(&bad) = face.iter().find(|&&i| i >= vertex_count) {
            return Err(Error::InvalidDocument(format!(
                "object {} references vertex {} of {}",
                position, bad, vertex_count
            )));
        }
        match face.as_slice() {
            [a, b, c] => indices.extend_from_slice(&[*a, *b, *c]),
            // Quads repeat the last index when they are really triangles
            [a, b, c, d] if c == d => indices.extend_from_slice(&[*a, *b, *c]),
            [a, b, c, d] => indices.extend_from_slice(&[*a, *b, *c, *a, *c, *d]),
            other => {
                return Err(Error::InvalidDocument(format!(
                    "object {} has a face with {} vertices",
                    position,
                    other.len()
                )))
            }
        }
    }

    let positions = geometry
        .vertices
        .iter()
        .flat_map(|v| [v[0] as f32, v[1] as f32, v[2] as f32])
        .collect();

    let color = attributes.get("color").and_then(parse_color);
    let layer_index = attributes.find_index(LAYER_INDEX_KEYS);
    let geometry_attributes = AttributeBag::from_json(&Value::Object(geometry.extra));

    Ok(SceneMesh {
        positions,
        indices,
        object_attributes: attributes,
        geometry_attributes,
        layer_index,
        color,
    })
}

/// `[r, g, b]` or `[r, g, b, a]` in 0-255
fn parse_color(value: &AttributeValue) -> Option<[f32; 4]> {
    let AttributeValue::List(items) = value else {
        return None;
    };
    let channels: Vec<f32> = items
        .iter()
        .filter_map(|v| match v {
            AttributeValue::Number(n) => Some((*n as f32 / 255.0).clamp(0.0, 1.0)),
            _ => None,
        })
        .collect();
    match channels.as_slice() {
        [r, g, b] => Some([*r, *g, *b, 1.0]),
        [r, g, b, a] => Some([*r, *g, *b, *a]),
        _ => None,
    }
}
