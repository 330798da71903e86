// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Load -> normalize -> classify -> bind -> overlay, through a review session

use approx::assert_relative_eq;
use serde_json::{json, Value};
use sitecheck_core::{CheckKind, CheckResults, DocumentDecoder, ModelFormat, ModelLoader, ModelSource};
use sitecheck_engine::{
    LayerRole, LoadOutcome, MatchMethod, ReviewConfig, ReviewSession, ReviewWarning,
};
use sitecheck_geometry::AxisMethod;
use std::sync::Arc;

fn block(name: &str, id: Option<&str>, layer: usize, origin: [f64; 2], size: [f64; 2], height: f64) -> Value {
    let [x0, y0] = origin;
    let [x1, y1] = [x0 + size[0], y0 + size[1]];
    let mut attributes = json!({ "name": name, "layerIndex": layer });
    if let Some(id) = id {
        attributes["id"] = json!(id);
    }
    json!({
        "attributes": attributes,
        "geometry": {
            "vertices": [
                [x0, y0, 0.0], [x1, y0, 0.0], [x1, y1, 0.0], [x0, y1, 0.0],
                [x0, y0, height], [x1, y0, height], [x1, y1, height], [x0, y1, height]
            ],
            "faces": [[0, 3, 2, 1], [4, 5, 6, 7], [0, 1, 5, 4], [1, 2, 6, 5], [2, 3, 7, 6], [3, 0, 4, 7]]
        }
    })
}

fn slab(name: &str, layer: usize, origin: [f64; 2], size: [f64; 2]) -> Value {
    let [x0, y0] = origin;
    let [x1, y1] = [x0 + size[0], y0 + size[1]];
    json!({
        "attributes": { "name": name, "layerIndex": layer },
        "geometry": {
            "vertices": [[x0, y0, 0.0], [x1, y0, 0.0], [x1, y1, 0.0], [x0, y1, 0.0]],
            "faces": [[0, 1, 2, 3]]
        }
    })
}

/// Z-up site, 200 m square, two towers, a setback strip and a view corridor
fn site() -> ModelSource {
    let doc = json!({
        "units": "m",
        "layers": [
            { "index": 0, "name": "Buildings", "fullPath": "Site::Buildings" },
            { "index": 1, "name": "Setback", "fullPath": "Site::Setback" },
            { "index": 2, "name": "Sight Corridor", "fullPath": "Site::Views::Sight Corridor" }
        ],
        "objects": [
            block("Tower A", Some("guid-a"), 0, [0.0, 0.0], [20.0, 20.0], 92.0),
            block("Tower B", None, 0, [40.0, 0.0], [15.0, 15.0], 30.0),
            slab("Frontage strip", 1, [-100.0, -100.0], [200.0, 5.0]),
            slab("Harbour view", 2, [-100.0, 95.0], [200.0, 5.0])
        ]
    });
    ModelSource::from_bytes("site.3dm", ModelFormat::Native, doc.to_string().into_bytes())
}

async fn loaded() -> ReviewSession {
    let loader = ModelLoader::new().with_native_decoder(Arc::new(DocumentDecoder));
    let mut session = ReviewSession::new(ReviewConfig::default(), loader);
    let outcome = session.load(site()).await.unwrap();
    assert!(matches!(outcome, LoadOutcome::Installed { .. }));
    session
}

fn results(value: Value) -> CheckResults {
    serde_json::from_value(value).unwrap()
}

#[tokio::test]
async fn layers_drive_roles() {
    let session = loaded().await;
    let generation = session.generation().unwrap();
    assert_eq!(generation.len(), 4);
    assert_eq!(generation.keys_with_role(LayerRole::Building).len(), 2);
    assert_eq!(generation.keys_with_role(LayerRole::SetbackRestriction).len(), 1);
    assert_eq!(generation.keys_with_role(LayerRole::SightCorridor).len(), 1);

    let placement = session.placement().unwrap();
    assert_eq!(placement.axis.method, AxisMethod::DefaultVertical);
    assert_relative_eq!(placement.bounds.min.y, 0.0, epsilon = 1e-6);
    assert_relative_eq!(placement.bounds.max.y, 92.0, epsilon = 1e-6);
}

#[tokio::test]
async fn height_exceedance_labels_upper_center() {
    let mut session = loaded().await;
    let overlays = session
        .set_results(results(json!({
            "height": [{ "building_index": 0, "building_name": "Tower A",
                         "height_limit": 80.0, "actual_height": 92.0 }]
        })))
        .unwrap();

    let label = &overlays.labels[0];
    assert!(label.violation);
    assert_eq!(label.text, "92.0m / 80.0m (+12.0m)");
    // Local (Z-up) frame: top face center of Tower A
    assert_relative_eq!(label.anchor[0], 10.0, epsilon = 1e-6);
    assert_relative_eq!(label.anchor[1], 10.0, epsilon = 1e-6);
    assert_relative_eq!(label.anchor[2], 92.0, epsilon = 1e-6);

    let volume = overlays.volumes[0].mesh.bounds();
    assert_relative_eq!(volume.min.z, 80.0, epsilon = 1e-3);
    assert_relative_eq!(volume.max.z, 92.0, epsilon = 1e-3);
    assert_eq!(overlays.highlights.len(), 1);

    let camera = overlays.camera.unwrap();
    assert!(camera.near > 0.0 && camera.near < camera.far);
    assert!(camera.far >= 1000.0);
}

#[tokio::test]
async fn object_id_wins_over_name() {
    let mut session = loaded().await;
    session
        .set_results(results(json!({
            "fire_access": [{ "building_name": "Tower B", "object_id": "guid-a",
                              "access_width": 3.0, "required_width": 4.0, "is_compliant": false }]
        })))
        .unwrap();

    let set = session.bindings().get(CheckKind::FireAccess).unwrap();
    assert_eq!(set.bindings[0].method, MatchMethod::ObjectId);
    let mesh = session.generation().unwrap().get(set.bindings[0].mesh).unwrap();
    assert_eq!(mesh.display_name.as_deref(), Some("Tower A"));
}

#[tokio::test]
async fn missing_building_is_one_warning() {
    let mut session = loaded().await;
    session
        .set_results(results(json!({
            "corridor": [
                { "building_name": "Tower B", "distance": 120.0, "is_visible": true },
                { "building_name": "Ghost", "distance": 300.0, "is_visible": false }
            ]
        })))
        .unwrap();

    let set = session.bindings().get(CheckKind::SightCorridor).unwrap();
    assert_eq!(set.bindings.len(), 1);
    assert_eq!(set.warnings.len(), 1);
    assert!(session
        .warnings()
        .iter()
        .any(|w| matches!(w, ReviewWarning::UnboundRecord { ordinal: 1, .. })));
}

#[tokio::test]
async fn lone_missing_building_stays_unbound() {
    let mut session = loaded().await;
    let overlays = session
        .set_results(results(json!({
            "height": [{ "building_index": 0, "building_name": "Ghost",
                         "height_limit": 30.0, "actual_height": 45.0 }]
        })))
        .unwrap()
        .clone();

    let set = session.bindings().get(CheckKind::Height).unwrap();
    assert!(set.bindings.is_empty());
    assert_eq!(set.warnings.len(), 1);
    assert!(overlays.labels.is_empty());
    assert!(overlays.highlights.is_empty());
}

#[tokio::test]
async fn layer_leaf_binds_corridor() {
    let mut session = loaded().await;
    session
        .set_results(results(json!({
            "sight_corridor": [{ "building_name": "", "layer_name": "sight corridor",
                                 "distance": 80.0, "is_visible": false }]
        })))
        .unwrap();

    let set = session.bindings().get(CheckKind::SightCorridor).unwrap();
    assert_eq!(set.bindings[0].method, MatchMethod::LayerName);
    let mesh = session.generation().unwrap().get(set.bindings[0].mesh).unwrap();
    assert_eq!(mesh.role, LayerRole::SightCorridor);
}

#[tokio::test]
async fn setback_outline_becomes_local_volume() {
    let mut session = loaded().await;
    let overlays = session
        .set_results(results(json!({
            "setback": [{
                "plot_name": "Frontage strip", "setback_length": 4.0, "overlap_length": 2.5,
                "frontage_rate": 0.55, "required_rate": 0.7,
                "outline_points": [[-10.0, 0.0, 100.0], [10.0, 0.0, 100.0], [10.0, 0.0, 95.0], [-10.0, 0.0, 95.0]],
                "highlight_segments": [[[-10.0, 0.0, 100.0], [10.0, 0.0, 100.0]]]
            }]
        })))
        .unwrap();

    assert_eq!(overlays.volumes.len(), 1);
    assert_eq!(overlays.lines[0].lines.segment_count(), 1);
    assert!(overlays.labels[0].violation);

    // The strip is flat, so the volume uses the configured default height
    let bounds = overlays.volumes[0].mesh.bounds();
    assert_relative_eq!(bounds.max.z - bounds.min.z, 10.0, epsilon = 1e-3);
}

#[tokio::test]
async fn reload_invalidates_everything() {
    let mut session = loaded().await;
    session
        .set_results(results(json!({
            "height": [{ "building_index": 0, "building_name": "Tower A",
                         "height_limit": 80.0, "actual_height": 92.0 }]
        })))
        .unwrap();
    let stale = session.bindings().mesh_for(CheckKind::Height, 0).unwrap();

    session.load(site()).await.unwrap();
    assert!(session.generation().unwrap().get(stale).is_none());
    assert!(session.bindings().is_empty());
    assert!(session.overlays().unwrap().labels.is_empty());
}

#[tokio::test]
async fn interchange_model_is_y_up() {
    let gltf = r#"{
      "asset": { "version": "2.0" },
      "scene": 0,
      "scenes": [{ "nodes": [0] }],
      "nodes": [{ "name": "Pavilion", "mesh": 0, "extras": { "layer": "Site::Buildings" } }],
      "meshes": [{ "primitives": [{ "attributes": { "POSITION": 0 } }] }],
      "buffers": [{ "byteLength": 36, "uri": "data:application/octet-stream;base64,AAAAAAAAAAAAAAAAAACAPwAAAAAAAAAAAAAAAAAAgD8AAAAA" }],
      "bufferViews": [{ "buffer": 0, "byteLength": 36 }],
      "accessors": [{ "bufferView": 0, "componentType": 5126, "count": 3, "type": "VEC3",
                      "min": [0, 0, 0], "max": [1, 1, 0] }]
    }"#;
    let mut session = ReviewSession::new(ReviewConfig::default(), ModelLoader::new());
    session
        .load(ModelSource::from_bytes("pavilion.gltf", ModelFormat::Interchange, gltf.as_bytes().to_vec()))
        .await
        .unwrap();

    assert_eq!(session.placement().unwrap().axis.method, AxisMethod::Interchange);
    let generation = session.generation().unwrap();
    let (_, mesh) = generation.iter().next().unwrap();
    assert_eq!(mesh.role, LayerRole::Building);
    assert_eq!(mesh.label(), "Pavilion");
}
