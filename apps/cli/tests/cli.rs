// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use assert_cmd::cargo::cargo_bin_cmd;
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use tempfile::tempdir;

fn write_site(dir: &Path) -> Result<PathBuf, Box<dyn std::error::Error>> {
    let doc = json!({
        "units": "mm",
        "layers": [{ "index": 0, "name": "Buildings" }],
        "objects": [{
            "attributes": { "name": "Tower A", "objectId": "guid-a", "layerIndex": 0 },
            "geometry": {
                "vertices": [
                    [0, 0, 0], [20000, 0, 0], [20000, 20000, 0], [0, 20000, 0],
                    [0, 0, 92000], [20000, 0, 92000], [20000, 20000, 92000], [0, 20000, 92000]
                ],
                "faces": [[0, 3, 2, 1], [4, 5, 6, 7], [0, 1, 5, 4], [1, 2, 6, 5], [2, 3, 7, 6], [3, 0, 4, 7]]
            }
        }]
    });
    let path = dir.join("site.json");
    std::fs::write(&path, doc.to_string())?;
    Ok(path)
}

fn write_results(dir: &Path) -> Result<PathBuf, Box<dyn std::error::Error>> {
    let results = json!({
        "height": [
            { "building_index": 0, "building_name": "Tower A", "height_limit": 80.0, "actual_height": 92.0 },
            { "building_index": 1, "building_name": "Ghost", "height_limit": 30.0, "actual_height": 12.0 }
        ]
    });
    let path = dir.join("results.json");
    std::fs::write(&path, results.to_string())?;
    Ok(path)
}

#[test]
fn reports_bindings_and_overlays() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let model = write_site(dir.path())?;
    let results = write_results(dir.path())?;
    let report_path = dir.path().join("report.json");

    let mut cmd = cargo_bin_cmd!("sitecheck");
    cmd.arg(&model)
        .arg("--results")
        .arg(&results)
        .arg("--report")
        .arg(&report_path)
        .env_remove("RUST_LOG");
    cmd.assert().success();

    let report: Value = serde_json::from_str(&std::fs::read_to_string(&report_path)?)?;
    assert_eq!(report["format"], "native");
    assert_eq!(report["generation"], 1);
    assert_eq!(report["placement"]["scale_factor"], 0.001);
    assert_eq!(report["meshes"][0]["role"], "building");
    assert_eq!(report["meshes"][0]["object_id"], "guid-a");
    assert_eq!(report["bindings"][0]["method"], "name");
    assert_eq!(report["overlays"]["volumes"], 1);
    assert_eq!(report["overlays"]["labels"][0]["text"], "92.0m / 80.0m (+12.0m)");

    let warnings = report["warnings"].as_array().unwrap();
    assert!(warnings
        .iter()
        .any(|w| w["kind"] == "unbound_record" && w["record"].as_str().unwrap().contains("Ghost")));
    Ok(())
}

#[test]
fn prints_to_stdout_and_honours_hidden_checks() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let model = write_site(dir.path())?;
    let results = write_results(dir.path())?;

    let mut cmd = cargo_bin_cmd!("sitecheck");
    cmd.arg(&model)
        .arg("--results")
        .arg(&results)
        .arg("--hide")
        .arg("height")
        .arg("--up-axis")
        .arg("z");
    let output = cmd.output()?;
    assert!(output.status.success());

    let report: Value = serde_json::from_slice(&output.stdout)?;
    assert_eq!(report["placement"]["axis_method"], "override");
    assert_eq!(report["overlays"]["volumes"], 0);
    assert_eq!(report["bindings"].as_array().unwrap().len(), 1);
    Ok(())
}

#[test]
fn unknown_extension_needs_format() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let model = dir.path().join("site.obj");
    std::fs::write(&model, "o cube")?;

    let mut cmd = cargo_bin_cmd!("sitecheck");
    cmd.arg(&model);
    cmd.assert().failure();
    Ok(())
}

#[test]
fn missing_model_fails() {
    let mut cmd = cargo_bin_cmd!("sitecheck");
    cmd.arg("/nonexistent/site.glb");
    cmd.assert().failure();
}
