// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Review configuration.
//!
//! Built-in defaults, optionally replaced by a JSON file, then overridden by
//! `SITECHECK_*` environment variables.

use crate::error::{Error, Result};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sitecheck_geometry::{AxisSettings, ClipSettings, UpAxis};
use std::path::Path;

/// Layer names that mark each semantic role, matched case-insensitively
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoleNames {
    pub building: Vec<String>,
    pub setback: Vec<String>,
    pub corridor: Vec<String>,
}

impl Default for RoleNames {
    fn default() -> Self {
        Self {
            building: strings(&["building", "buildings", "建物"]),
            setback: strings(&["setback", "setback restriction", "壁面後退"]),
            corridor: strings(&["sight corridor", "view corridor", "眺望"]),
        }
    }
}

/// Review configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReviewConfig {
    /// Up axis of the rendering engine.
    #[serde(serialize_with = "axis_to_str", deserialize_with = "axis_from_str")]
    pub engine_up: UpAxis,
    /// Flatness ratio a source-axis hypothesis must beat.
    pub flatness_threshold: f64,
    /// Best hypothesis must be below this fraction of the runner-up.
    pub runner_up_margin: f64,
    /// Eigenvalue ratio under which a model counts as planar.
    pub planarity_ratio: f64,
    /// Vertex budget for covariance sampling.
    pub max_pca_samples: usize,
    /// Vertex budget per footprint.
    pub max_footprint_samples: usize,
    /// Far clip plane floor.
    pub min_far_floor: f64,
    /// Minimum near/far separation.
    pub clip_epsilon: f64,
    /// Vertical field of view in degrees.
    pub camera_fov_deg: f64,
    /// Extrusion height for outlines without their own height or a bound mesh.
    pub default_volume_height: f64,
    pub roles: RoleNames,
    /// Attribute keys holding a display name, in priority order.
    pub name_keys: Vec<String>,
    /// Attribute keys holding an external object id, in priority order.
    pub object_id_keys: Vec<String>,
    /// Attribute keys holding a layer index, in priority order.
    pub layer_index_keys: Vec<String>,
}

impl Default for ReviewConfig {
    fn default() -> Self {
        Self {
            engine_up: UpAxis::Y,
            flatness_threshold: 0.35,
            runner_up_margin: 0.85,
            planarity_ratio: 0.02,
            max_pca_samples: 5000,
            max_footprint_samples: 2000,
            min_far_floor: 1000.0,
            clip_epsilon: 1e-3,
            camera_fov_deg: 45.0,
            default_volume_height: 10.0,
            roles: RoleNames::default(),
            name_keys: strings(&["building_name", "buildingName", "name", "label"]),
            object_id_keys: strings(&["object_id", "objectId", "id", "guid", "uuid"]),
            layer_index_keys: strings(&["layer_index", "layerIndex"]),
        }
    }
}

impl ReviewConfig {
    /// Defaults plus environment overrides
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    /// Read a JSON config file; missing fields keep their defaults
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;
        let config: Self = serde_json::from_str(&text)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `SITECHECK_*` environment variables on top of `self`
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from any key lookup. Unparseable values are ignored.
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        fn parsed<T: std::str::FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
            let raw = lookup(key)?;
            match raw.trim().parse() {
                Ok(value) => Some(value),
                Err(_) => {
                    tracing::warn!(key, value = %raw, "ignoring unparseable config override");
                    None
                }
            }
        }
        fn list(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<Vec<String>> {
            let raw = lookup(key)?;
            Some(
                raw.split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect(),
            )
        }

        if let Some(v) = parsed(&lookup, "SITECHECK_ENGINE_UP") {
            self.engine_up = v;
        }
        if let Some(v) = parsed(&lookup, "SITECHECK_FLATNESS_THRESHOLD") {
            self.flatness_threshold = v;
        }
        if let Some(v) = parsed(&lookup, "SITECHECK_RUNNER_UP_MARGIN") {
            self.runner_up_margin = v;
        }
        if let Some(v) = parsed(&lookup, "SITECHECK_PLANARITY_RATIO") {
            self.planarity_ratio = v;
        }
        if let Some(v) = parsed(&lookup, "SITECHECK_MAX_PCA_SAMPLES") {
            self.max_pca_samples = v;
        }
        if let Some(v) = parsed(&lookup, "SITECHECK_MAX_FOOTPRINT_SAMPLES") {
            self.max_footprint_samples = v;
        }
        if let Some(v) = parsed(&lookup, "SITECHECK_MIN_FAR_FLOOR") {
            self.min_far_floor = v;
        }
        if let Some(v) = parsed(&lookup, "SITECHECK_CAMERA_FOV_DEG") {
            self.camera_fov_deg = v;
        }
        if let Some(v) = parsed(&lookup, "SITECHECK_DEFAULT_VOLUME_HEIGHT") {
            self.default_volume_height = v;
        }
        if let Some(v) = list(&lookup, "SITECHECK_BUILDING_LAYERS") {
            self.roles.building = v;
        }
        if let Some(v) = list(&lookup, "SITECHECK_SETBACK_LAYERS") {
            self.roles.setback = v;
        }
        if let Some(v) = list(&lookup, "SITECHECK_CORRIDOR_LAYERS") {
            self.roles.corridor = v;
        }
        self
    }

    pub fn validate(&self) -> Result<()> {
        fn positive(name: &str, value: f64) -> Result<()> {
            if value.is_finite() && value > 0.0 {
                Ok(())
            } else {
                Err(Error::Config(format!("{} must be positive, got {}", name, value)))
            }
        }

        if self.engine_up == UpAxis::X {
            return Err(Error::Config("engine_up must be y or z".into()));
        }
        positive("flatness_threshold", self.flatness_threshold)?;
        positive("planarity_ratio", self.planarity_ratio)?;
        positive("min_far_floor", self.min_far_floor)?;
        positive("clip_epsilon", self.clip_epsilon)?;
        positive("default_volume_height", self.default_volume_height)?;
        if !(self.runner_up_margin > 0.0 && self.runner_up_margin <= 1.0) {
            return Err(Error::Config(format!(
                "runner_up_margin must be in (0, 1], got {}",
                self.runner_up_margin
            )));
        }
        if !(self.camera_fov_deg > 0.0 && self.camera_fov_deg < 180.0) {
            return Err(Error::Config(format!(
                "camera_fov_deg must be in (0, 180), got {}",
                self.camera_fov_deg
            )));
        }
        if self.max_pca_samples < 3 || self.max_footprint_samples < 3 {
            return Err(Error::Config("sample budgets must be at least 3".into()));
        }
        if self.name_keys.is_empty() {
            return Err(Error::Config("name_keys must not be empty".into()));
        }
        Ok(())
    }

    pub fn axis_settings(&self) -> AxisSettings {
        AxisSettings {
            engine_up: self.engine_up,
            flatness_threshold: self.flatness_threshold,
            runner_up_margin: self.runner_up_margin,
            planarity_ratio: self.planarity_ratio,
            max_samples: self.max_pca_samples,
        }
    }

    pub fn clip_settings(&self) -> ClipSettings {
        ClipSettings {
            fov_deg: self.camera_fov_deg,
            min_far_floor: self.min_far_floor,
            epsilon: self.clip_epsilon,
        }
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn axis_to_str<S: Serializer>(axis: &UpAxis, serializer: S) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_str(axis.as_str())
}

fn axis_from_str<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<UpAxis, D::Error> {
    let raw = String::deserialize(deserializer)?;
    raw.parse().map_err(serde::de::Error::custom)
}
