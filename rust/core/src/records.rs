// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Compliance-check result records
//!
//! The checks run elsewhere; these are the read-only shapes they return.
//! Each family exposes whatever subset of binding keys it carries through
//! [`ComplianceRecord::binding_keys`]. Point coordinates are in the placed
//! (world) frame, in metres.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// World-frame point
pub type WorldPoint = [f64; 3];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckKind {
    Height,
    Setback,
    SightCorridor,
    FireAccess,
    SkyBridge,
}

impl CheckKind {
    pub const ALL: [CheckKind; 5] = [
        CheckKind::Height,
        CheckKind::Setback,
        CheckKind::SightCorridor,
        CheckKind::FireAccess,
        CheckKind::SkyBridge,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            CheckKind::Height => "height",
            CheckKind::Setback => "setback",
            CheckKind::SightCorridor => "sight_corridor",
            CheckKind::FireAccess => "fire_access",
            CheckKind::SkyBridge => "sky_bridge",
        }
    }
}

impl fmt::Display for CheckKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The loose keys a record can be matched on. Any of them may be missing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BindingKeys {
    pub object_id: Option<String>,
    pub name: Option<String>,
    pub layer_index: Option<usize>,
    pub layer_name: Option<String>,
    /// Position in the original result array (or the record's own index field)
    pub ordinal: usize,
}

impl BindingKeys {
    /// The record names a specific object, so only identity keys may bind it
    pub fn is_identified(&self) -> bool {
        self.object_id.is_some() || self.name.is_some()
    }

    /// Human-readable identification for warnings
    pub fn describe(&self) -> String {
        if let Some(id) = &self.object_id {
            format!("object id '{}'", id)
        } else if let Some(name) = &self.name {
            format!("'{}'", name)
        } else if let Some(layer) = &self.layer_name {
            format!("layer '{}'", layer)
        } else if let Some(index) = self.layer_index {
            format!("layer #{}", index)
        } else {
            format!("record #{}", self.ordinal)
        }
    }
}

pub trait ComplianceRecord {
    const KIND: CheckKind;

    /// Keys for binding; `position` is the record's index in its batch
    fn binding_keys(&self, position: usize) -> BindingKeys;

    fn is_violation(&self) -> bool;

    fn label(&self) -> String;
}

/// Accepts integers, numeric strings or null; negatives mean "no layer"
fn lenient_index<'de, D>(deserializer: D) -> Result<Option<usize>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::Number(n)) => n.as_u64().map(|v| v as usize),
        Some(serde_json::Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    })
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeightResult {
    pub building_index: usize,
    #[serde(default)]
    pub building_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_index")]
    pub layer_index: Option<usize>,
    #[serde(default)]
    pub layer_name: Option<String>,
    #[serde(default)]
    pub object_id: Option<String>,
    pub height_limit: f64,
    pub actual_height: f64,
    #[serde(default)]
    pub is_exceeded: Option<bool>,
    #[serde(default)]
    pub exceed_amount: Option<f64>,
}

impl HeightResult {
    pub fn exceeded(&self) -> bool {
        self.is_exceeded
            .unwrap_or(self.actual_height > self.height_limit)
    }

    pub fn exceedance(&self) -> f64 {
        self.exceed_amount
            .unwrap_or(self.actual_height - self.height_limit)
            .max(0.0)
    }
}

impl ComplianceRecord for HeightResult {
    const KIND: CheckKind = CheckKind::Height;

    fn binding_keys(&self, _position: usize) -> BindingKeys {
        BindingKeys {
            object_id: non_empty(&self.object_id),
            name: non_empty(&self.building_name),
            layer_index: self.layer_index,
            layer_name: non_empty(&self.layer_name),
            ordinal: self.building_index,
        }
    }

    fn is_violation(&self) -> bool {
        self.exceeded()
    }

    fn label(&self) -> String {
        if self.exceeded() {
            format!(
                "{:.1}m / {:.1}m (+{:.1}m)",
                self.actual_height,
                self.height_limit,
                self.exceedance()
            )
        } else {
            format!("{:.1}m / {:.1}m", self.actual_height, self.height_limit)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetbackResult {
    pub plot_name: String,
    pub setback_length: f64,
    pub overlap_length: f64,
    pub frontage_rate: f64,
    #[serde(default)]
    pub required_rate: Option<f64>,
    #[serde(default)]
    pub is_compliant: Option<bool>,
    #[serde(default)]
    pub outline_points: Option<Vec<WorldPoint>>,
    #[serde(default)]
    pub highlight_segments: Option<Vec<[WorldPoint; 2]>>,
}

impl ComplianceRecord for SetbackResult {
    const KIND: CheckKind = CheckKind::Setback;

    fn binding_keys(&self, position: usize) -> BindingKeys {
        BindingKeys {
            name: non_empty(&Some(self.plot_name.clone())),
            ordinal: position,
            ..Default::default()
        }
    }

    fn is_violation(&self) -> bool {
        match (self.is_compliant, self.required_rate) {
            (Some(compliant), _) => !compliant,
            (None, Some(required)) => self.frontage_rate < required,
            (None, None) => self.overlap_length > 0.0,
        }
    }

    fn label(&self) -> String {
        match self.required_rate {
            Some(required) => format!(
                "{}: frontage {:.1}% (required {:.1}%)",
                self.plot_name,
                self.frontage_rate * 100.0,
                required * 100.0
            ),
            None => format!("{}: frontage {:.1}%", self.plot_name, self.frontage_rate * 100.0),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorridorResult {
    pub building_name: String,
    pub distance: f64,
    pub is_visible: bool,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default, deserialize_with = "lenient_index")]
    pub layer_index: Option<usize>,
    #[serde(default)]
    pub layer_name: Option<String>,
}

impl ComplianceRecord for CorridorResult {
    const KIND: CheckKind = CheckKind::SightCorridor;

    fn binding_keys(&self, position: usize) -> BindingKeys {
        BindingKeys {
            name: non_empty(&Some(self.building_name.clone())),
            layer_index: self.layer_index,
            layer_name: non_empty(&self.layer_name),
            ordinal: position,
            ..Default::default()
        }
    }

    /// A building visible inside a protected corridor intrudes on the view
    fn is_violation(&self) -> bool {
        self.is_visible
    }

    fn label(&self) -> String {
        let state = if self.is_visible { "visible" } else { "hidden" };
        match &self.reason {
            Some(reason) if !reason.trim().is_empty() => {
                format!("{}: {} at {:.0}m ({})", self.building_name, state, self.distance, reason.trim())
            }
            _ => format!("{}: {} at {:.0}m", self.building_name, state, self.distance),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FireAccessResult {
    #[serde(default)]
    pub building_name: Option<String>,
    #[serde(default)]
    pub object_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_index")]
    pub layer_index: Option<usize>,
    pub access_width: f64,
    pub required_width: f64,
    pub is_compliant: bool,
    #[serde(default)]
    pub route_points: Option<Vec<WorldPoint>>,
}

impl ComplianceRecord for FireAccessResult {
    const KIND: CheckKind = CheckKind::FireAccess;

    fn binding_keys(&self, position: usize) -> BindingKeys {
        BindingKeys {
            object_id: non_empty(&self.object_id),
            name: non_empty(&self.building_name),
            layer_index: self.layer_index,
            ordinal: position,
            ..Default::default()
        }
    }

    fn is_violation(&self) -> bool {
        !self.is_compliant
    }

    fn label(&self) -> String {
        let name = self.building_name.as_deref().unwrap_or("fire access");
        format!(
            "{}: access {:.1}m / {:.1}m",
            name, self.access_width, self.required_width
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkyBridgeResult {
    pub bridge_name: String,
    #[serde(default)]
    pub object_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_index")]
    pub layer_index: Option<usize>,
    #[serde(default)]
    pub layer_name: Option<String>,
    pub clearance: f64,
    pub required_clearance: f64,
    pub is_compliant: bool,
    #[serde(default)]
    pub outline_points: Option<Vec<WorldPoint>>,
    /// Volume height; the bound mesh's height is used when absent
    #[serde(default)]
    pub height: Option<f64>,
}

impl ComplianceRecord for SkyBridgeResult {
    const KIND: CheckKind = CheckKind::SkyBridge;

    fn binding_keys(&self, position: usize) -> BindingKeys {
        BindingKeys {
            object_id: non_empty(&self.object_id),
            name: non_empty(&Some(self.bridge_name.clone())),
            layer_index: self.layer_index,
            layer_name: non_empty(&self.layer_name),
            ordinal: position,
        }
    }

    fn is_violation(&self) -> bool {
        !self.is_compliant
    }

    fn label(&self) -> String {
        format!(
            "{}: clearance {:.1}m / {:.1}m",
            self.bridge_name, self.clearance, self.required_clearance
        )
    }
}

/// One request's worth of results across all check families
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CheckResults {
    #[serde(default)]
    pub height: Vec<HeightResult>,
    #[serde(default)]
    pub setback: Vec<SetbackResult>,
    #[serde(default, alias = "corridor")]
    pub sight_corridor: Vec<CorridorResult>,
    #[serde(default)]
    pub fire_access: Vec<FireAccessResult>,
    #[serde(default)]
    pub sky_bridge: Vec<SkyBridgeResult>,
}

impl CheckResults {
    pub fn is_empty(&self) -> bool {
        self.height.is_empty()
            && self.setback.is_empty()
            && self.sight_corridor.is_empty()
            && self.fire_access.is_empty()
            && self.sky_bridge.is_empty()
    }

    pub fn len(&self, kind: CheckKind) -> usize {
        match kind {
            CheckKind::Height => self.height.len(),
            CheckKind::Setback => self.setback.len(),
            CheckKind::SightCorridor => self.sight_corridor.len(),
            CheckKind::FireAccess => self.fire_access.len(),
            CheckKind::SkyBridge => self.sky_bridge.len(),
        }
    }

    /// Binding keys for one family, in result order
    pub fn binding_keys(&self, kind: CheckKind) -> Vec<BindingKeys> {
        fn keys<R: ComplianceRecord>(records: &[R]) -> Vec<BindingKeys> {
            records
                .iter()
                .enumerate()
                .map(|(i, r)| r.binding_keys(i))
                .collect()
        }
        match kind {
            CheckKind::Height => keys(&self.height),
            CheckKind::Setback => keys(&self.setback),
            CheckKind::SightCorridor => keys(&self.sight_corridor),
            CheckKind::FireAccess => keys(&self.fire_access),
            CheckKind::SkyBridge => keys(&self.sky_bridge),
        }
    }
}
