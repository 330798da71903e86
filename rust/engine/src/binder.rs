// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Result-to-mesh binding
//!
//! Each check's result batch is matched against the classified meshes in two
//! passes:
//!
//! 1. object id, then normalized display name. Records whether any record
//!    matched by name.
//! 2. for records still unbound: layer index (only when pass 1 saw no name
//!    match), normalized layer name, then position in the role-filtered mesh
//!    list (again only when pass 1 saw no name match).
//!
//! A mesh is claimed by at most one record per batch. Records that match
//! nothing become warnings.

use crate::classifier::{normalize_name, ImportedMesh, LayerRole, ModelGeneration};
use crate::keys::MeshKey;
use crate::warnings::ReviewWarning;
use rustc_hash::{FxHashMap, FxHashSet};
use serde::Serialize;
use sitecheck_core::{BindingKeys, CheckKind, CheckResults, LAYER_PATH_SEPARATOR};

/// Which step of the fallback chain produced a binding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchMethod {
    ObjectId,
    Name,
    LayerIndex,
    LayerName,
    Position,
}

/// A record bound to a mesh
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Binding {
    /// Index of the record in its batch
    pub record: usize,
    pub mesh: MeshKey,
    pub method: MatchMethod,
}

/// Outcome of binding one check's batch
#[derive(Debug, Clone, PartialEq)]
pub struct BindingSet {
    pub check: CheckKind,
    /// Sorted by record index
    pub bindings: Vec<Binding>,
    pub warnings: Vec<ReviewWarning>,
    /// Whether pass 1 bound anything by name
    pub name_matched: bool,
}

impl BindingSet {
    pub fn mesh_for(&self, record: usize) -> Option<MeshKey> {
        self.bindings
            .iter()
            .find(|b| b.record == record)
            .map(|b| b.mesh)
    }
}

/// Role whose meshes a check's positional fallback indexes into
pub fn positional_role(check: CheckKind) -> LayerRole {
    match check {
        CheckKind::Setback => LayerRole::SetbackRestriction,
        CheckKind::Height
        | CheckKind::SightCorridor
        | CheckKind::FireAccess
        | CheckKind::SkyBridge => LayerRole::Building,
    }
}

/// Bind one batch of records to the meshes of `generation`
pub fn bind(generation: &ModelGeneration, check: CheckKind, records: &[BindingKeys]) -> BindingSet {
    let mut claimed: FxHashSet<MeshKey> = FxHashSet::default();
    let mut resolved: Vec<Option<(MeshKey, MatchMethod)>> = vec![None; records.len()];
    let mut name_matched = false;

    let first_unclaimed = |claimed: &FxHashSet<MeshKey>, pred: &dyn Fn(&ImportedMesh) -> bool| {
        generation
            .iter()
            .find(|(key, mesh)| !claimed.contains(key) && pred(*mesh))
            .map(|(key, _)| key)
    };

    // Pass 1: object id, then name
    for (slot, keys) in resolved.iter_mut().zip(records) {
        if let Some(id) = &keys.object_id {
            if let Some(key) = first_unclaimed(&claimed, &|m| m.object_id.as_deref() == Some(id.as_str())) {
                claimed.insert(key);
                *slot = Some((key, MatchMethod::ObjectId));
                continue;
            }
        }
        if let Some(name) = &keys.name {
            let wanted = normalize_name(name);
            if let Some(key) = first_unclaimed(&claimed, &|m| {
                m.display_name.as_deref().map(normalize_name).as_deref() == Some(wanted.as_str())
            }) {
                claimed.insert(key);
                *slot = Some((key, MatchMethod::Name));
                name_matched = true;
            }
        }
    }

    // Pass 2: layer index, layer name, position
    let role = positional_role(check);
    let mut positional = generation.keys_with_role(role);
    if positional.is_empty() {
        positional = generation.keys().to_vec();
    }

    for (slot, keys) in resolved.iter_mut().zip(records) {
        if slot.is_some() {
            continue;
        }
        if !name_matched {
            if let Some(index) = keys.layer_index {
                if let Some(key) = first_unclaimed(&claimed, &|m| m.layer_index == Some(index)) {
                    claimed.insert(key);
                    *slot = Some((key, MatchMethod::LayerIndex));
                    continue;
                }
            }
        }
        if let Some(layer) = &keys.layer_name {
            let wanted = normalize_name(layer);
            if let Some(key) = first_unclaimed(&claimed, &|m| {
                m.layer_name
                    .as_deref()
                    .map_or(false, |path| layer_name_matches(path, &wanted))
            }) {
                claimed.insert(key);
                *slot = Some((key, MatchMethod::LayerName));
                continue;
            }
        }
        // Position only stands in for records that carry no identity
        if !name_matched && !keys.is_identified() {
            if let Some(&key) = positional.get(keys.ordinal) {
                if !claimed.contains(&key) {
                    claimed.insert(key);
                    *slot = Some((key, MatchMethod::Position));
                }
            }
        }
    }

    let mut bindings = Vec::new();
    let mut warnings = Vec::new();
    for (record, (slot, keys)) in resolved.into_iter().zip(records).enumerate() {
        match slot {
            Some((mesh, method)) => bindings.push(Binding { record, mesh, method }),
            None => warnings.push(
                ReviewWarning::UnboundRecord {
                    check,
                    ordinal: keys.ordinal,
                    record: keys.describe(),
                }
                .emit(),
            ),
        }
    }

    tracing::debug!(
        check = %check,
        records = records.len(),
        bound = bindings.len(),
        name_matched,
        "bound check results"
    );

    BindingSet {
        check,
        bindings,
        warnings,
        name_matched,
    }
}

/// A layer name matches the full path or its innermost segment
fn layer_name_matches(path: &str, wanted: &str) -> bool {
    normalize_name(path) == wanted
        || path
            .rsplit(LAYER_PATH_SEPARATOR)
            .next()
            .map_or(false, |leaf| normalize_name(leaf) == wanted)
}

/// Binding sets for every check family of one request
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReviewBindings {
    sets: FxHashMap<CheckKind, BindingSet>,
}

impl ReviewBindings {
    pub fn bind_all(generation: &ModelGeneration, results: &CheckResults) -> Self {
        let sets = CheckKind::ALL
            .into_iter()
            .filter(|&kind| results.len(kind) > 0)
            .map(|kind| (kind, bind(generation, kind, &results.binding_keys(kind))))
            .collect();
        Self { sets }
    }

    pub fn get(&self, check: CheckKind) -> Option<&BindingSet> {
        self.sets.get(&check)
    }

    pub fn mesh_for(&self, check: CheckKind, record: usize) -> Option<MeshKey> {
        self.get(check).and_then(|set| set.mesh_for(record))
    }

    /// Sets in check order
    pub fn iter(&self) -> impl Iterator<Item = &BindingSet> {
        CheckKind::ALL.into_iter().filter_map(move |kind| self.sets.get(&kind))
    }

    pub fn warnings(&self) -> impl Iterator<Item = &ReviewWarning> {
        self.iter().flat_map(|set| set.warnings.iter())
    }

    pub fn binding_count(&self) -> usize {
        self.sets.values().map(|s| s.bindings.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::MeshClassifier;
    use crate::config::ReviewConfig;
    use crate::transform_cache::Placement;
    use sitecheck_core::{AttributeBag, LayerTable, LoadedModel, ModelFormat, SceneMesh, SceneNode};
    use sitecheck_geometry::{Aabb, AxisDecision, AxisMethod, SceneTransform, UnitQuaternion, UpAxis};

    struct Fixture {
        name: Option<&'static str>,
        id: Option<&'static str>,
        layer: Option<usize>,
    }

    fn generation(fixtures: &[Fixture]) -> ModelGeneration {
        let mut layers = LayerTable::new();
        layers.insert(0, "Site::Buildings");
        layers.insert(1, "Site::Setback");
        layers.insert(2, "Site::Buildings::Annex");
        let mut root = SceneNode::new("root");
        for (i, fixture) in fixtures.iter().enumerate() {
            let mut attributes = AttributeBag::new();
            if let Some(name) = fixture.name {
                attributes.insert("name", name);
            }
            if let Some(id) = fixture.id {
                attributes.insert("objectId", id);
            }
            let mut node = SceneNode::new("");
            let x = i as f32 * 20.0;
            node.mesh = Some(SceneMesh {
                positions: vec![x, 0.0, 0.0, x + 10.0, 0.0, 0.0, x, 10.0, 10.0],
                indices: vec![0, 1, 2],
                object_attributes: attributes,
                layer_index: fixture.layer,
                ..Default::default()
            });
            root.children.push(node);
        }
        let model = LoadedModel {
            format: ModelFormat::Interchange,
            source_name: "test".into(),
            root,
            layers,
            unit_scale: 1.0,
        };
        let placement = Placement::new(
            SceneTransform::identity(),
            Aabb::empty(),
            AxisDecision {
                rotation: UnitQuaternion::identity(),
                method: AxisMethod::Interchange,
                source_up: UpAxis::Y,
                ratios: None,
            },
        );
        MeshClassifier::new(&ReviewConfig::default()).classify(1, &model, placement).0
    }

    fn keys(id: Option<&str>, name: Option<&str>, layer_index: Option<usize>, ordinal: usize) -> BindingKeys {
        BindingKeys {
            object_id: id.map(str::to_string),
            name: name.map(str::to_string),
            layer_index,
            layer_name: None,
            ordinal,
        }
    }

    fn ordinal_of(generation: &ModelGeneration, key: MeshKey) -> usize {
        generation.get(key).map(|m| m.ordinal).unwrap_or(usize::MAX)
    }

    #[test]
    fn object_id_beats_name() {
        let generation = generation(&[
            Fixture { name: Some("Tower1"), id: Some("x"), layer: Some(0) },
            Fixture { name: Some("WrongName"), id: None, layer: Some(0) },
        ]);
        let set = bind(&generation, CheckKind::Height, &[keys(Some("x"), Some("WrongName"), None, 0)]);
        assert_eq!(set.bindings.len(), 1);
        assert_eq!(set.bindings[0].method, MatchMethod::ObjectId);
        assert_eq!(ordinal_of(&generation, set.bindings[0].mesh), 0);
    }

    #[test]
    fn unknown_building_is_one_warning() {
        let generation = generation(&[Fixture { name: Some("Tower1"), id: None, layer: Some(0) }]);
        let set = bind(&generation, CheckKind::SightCorridor, &[keys(None, Some("Ghost"), None, 0)]);
        assert!(set.bindings.is_empty());
        assert_eq!(set.warnings.len(), 1);
        assert!(matches!(
            &set.warnings[0],
            ReviewWarning::UnboundRecord { check: CheckKind::SightCorridor, ordinal: 0, .. }
        ));
    }

    #[test]
    fn unmatched_object_id_does_not_fall_back_to_position() {
        let generation = generation(&[Fixture { name: Some("Tower1"), id: Some("a"), layer: Some(0) }]);
        let set = bind(&generation, CheckKind::FireAccess, &[keys(Some("gone"), None, None, 0)]);
        assert!(set.bindings.is_empty());
        assert_eq!(set.warnings.len(), 1);

        // The same slot binds once the record is anonymous
        let set = bind(&generation, CheckKind::FireAccess, &[keys(None, None, None, 0)]);
        assert_eq!(set.bindings[0].method, MatchMethod::Position);
    }

    #[test]
    fn names_are_trimmed_and_case_folded() {
        let generation = generation(&[Fixture { name: Some("  Tower One "), id: None, layer: None }]);
        let set = bind(&generation, CheckKind::Height, &[keys(None, Some("TOWER ONE"), None, 0)]);
        assert_eq!(set.bindings[0].method, MatchMethod::Name);
        assert!(set.name_matched);
    }

    #[test]
    fn a_name_match_disables_index_fallback_batch_wide() {
        let generation = generation(&[
            Fixture { name: Some("A"), id: None, layer: Some(0) },
            Fixture { name: None, id: None, layer: Some(2) },
        ]);
        let records = [keys(None, Some("A"), None, 0), keys(None, None, Some(2), 1)];
        let set = bind(&generation, CheckKind::Height, &records);
        assert_eq!(set.bindings.len(), 1);
        assert_eq!(set.warnings.len(), 1);

        // Without the name match the same index record binds
        let set = bind(&generation, CheckKind::Height, &records[1..]);
        assert_eq!(set.bindings[0].method, MatchMethod::LayerIndex);
        assert_eq!(ordinal_of(&generation, set.bindings[0].mesh), 1);
    }

    #[test]
    fn layer_name_matches_leaf_even_after_name_match() {
        let generation = generation(&[
            Fixture { name: Some("A"), id: None, layer: Some(0) },
            Fixture { name: None, id: None, layer: Some(2) },
        ]);
        let mut by_layer = keys(None, None, None, 1);
        by_layer.layer_name = Some("annex".into());
        let set = bind(&generation, CheckKind::Height, &[keys(None, Some("A"), None, 0), by_layer]);
        assert_eq!(set.bindings.len(), 2);
        assert_eq!(set.bindings[1].method, MatchMethod::LayerName);
    }

    #[test]
    fn no_mesh_is_claimed_twice() {
        let generation = generation(&[Fixture { name: Some("Twin"), id: None, layer: None }]);
        let set = bind(
            &generation,
            CheckKind::Height,
            &[keys(None, Some("Twin"), None, 0), keys(None, Some("Twin"), None, 0)],
        );
        assert_eq!(set.bindings.len(), 1);
        assert_eq!(set.bindings[0].record, 0);
        assert_eq!(set.warnings.len(), 1);
    }

    #[test]
    fn positional_fallback_uses_role_filtered_list() {
        let generation = generation(&[
            Fixture { name: None, id: None, layer: Some(1) },
            Fixture { name: None, id: None, layer: Some(0) },
            Fixture { name: None, id: None, layer: Some(0) },
        ]);
        let set = bind(&generation, CheckKind::Height, &[keys(None, None, None, 1)]);
        assert_eq!(set.bindings[0].method, MatchMethod::Position);
        // Second building, not second mesh overall
        assert_eq!(ordinal_of(&generation, set.bindings[0].mesh), 2);

        let set = bind(&generation, CheckKind::Setback, &[keys(None, None, None, 0)]);
        assert_eq!(ordinal_of(&generation, set.bindings[0].mesh), 0);
    }

    #[test]
    fn positional_fallback_skips_claimed_positions() {
        let generation = generation(&[
            Fixture { name: None, id: Some("a"), layer: Some(0) },
            Fixture { name: None, id: None, layer: Some(0) },
        ]);
        let set = bind(
            &generation,
            CheckKind::Height,
            &[keys(Some("a"), None, None, 1), keys(None, None, None, 0)],
        );
        // Position 0 is already claimed by the id match
        assert_eq!(set.bindings.len(), 1);
        assert_eq!(set.warnings.len(), 1);
    }

    #[test]
    fn binding_is_deterministic() {
        let generation = generation(&[
            Fixture { name: Some("A"), id: None, layer: Some(0) },
            Fixture { name: Some("B"), id: Some("b"), layer: Some(0) },
            Fixture { name: None, id: None, layer: Some(0) },
        ]);
        let records = [
            keys(None, Some("b"), None, 0),
            keys(Some("b"), None, None, 1),
            keys(None, Some("a"), None, 2),
        ];
        let first = bind(&generation, CheckKind::Height, &records);
        let second = bind(&generation, CheckKind::Height, &records);
        assert_eq!(first, second);
        let meshes: FxHashSet<_> = first.bindings.iter().map(|b| b.mesh).collect();
        assert_eq!(meshes.len(), first.bindings.len());
    }
}
