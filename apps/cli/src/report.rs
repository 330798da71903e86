// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! JSON review report

use serde::Serialize;
use sitecheck_core::{CheckKind, ModelFormat};
use sitecheck_engine::{
    ImportedMesh, LayerRole, MatchMethod, OverlaySummary, Placement, ReviewSession, ReviewWarning,
};

#[derive(Debug, Serialize)]
pub struct MeshReport {
    pub ordinal: usize,
    pub name: String,
    pub object_id: Option<String>,
    pub layer: Option<String>,
    pub role: LayerRole,
    pub vertex_count: usize,
    pub triangle_count: usize,
    pub bounds_min: Option<[f64; 3]>,
    pub bounds_max: Option<[f64; 3]>,
    /// Plan-view hull in world coordinates
    pub footprint: Option<Vec<[f64; 2]>>,
    pub footprint_area: Option<f64>,
}

impl From<&ImportedMesh> for MeshReport {
    fn from(mesh: &ImportedMesh) -> Self {
        let empty = mesh.bounds.is_empty();
        Self {
            ordinal: mesh.ordinal,
            name: mesh.label(),
            object_id: mesh.object_id.clone(),
            layer: mesh.layer_name.clone(),
            role: mesh.role,
            vertex_count: mesh.vertex_count,
            triangle_count: mesh.triangle_count,
            bounds_min: (!empty).then(|| mesh.bounds.min.coords.into()),
            bounds_max: (!empty).then(|| mesh.bounds.max.coords.into()),
            footprint: mesh
                .footprint
                .as_ref()
                .map(|f| f.points().iter().map(|p| [p.x, p.y]).collect()),
            footprint_area: mesh.footprint.as_ref().map(|f| f.area()),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct BindingReport {
    pub check: CheckKind,
    pub record: usize,
    pub mesh: usize,
    pub mesh_name: String,
    pub method: MatchMethod,
}

#[derive(Debug, Serialize)]
pub struct ReviewReport {
    pub source: String,
    pub format: ModelFormat,
    pub generation: u64,
    pub placement: Option<Placement>,
    pub meshes: Vec<MeshReport>,
    pub bindings: Vec<BindingReport>,
    pub overlays: Option<OverlaySummary>,
    pub warnings: Vec<ReviewWarning>,
}

impl ReviewReport {
    /// Snapshot of the session's current generation
    pub fn from_session(session: &ReviewSession) -> Option<Self> {
        let generation = session.generation()?;

        let bindings = session
            .bindings()
            .iter()
            .flat_map(|set| set.bindings.iter().map(move |b| (set.check, b)))
            .filter_map(|(check, binding)| {
                let mesh = generation.get(binding.mesh)?;
                Some(BindingReport {
                    check,
                    record: binding.record,
                    mesh: mesh.ordinal,
                    mesh_name: mesh.label(),
                    method: binding.method,
                })
            })
            .collect();

        Some(Self {
            source: generation.source_name.clone(),
            format: generation.format,
            generation: generation.id,
            placement: session.placement().copied(),
            meshes: generation.iter().map(|(_, mesh)| MeshReport::from(mesh)).collect(),
            bindings,
            overlays: session.overlays().map(|o| o.summary()),
            warnings: session.warnings().into_iter().cloned().collect(),
        })
    }
}
