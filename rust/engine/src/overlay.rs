// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Overlay generation
//!
//! Turns bound compliance results into render-ready shapes: extruded
//! violation volumes, highlight line sets, label anchors and per-mesh
//! highlight colors. Shapes are computed in world space and stored in the
//! model's local frame, so a renderer parents them under the same node as the
//! imported subtree. An [`OverlaySet`] is always rebuilt from scratch.

use crate::binder::{BindingSet, ReviewBindings};
use crate::classifier::{ImportedMesh, ModelGeneration};
use crate::config::ReviewConfig;
use crate::highlight::{HighlightPalette, Rgba};
use crate::keys::MeshKey;
use crate::warnings::ReviewWarning;
use serde::Serialize;
use sitecheck_core::{
    CheckKind, CheckResults, ComplianceRecord, CorridorResult, FireAccessResult, HeightResult,
    SetbackResult, SkyBridgeResult, WorldPoint,
};
use sitecheck_geometry::{
    clean_polygon, extrude_polygon, fit_sphere, CameraFit, LineSet, Mesh, Point3, Vector3, Viewport,
};

/// Per-check overlay visibility
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VisibilityFlags {
    flags: [bool; 5],
}

impl Default for VisibilityFlags {
    fn default() -> Self {
        Self { flags: [true; 5] }
    }
}

impl VisibilityFlags {
    fn slot(check: CheckKind) -> usize {
        match check {
            CheckKind::Height => 0,
            CheckKind::Setback => 1,
            CheckKind::SightCorridor => 2,
            CheckKind::FireAccess => 3,
            CheckKind::SkyBridge => 4,
        }
    }

    pub fn is_visible(&self, check: CheckKind) -> bool {
        self.flags[Self::slot(check)]
    }

    pub fn set(&mut self, check: CheckKind, visible: bool) {
        self.flags[Self::slot(check)] = visible;
    }
}

/// Extruded violation solid
#[derive(Debug, Clone)]
pub struct Volume {
    pub check: CheckKind,
    pub record: usize,
    pub color: Rgba,
    pub mesh: Mesh,
}

/// Highlight line segments for one record
#[derive(Debug, Clone)]
pub struct HighlightLines {
    pub check: CheckKind,
    pub record: usize,
    pub color: Rgba,
    pub lines: LineSet,
}

/// Color override for a violating mesh
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeshHighlight {
    pub mesh: MeshKey,
    pub check: CheckKind,
    pub record: usize,
    pub color: Rgba,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Label {
    pub check: CheckKind,
    pub record: usize,
    #[serde(skip)]
    pub mesh: Option<MeshKey>,
    pub text: String,
    /// Local-frame anchor
    pub anchor: [f64; 3],
    pub violation: bool,
}

#[derive(Debug, Clone, Default)]
pub struct OverlaySet {
    pub generation: u64,
    pub volumes: Vec<Volume>,
    pub lines: Vec<HighlightLines>,
    pub labels: Vec<Label>,
    pub highlights: Vec<MeshHighlight>,
    pub camera: Option<CameraFit>,
    pub warnings: Vec<ReviewWarning>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CameraSummary {
    pub distance: f64,
    pub near: f64,
    pub far: f64,
}

/// Counts and labels, for reports
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverlaySummary {
    pub volumes: usize,
    pub volume_triangles: usize,
    pub line_segments: usize,
    pub highlighted_meshes: usize,
    pub labels: Vec<Label>,
    pub camera: Option<CameraSummary>,
}

impl OverlaySet {
    pub fn is_empty(&self) -> bool {
        self.volumes.is_empty()
            && self.lines.is_empty()
            && self.labels.is_empty()
            && self.highlights.is_empty()
    }

    pub fn summary(&self) -> OverlaySummary {
        OverlaySummary {
            volumes: self.volumes.len(),
            volume_triangles: self.volumes.iter().map(|v| v.mesh.triangle_count()).sum(),
            line_segments: self.lines.iter().map(|l| l.lines.segment_count()).sum(),
            highlighted_meshes: self.highlights.len(),
            labels: self.labels.clone(),
            camera: self.camera.map(|c| CameraSummary {
                distance: c.distance,
                near: c.near,
                far: c.far,
            }),
        }
    }
}

fn world_points(points: &[WorldPoint]) -> Vec<Point3<f64>> {
    points.iter().map(|p| Point3::new(p[0], p[1], p[2])).collect()
}

/// Builds the overlays of one generation
pub struct OverlayBuilder<'a> {
    generation: &'a ModelGeneration,
    config: &'a ReviewConfig,
    palette: &'a HighlightPalette,
}

impl<'a> OverlayBuilder<'a> {
    pub fn new(generation: &'a ModelGeneration, config: &'a ReviewConfig, palette: &'a HighlightPalette) -> Self {
        Self {
            generation,
            config,
            palette,
        }
    }

    pub fn build(
        &self,
        results: &CheckResults,
        bindings: &ReviewBindings,
        flags: &VisibilityFlags,
        viewport: &Viewport,
    ) -> OverlaySet {
        let mut out = OverlaySet {
            generation: self.generation.id,
            ..Default::default()
        };

        if flags.is_visible(CheckKind::Height) {
            self.height(&results.height, bindings.get(CheckKind::Height), &mut out);
        }
        if flags.is_visible(CheckKind::Setback) {
            self.setback(&results.setback, bindings.get(CheckKind::Setback), &mut out);
        }
        if flags.is_visible(CheckKind::SightCorridor) {
            self.corridor(&results.sight_corridor, bindings.get(CheckKind::SightCorridor), &mut out);
        }
        if flags.is_visible(CheckKind::FireAccess) {
            self.fire_access(&results.fire_access, bindings.get(CheckKind::FireAccess), &mut out);
        }
        if flags.is_visible(CheckKind::SkyBridge) {
            self.sky_bridge(&results.sky_bridge, bindings.get(CheckKind::SkyBridge), &mut out);
        }

        let placement = self.generation.placement();
        out.camera = fit_sphere(&placement.sphere, viewport, &self.config.clip_settings());
        if out.camera.is_none() {
            out.warnings.push(ReviewWarning::EmptyBounds.emit());
        }

        tracing::debug!(
            generation = out.generation,
            volumes = out.volumes.len(),
            lines = out.lines.len(),
            labels = out.labels.len(),
            highlights = out.highlights.len(),
            "built overlays"
        );
        out
    }

    fn height(&self, records: &[HeightResult], set: Option<&BindingSet>, out: &mut OverlaySet) {
        let up = self.generation.up;
        for (i, record) in records.iter().enumerate() {
            let Some((key, mesh)) = self.bound(set, i) else {
                continue;
            };
            self.label(out, CheckKind::Height, i, Some(key), record, mesh.bounds.upper_center(up));
            if !record.is_violation() {
                continue;
            }
            self.highlight(out, CheckKind::Height, i, key);

            let exceed = record.exceedance();
            if exceed <= 0.0 {
                continue;
            }
            match &mesh.footprint {
                Some(footprint) => {
                    let base = mesh.bounds.min[up.index()] + record.height_limit;
                    let outline: Vec<Point3<f64>> =
                        footprint.points().iter().map(|p| up.lift(p, base)).collect();
                    self.volume(out, CheckKind::Height, i, record, &outline, exceed);
                }
                None => out.warnings.push(
                    ReviewWarning::DegenerateGeometry {
                        check: CheckKind::Height,
                        record: record.binding_keys(i).describe(),
                        reason: format!("mesh '{}' has no footprint", mesh.label()),
                    }
                    .emit(),
                ),
            }
        }
    }

    fn setback(&self, records: &[SetbackResult], set: Option<&BindingSet>, out: &mut OverlaySet) {
        let up = self.generation.up;
        for (i, record) in records.iter().enumerate() {
            let bound = self.bound(set, i);
            let violation = record.is_violation();
            let outline = record.outline_points.as_deref().map(world_points);

            if let (true, Some(outline)) = (violation, &outline) {
                let height = bound
                    .map(|(_, m)| m.height(up))
                    .filter(|h| *h > 0.0)
                    .unwrap_or(self.config.default_volume_height);
                self.volume(out, CheckKind::Setback, i, record, outline, height);
            }

            if let Some(segments) = &record.highlight_segments {
                let segments: Vec<[Point3<f64>; 2]> = segments
                    .iter()
                    .map(|[a, b]| [Point3::new(a[0], a[1], a[2]), Point3::new(b[0], b[1], b[2])])
                    .collect();
                if let Some(lines) = LineSet::from_segments(&segments) {
                    self.lines(out, CheckKind::Setback, i, lines);
                }
            }

            let anchor = outline
                .as_deref()
                .and_then(|o| self.outline_anchor(o))
                .or_else(|| bound.map(|(_, m)| m.bounds.upper_center(up)));
            if let Some(anchor) = anchor {
                self.label(out, CheckKind::Setback, i, bound.map(|(k, _)| k), record, anchor);
            }
            if let (true, Some((key, _))) = (violation, bound) {
                self.highlight(out, CheckKind::Setback, i, key);
            }
        }
    }

    fn corridor(&self, records: &[CorridorResult], set: Option<&BindingSet>, out: &mut OverlaySet) {
        let up = self.generation.up;
        for (i, record) in records.iter().enumerate() {
            let Some((key, mesh)) = self.bound(set, i) else {
                continue;
            };
            self.label(out, CheckKind::SightCorridor, i, Some(key), record, mesh.bounds.upper_center(up));
            if record.is_violation() {
                self.highlight(out, CheckKind::SightCorridor, i, key);
            }
        }
    }

    fn fire_access(&self, records: &[FireAccessResult], set: Option<&BindingSet>, out: &mut OverlaySet) {
        let up = self.generation.up;
        for (i, record) in records.iter().enumerate() {
            let bound = self.bound(set, i);
            let route = record.route_points.as_deref().map(world_points);

            if let Some(lines) = route.as_deref().and_then(LineSet::from_polyline) {
                self.lines(out, CheckKind::FireAccess, i, lines);
            }

            let anchor = bound
                .map(|(_, m)| m.bounds.upper_center(up))
                .or_else(|| route.as_ref().and_then(|r| r.first().copied()));
            if let Some(anchor) = anchor {
                self.label(out, CheckKind::FireAccess, i, bound.map(|(k, _)| k), record, anchor);
            }
            if let (true, Some((key, _))) = (record.is_violation(), bound) {
                self.highlight(out, CheckKind::FireAccess, i, key);
            }
        }
    }

    fn sky_bridge(&self, records: &[SkyBridgeResult], set: Option<&BindingSet>, out: &mut OverlaySet) {
        let up = self.generation.up;
        for (i, record) in records.iter().enumerate() {
            let bound = self.bound(set, i);
            let violation = record.is_violation();
            let outline = record.outline_points.as_deref().map(world_points);

            if let (true, Some(outline)) = (violation, &outline) {
                let height = record
                    .height
                    .or_else(|| bound.map(|(_, m)| m.height(up)))
                    .filter(|h| *h > 0.0)
                    .unwrap_or(self.config.default_volume_height);
                self.volume(out, CheckKind::SkyBridge, i, record, outline, height);
            }

            let anchor = bound
                .map(|(_, m)| m.bounds.upper_center(up))
                .or_else(|| outline.as_deref().and_then(|o| self.outline_anchor(o)));
            if let Some(anchor) = anchor {
                self.label(out, CheckKind::SkyBridge, i, bound.map(|(k, _)| k), record, anchor);
            }
            if let (true, Some((key, _))) = (violation, bound) {
                self.highlight(out, CheckKind::SkyBridge, i, key);
            }
        }
    }

    fn bound(&self, set: Option<&BindingSet>, record: usize) -> Option<(MeshKey, &'a ImportedMesh)> {
        let key = set?.mesh_for(record)?;
        self.generation.get(key).map(|mesh| (key, mesh))
    }

    /// Vertex average of the cleaned outline, raised to its highest point
    fn outline_anchor(&self, outline: &[Point3<f64>]) -> Option<Point3<f64>> {
        let cleaned = clean_polygon(outline);
        if cleaned.is_empty() {
            return None;
        }
        let up = self.generation.up.index();
        let sum = cleaned.iter().fold(Vector3::zeros(), |acc, p| acc + p.coords);
        let mut anchor = Point3::from(sum / cleaned.len() as f64);
        anchor[up] = cleaned.iter().map(|p| p[up]).fold(f64::MIN, f64::max);
        Some(anchor)
    }

    fn label<R: ComplianceRecord>(
        &self,
        out: &mut OverlaySet,
        check: CheckKind,
        record: usize,
        mesh: Option<MeshKey>,
        result: &R,
        world_anchor: Point3<f64>,
    ) {
        let local = self.generation.transform().inverse_apply(&world_anchor);
        out.labels.push(Label {
            check,
            record,
            mesh,
            text: result.label(),
            anchor: local.coords.into(),
            violation: result.is_violation(),
        });
    }

    fn highlight(&self, out: &mut OverlaySet, check: CheckKind, record: usize, mesh: MeshKey) {
        out.highlights.push(MeshHighlight {
            mesh,
            check,
            record,
            color: self.palette.color(check),
        });
    }

    fn lines(&self, out: &mut OverlaySet, check: CheckKind, record: usize, world: LineSet) {
        let transform = self.generation.transform();
        let mut lines = world;
        lines.map_points(|p| transform.inverse_apply(p));
        out.lines.push(HighlightLines {
            check,
            record,
            color: self.palette.color(check),
            lines,
        });
    }

    fn volume<R: ComplianceRecord>(
        &self,
        out: &mut OverlaySet,
        check: CheckKind,
        record: usize,
        result: &R,
        outline: &[Point3<f64>],
        height: f64,
    ) {
        match extrude_polygon(outline, height, &self.generation.up.unit()) {
            Ok(world) => out.volumes.push(Volume {
                check,
                record,
                color: self.palette.volume_color(check),
                mesh: self.local_mesh(world),
            }),
            Err(e) => out.warnings.push(
                ReviewWarning::DegenerateGeometry {
                    check,
                    record: result.binding_keys(record).describe(),
                    reason: e.to_string(),
                }
                .emit(),
            ),
        }
    }

    fn local_mesh(&self, mut mesh: Mesh) -> Mesh {
        let transform = self.generation.transform();
        mesh.map_vertices(|p| transform.inverse_apply(p), |n| transform.local_direction(n));
        mesh
    }
}
