// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Review session
//!
//! Owns the current model generation and everything derived from it. A load
//! is issued as a ticket plus a future; when the future resolves, the result
//! is only installed if its source is still the latest one requested. All
//! derived state is replaced wholesale on install and rebuilt wholesale when
//! results or visibility change.

use crate::binder::ReviewBindings;
use crate::classifier::{ImportedMesh, MeshClassifier, ModelGeneration};
use crate::config::ReviewConfig;
use crate::error::{Error, Result};
use crate::highlight::{HighlightPalette, Rgba};
use crate::keys::MeshKey;
use crate::overlay::{OverlayBuilder, OverlaySet, VisibilityFlags};
use crate::transform_cache::{Placement, TransformCache};
use crate::upload::UploadCoalescer;
use crate::warnings::ReviewWarning;
use futures::future::{BoxFuture, FutureExt};
use rustc_hash::FxHashSet;
use slotmap::SlotMap;
use sitecheck_core::{CheckKind, CheckResults, LoadedModel, ModelLoader, ModelSource};
use sitecheck_geometry::{Aabb, AxisNormalizer, Point3, SceneTransform, UpAxis, Viewport};
use std::sync::Arc;

/// Normalize, place and classify a loaded model as generation `id`.
///
/// `arena` is the previous generation's mesh arena (or an empty one); it is
/// cleared before use.
pub fn import_model(
    id: u64,
    model: &LoadedModel,
    config: &ReviewConfig,
    up_override: Option<UpAxis>,
    arena: SlotMap<MeshKey, ImportedMesh>,
) -> (ModelGeneration, Vec<ReviewWarning>) {
    let samples = model.sample_points(config.max_pca_samples);
    let decision = AxisNormalizer::new(config.axis_settings()).resolve(&samples, model.format, up_override);
    tracing::debug!(
        generation = id,
        method = decision.method.as_str(),
        source_up = decision.source_up.as_str(),
        "resolved up axis"
    );

    let points: Vec<Point3<f64>> = model
        .mesh_instances()
        .iter()
        .flat_map(|instance| instance.points())
        .collect();
    let transform = SceneTransform::place(decision.rotation, model.unit_scale, &points, config.engine_up);
    let placement = Placement::new(transform, Aabb::empty(), decision);

    MeshClassifier::new(config).classify_into(arena, id, model, placement)
}

/// Identifies one issued load
#[derive(Debug, Clone)]
pub struct LoadTicket {
    source: Arc<ModelSource>,
}

impl LoadTicket {
    pub fn source(&self) -> &ModelSource {
        &self.source
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    Installed { generation: u64 },
    /// A newer load was requested before this one finished
    Superseded,
}

pub struct ReviewSession {
    config: ReviewConfig,
    loader: ModelLoader,
    uploads: UploadCoalescer<Arc<[u8]>>,
    palette: HighlightPalette,
    next_generation: u64,
    latest: Option<Arc<ModelSource>>,
    up_override: Option<UpAxis>,
    model: Option<LoadedModel>,
    current: Option<ModelGeneration>,
    transforms: TransformCache,
    import_warnings: Vec<ReviewWarning>,
    results: CheckResults,
    bindings: ReviewBindings,
    flags: VisibilityFlags,
    viewport: Viewport,
    overlays: Option<OverlaySet>,
}

impl ReviewSession {
    pub fn new(config: ReviewConfig, loader: ModelLoader) -> Self {
        Self {
            config,
            loader,
            uploads: UploadCoalescer::new(),
            palette: HighlightPalette::default(),
            next_generation: 1,
            latest: None,
            up_override: None,
            model: None,
            current: None,
            transforms: TransformCache::new(),
            import_warnings: Vec::new(),
            results: CheckResults::default(),
            bindings: ReviewBindings::default(),
            flags: VisibilityFlags::default(),
            viewport: Viewport::new(1280.0, 720.0),
            overlays: None,
        }
    }

    pub fn with_palette(mut self, palette: HighlightPalette) -> Self {
        self.palette = palette;
        self
    }

    /// Source up axis to force on the next import
    pub fn with_up_override(mut self, axis: Option<UpAxis>) -> Self {
        self.up_override = axis;
        self
    }

    /// Issue a load. The returned future does not touch the session; hand its
    /// output to [`ReviewSession::complete_load`] together with the ticket.
    ///
    /// The payload read goes through the session's upload coalescer, so
    /// overlapping requests for the same file share one read. A failed read
    /// surfaces as [`Error::Upload`], a failed decode as [`Error::Load`].
    pub fn request_load(&mut self, source: ModelSource) -> (LoadTicket, BoxFuture<'static, Result<LoadedModel>>) {
        let source = Arc::new(source);
        self.latest = Some(Arc::clone(&source));
        tracing::debug!(source = %source.name, format = %source.format, "load requested");

        let loader = self.loader.clone();
        let uploads = self.uploads.clone();
        let task_source = Arc::clone(&source);
        let load = async move {
            let reader = Arc::clone(&task_source);
            let bytes = uploads
                .upload(&task_source.upload_key(), move || async move {
                    reader.read().await.map_err(|e| e.to_string())
                })
                .await?;
            Ok(loader.decode(&task_source, &bytes)?)
        }
        .boxed();
        (LoadTicket { source }, load)
    }

    /// Install the result of a load issued by [`ReviewSession::request_load`].
    ///
    /// Results for any source other than the latest requested are ignored. A
    /// failed load leaves the current generation untouched.
    pub fn complete_load(
        &mut self,
        ticket: LoadTicket,
        result: Result<LoadedModel>,
    ) -> Result<LoadOutcome> {
        let is_latest = self
            .latest
            .as_ref()
            .map_or(false, |latest| Arc::ptr_eq(latest, &ticket.source));
        if !is_latest {
            tracing::debug!(source = %ticket.source.name, "ignoring superseded load");
            return Ok(LoadOutcome::Superseded);
        }
        self.latest = None;

        match result {
            Ok(model) => self.install(model),
            Err(e) => {
                tracing::warn!(source = %ticket.source.name, error = %e, "model load failed");
                Err(e)
            }
        }
    }

    /// Request, await and install in one step
    pub async fn load(&mut self, source: ModelSource) -> Result<LoadOutcome> {
        let (ticket, load) = self.request_load(source);
        let result = load.await;
        self.complete_load(ticket, result)
    }

    /// Install an already-decoded model as a new generation
    pub fn install(&mut self, model: LoadedModel) -> Result<LoadOutcome> {
        let id = self.next_generation;
        self.next_generation += 1;

        let arena = self
            .current
            .take()
            .map(ModelGeneration::into_arena)
            .unwrap_or_default();
        let (generation, warnings) = import_model(id, &model, &self.config, self.up_override, arena);
        self.transforms.record(id, *generation.placement())?;

        self.current = Some(generation);
        self.model = Some(model);
        self.import_warnings = warnings;
        self.results = CheckResults::default();
        self.bindings = ReviewBindings::default();
        self.rebuild_overlays();

        tracing::info!(generation = id, "model generation installed");
        Ok(LoadOutcome::Installed { generation: id })
    }

    /// Force a source up axis and re-import the current model as a new
    /// generation
    pub fn set_up_override(&mut self, axis: Option<UpAxis>) -> Result<LoadOutcome> {
        self.up_override = axis;
        let model = self.model.take().ok_or(Error::NoModel)?;
        self.install(model)
    }

    /// Bind a new batch of results and rebuild overlays
    pub fn set_results(&mut self, results: CheckResults) -> Result<&OverlaySet> {
        let generation = self.current.as_ref().ok_or(Error::NoModel)?;
        self.bindings = ReviewBindings::bind_all(generation, &results);
        self.results = results;
        tracing::debug!(
            generation = generation.id,
            bindings = self.bindings.binding_count(),
            "bound compliance results"
        );
        self.rebuild_overlays();
        self.overlays.as_ref().ok_or(Error::NoModel)
    }

    pub fn set_visibility(&mut self, check: CheckKind, visible: bool) {
        if self.flags.is_visible(check) != visible {
            self.flags.set(check, visible);
            self.rebuild_overlays();
        }
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
        self.rebuild_overlays();
    }

    fn rebuild_overlays(&mut self) {
        self.overlays = self.current.as_ref().map(|generation| {
            OverlayBuilder::new(generation, &self.config, &self.palette).build(
                &self.results,
                &self.bindings,
                &self.flags,
                &self.viewport,
            )
        });
    }

    /// Take the highlight overrides out of the current overlays and return
    /// each highlighted mesh's loaded base color
    pub fn restore_base_colors(&mut self) -> Vec<(MeshKey, Rgba)> {
        let (Some(generation), Some(overlays)) = (&self.current, &mut self.overlays) else {
            return Vec::new();
        };
        let mut seen = FxHashSet::default();
        std::mem::take(&mut overlays.highlights)
            .into_iter()
            .filter(|h| seen.insert(h.mesh))
            .filter_map(|h| generation.base_color(h.mesh).map(|color| (h.mesh, color)))
            .collect()
    }

    pub fn config(&self) -> &ReviewConfig {
        &self.config
    }

    pub fn generation(&self) -> Option<&ModelGeneration> {
        self.current.as_ref()
    }

    pub fn model(&self) -> Option<&LoadedModel> {
        self.model.as_ref()
    }

    /// Placement of the current generation, as recorded in the transform cache
    pub fn placement(&self) -> Option<&Placement> {
        let id = self.current.as_ref()?.id;
        self.transforms.get_for(id)
    }

    pub fn results(&self) -> &CheckResults {
        &self.results
    }

    pub fn bindings(&self) -> &ReviewBindings {
        &self.bindings
    }

    pub fn overlays(&self) -> Option<&OverlaySet> {
        self.overlays.as_ref()
    }

    pub fn visibility(&self) -> &VisibilityFlags {
        &self.flags
    }

    pub fn is_loading(&self) -> bool {
        self.latest.is_some()
    }

    /// Payload reads shared between overlapping loads
    pub fn uploads(&self) -> &UploadCoalescer<Arc<[u8]>> {
        &self.uploads
    }

    /// Import, binding and overlay warnings of the current generation
    pub fn warnings(&self) -> Vec<&ReviewWarning> {
        self.import_warnings
            .iter()
            .chain(self.bindings.warnings())
            .chain(self.overlays.iter().flat_map(|o| o.warnings.iter()))
            .collect()
    }
}

impl std::fmt::Debug for ReviewSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReviewSession")
            .field("generation", &self.current.as_ref().map(|g| g.id))
            .field("loading", &self.is_loading())
            .field("bindings", &self.bindings.binding_count())
            .finish()
    }
}
