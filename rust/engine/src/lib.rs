// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! # SiteCheck Engine
//!
//! Semantic side of the import pipeline. A [`ReviewSession`] takes a loaded
//! model through axis normalization and placement, classifies its meshes by
//! layer role, binds compliance results to them and builds overlays.
//!
//! ## Pipeline
//!
//! 1. [`import_model`]: resolve the up axis, compute the single
//!    [`SceneTransform`](sitecheck_geometry::SceneTransform) and classify
//!    every mesh into a [`ModelGeneration`]
//! 2. [`TransformCache`]: records the generation's [`Placement`] once
//! 3. [`ReviewBindings::bind_all`]: id, name, layer index, layer name,
//!    position
//! 4. [`OverlayBuilder`]: volumes, highlight lines, labels and camera fit,
//!    in the model's local frame
//!
//! Non-fatal problems are collected as [`ReviewWarning`]s.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use sitecheck_core::{DocumentDecoder, ModelLoader, ModelSource};
//! use sitecheck_engine::{ReviewConfig, ReviewSession};
//!
//! let loader = ModelLoader::new().with_native_decoder(Arc::new(DocumentDecoder));
//! let mut session = ReviewSession::new(ReviewConfig::from_env(), loader);
//! session.load(ModelSource::from_path("site.3dm", None)?).await?;
//! let overlays = session.set_results(results)?;
//! ```

pub mod binder;
pub mod classifier;
pub mod config;
pub mod error;
pub mod highlight;
pub mod keys;
pub mod overlay;
pub mod session;
pub mod transform_cache;
pub mod upload;
pub mod warnings;

pub use binder::{bind, positional_role, Binding, BindingSet, MatchMethod, ReviewBindings};
pub use classifier::{normalize_name, ImportedMesh, LayerRole, MeshClassifier, ModelGeneration};
pub use config::{ReviewConfig, RoleNames};
pub use error::{Error, Result};
pub use highlight::{HighlightPalette, Rgba};
pub use keys::MeshKey;
pub use overlay::{
    CameraSummary, HighlightLines, Label, MeshHighlight, OverlayBuilder, OverlaySet, OverlaySummary,
    VisibilityFlags, Volume,
};
pub use session::{import_model, LoadOutcome, LoadTicket, ReviewSession};
pub use transform_cache::{Placement, TransformCache};
pub use upload::UploadCoalescer;
pub use warnings::ReviewWarning;
