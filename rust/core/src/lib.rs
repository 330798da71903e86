// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! # SiteCheck Core
//!
//! Model loading and the data model shared by the review engine.
//!
//! ## Overview
//!
//! - **Loading**: [`ModelLoader`] reads a [`ModelSource`] and dispatches on
//!   [`ModelFormat`]. Interchange models (glTF/GLB) decode in-crate; native
//!   models go through a registered [`NativeDecoder`] such as
//!   [`DocumentDecoder`].
//! - **Scene**: decoders produce a [`SceneNode`] tree with per-mesh
//!   [`AttributeBag`]s and a [`LayerTable`], wrapped in a [`LoadedModel`].
//! - **Records**: the compliance-check result families consumed by the
//!   binder, grouped per request in [`CheckResults`].
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use sitecheck_core::{DocumentDecoder, ModelLoader, ModelSource};
//!
//! let loader = ModelLoader::new().with_native_decoder(Arc::new(DocumentDecoder));
//! let source = ModelSource::from_path("site.3dm", None)?;
//! let model = loader.load(&source).await?;
//! println!("{} meshes", model.mesh_count());
//! ```

pub mod attributes;
pub mod error;
pub mod format;
pub mod interchange;
pub mod loader;
pub mod native;
pub mod records;
pub mod scene;
pub mod units;

pub use attributes::{AttributeBag, AttributeSources, AttributeValue, USER_TEXT_CONTAINERS};
pub use error::{Error, Result};
pub use format::ModelFormat;
pub use interchange::decode_gltf;
pub use loader::{ModelLoader, ModelSource, SourceData};
pub use native::{DocumentDecoder, NativeDecoder};
pub use records::{
    BindingKeys, CheckKind, CheckResults, ComplianceRecord, CorridorResult, FireAccessResult,
    HeightResult, SetbackResult, SkyBridgeResult, WorldPoint,
};
pub use scene::{Layer, LayerTable, LoadedModel, MeshInstance, SceneMesh, SceneNode, LAYER_PATH_SEPARATOR};
pub use units::{unit_scale, unit_scale_or_metres};
