// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Model sources and the format-dispatching loader

use crate::error::{Error, Result};
use crate::format::ModelFormat;
use crate::interchange::decode_gltf;
use crate::native::NativeDecoder;
use crate::scene::LoadedModel;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Where the model bytes come from
#[derive(Debug, Clone)]
pub enum SourceData {
    File(PathBuf),
    Bytes(Arc<[u8]>),
}

/// A model to load: payload, declared format and a display name
#[derive(Debug, Clone)]
pub struct ModelSource {
    pub name: String,
    pub format: ModelFormat,
    pub data: SourceData,
}

impl ModelSource {
    /// File source; the format is taken from the extension unless given
    pub fn from_path(path: impl AsRef<Path>, format: Option<ModelFormat>) -> Result<Self> {
        let path = path.as_ref();
        let format = match format.or_else(|| ModelFormat::from_path(path)) {
            Some(format) => format,
            None => return Err(Error::UnsupportedFormat(path.display().to_string())),
        };
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Ok(Self {
            name,
            format,
            data: SourceData::File(path.to_path_buf()),
        })
    }

    pub fn from_bytes(name: impl Into<String>, format: ModelFormat, bytes: impl Into<Arc<[u8]>>) -> Self {
        Self {
            name: name.into(),
            format,
            data: SourceData::Bytes(bytes.into()),
        }
    }

    /// Identity of the payload: the file path, or the name of an in-memory
    /// source. Concurrent reads of one key are shared.
    pub fn upload_key(&self) -> String {
        match &self.data {
            SourceData::File(path) => path.display().to_string(),
            SourceData::Bytes(_) => self.name.clone(),
        }
    }

    /// Fetch the raw payload
    pub async fn read(&self) -> Result<Arc<[u8]>> {
        match &self.data {
            SourceData::File(path) => Ok(tokio::fs::read(path).await?.into()),
            SourceData::Bytes(bytes) => Ok(Arc::clone(bytes)),
        }
    }
}

/// Dispatches a source to the decoder for its format
#[derive(Clone, Default)]
pub struct ModelLoader {
    native: Option<Arc<dyn NativeDecoder>>,
}

impl ModelLoader {
    /// Loader that only understands the interchange format
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_native_decoder(mut self, decoder: Arc<dyn NativeDecoder>) -> Self {
        self.native = Some(decoder);
        self
    }

    pub fn has_native_decoder(&self) -> bool {
        self.native.is_some()
    }

    /// Read and decode a source. A model without meshes is an error.
    pub async fn load(&self, source: &ModelSource) -> Result<LoadedModel> {
        let bytes = source.read().await?;
        self.decode(source, &bytes)
    }

    /// Decode an already-read payload
    pub fn decode(&self, source: &ModelSource, bytes: &[u8]) -> Result<LoadedModel> {
        let model = match source.format {
            ModelFormat::Interchange => decode_gltf(&source.name, bytes)?,
            ModelFormat::Native => {
                let decoder = self
                    .native
                    .as_ref()
                    .ok_or_else(|| Error::MissingDecoder(ModelFormat::Native.to_string()))?;
                tracing::debug!(decoder = decoder.name(), source = %source.name, "decoding native model");
                decoder.decode(&source.name, bytes)?
            }
        };

        if model.mesh_count() == 0 {
            return Err(Error::EmptyModel);
        }

        tracing::info!(
            source = %source.name,
            format = %model.format,
            meshes = model.mesh_count(),
            unit_scale = model.unit_scale,
            "model loaded"
        );
        Ok(model)
    }
}

impl std::fmt::Debug for ModelLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelLoader")
            .field("native", &self.native.as_ref().map(|d| d.name().to_string()))
            .finish()
    }
}
