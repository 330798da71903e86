// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("failed to read model: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("glTF decode failed: {0}")]
    Gltf(#[from] gltf::Error),

    #[error("no decoder registered for {0} models")]
    MissingDecoder(String),

    #[error("unsupported model format: {0}")]
    UnsupportedFormat(String),

    #[error("invalid model document: {0}")]
    InvalidDocument(String),

    #[error("model contains no meshes")]
    EmptyModel,
}
