// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("model load failed: {0}")]
    Load(#[from] sitecheck_core::Error),

    #[error("geometry error: {0}")]
    Geometry(#[from] sitecheck_geometry::Error),

    #[error("scene transform already recorded for generation {0}")]
    TransformAlreadyRecorded(u64),

    #[error("no model loaded")]
    NoModel,

    #[error("upload failed: {0}")]
    Upload(String),

    #[error("invalid configuration: {0}")]
    Config(String),
}
