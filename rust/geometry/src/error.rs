// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Overlay geometry that could not be built
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("cannot triangulate outline: {0}")]
    TriangulationError(String),

    #[error("bad extrusion: {0}")]
    InvalidExtrusion(String),

    #[error("degenerate outline: {0}")]
    DegenerateGeometry(String),
}
