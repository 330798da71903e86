// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Non-fatal review findings
//!
//! Nothing in the review pipeline aborts on bad data. Classification gaps,
//! unmatched records and degenerate geometry are collected here and handed
//! back next to whatever could be produced.

use serde::Serialize;
use sitecheck_core::CheckKind;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReviewWarning {
    /// A mesh has neither a resolvable name nor a layer
    Unclassified { mesh: String },
    /// A compliance record did not match any mesh
    UnboundRecord {
        check: CheckKind,
        ordinal: usize,
        record: String,
    },
    /// An overlay shape could not be built and was skipped
    DegenerateGeometry {
        check: CheckKind,
        record: String,
        reason: String,
    },
    /// The model has no usable bounding sphere to frame
    EmptyBounds,
}

impl ReviewWarning {
    /// Log at `warn` and hand the warning back
    pub fn emit(self) -> Self {
        tracing::warn!(warning = %self, "review warning");
        self
    }
}

impl fmt::Display for ReviewWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReviewWarning::Unclassified { mesh } => {
                write!(f, "mesh '{}' has no name or layer", mesh)
            }
            ReviewWarning::UnboundRecord { check, record, .. } => {
                write!(f, "{} result for {} matched no mesh", check, record)
            }
            ReviewWarning::DegenerateGeometry { check, record, reason } => {
                write!(f, "{} overlay for {} skipped: {}", check, record, reason)
            }
            ReviewWarning::EmptyBounds => f.write_str("model has no usable bounds"),
        }
    }
}
