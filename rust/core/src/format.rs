// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Source model formats

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// The two model formats the review tool accepts.
///
/// `Native` is the CAD authoring format (Z-up by convention, arbitrary units,
/// layer table). `Interchange` is glTF, which is Y-up in metres by definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelFormat {
    Native,
    Interchange,
}

impl ModelFormat {
    /// Guess the format from a file extension
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "3dm" | "json" => Some(ModelFormat::Native),
            "gltf" | "glb" => Some(ModelFormat::Interchange),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ModelFormat::Native => "native",
            ModelFormat::Interchange => "interchange",
        }
    }
}

impl fmt::Display for ModelFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModelFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "native" | "3dm" => Ok(ModelFormat::Native),
            "interchange" | "gltf" | "glb" => Ok(ModelFormat::Interchange),
            other => Err(format!("unknown model format '{}'", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_detection() {
        assert_eq!(ModelFormat::from_path(Path::new("site.3DM")), Some(ModelFormat::Native));
        assert_eq!(ModelFormat::from_path(Path::new("a/b/site.glb")), Some(ModelFormat::Interchange));
        assert_eq!(ModelFormat::from_path(Path::new("site.gltf")), Some(ModelFormat::Interchange));
        assert_eq!(ModelFormat::from_path(Path::new("site.obj")), None);
        assert_eq!(ModelFormat::from_path(Path::new("site")), None);
    }

    #[test]
    fn parse_names() {
        assert_eq!("GLTF".parse::<ModelFormat>(), Ok(ModelFormat::Interchange));
        assert_eq!("native".parse::<ModelFormat>(), Ok(ModelFormat::Native));
        assert!("ifc".parse::<ModelFormat>().is_err());
    }
}
