// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Highlight colors

use serde::{Deserialize, Serialize};
use sitecheck_core::CheckKind;

/// RGBA in 0..1
pub type Rgba = [f32; 4];

/// Colors for violating meshes and overlay shapes, per check family
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HighlightPalette {
    pub height: Rgba,
    pub setback: Rgba,
    pub sight_corridor: Rgba,
    pub fire_access: Rgba,
    pub sky_bridge: Rgba,
    /// Alpha applied to violation volumes
    pub volume_alpha: f32,
}

impl Default for HighlightPalette {
    fn default() -> Self {
        Self {
            height: [0.92, 0.20, 0.20, 1.0],
            setback: [0.98, 0.55, 0.10, 1.0],
            sight_corridor: [0.60, 0.30, 0.85, 1.0],
            fire_access: [0.95, 0.80, 0.10, 1.0],
            sky_bridge: [0.15, 0.65, 0.90, 1.0],
            volume_alpha: 0.35,
        }
    }
}

impl HighlightPalette {
    pub fn color(&self, check: CheckKind) -> Rgba {
        match check {
            CheckKind::Height => self.height,
            CheckKind::Setback => self.setback,
            CheckKind::SightCorridor => self.sight_corridor,
            CheckKind::FireAccess => self.fire_access,
            CheckKind::SkyBridge => self.sky_bridge,
        }
    }

    /// Translucent variant for extruded volumes
    pub fn volume_color(&self, check: CheckKind) -> Rgba {
        let [r, g, b, _] = self.color(check);
        [r, g, b, self.volume_alpha]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_check_has_a_distinct_color() {
        let palette = HighlightPalette::default();
        for (i, a) in CheckKind::ALL.iter().enumerate() {
            for b in &CheckKind::ALL[i + 1..] {
                assert_ne!(palette.color(*a), palette.color(*b));
            }
        }
        assert_eq!(palette.volume_color(CheckKind::Height)[3], 0.35);
    }
}
