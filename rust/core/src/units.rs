// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Length unit conversion
//!
//! Native documents declare their model unit by name. Everything downstream
//! works in metres, so the loader records the multiplier here and placement
//! applies it as a uniform scale.

/// Multiplier that converts one model unit into metres.
///
/// Returns `None` for names we do not recognise.
#[inline]
pub fn unit_scale(name: &str) -> Option<f64> {
    let scale = match name.trim().to_ascii_lowercase().as_str() {
        "mm" | "millimeter" | "millimeters" | "millimetre" | "millimetres" => 1e-3,
        "cm" | "centimeter" | "centimeters" | "centimetre" | "centimetres" => 1e-2,
        "dm" | "decimeter" | "decimeters" => 1e-1,
        "m" | "meter" | "meters" | "metre" | "metres" | "" => 1.0,
        "km" | "kilometer" | "kilometers" => 1e3,
        "in" | "inch" | "inches" => 0.0254,
        "ft" | "foot" | "feet" => 0.3048,
        "yd" | "yard" | "yards" => 0.9144,
        _ => return None,
    };
    Some(scale)
}

/// Like [`unit_scale`] but falls back to metres with a warning
pub fn unit_scale_or_metres(name: Option<&str>) -> f64 {
    match name {
        None => 1.0,
        Some(name) => unit_scale(name).unwrap_or_else(|| {
            tracing::warn!(unit = name, "unknown model unit, assuming metres");
            1.0
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_common_units() {
        assert_eq!(unit_scale("mm"), Some(0.001));
        assert_eq!(unit_scale("Millimeters"), Some(0.001));
        assert_eq!(unit_scale("cm"), Some(0.01));
        assert_eq!(unit_scale(" meters "), Some(1.0));
        assert_eq!(unit_scale("in"), Some(0.0254));
        assert_eq!(unit_scale("feet"), Some(0.3048));
    }

    #[test]
    fn test_unknown_unit() {
        assert_eq!(unit_scale("furlong"), None);
        assert_eq!(unit_scale_or_metres(Some("furlong")), 1.0);
        assert_eq!(unit_scale_or_metres(None), 1.0);
    }
}
