// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Camera fitting and clip planes

use crate::bounds::BoundingSphere;

/// Viewport in pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Width / height, 1.0 for an unusable viewport
    #[inline]
    pub fn aspect(&self) -> f64 {
        if self.width > 0.0 && self.height > 0.0 {
            self.width / self.height
        } else {
            1.0
        }
    }
}

/// Clip plane settings
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClipSettings {
    /// Vertical field of view in degrees
    pub fov_deg: f64,
    /// Far plane is never closer than this
    pub min_far_floor: f64,
    /// Minimum gap between near and far
    pub epsilon: f64,
}

impl Default for ClipSettings {
    fn default() -> Self {
        Self {
            fov_deg: 45.0,
            min_far_floor: 1000.0,
            epsilon: 1e-3,
        }
    }
}

/// Camera distance plus clip planes framing a sphere
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraFit {
    pub distance: f64,
    pub near: f64,
    pub far: f64,
}

/// Near/far planes for a camera `distance` away from a sphere of `radius`.
///
/// `near = clamp(distance - 1.5 r, max(0.01, r / 1000), 0.05 distance)` and
/// `far = max(near + eps, distance + 2 r, min_far_floor)`.
pub fn clip_planes(distance: f64, radius: f64, settings: &ClipSettings) -> (f64, f64) {
    let lower = (radius / 1000.0).max(0.01);
    // A camera inside the sphere leaves an empty clamp range; the lower bound wins
    let upper = (distance * 0.05).max(lower);
    let near = (distance - radius * 1.5).clamp(lower, upper);
    let far = (near + settings.epsilon)
        .max(distance + radius * 2.0)
        .max(settings.min_far_floor);
    (near, far)
}

/// Fit a sphere into the viewport; `None` for a degenerate sphere
pub fn fit_sphere(
    sphere: &BoundingSphere,
    viewport: &Viewport,
    settings: &ClipSettings,
) -> Option<CameraFit> {
    if sphere.is_degenerate() {
        tracing::warn!(radius = sphere.radius, "Skipping camera fit for empty bounding sphere");
        return None;
    }

    let half_v = (settings.fov_deg.clamp(1.0, 179.0).to_radians()) * 0.5;
    let half_h = (half_v.tan() * viewport.aspect()).atan();
    let half = half_v.min(half_h);
    let distance = sphere.radius / half.sin();

    let (near, far) = clip_planes(distance, sphere.radius, settings);
    Some(CameraFit { distance, near, far })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::Point3;

    #[test]
    fn near_clamps_to_fraction_of_distance() {
        let (near, far) = clip_planes(100.0, 10.0, &ClipSettings::default());
        // distance - 1.5r = 85, capped at 5% of distance
        assert_relative_eq!(near, 5.0);
        assert_relative_eq!(far, 1000.0);
    }

    #[test]
    fn near_respects_radius_floor() {
        let (near, _) = clip_planes(2.0, 100.0, &ClipSettings::default());
        // Inside the sphere: lower bound max(0.01, 0.1) wins over 0.05 * 2
        assert_relative_eq!(near, 0.1);
    }

    #[test]
    fn far_grows_with_large_scenes() {
        let settings = ClipSettings {
            min_far_floor: 10.0,
            ..ClipSettings::default()
        };
        let (near, far) = clip_planes(5000.0, 2000.0, &settings);
        assert_relative_eq!(near, 250.0);
        assert_relative_eq!(far, 9000.0);
    }

    #[test]
    fn fit_frames_sphere() {
        let sphere = BoundingSphere {
            center: Point3::origin(),
            radius: 50.0,
        };
        let fit = fit_sphere(&sphere, &Viewport::new(800.0, 600.0), &ClipSettings::default()).unwrap();
        assert_relative_eq!(fit.distance, 50.0 / (22.5_f64.to_radians()).sin(), epsilon = 1e-9);
        assert!(fit.near > 0.0 && fit.near < fit.distance);
        assert!(fit.far >= fit.distance + 100.0);
    }

    #[test]
    fn portrait_viewport_backs_off() {
        let sphere = BoundingSphere {
            center: Point3::origin(),
            radius: 50.0,
        };
        let landscape = fit_sphere(&sphere, &Viewport::new(800.0, 600.0), &ClipSettings::default()).unwrap();
        let portrait = fit_sphere(&sphere, &Viewport::new(300.0, 600.0), &ClipSettings::default()).unwrap();
        assert!(portrait.distance > landscape.distance);
    }

    #[test]
    fn degenerate_sphere_is_skipped() {
        assert!(fit_sphere(&BoundingSphere::empty(), &Viewport::new(1.0, 1.0), &ClipSettings::default()).is_none());
    }
}
