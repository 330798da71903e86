// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Up-axis detection and normalization
//!
//! Interchange files are Y-up by convention and are rotated deterministically.
//! Native files carry no reliable up axis, so each of the three source axes is
//! tested as a hypothesis: the model is assumed to be wider than it is tall,
//! and the axis with the smallest `vertical / max(horizontal)` ratio wins when
//! it is clearly flatter than the runner-up. Near-planar models (site plans,
//! thin massing layers) are then refined by aligning the best-fit plane normal
//! with up.

use crate::pca::{principal_axes, sample_stride};
use nalgebra::{Point2, Point3, Unit, UnitQuaternion, Vector3};
use sitecheck_core::ModelFormat;
use std::fmt;

/// A coordinate axis used as "up"
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UpAxis {
    X,
    Y,
    Z,
}

impl UpAxis {
    /// All axes in hypothesis order
    pub const ALL: [UpAxis; 3] = [UpAxis::X, UpAxis::Y, UpAxis::Z];

    /// Component index (x = 0, y = 1, z = 2)
    #[inline]
    pub fn index(self) -> usize {
        match self {
            UpAxis::X => 0,
            UpAxis::Y => 1,
            UpAxis::Z => 2,
        }
    }

    /// Unit vector along this axis
    #[inline]
    pub fn unit(self) -> Unit<Vector3<f64>> {
        match self {
            UpAxis::X => Vector3::x_axis(),
            UpAxis::Y => Vector3::y_axis(),
            UpAxis::Z => Vector3::z_axis(),
        }
    }

    /// The two remaining component indices in ascending order.
    ///
    /// For Y-up the plan is (x, z), which is clockwise seen from +y; callers
    /// that build solids from plan polygons re-wind in their own frame.
    #[inline]
    pub fn horizontal(self) -> (usize, usize) {
        match self {
            UpAxis::X => (1, 2),
            UpAxis::Y => (0, 2),
            UpAxis::Z => (0, 1),
        }
    }

    /// Drop the up component of a point
    #[inline]
    pub fn project(self, p: &Point3<f64>) -> Point2<f64> {
        let (a, b) = self.horizontal();
        Point2::new(p[a], p[b])
    }

    /// Inverse of [`UpAxis::project`] at the given height
    #[inline]
    pub fn lift(self, p: &Point2<f64>, height: f64) -> Point3<f64> {
        let (a, b) = self.horizontal();
        let mut out = Point3::origin();
        out[a] = p.x;
        out[b] = p.y;
        out[self.index()] = height;
        out
    }

    pub fn as_str(self) -> &'static str {
        match self {
            UpAxis::X => "x",
            UpAxis::Y => "y",
            UpAxis::Z => "z",
        }
    }
}

impl fmt::Display for UpAxis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for UpAxis {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "x" => Ok(UpAxis::X),
            "y" => Ok(UpAxis::Y),
            "z" => Ok(UpAxis::Z),
            other => Err(format!("unknown axis '{}'", other)),
        }
    }
}

/// Shortest rotation taking `from` onto `to`, including the antiparallel case
pub fn align_vectors(from: &Vector3<f64>, to: &Vector3<f64>) -> UnitQuaternion<f64> {
    if let Some(q) = UnitQuaternion::rotation_between(from, to) {
        return q;
    }
    // Antiparallel (or degenerate): half turn about any perpendicular axis
    let helper = if from.x.abs() < 0.9 { Vector3::x() } else { Vector3::y() };
    match Unit::try_new(from.cross(&helper), 1e-12) {
        Some(axis) => UnitQuaternion::from_axis_angle(&axis, std::f64::consts::PI),
        None => UnitQuaternion::identity(),
    }
}

/// Tunables for axis detection
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisSettings {
    /// Up axis of the rendering engine
    pub engine_up: UpAxis,
    /// A hypothesis only wins when its vertical/horizontal ratio is below this
    pub flatness_threshold: f64,
    /// ...and below `runner_up_margin` times the second best ratio
    pub runner_up_margin: f64,
    /// Smallest/largest covariance eigenvalue ratio that counts as planar
    pub planarity_ratio: f64,
    /// Maximum number of vertices fed to the covariance
    pub max_samples: usize,
}

impl Default for AxisSettings {
    fn default() -> Self {
        Self {
            engine_up: UpAxis::Y,
            flatness_threshold: 0.35,
            runner_up_margin: 0.85,
            planarity_ratio: 0.02,
            max_samples: 5000,
        }
    }
}

/// How the final rotation was chosen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AxisMethod {
    /// Fewer than three usable samples; model left as-is
    Skipped,
    /// Y-up interchange convention
    Interchange,
    /// Caller supplied the source up axis
    Override,
    /// Flatness heuristic picked a source axis
    Heuristic,
    /// Heuristic was inconclusive; native vertical axis assumed
    DefaultVertical,
    /// Best-fit plane normal aligned with up
    PlaneFit,
}

impl AxisMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            AxisMethod::Skipped => "skipped",
            AxisMethod::Interchange => "interchange",
            AxisMethod::Override => "override",
            AxisMethod::Heuristic => "heuristic",
            AxisMethod::DefaultVertical => "default_vertical",
            AxisMethod::PlaneFit => "plane_fit",
        }
    }
}

/// Result of axis normalization
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisDecision {
    /// Rotation from the source frame into the engine frame
    pub rotation: UnitQuaternion<f64>,
    pub method: AxisMethod,
    /// Source axis that was mapped to engine up (before any plane refinement)
    pub source_up: UpAxis,
    /// Flatness ratio per hypothesis (x, y, z); only filled for native models
    pub ratios: Option<[f64; 3]>,
}

impl AxisDecision {
    fn unchanged(engine_up: UpAxis) -> Self {
        Self {
            rotation: UnitQuaternion::identity(),
            method: AxisMethod::Skipped,
            source_up: engine_up,
            ratios: None,
        }
    }
}

/// Axis normalizer
#[derive(Debug, Clone, Default)]
pub struct AxisNormalizer {
    settings: AxisSettings,
}

impl AxisNormalizer {
    pub fn new(settings: AxisSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &AxisSettings {
        &self.settings
    }

    /// Decide the rotation that maps the model's up axis onto engine up.
    ///
    /// Pure function of its inputs: resolving the same samples twice yields
    /// the same rotation.
    pub fn resolve(
        &self,
        samples: &[Point3<f64>],
        format: ModelFormat,
        override_axis: Option<UpAxis>,
    ) -> AxisDecision {
        let engine_up = self.settings.engine_up;
        let usable: Vec<Point3<f64>> = samples
            .iter()
            .filter(|p| p.x.is_finite() && p.y.is_finite() && p.z.is_finite())
            .cloned()
            .collect();

        if usable.len() < 3 {
            tracing::debug!(samples = usable.len(), "Too few samples, skipping axis normalization");
            return AxisDecision::unchanged(engine_up);
        }

        if let Some(axis) = override_axis {
            return AxisDecision {
                rotation: align_vectors(&axis.unit(), &engine_up.unit()),
                method: AxisMethod::Override,
                source_up: axis,
                ratios: None,
            };
        }

        if format == ModelFormat::Interchange {
            return AxisDecision {
                rotation: align_vectors(&UpAxis::Y.unit(), &engine_up.unit()),
                method: AxisMethod::Interchange,
                source_up: UpAxis::Y,
                ratios: None,
            };
        }

        let ratios = flatness_ratios(&usable);
        let (source_up, method) = self.pick_axis(&ratios);
        let coarse = align_vectors(&source_up.unit(), &engine_up.unit());

        tracing::debug!(
            ratio_x = ratios[0],
            ratio_y = ratios[1],
            ratio_z = ratios[2],
            source_up = %source_up,
            method = method.as_str(),
            "Coarse up-axis decision"
        );

        match self.plane_refinement(&usable, &coarse) {
            Some(refine) => AxisDecision {
                rotation: refine * coarse,
                method: AxisMethod::PlaneFit,
                source_up,
                ratios: Some(ratios),
            },
            None => AxisDecision {
                rotation: coarse,
                method,
                source_up,
                ratios: Some(ratios),
            },
        }
    }

    fn pick_axis(&self, ratios: &[f64; 3]) -> (UpAxis, AxisMethod) {
        let mut ranked = UpAxis::ALL;
        ranked.sort_by(|a, b| ratios[a.index()].total_cmp(&ratios[b.index()]));
        let best = ratios[ranked[0].index()];
        let runner_up = ratios[ranked[1].index()];

        if best < self.settings.flatness_threshold && best < runner_up * self.settings.runner_up_margin {
            (ranked[0], AxisMethod::Heuristic)
        } else {
            // Native architectural models are Z-up unless proven otherwise
            (UpAxis::Z, AxisMethod::DefaultVertical)
        }
    }

    /// Rotation aligning a near-planar sample's normal with up, applied after `coarse`
    fn plane_refinement(
        &self,
        samples: &[Point3<f64>],
        coarse: &UnitQuaternion<f64>,
    ) -> Option<UnitQuaternion<f64>> {
        let stride = sample_stride(samples.len(), self.settings.max_samples);
        let rotated: Vec<Point3<f64>> = samples
            .iter()
            .step_by(stride)
            .map(|p| coarse * p)
            .collect();

        let (centroid, eigen) = principal_axes(&rotated)?;
        let (smallest, normal) = eigen.smallest();
        let (largest, _) = eigen.largest();

        if !(largest > 0.0) || smallest >= self.settings.planarity_ratio * largest {
            return None;
        }

        let up = self.settings.engine_up.unit();
        let normal = orient_normal(&normal, &centroid, &rotated, &up);
        tracing::debug!(
            eigen_ratio = smallest / largest,
            normal_x = normal.x,
            normal_y = normal.y,
            normal_z = normal.z,
            "Near-planar model, aligning plane normal with up"
        );
        Some(align_vectors(&normal, &up))
    }
}

/// Vertical/horizontal extent ratio for each source-axis hypothesis.
///
/// Rotating the sample so that a source axis becomes vertical maps the other
/// two axes onto the horizontal plane, so the ratio can be read directly from
/// the source-frame extents.
pub fn flatness_ratios(samples: &[Point3<f64>]) -> [f64; 3] {
    let mut min = [f64::MAX; 3];
    let mut max = [f64::MIN; 3];
    for p in samples {
        for i in 0..3 {
            min[i] = min[i].min(p[i]);
            max[i] = max[i].max(p[i]);
        }
    }
    let extent = [
        (max[0] - min[0]).max(0.0),
        (max[1] - min[1]).max(0.0),
        (max[2] - min[2]).max(0.0),
    ];

    let mut ratios = [f64::INFINITY; 3];
    for axis in UpAxis::ALL {
        let (a, b) = axis.horizontal();
        let horizontal = extent[a].max(extent[b]);
        if horizontal > 0.0 {
            ratios[axis.index()] = extent[axis.index()] / horizontal;
        }
    }
    ratios
}

/// Pick the sign of a plane normal from the sample mass distribution.
///
/// The bulk of the points (the ground slab) sits on one side of the centroid
/// and the sparse tail (buildings) on the other; the normal points from the
/// bulk toward the tail. Equal counts fall back to the engine up direction.
fn orient_normal(
    normal: &Vector3<f64>,
    centroid: &Point3<f64>,
    samples: &[Point3<f64>],
    up: &Unit<Vector3<f64>>,
) -> Vector3<f64> {
    let reach = samples
        .iter()
        .map(|p| (p - centroid).norm())
        .fold(0.0, f64::max);
    let tolerance = 1e-9 * reach.max(f64::MIN_POSITIVE);

    let (mut above, mut below) = (0usize, 0usize);
    for p in samples {
        let d = (p - centroid).dot(normal);
        if d > tolerance {
            above += 1;
        } else if d < -tolerance {
            below += 1;
        }
    }

    let flip = if above == below {
        normal.dot(up) < 0.0
    } else {
        above > below
    };

    if flip {
        -normal
    } else {
        *normal
    }
}
