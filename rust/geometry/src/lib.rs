// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! # SiteCheck Geometry
//!
//! Numerical core of the model import pipeline:
//!
//! - **Bounds**: f64 axis-aligned boxes and bounding spheres
//! - **Hull**: monotone-chain 2D convex hull
//! - **PCA**: covariance and Jacobi eigen decomposition of sampled vertices
//! - **Axis**: up-axis detection and best-fit plane alignment
//! - **Transform**: the single position/rotation/scale placement of a model
//! - **Footprint**: plan-view convex footprints
//! - **Extrusion / Lines / Camera**: render-ready overlay primitives
//!
//! nalgebra provides the linear algebra; earcutr triangulates non-convex caps.

pub mod axis;
pub mod bounds;
pub mod camera;
pub mod error;
pub mod extrusion;
pub mod footprint;
pub mod hull;
pub mod lines;
pub mod mesh;
pub mod pca;
pub mod transform;
pub mod triangulation;

// Re-export nalgebra types for convenience
pub use nalgebra::{Point2, Point3, Unit, UnitQuaternion, Vector3};

pub use axis::{align_vectors, AxisDecision, AxisMethod, AxisNormalizer, AxisSettings, UpAxis};
pub use bounds::{Aabb, BoundingSphere};
pub use camera::{clip_planes, fit_sphere, CameraFit, ClipSettings, Viewport};
pub use error::{Error, Result};
pub use extrusion::{clean_polygon, extrude_polygon};
pub use footprint::{extract_footprint, footprint_stride, Footprint, DEFAULT_FOOTPRINT_SAMPLES};
pub use hull::convex_hull;
pub use lines::LineSet;
pub use mesh::Mesh;
pub use pca::{covariance, jacobi_eigen, principal_axes, sample_stride, SymmetricEigen3};
pub use transform::SceneTransform;
pub use triangulation::triangulate_polygon;
