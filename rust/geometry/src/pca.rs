// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Principal component analysis over sampled surface points
//!
//! The covariance matrix of a point sample is symmetric 3x3, so the cyclic
//! Jacobi method converges in a handful of sweeps and gives orthonormal
//! eigenvectors without any external solver.

use nalgebra::{Matrix3, Point3, Vector3};

const JACOBI_MAX_SWEEPS: usize = 64;
const JACOBI_TOLERANCE: f64 = 1e-24;

/// Eigen decomposition of a symmetric 3x3 matrix, sorted ascending
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SymmetricEigen3 {
    /// Eigenvalues, smallest first
    pub values: Vector3<f64>,
    /// Unit eigenvectors as columns, in the same order as `values`
    pub vectors: Matrix3<f64>,
}

impl SymmetricEigen3 {
    #[inline]
    pub fn smallest(&self) -> (f64, Vector3<f64>) {
        (self.values[0], self.vectors.column(0).into_owned())
    }

    #[inline]
    pub fn largest(&self) -> (f64, Vector3<f64>) {
        (self.values[2], self.vectors.column(2).into_owned())
    }
}

/// Stride that keeps at most `max_samples` of `count` items
#[inline]
pub fn sample_stride(count: usize, max_samples: usize) -> usize {
    if max_samples == 0 {
        return count.max(1);
    }
    count.div_ceil(max_samples).max(1)
}

/// Mean and covariance of a point set, or `None` when empty
pub fn covariance(points: &[Point3<f64>]) -> Option<(Point3<f64>, Matrix3<f64>)> {
    if points.is_empty() {
        return None;
    }
    let n = points.len() as f64;
    let sum = points
        .iter()
        .fold(Vector3::zeros(), |acc, p| acc + p.coords);
    let mean = sum / n;

    let mut cov = Matrix3::zeros();
    for p in points {
        let d = p.coords - mean;
        cov += d * d.transpose();
    }
    cov /= n;

    Some((Point3::from(mean), cov))
}

/// Cyclic Jacobi eigenvalue decomposition of a symmetric 3x3 matrix
pub fn jacobi_eigen(matrix: &Matrix3<f64>) -> SymmetricEigen3 {
    let mut a = (matrix + matrix.transpose()) * 0.5;
    let mut v = Matrix3::<f64>::identity();
    let scale = a.norm_squared().max(f64::MIN_POSITIVE);

    for _ in 0..JACOBI_MAX_SWEEPS {
        let off = a[(0, 1)].powi(2) + a[(0, 2)].powi(2) + a[(1, 2)].powi(2);
        if off <= JACOBI_TOLERANCE * scale {
            break;
        }

        for (p, q) in [(0usize, 1usize), (0, 2), (1, 2)] {
            let apq = a[(p, q)];
            if apq.abs() <= f64::MIN_POSITIVE {
                continue;
            }

            let theta = (a[(q, q)] - a[(p, p)]) / (2.0 * apq);
            let t = theta.signum() / (theta.abs() + (theta * theta + 1.0).sqrt());
            let c = 1.0 / (t * t + 1.0).sqrt();
            let s = t * c;

            // A <- A J
            for k in 0..3 {
                let akp = a[(k, p)];
                let akq = a[(k, q)];
                a[(k, p)] = c * akp - s * akq;
                a[(k, q)] = s * akp + c * akq;
            }
            // A <- J^T A
            for k in 0..3 {
                let apk = a[(p, k)];
                let aqk = a[(q, k)];
                a[(p, k)] = c * apk - s * aqk;
                a[(q, k)] = s * apk + c * aqk;
            }
            // V <- V J
            for k in 0..3 {
                let vkp = v[(k, p)];
                let vkq = v[(k, q)];
                v[(k, p)] = c * vkp - s * vkq;
                v[(k, q)] = s * vkp + c * vkq;
            }
        }
    }

    let mut order = [0usize, 1, 2];
    order.sort_by(|&i, &j| a[(i, i)].total_cmp(&a[(j, j)]));

    let values = Vector3::new(a[(order[0], order[0])], a[(order[1], order[1])], a[(order[2], order[2])]);
    let vectors = Matrix3::from_columns(&[
        v.column(order[0]).normalize(),
        v.column(order[1]).normalize(),
        v.column(order[2]).normalize(),
    ]);

    SymmetricEigen3 { values, vectors }
}

/// Principal axes of a point set: centroid plus covariance eigen decomposition
pub fn principal_axes(points: &[Point3<f64>]) -> Option<(Point3<f64>, SymmetricEigen3)> {
    covariance(points).map(|(mean, cov)| (mean, jacobi_eigen(&cov)))
}
