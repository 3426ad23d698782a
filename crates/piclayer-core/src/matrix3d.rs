//! Homogeneous 3×3 point matrices for exact three-point affine solves.
//!
//! Three planar points are stored as columns `(xᵢ, yᵢ, 1)`. For three
//! correspondences `Xᵢ → Yᵢ` the affine `A` with `A·Xᵢ = Yᵢ` is
//! `Y · X⁻¹`; see [`solve_affine`].

use crate::{AffineTransform, TransformError};
use nalgebra::{Matrix3, Point2};

/// Below this determinant the point matrix is treated as singular.
pub const SINGULAR_DET_EPS: f64 = 1e-12;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Matrix3D {
    pub m: Matrix3<f64>,
}

impl Matrix3D {
    pub fn new(m: Matrix3<f64>) -> Self {
        Self { m }
    }

    /// Columns `(xᵢ, yᵢ, 1)` for the three points.
    pub fn from_points(pts: &[Point2<f64>; 3]) -> Self {
        let [a, b, c] = pts;
        Self::new(Matrix3::new(
            a.x, b.x, c.x, //
            a.y, b.y, c.y, //
            1.0, 1.0, 1.0,
        ))
    }

    pub fn identity() -> Self {
        Self::new(Matrix3::identity())
    }

    pub fn multiply(&self, other: &Matrix3D) -> Matrix3D {
        Matrix3D::new(self.m * other.m)
    }

    #[inline]
    pub fn determinant(&self) -> f64 {
        self.m.determinant()
    }

    /// Adjugate divided by the determinant.
    ///
    /// Fails with `NoSolution` when `|det| < 1e-12`, i.e. the source points
    /// are colinear or coincident.
    pub fn inverse(&self) -> Result<Matrix3D, TransformError> {
        let det = self.determinant();
        if !det.is_finite() || det.abs() < SINGULAR_DET_EPS {
            return Err(TransformError::NoSolution { det });
        }
        let m = &self.m;
        let cof = |r0: usize, r1: usize, c0: usize, c1: usize| {
            m[(r0, c0)] * m[(r1, c1)] - m[(r0, c1)] * m[(r1, c0)]
        };
        // adj[i][j] = cofactor[j][i]
        let adj = Matrix3::new(
            cof(1, 2, 1, 2),
            -cof(0, 2, 1, 2),
            cof(0, 1, 1, 2),
            -cof(1, 2, 0, 2),
            cof(0, 2, 0, 2),
            -cof(0, 1, 0, 2),
            cof(1, 2, 0, 1),
            -cof(0, 2, 0, 1),
            cof(0, 1, 0, 1),
        );
        Ok(Matrix3D::new(adj / det))
    }

    /// Rows 0 and 1 as an affine transform; row 2 is dropped.
    pub fn to_affine(&self) -> AffineTransform {
        AffineTransform::from_matrix3(&self.m)
    }
}

/// Affine `A` such that `A · src[i] = dst[i]` for all three pairs.
pub fn solve_affine(
    src: &[Point2<f64>; 3],
    dst: &[Point2<f64>; 3],
) -> Result<AffineTransform, TransformError> {
    let x_inv = Matrix3D::from_points(src).inverse()?;
    Ok(Matrix3D::from_points(dst).multiply(&x_inv).to_affine())
}
