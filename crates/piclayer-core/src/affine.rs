use crate::TransformError;
use nalgebra::{Matrix3, Point2};
use serde::{Deserialize, Serialize};
use std::ops::Mul;

/// 2D affine transform `[x'; y'; 1] = M · [x; y; 1]` with the third row fixed at `(0, 0, 1)`.
///
/// Field names follow the `m{row}{col}` convention, so `m01` is the x-shear
/// term and `m10` the y-shear term.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct AffineTransform {
    pub m00: f64,
    pub m10: f64,
    pub m01: f64,
    pub m11: f64,
    pub m02: f64,
    pub m12: f64,
}

impl Default for AffineTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl AffineTransform {
    pub const IDENTITY: AffineTransform = AffineTransform {
        m00: 1.0,
        m10: 0.0,
        m01: 0.0,
        m11: 1.0,
        m02: 0.0,
        m12: 0.0,
    };

    /// Build from the six entries in `(m00, m10, m01, m11, m02, m12)` order.
    pub fn new(m00: f64, m10: f64, m01: f64, m11: f64, m02: f64, m12: f64) -> Self {
        Self {
            m00,
            m10,
            m01,
            m11,
            m02,
            m12,
        }
    }

    /// Build from a flat `[m00, m10, m01, m11, m02, m12]` array.
    pub fn from_flat_matrix(m: [f64; 6]) -> Self {
        Self::new(m[0], m[1], m[2], m[3], m[4], m[5])
    }

    /// Flat `[m00, m10, m01, m11, m02, m12]` array.
    pub fn flat_matrix(&self) -> [f64; 6] {
        [self.m00, self.m10, self.m01, self.m11, self.m02, self.m12]
    }

    pub fn translation(tx: f64, ty: f64) -> Self {
        Self::new(1.0, 0.0, 0.0, 1.0, tx, ty)
    }

    /// Counter-clockwise rotation by `theta` radians (in a y-up frame).
    ///
    /// Quadrant angles produce exact zeros and ones.
    pub fn rotation(theta: f64) -> Self {
        let (mut sin, mut cos) = theta.sin_cos();
        if sin == 1.0 || sin == -1.0 {
            cos = 0.0;
        } else if cos == 1.0 || cos == -1.0 {
            sin = 0.0;
        }
        Self::new(cos, sin, -sin, cos, 0.0, 0.0)
    }

    pub fn scaling(sx: f64, sy: f64) -> Self {
        Self::new(sx, 0.0, 0.0, sy, 0.0, 0.0)
    }

    /// `x' = x + shx·y`, `y' = shy·x + y`.
    pub fn shearing(shx: f64, shy: f64) -> Self {
        Self::new(1.0, shy, shx, 1.0, 0.0, 0.0)
    }

    /// Right-multiply: `self := self · other`.
    ///
    /// `other` is applied to points first.
    pub fn concatenate(&mut self, other: &AffineTransform) {
        *self = *self * *other;
    }

    /// Left-multiply: `self := other · self`.
    pub fn pre_concatenate(&mut self, other: &AffineTransform) {
        *self = *other * *self;
    }

    pub fn translate(&mut self, tx: f64, ty: f64) {
        self.concatenate(&Self::translation(tx, ty));
    }

    pub fn rotate(&mut self, theta: f64) {
        self.concatenate(&Self::rotation(theta));
    }

    pub fn scale(&mut self, sx: f64, sy: f64) {
        self.concatenate(&Self::scaling(sx, sy));
    }

    pub fn shear(&mut self, shx: f64, shy: f64) {
        self.concatenate(&Self::shearing(shx, shy));
    }

    /// Determinant of the 2×2 linear part.
    #[inline]
    pub fn determinant(&self) -> f64 {
        self.m00 * self.m11 - self.m01 * self.m10
    }

    pub fn is_identity(&self) -> bool {
        *self == Self::IDENTITY
    }

    pub fn scale_x(&self) -> f64 {
        self.m00
    }

    pub fn scale_y(&self) -> f64 {
        self.m11
    }

    pub fn shear_x(&self) -> f64 {
        self.m01
    }

    pub fn shear_y(&self) -> f64 {
        self.m10
    }

    pub fn translate_x(&self) -> f64 {
        self.m02
    }

    pub fn translate_y(&self) -> f64 {
        self.m12
    }

    /// Inverse transform, or `Noninvertible` when the determinant vanishes.
    pub fn create_inverse(&self) -> Result<Self, TransformError> {
        let det = self.checked_determinant()?;
        Ok(Self::new(
            self.m11 / det,
            -self.m10 / det,
            -self.m01 / det,
            self.m00 / det,
            (self.m01 * self.m12 - self.m11 * self.m02) / det,
            (self.m10 * self.m02 - self.m00 * self.m12) / det,
        ))
    }

    #[inline]
    pub fn transform(&self, p: Point2<f64>) -> Point2<f64> {
        Point2::new(
            self.m00 * p.x + self.m01 * p.y + self.m02,
            self.m10 * p.x + self.m11 * p.y + self.m12,
        )
    }

    pub fn inverse_transform(&self, p: Point2<f64>) -> Result<Point2<f64>, TransformError> {
        let det = self.checked_determinant()?;
        let x = p.x - self.m02;
        let y = p.y - self.m12;
        Ok(Point2::new(
            (x * self.m11 - y * self.m01) / det,
            (y * self.m00 - x * self.m10) / det,
        ))
    }

    pub fn to_matrix3(&self) -> Matrix3<f64> {
        Matrix3::new(
            self.m00, self.m01, self.m02, //
            self.m10, self.m11, self.m12, //
            0.0, 0.0, 1.0,
        )
    }

    /// Read the first two rows of `m`; the third row is ignored.
    pub fn from_matrix3(m: &Matrix3<f64>) -> Self {
        Self::new(
            m[(0, 0)],
            m[(1, 0)],
            m[(0, 1)],
            m[(1, 1)],
            m[(0, 2)],
            m[(1, 2)],
        )
    }

    fn checked_determinant(&self) -> Result<f64, TransformError> {
        let det = self.determinant();
        if !det.is_finite() || det.abs() < f64::MIN_POSITIVE {
            return Err(TransformError::Noninvertible { det });
        }
        Ok(det)
    }
}

impl Mul for AffineTransform {
    type Output = AffineTransform;

    fn mul(self, t: AffineTransform) -> AffineTransform {
        AffineTransform {
            m00: self.m00 * t.m00 + self.m01 * t.m10,
            m01: self.m00 * t.m01 + self.m01 * t.m11,
            m02: self.m00 * t.m02 + self.m01 * t.m12 + self.m02,
            m10: self.m10 * t.m00 + self.m11 * t.m10,
            m11: self.m10 * t.m01 + self.m11 * t.m11,
            m12: self.m10 * t.m02 + self.m11 * t.m12 + self.m12,
        }
    }
}
