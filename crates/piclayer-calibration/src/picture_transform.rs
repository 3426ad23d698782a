//! Mutable calibration state of one picture.
//!
//! The accumulated [`AffineTransform`] lives in image-local coordinates
//! (origin at the picture centre). Control points are expressed in the same
//! frame and drive the transform through [`PictureTransform::update_pair`].

use log::{debug, warn};
use nalgebra::Point2;
use piclayer_core::{solve_affine, AffineTransform, EastNorth, TransformError};
use serde::{Deserialize, Serialize};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Maximum number of control points and of reference points.
pub const MAX_CONTROL_POINTS: usize = 3;

/// An image-space control point with its optional geographic counterpart.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ControlPoint {
    pub image: Point2<f64>,
    /// Geographic position in point form (`x = lon`, `y = lat`).
    #[serde(default)]
    pub lat_lon: Option<Point2<f64>>,
}

impl ControlPoint {
    pub fn new(image: Point2<f64>) -> Self {
        Self {
            image,
            lat_lon: None,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct PictureTransform {
    transform: AffineTransform,
    image_position: EastNorth,
    control_points: Vec<ControlPoint>,
    lat_lon_ref_points: Vec<Point2<f64>>,
    modified: bool,
}

impl Default for PictureTransform {
    fn default() -> Self {
        Self::new(EastNorth::default())
    }
}

impl PictureTransform {
    pub fn new(image_position: EastNorth) -> Self {
        Self {
            transform: AffineTransform::IDENTITY,
            image_position,
            control_points: Vec::with_capacity(MAX_CONTROL_POINTS),
            lat_lon_ref_points: Vec::with_capacity(MAX_CONTROL_POINTS),
            modified: false,
        }
    }

    pub fn transform(&self) -> &AffineTransform {
        &self.transform
    }

    pub fn set_transform(&mut self, transform: AffineTransform) {
        self.transform = transform;
    }

    pub fn image_position(&self) -> EastNorth {
        self.image_position
    }

    pub fn set_image_position(&mut self, image_position: EastNorth) {
        self.image_position = image_position;
    }

    pub fn is_modified(&self) -> bool {
        self.modified
    }

    pub fn set_modified(&mut self) {
        self.modified = true;
    }

    pub fn reset_modified(&mut self) {
        self.modified = false;
    }

    /// Right-concatenate `t` without touching control points or the modified flag.
    pub fn concatenate(&mut self, t: &AffineTransform) {
        self.transform.concatenate(t);
    }

    /// Identity transform, no points, not modified. The image position is kept.
    pub fn reset_calibration(&mut self) {
        self.control_points.clear();
        self.lat_lon_ref_points.clear();
        self.modified = false;
        self.transform = AffineTransform::IDENTITY;
    }

    pub fn control_points(&self) -> &[ControlPoint] {
        &self.control_points
    }

    pub fn origin_points(&self) -> Vec<Point2<f64>> {
        self.control_points.iter().map(|c| c.image).collect()
    }

    /// Geographic side of the control points, index-aligned with [`Self::origin_points`].
    pub fn lat_lon_origin_points(&self) -> Vec<Option<Point2<f64>>> {
        self.control_points.iter().map(|c| c.lat_lon).collect()
    }

    fn index_of(&self, image: Point2<f64>) -> Option<usize> {
        self.control_points.iter().position(|c| c.image == image)
    }

    /// Append a control point; ignored once three are stored.
    pub fn add_origin_point(&mut self, image: Point2<f64>) -> bool {
        self.add_control_point(ControlPoint::new(image))
    }

    pub fn add_control_point(&mut self, point: ControlPoint) -> bool {
        if self.control_points.len() >= MAX_CONTROL_POINTS {
            return false;
        }
        self.control_points.push(point);
        true
    }

    /// Move the control point at `old` to `new`, keeping its geographic pairing.
    pub fn replace_origin_point(&mut self, old: Point2<f64>, new: Point2<f64>) -> bool {
        match self.index_of(old) {
            Some(idx) => {
                self.control_points[idx].image = new;
                true
            }
            None => false,
        }
    }

    /// Remove the control point at `image` together with its geographic pairing.
    pub fn remove_origin_point(&mut self, image: Point2<f64>) -> Option<ControlPoint> {
        let idx = self.index_of(image)?;
        Some(self.control_points.remove(idx))
    }

    /// Replace all control points; anything beyond three is dropped.
    pub fn set_origin_points(&mut self, points: &[Point2<f64>]) {
        self.control_points.clear();
        self.control_points.extend(
            points
                .iter()
                .take(MAX_CONTROL_POINTS)
                .map(|&p| ControlPoint::new(p)),
        );
    }

    pub fn clear_origin_points(&mut self) {
        self.control_points.clear();
    }

    /// Attach a geographic position to the control point at `index`.
    pub fn set_lat_lon_origin(&mut self, index: usize, lat_lon: Point2<f64>) -> bool {
        match self.control_points.get_mut(index) {
            Some(c) => {
                c.lat_lon = Some(lat_lon);
                true
            }
            None => false,
        }
    }

    pub fn clear_lat_lon_origin_points(&mut self) {
        for c in &mut self.control_points {
            c.lat_lon = None;
        }
    }

    pub fn lat_lon_ref_points(&self) -> &[Point2<f64>] {
        &self.lat_lon_ref_points
    }

    pub fn add_lat_lon_ref_point(&mut self, lat_lon: Point2<f64>) -> bool {
        if self.lat_lon_ref_points.len() >= MAX_CONTROL_POINTS {
            return false;
        }
        self.lat_lon_ref_points.push(lat_lon);
        true
    }

    pub fn clear_lat_lon_ref_points(&mut self) {
        self.lat_lon_ref_points.clear();
    }

    /// Affine mapping the three stored origins onto `desired`.
    pub fn solve_equation(
        &self,
        desired: &[Point2<f64>; 3],
    ) -> Result<AffineTransform, TransformError> {
        let origins = self.origin_triangle().ok_or(TransformError::NoSolution { det: 0.0 })?;
        solve_affine(&origins, desired)
    }

    fn origin_triangle(&self) -> Option<[Point2<f64>; 3]> {
        match self.control_points.as_slice() {
            [a, b, c] => Some([a.image, b.image, c.image]),
            _ => None,
        }
    }

    /// Drag the control point `origin` to `desired` and fold the implied
    /// correction into the transform.
    ///
    /// With one control point this is a translation, with two a similarity
    /// built on a synthetic third point, with three a full affine solve.
    /// Degenerate configurations are logged and leave the state untouched.
    #[cfg_attr(feature = "tracing", instrument(level = "debug", skip(self)))]
    pub fn update_pair(&mut self, origin: Point2<f64>, desired: Point2<f64>) {
        match self.control_points.len() {
            1 => {
                let delta = desired - origin;
                self.transform
                    .concatenate(&AffineTransform::translation(delta.x, delta.y));
                self.modified = true;
            }
            2 => {
                let o1 = self.control_points[0].image;
                let o2 = self.control_points[1].image;
                let (d1, d2) = if o2 == origin {
                    (o1, desired)
                } else {
                    (desired, o2)
                };
                let origins = [o1, o2, triangle_point(o1, o2)];
                let targets = [d1, d2, triangle_point(d1, d2)];
                self.try_solve(solve_affine(&origins, &targets));
            }
            3 => {
                let mut targets = [Point2::origin(); 3];
                for (t, c) in targets.iter_mut().zip(&self.control_points) {
                    *t = if c.image == origin { desired } else { c.image };
                }
                self.try_solve(self.solve_equation(&targets));
            }
            _ => {}
        }
    }

    fn try_solve(&mut self, solved: Result<AffineTransform, TransformError>) {
        match solved {
            Ok(t) => {
                self.transform.concatenate(&t);
                self.modified = true;
                debug!("calibration updated from {} control points", self.control_points.len());
            }
            Err(e) => warn!("control point update skipped: {e}"),
        }
    }

    /// Apply `t` while keeping `pivot` (image-local) fixed, and carry the
    /// control points along.
    pub fn concatenate_at(&mut self, t: &AffineTransform, pivot: Option<Point2<f64>>) {
        match pivot {
            Some(p) => {
                let mut centered = AffineTransform::translation(p.x, p.y);
                centered.concatenate(t);
                centered.translate(-p.x, -p.y);
                self.transform.concatenate(&centered);
            }
            None => self.transform.concatenate(t),
        }

        for c in &mut self.control_points {
            c.image = t.transform(c.image);
        }
        self.modified = true;
    }
}

/// Third vertex of the right isosceles triangle over `p → q`: the midpoint
/// plus half the segment rotated by 90°.
fn triangle_point(p: Point2<f64>, q: Point2<f64>) -> Point2<f64> {
    Point2::new(
        (p.x + q.x - q.y + p.y) / 2.0,
        (p.y + q.y + q.x - p.x) / 2.0,
    )
}
