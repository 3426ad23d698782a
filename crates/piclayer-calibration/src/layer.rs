//! A calibrated picture: the engine state plus everything needed to place
//! it on a map view and to persist it.

use crate::record::CALIBRATION_HEADER;
use crate::view::{meters_per_easting, meters_per_northing, MapView};
use crate::{CalibrationIoError, CalibrationRecord, PictureTransform, Properties, WorldFile};
use log::{debug, error};
use nalgebra::{Point2, Vector2};
use piclayer_core::{
    AffineTransform, EastNorth, EastNorthBounds, ImageSize, LatLon, Projection, TransformError,
    EPSG_4326,
};
use std::io::{Read, Write};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Screen distance (in image-local units) within which a click selects a control point.
pub const SELECTION_RADIUS: f64 = 10.0;

#[derive(Clone, Debug)]
pub struct PicLayer<P> {
    transformer: PictureTransform,
    /// Metres per 100 pixels of the map at creation time.
    initial_image_scale: f64,
    image_size: ImageSize,
    projection: P,
}

impl<P: Projection> PicLayer<P> {
    /// Place a picture at the centre of `view`, at the view's current scale.
    pub fn new<V: MapView + ?Sized>(projection: P, image_size: ImageSize, view: &V) -> Self {
        Self::with_anchor(
            projection,
            image_size,
            view.center(),
            view.meters_per_100_pixels(),
        )
    }

    pub fn with_anchor(
        projection: P,
        image_size: ImageSize,
        anchor: EastNorth,
        initial_image_scale: f64,
    ) -> Self {
        Self {
            transformer: PictureTransform::new(anchor),
            initial_image_scale,
            image_size,
            projection,
        }
    }

    pub fn transformer(&self) -> &PictureTransform {
        &self.transformer
    }

    pub fn transformer_mut(&mut self) -> &mut PictureTransform {
        &mut self.transformer
    }

    pub fn projection(&self) -> &P {
        &self.projection
    }

    pub fn image_size(&self) -> ImageSize {
        self.image_size
    }

    pub fn initial_image_scale(&self) -> f64 {
        self.initial_image_scale
    }

    pub fn is_modified(&self) -> bool {
        self.transformer.is_modified()
    }

    pub fn meters_per_easting(&self, en: EastNorth) -> f64 {
        meters_per_easting(&self.projection, en)
    }

    pub fn meters_per_northing(&self, en: EastNorth) -> f64 {
        meters_per_northing(&self.projection, en)
    }

    /// Screen position of the anchor.
    pub fn screen_offset<V: MapView + ?Sized>(&self, view: &V) -> Vector2<f64> {
        view.screen_point_for(self.transformer.image_position()).coords
    }

    /// Scale from image pixels to screen pixels implied by the initial scale.
    fn view_scale(&self, ppen: f64) -> (f64, f64) {
        let anchor = self.transformer.image_position();
        let base = self.initial_image_scale * ppen / 100.0;
        (
            base / self.meters_per_easting(anchor),
            base / self.meters_per_northing(anchor),
        )
    }

    /// Image-local → screen, relative to the anchor's screen position.
    pub fn marker_transform<V: MapView + ?Sized>(&self, view: &V) -> AffineTransform {
        let (sx, sy) = self.view_scale(view.pixels_per_east_north());
        let mut t = AffineTransform::scaling(sx, sy);
        t.concatenate(self.transformer.transform());
        t
    }

    /// Image-local → screen: anchor offset, then view scale, then the calibration.
    pub fn screen_transform<V: MapView + ?Sized>(&self, view: &V) -> AffineTransform {
        let offset = self.screen_offset(view);
        let mut t = AffineTransform::translation(offset.x, offset.y);
        t.concatenate(&self.marker_transform(view));
        t
    }

    pub fn image_to_screen<V: MapView + ?Sized>(&self, view: &V, p: Point2<f64>) -> Point2<f64> {
        self.screen_transform(view).transform(p)
    }

    pub fn screen_to_image<V: MapView + ?Sized>(
        &self,
        view: &V,
        p: Point2<f64>,
    ) -> Result<Point2<f64>, TransformError> {
        self.screen_transform(view).inverse_transform(p)
    }

    /// Geographic point → image-local coordinates.
    pub fn lat_lon_to_image<V: MapView + ?Sized>(
        &self,
        view: &V,
        ll: LatLon,
    ) -> Result<Point2<f64>, TransformError> {
        let en = self.projection.lat_lon_to_east_north(ll);
        self.screen_to_image(view, view.screen_point_for(en))
    }

    /// Screen positions of the control points.
    pub fn origin_markers_on_screen<V: MapView + ?Sized>(&self, view: &V) -> Vec<Point2<f64>> {
        let t = self.screen_transform(view);
        self.transformer
            .control_points()
            .iter()
            .map(|c| t.transform(c.image))
            .collect()
    }

    /// Reference points in image-local coordinates; unmappable points are skipped.
    pub fn reference_points_in_image<V: MapView + ?Sized>(&self, view: &V) -> Vec<Point2<f64>> {
        self.transformer
            .lat_lon_ref_points()
            .iter()
            .filter_map(|&p| match self.lat_lon_to_image(view, LatLon::from_point(p)) {
                Ok(q) => Some(q),
                Err(e) => {
                    error!("reference point {p:?} not mappable: {e}");
                    None
                }
            })
            .collect()
    }

    /// Move the anchor by `(de, dn)` projected units.
    pub fn move_picture_by(&mut self, de: f64, dn: f64) {
        let position = self.transformer.image_position().add(de, dn);
        self.transformer.set_image_position(position);
        self.transformer.set_modified();
    }

    pub fn rotate_picture_by<V: MapView + ?Sized>(&mut self, angle: f64, view: &V) {
        self.concatenate_at_view_center(&AffineTransform::rotation(angle), view);
    }

    pub fn scale_picture_by<V: MapView + ?Sized>(&mut self, sx: f64, sy: f64, view: &V) {
        self.concatenate_at_view_center(&AffineTransform::scaling(sx, sy), view);
    }

    pub fn shear_picture_by<V: MapView + ?Sized>(&mut self, shx: f64, shy: f64, view: &V) {
        self.concatenate_at_view_center(&AffineTransform::shearing(shx, shy), view);
    }

    fn concatenate_at_view_center<V: MapView + ?Sized>(&mut self, t: &AffineTransform, view: &V) {
        match self.screen_to_image(view, view.screen_center()) {
            Ok(pivot) => self.transformer.concatenate_at(t, Some(pivot)),
            Err(e) => error!("view centre not mappable into the picture: {e}"),
        }
    }

    pub fn reset_calibration(&mut self) {
        self.transformer.reset_calibration();
    }

    /// Control point nearest to `screen`, if one lies within [`SELECTION_RADIUS`].
    pub fn find_selected_point<V: MapView + ?Sized>(
        &self,
        view: &V,
        screen: Point2<f64>,
    ) -> Option<Point2<f64>> {
        let pressed = match self.screen_to_image(view, screen) {
            Ok(p) => p,
            Err(e) => {
                error!("selection failed: {e}");
                return None;
            }
        };
        let mut best = None;
        let mut min_dist = SELECTION_RADIUS;
        for c in self.transformer.control_points() {
            let d = nalgebra::distance(&c.image, &pressed);
            if d < min_dist {
                min_dist = d;
                best = Some(c.image);
            }
        }
        best
    }

    /// Rough box containing the picture under any rotation.
    ///
    /// `None` for EPSG:4326: the initial scale is metric while positions are
    /// in degrees there.
    pub fn bounding_box(&self) -> Option<EastNorthBounds> {
        if self.projection.code() == EPSG_4326 {
            return None;
        }
        let diag_m = self.image_size.diagonal() / 100.0 * self.initial_image_scale;
        let t = self.transformer.transform();
        let factor = t.scale_x().abs().max(t.scale_y().abs());
        Some(EastNorthBounds::around(
            self.transformer.image_position(),
            factor * diag_m / 2.0,
        ))
    }

    pub fn calibration_record(&self) -> CalibrationRecord {
        CalibrationRecord {
            transform: *self.transformer.transform(),
            position: self.transformer.image_position(),
            initial_scale: self.initial_image_scale,
        }
    }

    /// Encode the calibration as a property blob and clear the modified flag.
    pub fn save_calibration(&mut self) -> Properties {
        let props = self.calibration_record().to_properties();
        self.transformer.reset_modified();
        props
    }

    pub fn write_calibration<W: Write>(&mut self, writer: W) -> Result<(), CalibrationIoError> {
        let props = self.calibration_record().to_properties();
        props.write_to(writer, Some(CALIBRATION_HEADER))?;
        self.transformer.reset_modified();
        Ok(())
    }

    /// Reset, then apply a stored calibration. Control points are discarded.
    pub fn apply_calibration_record(&mut self, record: &CalibrationRecord) {
        self.transformer.set_image_position(record.position);
        self.initial_image_scale = record.initial_scale;
        self.transformer.reset_calibration();
        self.transformer.concatenate(&record.transform);
        debug!(
            "calibration loaded at ({}, {}), initial scale {}",
            record.position.east, record.position.north, record.initial_scale
        );
    }

    pub fn load_calibration(&mut self, props: &Properties) -> Result<(), CalibrationIoError> {
        let record = CalibrationRecord::from_properties(props)?;
        self.apply_calibration_record(&record);
        Ok(())
    }

    pub fn read_calibration<R: Read>(&mut self, reader: R) -> Result<(), CalibrationIoError> {
        let props = Properties::read_from(reader)?;
        self.load_calibration(&props)
    }

    /// Replace the calibration with the one encoded by a world file.
    ///
    /// The anchor becomes the projected position of the picture centre and
    /// the initial scale is set to 1, so the world-file pixel size alone
    /// determines the rendered scale.
    #[cfg_attr(feature = "tracing", instrument(level = "debug", skip(self)))]
    pub fn load_world_file(&mut self, wf: &WorldFile) -> Result<(), CalibrationIoError> {
        if !wf.values().iter().all(|v| v.is_finite()) || wf.sx == 0.0 || wf.sy == 0.0 {
            return Err(CalibrationIoError::DegenerateWorldFile {
                sx: wf.sx,
                sy: wf.sy,
            });
        }
        let hw = self.image_size.half_width();
        let hh = self.image_size.half_height();
        let anchor = EastNorth::new(
            wf.dx + hw * wf.sx + hh * wf.rx,
            wf.dy + hw * wf.ry + hh * wf.sy,
        );
        let scale_x = 100.0 * wf.sx * self.meters_per_easting(anchor);
        let scale_y = -100.0 * wf.sy * self.meters_per_northing(anchor);

        self.transformer.set_image_position(anchor);
        self.transformer.reset_calibration();
        self.transformer
            .concatenate(&AffineTransform::scaling(scale_x, scale_y));
        self.transformer
            .concatenate(&AffineTransform::shearing(wf.rx / wf.sx, wf.ry / wf.sy));
        self.initial_image_scale = 1.0;
        debug!("world file loaded, anchor ({}, {})", anchor.east, anchor.north);
        Ok(())
    }

    pub fn read_world_file<R: Read>(&mut self, reader: R) -> Result<(), CalibrationIoError> {
        let wf = WorldFile::read_from(reader)?;
        self.load_world_file(&wf)
    }

    /// Projected units per image pixel along each axis (north negative).
    fn units_per_pixel(&self) -> (f64, f64) {
        let anchor = self.transformer.image_position();
        let base = self.initial_image_scale / 100.0;
        (
            base / self.meters_per_easting(anchor),
            -base / self.meters_per_northing(anchor),
        )
    }

    /// Projected position of an image-local point under the calibration.
    pub fn image_to_east_north(&self, p: Point2<f64>) -> EastNorth {
        let (qx, qy) = self.units_per_pixel();
        let q = self.transformer.transform().transform(p);
        self.transformer
            .image_position()
            .add(qx * q.x, qy * q.y)
    }

    /// Projected positions of the outer picture corners, clockwise from
    /// the upper left.
    pub fn corners(&self) -> [EastNorth; 4] {
        let hw = self.image_size.half_width();
        let hh = self.image_size.half_height();
        [(-hw, -hh), (hw, -hh), (hw, hh), (-hw, hh)]
            .map(|(x, y)| self.image_to_east_north(Point2::new(x, y)))
    }

    /// Express the calibration as a world file.
    ///
    /// The layer carries nine parameters and the world file six; the
    /// translation part of the transform is folded into the upper-left
    /// position.
    pub fn save_world_file(&self) -> WorldFile {
        let t = self.transformer.transform();
        let (qx, qy) = self.units_per_pixel();
        let upper_left = self.image_to_east_north(Point2::new(
            -self.image_size.half_width(),
            -self.image_size.half_height(),
        ));
        WorldFile {
            sx: qx * t.m00,
            ry: qy * t.m10,
            rx: qx * t.m01,
            sy: qy * t.m11,
            dx: upper_left.east,
            dy: upper_left.north,
        }
    }

    pub fn write_world_file<W: Write>(&self, writer: W) -> Result<(), CalibrationIoError> {
        self.save_world_file().write_to(writer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ViewState;
    use approx::assert_relative_eq;
    use piclayer_core::{Geographic, WebMercator};

    fn metric_layer() -> (PicLayer<WebMercator>, ViewState) {
        let anchor = EastNorth::new(500_000.0, 5_500_000.0);
        let view = ViewState::new(anchor, 0.5, 1024, 768, &WebMercator);
        (PicLayer::new(WebMercator, ImageSize::new(1000, 800), &view), view)
    }

    #[test]
    fn new_layer_sits_at_view_centre() {
        let (layer, view) = metric_layer();
        assert_eq!(layer.transformer().image_position(), view.center);
        assert_eq!(layer.initial_image_scale(), view.meters_per_100_pixels());
        // image centre lands on the screen centre
        let c = layer.image_to_screen(&view, Point2::origin());
        assert_relative_eq!(c.x, 512.0, epsilon = 1e-9);
        assert_relative_eq!(c.y, 384.0, epsilon = 1e-9);
    }

    #[test]
    fn image_pixels_match_screen_pixels_at_creation() {
        let (layer, view) = metric_layer();
        let a = layer.image_to_screen(&view, Point2::new(0.0, 0.0));
        let b = layer.image_to_screen(&view, Point2::new(100.0, 0.0));
        assert_relative_eq!(b.x - a.x, 100.0, max_relative = 1e-6);
    }

    #[test]
    fn screen_to_image_inverts_placement() {
        let (mut layer, view) = metric_layer();
        let t = AffineTransform::new(1.2, 0.3, -0.1, 0.8, 15.0, -4.0);
        layer.transformer_mut().set_transform(t);
        let p = Point2::new(37.0, -120.0);
        let back = layer
            .screen_to_image(&view, layer.image_to_screen(&view, p))
            .expect("invertible");
        assert_relative_eq!(back.x, p.x, epsilon = 1e-6);
        assert_relative_eq!(back.y, p.y, epsilon = 1e-6);
    }

    #[test]
    fn singular_calibration_cannot_map_back() {
        let (mut layer, view) = metric_layer();
        layer.transformer_mut().set_transform(AffineTransform::scaling(0.0, 0.0));
        assert!(matches!(
            layer.screen_to_image(&view, Point2::new(1.0, 1.0)),
            Err(TransformError::Noninvertible { .. })
        ));
        // pivot operations become no-ops
        layer.rotate_picture_by(0.5, &view);
        assert_eq!(*layer.transformer().transform(), AffineTransform::scaling(0.0, 0.0));
        assert!(!layer.is_modified());
        assert!(layer.find_selected_point(&view, Point2::new(1.0, 1.0)).is_none());
    }

    #[test]
    fn rotation_keeps_view_centre_fixed() {
        let (mut layer, view) = metric_layer();
        layer.move_picture_by(40.0, -25.0);
        let centre = view.screen_center();
        let before = layer.screen_to_image(&view, centre).expect("invertible");

        layer.rotate_picture_by(0.3, &view);
        layer.scale_picture_by(1.5, 0.5, &view);
        layer.shear_picture_by(0.2, 0.0, &view);

        let on_screen = layer.image_to_screen(&view, before);
        assert_relative_eq!(on_screen.x, centre.x, epsilon = 1e-6);
        assert_relative_eq!(on_screen.y, centre.y, epsilon = 1e-6);
        assert!(layer.is_modified());
    }

    #[test]
    fn moving_changes_only_the_anchor() {
        let (mut layer, _) = metric_layer();
        let start = layer.transformer().image_position();
        assert!(!layer.is_modified());
        layer.move_picture_by(10.0, -5.0);
        assert_eq!(layer.transformer().image_position(), start.add(10.0, -5.0));
        assert!(layer.transformer().transform().is_identity());
        assert!(layer.is_modified());
    }

    #[test]
    fn selects_nearest_control_point() {
        let (mut layer, view) = metric_layer();
        layer.transformer_mut().add_origin_point(Point2::new(0.0, 0.0));
        layer.transformer_mut().add_origin_point(Point2::new(6.0, 0.0));

        let markers = layer.origin_markers_on_screen(&view);
        assert_eq!(markers.len(), 2);

        let near_second = layer.image_to_screen(&view, Point2::new(5.0, 0.5));
        assert_eq!(
            layer.find_selected_point(&view, near_second),
            Some(Point2::new(6.0, 0.0))
        );
        let far = layer.image_to_screen(&view, Point2::new(200.0, 200.0));
        assert_eq!(layer.find_selected_point(&view, far), None);
    }

    #[test]
    fn reference_points_map_into_image() {
        let (mut layer, view) = metric_layer();
        let ll = WebMercator.east_north_to_lat_lon(view.center);
        layer.transformer_mut().add_lat_lon_ref_point(ll.to_point());
        let pts = layer.reference_points_in_image(&view);
        assert_eq!(pts.len(), 1);
        assert_relative_eq!(pts[0].x, 0.0, epsilon = 1e-6);
        assert_relative_eq!(pts[0].y, 0.0, epsilon = 1e-6);
    }

    #[test]
    fn bounding_box_in_metric_projection() {
        let mut layer = PicLayer::with_anchor(
            WebMercator,
            ImageSize::new(300, 400),
            EastNorth::new(1000.0, 2000.0),
            10.0,
        );
        layer.transformer_mut().set_transform(AffineTransform::scaling(-2.0, 1.5));
        let bbox = layer.bounding_box().expect("metric projection");
        // diag 500 px -> 50 m, factor 2
        assert_relative_eq!(bbox.width(), 100.0, epsilon = 1e-9);
        assert_relative_eq!(bbox.height(), 100.0, epsilon = 1e-9);
        assert_eq!(bbox.center(), EastNorth::new(1000.0, 2000.0));
    }

    #[test]
    fn bounding_box_unsupported_for_geographic() {
        let layer = PicLayer::with_anchor(
            Geographic,
            ImageSize::new(300, 400),
            EastNorth::new(8.0, 47.0),
            10.0,
        );
        assert!(layer.bounding_box().is_none());
    }

    #[test]
    fn save_clears_modified_and_load_resets_points() {
        let (mut layer, _) = metric_layer();
        layer.transformer_mut().add_origin_point(Point2::new(1.0, 2.0));
        layer.transformer_mut().concatenate_at(&AffineTransform::scaling(2.0, 2.0), None);
        assert!(layer.is_modified());

        let props = layer.save_calibration();
        assert!(!layer.is_modified());

        let (mut other, _) = metric_layer();
        other.transformer_mut().add_origin_point(Point2::new(9.0, 9.0));
        other.load_calibration(&props).expect("load");
        assert_eq!(other.calibration_record(), layer.calibration_record());
        assert!(other.transformer().control_points().is_empty());
        assert!(!other.is_modified());
    }

    #[test]
    fn failed_load_leaves_layer_untouched() {
        let (mut layer, _) = metric_layer();
        layer.transformer_mut().set_transform(AffineTransform::scaling(3.0, 3.0));
        let before = layer.calibration_record();

        let bad = Properties::parse("M00=2\nPOSITION_X=east\n");
        assert!(layer.load_calibration(&bad).is_err());
        assert_eq!(layer.calibration_record(), before);

        let non_finite = Properties::parse("POSITION_X=NaN\nPOSITION_Y=inf\nM00=inf\n");
        assert!(matches!(
            layer.load_calibration(&non_finite),
            Err(CalibrationIoError::InvalidProperty { .. })
        ));
        assert_eq!(layer.calibration_record(), before);

        assert!(layer.read_world_file("1\n0\n0\n".as_bytes()).is_err());
        let degenerate = WorldFile::from_values([0.0, 0.0, 0.0, -1.0, 0.0, 0.0]);
        assert!(matches!(
            layer.load_world_file(&degenerate),
            Err(CalibrationIoError::DegenerateWorldFile { .. })
        ));
        assert_eq!(layer.calibration_record(), before);
    }
}
