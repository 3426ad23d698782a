//! Map-view state and the metric helpers used to place a picture on screen.

use nalgebra::Point2;
use piclayer_core::{EastNorth, Projection};
use serde::{Deserialize, Serialize};

/// What the engine needs to know about the host map view.
pub trait MapView {
    /// Projected coordinate of the view centre.
    fn center(&self) -> EastNorth;

    /// Projected coordinate of the top-left pixel.
    fn top_left(&self) -> EastNorth;

    /// Width in pixels.
    fn width(&self) -> u32;

    /// Height in pixels.
    fn height(&self) -> u32;

    /// Ground distance covered by 100 screen pixels, in metres.
    fn meters_per_100_pixels(&self) -> f64;

    /// Screen pixels per projected unit; identical on both axes.
    fn pixels_per_east_north(&self) -> f64 {
        let center = self.center();
        let top_left = self.top_left();
        (f64::from(self.width()) / 2.0) / (center.east - top_left.east)
    }

    /// Screen position of a projected coordinate (y grows downwards).
    fn screen_point_for(&self, en: EastNorth) -> Point2<f64> {
        let top_left = self.top_left();
        let ppen = self.pixels_per_east_north();
        Point2::new(
            (en.east - top_left.east) * ppen,
            (top_left.north - en.north) * ppen,
        )
    }

    /// Centre pixel of the view.
    fn screen_center(&self) -> Point2<f64> {
        Point2::new(f64::from(self.width() / 2), f64::from(self.height() / 2))
    }
}

/// A plain map view: centre, square pixel size and screen dimensions.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ViewState {
    pub center: EastNorth,
    /// Projected units per screen pixel.
    pub east_north_per_pixel: f64,
    pub width: u32,
    pub height: u32,
    /// Cached ground distance of 100 pixels across the centre.
    pub meters_per_100_pixels: f64,
}

impl ViewState {
    /// Build a view and measure its metres-per-100-pixels under `projection`.
    pub fn new<P: Projection + ?Sized>(
        center: EastNorth,
        east_north_per_pixel: f64,
        width: u32,
        height: u32,
        projection: &P,
    ) -> Self {
        let half = 50.0 * east_north_per_pixel;
        let a = projection.east_north_to_lat_lon(center.add(-half, 0.0));
        let b = projection.east_north_to_lat_lon(center.add(half, 0.0));
        Self {
            center,
            east_north_per_pixel,
            width,
            height,
            meters_per_100_pixels: a.great_circle_distance(&b),
        }
    }
}

impl MapView for ViewState {
    fn center(&self) -> EastNorth {
        self.center
    }

    fn top_left(&self) -> EastNorth {
        let half_w = f64::from(self.width) / 2.0 * self.east_north_per_pixel;
        let half_h = f64::from(self.height) / 2.0 * self.east_north_per_pixel;
        self.center.add(-half_w, half_h)
    }

    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn meters_per_100_pixels(&self) -> f64 {
        self.meters_per_100_pixels
    }
}

fn sample_step<P: Projection + ?Sized>(projection: &P) -> f64 {
    // small enough to measure at `en` rather than average over a region
    projection.default_zoom_in_ppd() * 0.01
}

/// Metres per projected unit along east at `en`.
pub fn meters_per_easting<P: Projection + ?Sized>(projection: &P, en: EastNorth) -> f64 {
    let d = sample_step(projection);
    let a = projection.east_north_to_lat_lon(en.add(-d, 0.0));
    let b = projection.east_north_to_lat_lon(en.add(d, 0.0));
    a.great_circle_distance(&b) / d / 2.0
}

/// Metres per projected unit along north at `en`.
pub fn meters_per_northing<P: Projection + ?Sized>(projection: &P, en: EastNorth) -> f64 {
    let d = sample_step(projection);
    let a = projection.east_north_to_lat_lon(en.add(0.0, -d));
    let b = projection.east_north_to_lat_lon(en.add(0.0, d));
    a.great_circle_distance(&b) / d / 2.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use piclayer_core::{Geographic, LatLon, WebMercator};

    #[test]
    fn web_mercator_scale_factor_is_secant_of_latitude() {
        let lat: f64 = 45.0;
        let en = WebMercator.lat_lon_to_east_north(LatLon::new(lat, 10.0));
        let expected = lat.to_radians().cos();
        assert_relative_eq!(meters_per_easting(&WebMercator, en), expected, max_relative = 1e-6);
        assert_relative_eq!(meters_per_northing(&WebMercator, en), expected, max_relative = 1e-6);
    }

    #[test]
    fn geographic_degree_lengths() {
        let en = EastNorth::new(0.0, 60.0);
        let per_deg = Geographic.meters_per_unit();
        assert_relative_eq!(
            meters_per_easting(&Geographic, en),
            per_deg * 0.5,
            max_relative = 1e-6
        );
        assert_relative_eq!(meters_per_northing(&Geographic, en), per_deg, max_relative = 1e-6);
    }

    #[test]
    fn view_geometry() {
        let view = ViewState::new(EastNorth::new(1000.0, 2000.0), 2.0, 800, 600, &WebMercator);
        assert_eq!(view.top_left(), EastNorth::new(200.0, 2600.0));
        assert_relative_eq!(view.pixels_per_east_north(), 0.5);
        assert_eq!(view.screen_point_for(view.center), Point2::new(400.0, 300.0));
        assert_eq!(view.screen_center(), Point2::new(400.0, 300.0));
        // near the equator Web Mercator units are metres
        assert_relative_eq!(view.meters_per_100_pixels(), 200.0, max_relative = 1e-6);
    }
}
