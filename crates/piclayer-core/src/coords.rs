use nalgebra::Point2;
use serde::{Deserialize, Serialize};

/// Radius used for great-circle distances (WGS84 semi-major axis, metres).
pub const EARTH_RADIUS_M: f64 = 6_378_137.0;

/// Projected coordinate in the units of the active projection.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct EastNorth {
    pub east: f64,
    pub north: f64,
}

impl EastNorth {
    pub const fn new(east: f64, north: f64) -> Self {
        Self { east, north }
    }

    /// Translate by `(de, dn)`.
    pub fn add(self, de: f64, dn: f64) -> Self {
        Self::new(self.east + de, self.north + dn)
    }

    pub fn is_finite(&self) -> bool {
        self.east.is_finite() && self.north.is_finite()
    }
}

/// Geographic coordinate in degrees.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LatLon {
    pub lat: f64,
    pub lon: f64,
}

impl LatLon {
    pub const fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Point form with `x = lon`, `y = lat`.
    pub fn from_point(p: Point2<f64>) -> Self {
        Self::new(p.y, p.x)
    }

    pub fn to_point(self) -> Point2<f64> {
        Point2::new(self.lon, self.lat)
    }

    /// Haversine distance in metres on a sphere of [`EARTH_RADIUS_M`].
    pub fn great_circle_distance(&self, other: &LatLon) -> f64 {
        let lat1 = self.lat.to_radians();
        let lat2 = other.lat.to_radians();
        let dlat = lat2 - lat1;
        let dlon = (other.lon - self.lon).to_radians();

        let a = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
        // rounding can push `a` past 1 near antipodes
        EARTH_RADIUS_M * 2.0 * a.sqrt().min(1.0).asin()
    }
}

/// Raster size in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageSize {
    pub width: u32,
    pub height: u32,
}

impl ImageSize {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    #[inline]
    pub fn half_width(&self) -> f64 {
        f64::from(self.width) / 2.0
    }

    #[inline]
    pub fn half_height(&self) -> f64 {
        f64::from(self.height) / 2.0
    }

    /// Length of the pixel diagonal.
    pub fn diagonal(&self) -> f64 {
        f64::from(self.width).hypot(f64::from(self.height))
    }
}

/// Axis-aligned box in projected coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct EastNorthBounds {
    pub min: EastNorth,
    pub max: EastNorth,
}

impl EastNorthBounds {
    /// Square box of half-side `half` centred on `center`.
    pub fn around(center: EastNorth, half: f64) -> Self {
        Self {
            min: center.add(-half, -half),
            max: center.add(half, half),
        }
    }

    pub fn width(&self) -> f64 {
        self.max.east - self.min.east
    }

    pub fn height(&self) -> f64 {
        self.max.north - self.min.north
    }

    pub fn center(&self) -> EastNorth {
        EastNorth::new(
            (self.min.east + self.max.east) / 2.0,
            (self.min.north + self.max.north) / 2.0,
        )
    }

    pub fn contains(&self, en: EastNorth) -> bool {
        en.east >= self.min.east
            && en.east <= self.max.east
            && en.north >= self.min.north
            && en.north <= self.max.north
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn one_degree_of_longitude_on_equator() {
        let a = LatLon::new(0.0, 0.0);
        let b = LatLon::new(0.0, 1.0);
        let expected = EARTH_RADIUS_M * 1f64.to_radians();
        assert_relative_eq!(a.great_circle_distance(&b), expected, max_relative = 1e-12);
    }

    #[test]
    fn same_point_has_zero_distance() {
        let p = LatLon::new(48.2, 16.37);
        assert_eq!(p.great_circle_distance(&p), 0.0);
    }

    #[test]
    fn point_form_swaps_axes() {
        let ll = LatLon::new(50.0, 8.0);
        let p = ll.to_point();
        assert_eq!((p.x, p.y), (8.0, 50.0));
        assert_eq!(LatLon::from_point(p), ll);
    }

    #[test]
    fn bounds_around_center() {
        let b = EastNorthBounds::around(EastNorth::new(10.0, 20.0), 5.0);
        assert_eq!(b.min, EastNorth::new(5.0, 15.0));
        assert_eq!(b.max, EastNorth::new(15.0, 25.0));
        assert_eq!(b.width(), 10.0);
        assert_eq!(b.center(), EastNorth::new(10.0, 20.0));
        assert!(b.contains(EastNorth::new(10.0, 24.0)));
        assert!(!b.contains(EastNorth::new(16.0, 20.0)));
    }
}
