//! Projection adapter between projected east/north and geographic lat/lon.
//!
//! The calibration engine only needs the four operations of [`Projection`].
//! Two concrete projections are provided so the engine can run without a
//! host map: plain geographic coordinates and spherical Web Mercator.

use crate::{EastNorth, LatLon, EARTH_RADIUS_M};
use std::f64::consts::{FRAC_PI_4, PI};

/// Code of the geographic projection (east = lon, north = lat, degrees).
pub const EPSG_4326: &str = "EPSG:4326";
/// Code of spherical Web Mercator (metres).
pub const EPSG_3857: &str = "EPSG:3857";

/// Web Mercator latitude limit in degrees.
pub const WEB_MERCATOR_MAX_LAT: f64 = 85.051_128_779_806_59;

pub trait Projection {
    fn east_north_to_lat_lon(&self, en: EastNorth) -> LatLon;

    fn lat_lon_to_east_north(&self, ll: LatLon) -> EastNorth;

    /// Metres covered by one projected unit at the projection's reference point.
    fn meters_per_unit(&self) -> f64;

    /// Natural zoom in projected units per pixel (a map scale of about 1 km).
    fn default_zoom_in_ppd(&self) -> f64 {
        10.0 / self.meters_per_unit()
    }

    /// Identifier such as `"EPSG:4326"`.
    fn code(&self) -> &str;
}

impl<P: Projection + ?Sized> Projection for &P {
    fn east_north_to_lat_lon(&self, en: EastNorth) -> LatLon {
        (**self).east_north_to_lat_lon(en)
    }

    fn lat_lon_to_east_north(&self, ll: LatLon) -> EastNorth {
        (**self).lat_lon_to_east_north(ll)
    }

    fn meters_per_unit(&self) -> f64 {
        (**self).meters_per_unit()
    }

    fn default_zoom_in_ppd(&self) -> f64 {
        (**self).default_zoom_in_ppd()
    }

    fn code(&self) -> &str {
        (**self).code()
    }
}

/// EPSG:4326, identity between east/north and lon/lat.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Geographic;

impl Projection for Geographic {
    fn east_north_to_lat_lon(&self, en: EastNorth) -> LatLon {
        LatLon::new(en.north, en.east)
    }

    fn lat_lon_to_east_north(&self, ll: LatLon) -> EastNorth {
        EastNorth::new(ll.lon, ll.lat)
    }

    fn meters_per_unit(&self) -> f64 {
        2.0 * PI * EARTH_RADIUS_M / 360.0
    }

    fn code(&self) -> &str {
        EPSG_4326
    }
}

/// EPSG:3857, spherical Mercator on the WGS84 semi-major axis.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WebMercator;

impl Projection for WebMercator {
    fn east_north_to_lat_lon(&self, en: EastNorth) -> LatLon {
        let lon = (en.east / EARTH_RADIUS_M).to_degrees();
        let lat = (2.0 * (en.north / EARTH_RADIUS_M).exp().atan() - PI / 2.0).to_degrees();
        LatLon::new(lat, lon)
    }

    fn lat_lon_to_east_north(&self, ll: LatLon) -> EastNorth {
        let lat = ll
            .lat
            .clamp(-WEB_MERCATOR_MAX_LAT, WEB_MERCATOR_MAX_LAT)
            .to_radians();
        let east = EARTH_RADIUS_M * ll.lon.to_radians();
        let north = EARTH_RADIUS_M * (FRAC_PI_4 + lat / 2.0).tan().ln();
        EastNorth::new(east, north)
    }

    fn meters_per_unit(&self) -> f64 {
        1.0
    }

    fn code(&self) -> &str {
        EPSG_3857
    }
}

/// Statically dispatched choice of the built-in projections.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProjectionKind {
    Geographic(Geographic),
    WebMercator(WebMercator),
}

impl ProjectionKind {
    /// Look up a built-in projection by its EPSG code (case-insensitive).
    pub fn from_code(code: &str) -> Option<Self> {
        let code = code.trim();
        if code.eq_ignore_ascii_case(EPSG_4326) {
            Some(Self::Geographic(Geographic))
        } else if code.eq_ignore_ascii_case(EPSG_3857) || code.eq_ignore_ascii_case("EPSG:900913") {
            Some(Self::WebMercator(WebMercator))
        } else {
            None
        }
    }

    fn inner(&self) -> &dyn Projection {
        match self {
            Self::Geographic(p) => p,
            Self::WebMercator(p) => p,
        }
    }
}

impl Projection for ProjectionKind {
    fn east_north_to_lat_lon(&self, en: EastNorth) -> LatLon {
        self.inner().east_north_to_lat_lon(en)
    }

    fn lat_lon_to_east_north(&self, ll: LatLon) -> EastNorth {
        self.inner().lat_lon_to_east_north(ll)
    }

    fn meters_per_unit(&self) -> f64 {
        self.inner().meters_per_unit()
    }

    fn code(&self) -> &str {
        self.inner().code()
    }
}
