//! Core geometry for placing raster pictures on a map.
//!
//! This crate is intentionally small and purely numeric. It knows nothing
//! about images, rendering or the host map; it provides the affine algebra,
//! the exact three-point solver and a thin projection adapter.

mod affine;
mod coords;
mod error;
mod logger;
mod matrix3d;
pub mod projection;

pub use affine::AffineTransform;
pub use coords::{EastNorth, EastNorthBounds, ImageSize, LatLon, EARTH_RADIUS_M};
pub use error::TransformError;
pub use matrix3d::{solve_affine, Matrix3D, SINGULAR_DET_EPS};
pub use projection::{Geographic, Projection, ProjectionKind, WebMercator, EPSG_3857, EPSG_4326};

#[cfg(feature = "tracing")]
pub use logger::init_tracing;

pub use logger::{init_with_level, level_from_verbosity};
