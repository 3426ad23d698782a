//! Picture calibration engine.
//!
//! A [`PicLayer`] places a raster picture on a projected map: an anchor in
//! east/north coordinates, an initial metres-per-100-pixels scale and an
//! accumulated affine calibration in image-local coordinates. The
//! calibration is edited by dragging up to three control points
//! ([`PictureTransform::update_pair`]) or by pivoted rotate/scale/shear, and
//! persists either as a property blob ([`CalibrationRecord`]) or as a GIS
//! world file ([`WorldFile`]).
//!
//! ```
//! use nalgebra::Point2;
//! use piclayer_calibration::{PicLayer, ViewState};
//! use piclayer_core::{EastNorth, ImageSize, WebMercator};
//!
//! let view = ViewState::new(EastNorth::new(0.0, 0.0), 1.0, 800, 600, &WebMercator);
//! let mut layer = PicLayer::new(WebMercator, ImageSize::new(640, 480), &view);
//!
//! let pt = layer.transformer_mut();
//! pt.add_origin_point(Point2::new(0.0, 0.0));
//! pt.update_pair(Point2::new(0.0, 0.0), Point2::new(10.0, 5.0));
//! assert_eq!(pt.transform().translate_x(), 10.0);
//!
//! let props = layer.save_calibration();
//! assert_eq!(props.get("M02"), Some("10.0"));
//! ```

mod error;
pub mod io;
mod layer;
mod picture_transform;
mod properties;
pub mod record;
mod view;
mod world_file;

pub use error::CalibrationIoError;
pub use io::CalibrationReport;
pub use layer::{PicLayer, SELECTION_RADIUS};
pub use picture_transform::{ControlPoint, PictureTransform, MAX_CONTROL_POINTS};
pub use properties::Properties;
pub use record::{CalibrationRecord, CALIBRATION_HEADER};
pub use view::{meters_per_easting, meters_per_northing, MapView, ViewState};
pub use world_file::WorldFile;
