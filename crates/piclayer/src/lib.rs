//! High-level facade crate for the `piclayer-*` workspace.
//!
//! This crate provides:
//! - stable, convenient re-exports of the geometry and calibration crates
//! - (feature `cli`) the `piclayer` binary converting between calibration
//!   files and world files.
//!
//! ## Quickstart
//!
//! ```
//! use piclayer::core::{EastNorth, ImageSize, WebMercator};
//! use piclayer::PicLayer;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut layer = PicLayer::with_anchor(
//!     WebMercator,
//!     ImageSize::new(1000, 1000),
//!     EastNorth::new(500_000.0, 5_500_000.0),
//!     10.0,
//! );
//! let world = layer.save_world_file();
//! layer.load_world_file(&world)?;
//! assert_eq!(layer.initial_image_scale(), 1.0);
//! # Ok(())
//! # }
//! ```
//!
//! ## API map
//! - `piclayer::core`: affine transforms, the three-point solver, coordinates
//!   and projections.
//! - `piclayer::calibration`: control-point calibration, view mapping,
//!   property and world-file codecs, JSON reports.

pub use piclayer_calibration as calibration;
pub use piclayer_core as core;

pub use piclayer_calibration::{
    CalibrationIoError, CalibrationRecord, CalibrationReport, MapView, PicLayer, PictureTransform,
    ViewState, WorldFile,
};
pub use piclayer_core::{AffineTransform, EastNorth, ImageSize, Projection, ProjectionKind};
