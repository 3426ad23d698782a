//! JSON report helpers for a calibrated picture.

use crate::{CalibrationIoError, CalibrationRecord, PicLayer, WorldFile};
use piclayer_core::{EastNorth, EastNorthBounds, ImageSize, Projection};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Snapshot of a layer's calibration in both persisted forms.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalibrationReport {
    pub image_size: ImageSize,
    pub projection: String,
    pub calibration: CalibrationRecord,
    pub world_file: WorldFile,
    /// Absent for projections without a metric bounding box.
    #[serde(default)]
    pub bounding_box: Option<EastNorthBounds>,
    /// Projected outer corners, clockwise from the upper left.
    pub corners: [EastNorth; 4],
}

impl CalibrationReport {
    pub fn from_layer<P: Projection>(layer: &PicLayer<P>) -> Self {
        Self {
            image_size: layer.image_size(),
            projection: layer.projection().code().to_owned(),
            calibration: layer.calibration_record(),
            world_file: layer.save_world_file(),
            bounding_box: layer.bounding_box(),
            corners: layer.corners(),
        }
    }

    /// Load a JSON report from disk.
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, CalibrationIoError> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Write this report to disk as pretty JSON.
    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), CalibrationIoError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use piclayer_core::WebMercator;

    fn layer() -> PicLayer<WebMercator> {
        PicLayer::with_anchor(
            WebMercator,
            ImageSize::new(400, 200),
            EastNorth::new(10_000.0, 20_000.0),
            50.0,
        )
    }

    #[test]
    fn corners_surround_the_anchor() {
        let report = CalibrationReport::from_layer(&layer());
        assert_eq!(report.projection, "EPSG:3857");
        let [ul, ur, lr, ll] = report.corners;
        assert!(ul.east < ur.east && ul.north > ll.north);
        let cx = (ul.east + lr.east) / 2.0;
        let cy = (ul.north + lr.north) / 2.0;
        assert_relative_eq!(cx, 10_000.0, max_relative = 1e-9);
        assert_relative_eq!(cy, 20_000.0, max_relative = 1e-9);
        // 400 px at 50 m per 100 px
        assert_relative_eq!(ur.east - ul.east, 200.0, max_relative = 1e-4);
        assert!(report.bounding_box.is_some());
    }

    #[test]
    fn json_report_reads_back() {
        let report = CalibrationReport::from_layer(&layer());
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("report.json");
        report.write_json(&path).expect("write");
        let back = CalibrationReport::load_json(&path).expect("load");
        assert_eq!(back, report);
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = CalibrationReport::load_json(dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, CalibrationIoError::Io(_)));
    }
}
