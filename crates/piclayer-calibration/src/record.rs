//! Typed view of a `.cal` property blob.

use crate::{CalibrationIoError, Properties};
use piclayer_core::{AffineTransform, EastNorth};
use serde::{Deserialize, Serialize};

pub const POSITION_X: &str = "POSITION_X";
pub const POSITION_Y: &str = "POSITION_Y";
pub const INITIAL_SCALE: &str = "INITIAL_SCALE";
pub const M00: &str = "M00";
pub const M01: &str = "M01";
pub const M10: &str = "M10";
pub const M11: &str = "M11";
pub const M02: &str = "M02";
pub const M12: &str = "M12";
pub const ANGLE: &str = "ANGLE";
pub const SCALEX: &str = "SCALEX";
pub const SCALEY: &str = "SCALEY";
pub const SHEARX: &str = "SHEARX";
pub const SHEARY: &str = "SHEARY";

/// Flat-matrix slot stored under each matrix key.
///
/// Existing files store the flat `[m00, m10, m01, m11, m02, m12]` array
/// positionally, so `M01` holds `m10` and `M10` holds `m01`. The crossing is
/// kept for file compatibility.
const MATRIX_KEYS: [(&str, f64); 6] = [
    (M00, 1.0),
    (M01, 0.0),
    (M10, 0.0),
    (M11, 1.0),
    (M02, 0.0),
    (M12, 0.0),
];

/// Header written at the top of saved calibration files.
pub const CALIBRATION_HEADER: &str = "PicLayer plugin calibration file";

/// Calibration as persisted: the accumulated affine, the anchor and the
/// initial metres-per-100-pixels.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CalibrationRecord {
    pub transform: AffineTransform,
    pub position: EastNorth,
    pub initial_scale: f64,
}

impl Default for CalibrationRecord {
    fn default() -> Self {
        Self {
            transform: AffineTransform::IDENTITY,
            position: EastNorth::default(),
            initial_scale: 1.0,
        }
    }
}

impl CalibrationRecord {
    /// Decode a property blob. Every value is parsed before anything is
    /// returned, so a malformed file never yields a partial record.
    ///
    /// Blobs carrying `SCALEX` are read as the legacy
    /// angle/scale/shear parameterisation.
    pub fn from_properties(props: &Properties) -> Result<Self, CalibrationIoError> {
        let position = EastNorth::new(
            number(props, POSITION_X, 0.0)?,
            number(props, POSITION_Y, 0.0)?,
        );
        let initial_scale = number(props, INITIAL_SCALE, 1.0)?;

        let transform = if props.contains_key(SCALEX) {
            let angle = number(props, ANGLE, 0.0)?;
            let mut t = AffineTransform::rotation(angle.to_radians());
            t.scale(number(props, SCALEX, 1.0)?, number(props, SCALEY, 1.0)?);
            t.shear(number(props, SHEARX, 0.0)?, number(props, SHEARY, 0.0)?);
            t
        } else {
            let mut flat = [0.0; 6];
            for (slot, (key, default)) in flat.iter_mut().zip(MATRIX_KEYS) {
                *slot = number(props, key, default)?;
            }
            AffineTransform::from_flat_matrix(flat)
        };

        Ok(Self {
            transform,
            position,
            initial_scale,
        })
    }

    /// Encode in the current (matrix) format.
    pub fn to_properties(&self) -> Properties {
        let mut props: Properties = MATRIX_KEYS
            .iter()
            .zip(self.transform.flat_matrix())
            .map(|((key, _), v)| (*key, format_number(v)))
            .collect();
        props.insert(POSITION_X, format_number(self.position.east));
        props.insert(POSITION_Y, format_number(self.position.north));
        props.insert(INITIAL_SCALE, format_number(self.initial_scale));
        props
    }
}

/// Shortest round-trip decimal, always with a `.` decimal point.
pub fn format_number(v: f64) -> String {
    format!("{v:?}")
}

fn number(props: &Properties, key: &str, default: f64) -> Result<f64, CalibrationIoError> {
    match props.get(key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or_else(|| CalibrationIoError::InvalidProperty {
                key: key.to_owned(),
                value: raw.to_owned(),
            }),
    }
}
