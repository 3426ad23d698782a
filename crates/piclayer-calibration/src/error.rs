/// Errors returned by the calibration codecs.
///
/// A failed load never modifies the layer it was loading into.
#[derive(thiserror::Error, Debug)]
pub enum CalibrationIoError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error("unable to read line {line}")]
    MissingLine { line: usize },
    #[error("line {line}: {value:?} is not a decimal number")]
    InvalidNumber { line: usize, value: String },
    #[error("property {key}: {value:?} is not a decimal number")]
    InvalidProperty { key: String, value: String },
    #[error("world file has a degenerate pixel size ({sx}, {sy})")]
    DegenerateWorldFile { sx: f64, sy: f64 },
}
