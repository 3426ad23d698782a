//! The six-line GIS world file (`.wld`, `.jgw`, `.tfw`, ...).
//!
//! Lines, in order: `sx, ry, rx, sy, dx, dy`. `(sx, sy)` is the pixel size
//! in projected units (`sy` negative for north-up images), `(rx, ry)` the
//! skew terms and `(dx, dy)` the projected coordinate of the centre of the
//! upper-left pixel.

use crate::CalibrationIoError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::{Read, Write};

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct WorldFile {
    pub sx: f64,
    pub ry: f64,
    pub rx: f64,
    pub sy: f64,
    pub dx: f64,
    pub dy: f64,
}

impl WorldFile {
    /// Values in file order.
    pub fn from_values(v: [f64; 6]) -> Self {
        Self {
            sx: v[0],
            ry: v[1],
            rx: v[2],
            sy: v[3],
            dx: v[4],
            dy: v[5],
        }
    }

    pub fn values(&self) -> [f64; 6] {
        [self.sx, self.ry, self.rx, self.sy, self.dx, self.dy]
    }

    /// Parse the first six non-empty lines; anything after them is ignored.
    pub fn parse(text: &str) -> Result<Self, CalibrationIoError> {
        let mut lines = text.lines().map(str::trim).filter(|l| !l.is_empty());
        let mut v = [0.0; 6];
        for (i, slot) in v.iter_mut().enumerate() {
            let line = lines
                .next()
                .ok_or(CalibrationIoError::MissingLine { line: i + 1 })?;
            *slot = line
                .parse::<f64>()
                .map_err(|_| CalibrationIoError::InvalidNumber {
                    line: i + 1,
                    value: line.to_owned(),
                })?;
        }
        Ok(Self::from_values(v))
    }

    pub fn read_from<R: Read>(mut reader: R) -> Result<Self, CalibrationIoError> {
        let mut text = String::new();
        reader.read_to_string(&mut text)?;
        Self::parse(&text)
    }

    pub fn write_to<W: Write>(&self, mut writer: W) -> Result<(), CalibrationIoError> {
        write!(writer, "{self}")?;
        writer.flush()?;
        Ok(())
    }
}

impl fmt::Display for WorldFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for v in self.values() {
            writeln!(f, "{v:?}")?;
        }
        Ok(())
    }
}
