//! Viewport geometry

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{DataError, DataResult};

/// Page viewport in pixels
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

/// Viewport axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    Width,
    Height,
}

impl Axis {
    /// Both axes, width first
    pub const ALL: [Axis; 2] = [Axis::Width, Axis::Height];

    /// Style property name for this axis
    pub fn as_str(self) -> &'static str {
        match self {
            Axis::Width => "width",
            Axis::Height => "height",
        }
    }
}

impl Viewport {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Read one axis
    #[inline]
    pub fn axis(&self, axis: Axis) -> f64 {
        match axis {
            Axis::Width => self.width,
            Axis::Height => self.height,
        }
    }

    /// Write one axis
    #[inline]
    pub fn set_axis(&mut self, axis: Axis, value: f64) {
        match axis {
            Axis::Width => self.width = value,
            Axis::Height => self.height = value,
        }
    }
}

/// Parse a style length as pixels.
///
/// Accepts JSON numbers and strings with an optional trailing `px`.
pub fn parse_px(value: &Value) -> DataResult<f64> {
    match value {
        Value::Number(n) => n.as_f64().ok_or_else(|| DataError::InvalidLength { raw: n.to_string() }),
        Value::String(s) => {
            let trimmed = s.trim();
            let digits = trimmed.strip_suffix("px").unwrap_or(trimmed).trim_end();
            digits
                .parse::<f64>()
                .ok()
                .filter(|px| px.is_finite())
                .ok_or_else(|| DataError::InvalidLength { raw: s.clone() })
        }
        other => Err(DataError::InvalidLength { raw: other.to_string() }),
    }
}
