// src/bundle.rs - Per-run working set for one candidate-vs-reference match

use image::RgbaImage;

use crate::errors::{GestureMatchError, Result};
use crate::histogram::Histogram;

/// Which way the fingers point in the candidate capture.
///
/// Vertical projection histograms are bottom-origin (bin 0 is the bottom edge
/// of the capture), so fingers pointing up means the finger mass sits in the
/// *lower* key half of the histogram.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    Top,
    Bottom,
}

/// One half of a midpoint-split vertical histogram
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Half {
    Lower,
    Upper,
}

impl Orientation {
    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "top" => Ok(Orientation::Top),
            "bottom" => Ok(Orientation::Bottom),
            other => Err(GestureMatchError::Manifest(format!(
                "fingers orientation must be 'top' or 'bottom', got '{}'",
                other
            ))),
        }
    }

    /// Key half of the vertical histogram holding the finger region,
    /// resolved once at the start of a run.
    pub fn finger_half(self) -> Half {
        match self {
            Orientation::Top => Half::Lower,
            Orientation::Bottom => Half::Upper,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Orientation::Top => "top",
            Orientation::Bottom => "bottom",
        }
    }
}

/// Transient working set for one matching run: the candidate capture with its
/// raw axis projections, the stored reference with its projections, and the
/// orientation tag. Owned by a single run and discarded with it.
pub struct Bundle {
    pub gesture_type: String,
    pub orientation: Orientation,
    pub image: RgbaImage,
    pub image_x: Histogram,
    pub image_y: Histogram,
    pub reference: RgbaImage,
    pub reference_x: Histogram,
    pub reference_y: Histogram,
}
