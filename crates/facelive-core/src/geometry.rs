//! Bounding-box admission gate.
//!
//! Before an observation reaches the blink and motion detectors its face box
//! must sit inside an admission window: roughly centred, neither too small nor
//! too large. A miss is transient — it produces a `Failed` state but leaves
//! accumulated evidence alone.

use serde::{Deserialize, Serialize};

use crate::types::{BoundingBox, FrameSize};

/// Reason attached to `Failed` when the gate rejects a face.
pub const OFF_CENTER_REASON: &str = "Face isn't in the center of the frame";

/// Closed interval `[min, max]`, serialized as a two-element array.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds<T>(pub T, pub T);

impl<T: PartialOrd + Copy> Bounds<T> {
    pub fn min(&self) -> T {
        self.0
    }

    pub fn max(&self) -> T {
        self.1
    }

    pub fn contains(&self, value: T) -> bool {
        value >= self.0 && value <= self.1
    }

    fn is_ordered(&self) -> bool {
        self.0 <= self.1
    }
}

/// Where a face box has to be for the observation to count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum AdmissionWindow {
    /// Pixel bounds, tied to one capture resolution.
    Absolute {
        width: Bounds<i32>,
        height: Bounds<i32>,
        top: Bounds<i32>,
        left: Bounds<i32>,
        bottom: Bounds<i32>,
        right: Bounds<i32>,
    },
    /// Fractions of the frame: horizontal quantities are divided by the frame
    /// width, vertical ones by the frame height.
    Relative {
        width: Bounds<f32>,
        height: Bounds<f32>,
        top: Bounds<f32>,
        left: Bounds<f32>,
        bottom: Bounds<f32>,
        right: Bounds<f32>,
    },
    /// Every box is admitted.
    Unrestricted,
}

impl Default for AdmissionWindow {
    /// Pixel window tuned for a 480x640 analysis stream.
    fn default() -> Self {
        AdmissionWindow::Absolute {
            width: Bounds(100, 290),
            height: Bounds(100, 290),
            top: Bounds(100, 300),
            left: Bounds(100, 300),
            bottom: Bounds(300, 500),
            right: Bounds(300, 500),
        }
    }
}

impl AdmissionWindow {
    /// Resolution-independent window: the box spans 20–60% of each frame
    /// dimension and every edge stays within the central band.
    pub fn centered() -> Self {
        AdmissionWindow::Relative {
            width: Bounds(0.2, 0.6),
            height: Bounds(0.2, 0.6),
            top: Bounds(0.1, 0.5),
            left: Bounds(0.1, 0.5),
            bottom: Bounds(0.5, 0.9),
            right: Bounds(0.5, 0.9),
        }
    }

    /// Whether `bbox` inside a frame of `frame` dimensions passes the gate.
    pub fn admits(&self, bbox: &BoundingBox, frame: FrameSize) -> bool {
        match self {
            AdmissionWindow::Absolute {
                width,
                height,
                top,
                left,
                bottom,
                right,
            } => {
                width.contains(bbox.width())
                    && height.contains(bbox.height())
                    && top.contains(bbox.top)
                    && left.contains(bbox.left)
                    && bottom.contains(bbox.bottom)
                    && right.contains(bbox.right)
            }
            AdmissionWindow::Relative {
                width,
                height,
                top,
                left,
                bottom,
                right,
            } => {
                if frame.width == 0 || frame.height == 0 {
                    return false;
                }
                let fw = frame.width as f32;
                let fh = frame.height as f32;
                width.contains(bbox.width() as f32 / fw)
                    && height.contains(bbox.height() as f32 / fh)
                    && top.contains(bbox.top as f32 / fh)
                    && left.contains(bbox.left as f32 / fw)
                    && bottom.contains(bbox.bottom as f32 / fh)
                    && right.contains(bbox.right as f32 / fw)
            }
            AdmissionWindow::Unrestricted => true,
        }
    }

    /// Name of the first malformed range, if any.
    pub(crate) fn invalid_range(&self) -> Option<&'static str> {
        match self {
            AdmissionWindow::Absolute {
                width,
                height,
                top,
                left,
                bottom,
                right,
            } => first_unordered([
                ("width", width.is_ordered()),
                ("height", height.is_ordered()),
                ("top", top.is_ordered()),
                ("left", left.is_ordered()),
                ("bottom", bottom.is_ordered()),
                ("right", right.is_ordered()),
            ]),
            AdmissionWindow::Relative {
                width,
                height,
                top,
                left,
                bottom,
                right,
            } => {
                let fraction = |b: &Bounds<f32>| {
                    b.is_ordered() && (0.0..=1.0).contains(&b.0) && (0.0..=1.0).contains(&b.1)
                };
                first_unordered([
                    ("width", fraction(width)),
                    ("height", fraction(height)),
                    ("top", fraction(top)),
                    ("left", fraction(left)),
                    ("bottom", fraction(bottom)),
                    ("right", fraction(right)),
                ])
            }
            AdmissionWindow::Unrestricted => None,
        }
    }
}

fn first_unordered(checks: [(&'static str, bool); 6]) -> Option<&'static str> {
    checks
        .into_iter()
        .find(|(_, ok)| !ok)
        .map(|(name, _)| name)
}
