use std::fmt;

use serde::{Deserialize, Serialize};

/// Eye-open probability assumed when the detector did not classify an eye.
pub const DEFAULT_EYE_OPEN_PROBABILITY: f32 = 1.0;

/// A 2D landmark position in detector coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Axis-aligned face bounding box in frame pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl BoundingBox {
    pub fn new(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    /// Saturates instead of overflowing on degenerate coordinates.
    pub fn width(&self) -> i32 {
        self.right.saturating_sub(self.left)
    }

    pub fn height(&self) -> i32 {
        self.bottom.saturating_sub(self.top)
    }
}

/// Dimensions of the analysed frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameSize {
    pub width: u32,
    pub height: u32,
}

impl FrameSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// One detected face in one frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FaceObservation {
    #[serde(default)]
    pub left_eye_open_probability: Option<f32>,
    #[serde(default)]
    pub right_eye_open_probability: Option<f32>,
    pub bounding_box: BoundingBox,
    #[serde(default)]
    pub nose_base: Option<Point>,
    /// Wall-clock time of the frame, supplied by the caller. Non-decreasing.
    pub timestamp_millis: i64,
    /// Detector tracking id, passed through untouched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tracking_id: Option<u32>,
}

impl FaceObservation {
    pub fn new(bounding_box: BoundingBox, timestamp_millis: i64) -> Self {
        Self {
            left_eye_open_probability: None,
            right_eye_open_probability: None,
            bounding_box,
            nose_base: None,
            timestamp_millis,
            tracking_id: None,
        }
    }

    pub fn with_eyes(mut self, left: f32, right: f32) -> Self {
        self.left_eye_open_probability = Some(left);
        self.right_eye_open_probability = Some(right);
        self
    }

    pub fn with_nose_base(mut self, nose: Point) -> Self {
        self.nose_base = Some(nose);
        self
    }

    /// Left eye-open probability; an unclassified eye counts as open.
    pub fn left_eye_open(&self) -> f32 {
        self.left_eye_open_probability
            .unwrap_or(DEFAULT_EYE_OPEN_PROBABILITY)
    }

    /// Right eye-open probability; an unclassified eye counts as open.
    pub fn right_eye_open(&self) -> f32 {
        self.right_eye_open_probability
            .unwrap_or(DEFAULT_EYE_OPEN_PROBABILITY)
    }
}

/// Outcome of running the face detector on one frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum DetectionEvent {
    Face {
        observation: FaceObservation,
        frame: FrameSize,
    },
    NoFace,
    ManyFaces {
        count: usize,
    },
    Error {
        message: String,
    },
}

/// Externally visible liveness verdict, emitted after every input event.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum LivenessState {
    #[default]
    Initial,
    Processing {
        message: String,
        blink_count: u32,
        required_blinks: u32,
        motion_detected: bool,
    },
    /// Carries the observation that satisfied the blink requirement so the
    /// caller can pick the matching frame.
    Success {
        observation: FaceObservation,
        blink_count: u32,
    },
    Failed {
        reason: String,
    },
}

impl LivenessState {
    pub fn is_success(&self) -> bool {
        matches!(self, LivenessState::Success { .. })
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, LivenessState::Failed { .. })
    }

    /// Only `Success` concludes an attempt; everything else can still change.
    pub fn is_terminal(&self) -> bool {
        self.is_success()
    }
}

impl fmt::Display for LivenessState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LivenessState::Initial => write!(f, "initial"),
            LivenessState::Processing { message, .. } => write!(f, "processing: {message}"),
            LivenessState::Success { blink_count, .. } => {
                write!(f, "success: live subject ({blink_count} blinks)")
            }
            LivenessState::Failed { reason } => write!(f, "failed: {reason}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounding_box_dimensions() {
        let bbox = BoundingBox::new(120, 110, 330, 360);
        assert_eq!(bbox.width(), 210);
        assert_eq!(bbox.height(), 250);
    }

    #[test]
    fn test_extreme_coordinates_saturate() {
        let bbox = BoundingBox::new(i32::MIN, i32::MIN, i32::MAX, i32::MAX);
        assert_eq!(bbox.width(), i32::MAX);
        assert_eq!(bbox.height(), i32::MAX);
        let inverted = BoundingBox::new(i32::MAX, 0, i32::MIN, 10);
        assert_eq!(inverted.width(), i32::MIN);
    }

    #[test]
    fn test_missing_eye_probability_reads_as_open() {
        let obs = FaceObservation::new(BoundingBox::new(0, 0, 10, 10), 0);
        assert_eq!(obs.left_eye_open(), 1.0);
        assert_eq!(obs.right_eye_open(), 1.0);
    }

    #[test]
    fn test_detection_event_json_shape() {
        let json = r#"{"event":"face","observation":{"bounding_box":{"left":150,"top":150,"right":350,"bottom":350},"left_eye_open_probability":0.05,"timestamp_millis":1000},"frame":{"width":480,"height":640}}"#;
        let event: DetectionEvent = serde_json::from_str(json).unwrap();
        let DetectionEvent::Face { observation, frame } = event else {
            panic!("expected face event");
        };
        assert_eq!(observation.left_eye_open_probability, Some(0.05));
        assert_eq!(observation.right_eye_open_probability, None);
        assert_eq!(observation.nose_base, None);
        assert_eq!(frame, FrameSize::new(480, 640));

        let many: DetectionEvent = serde_json::from_str(r#"{"event":"many_faces","count":3}"#).unwrap();
        assert_eq!(many, DetectionEvent::ManyFaces { count: 3 });
    }

    #[test]
    fn test_state_display() {
        let failed = LivenessState::Failed {
            reason: "No face detected".into(),
        };
        assert_eq!(failed.to_string(), "failed: No face detected");
        assert!(!failed.is_terminal());
        assert_eq!(LivenessState::default().to_string(), "initial");
    }
}
