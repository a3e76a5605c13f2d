use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::geometry::AdmissionWindow;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("invalid configuration: required_blinks must be at least 1")]
    ZeroRequiredBlinks,
    #[error("invalid configuration: eye_open_threshold {0} is outside (0, 1]")]
    EyeOpenThreshold(f32),
    #[error("invalid configuration: motion_threshold {0} must be finite and non-negative")]
    MotionThreshold(f32),
    #[error("invalid configuration: admission window range `{0}` is inverted or out of bounds")]
    AdmissionRange(&'static str),
}

/// Liveness tunables, fixed for the lifetime of an engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LivenessConfig {
    /// Blinks needed before the attempt succeeds.
    pub required_blinks: u32,
    /// An eye whose open probability is below this value counts as closed.
    pub eye_open_threshold: f32,
    /// Minimum spacing between two counted blinks.
    pub blink_debounce_ms: u64,
    /// Nose-base displacement (per axis) that counts as head motion.
    pub motion_threshold: f32,
    /// Minimum spacing between two motion detections.
    pub motion_window_ms: u64,
    /// Keep reporting `Success` until an explicit reset once it is reached.
    pub latch_success: bool,
    /// Face-box admission window applied before the detectors run.
    pub admission: AdmissionWindow,
}

impl Default for LivenessConfig {
    fn default() -> Self {
        Self {
            required_blinks: 1,
            eye_open_threshold: 0.2,
            blink_debounce_ms: 200,
            motion_threshold: 5.0,
            motion_window_ms: 500,
            latch_success: true,
            admission: AdmissionWindow::default(),
        }
    }
}

impl LivenessConfig {
    /// Reject settings that would make the engine meaningless.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.required_blinks == 0 {
            return Err(ConfigError::ZeroRequiredBlinks);
        }
        // NaN fails both comparisons
        if !(self.eye_open_threshold > 0.0 && self.eye_open_threshold <= 1.0) {
            return Err(ConfigError::EyeOpenThreshold(self.eye_open_threshold));
        }
        if !self.motion_threshold.is_finite() || self.motion_threshold < 0.0 {
            return Err(ConfigError::MotionThreshold(self.motion_threshold));
        }
        if let Some(range) = self.admission.invalid_range() {
            return Err(ConfigError::AdmissionRange(range));
        }
        Ok(())
    }
}
