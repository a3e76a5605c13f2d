//! Head motion from nose-base landmark displacement.
//!
//! A printed photo held still produces near-identical landmark positions in
//! consecutive frames; a live subject drifts. Motion is advisory evidence
//! only: it changes the progress message but never completes an attempt.
//!
//! Detections are rate limited. After one fires, the next comparison happens
//! only once the motion window has elapsed, even if the head keeps moving.

use crate::types::{FaceObservation, Point};

#[derive(Debug, Clone)]
pub struct MotionDetector {
    threshold: f32,
    window_ms: u64,
    last_motion_millis: Option<i64>,
}

impl MotionDetector {
    pub fn new(threshold: f32, window_ms: u64) -> Self {
        Self {
            threshold,
            window_ms,
            last_motion_millis: None,
        }
    }

    pub fn last_motion_millis(&self) -> Option<i64> {
        self.last_motion_millis
    }

    /// Compare `current` against `previous`. Returns true when either axis of
    /// the nose-base displacement exceeds the threshold.
    ///
    /// Returns false without comparing when the rate limiter is closed, when
    /// there is no previous observation, or when either frame lacks a nose
    /// landmark.
    pub fn observe(&mut self, current: &FaceObservation, previous: Option<&FaceObservation>) -> bool {
        let now = current.timestamp_millis;
        if !self.window_elapsed(now) {
            return false;
        }
        let Some(previous) = previous else {
            return false;
        };
        let (Some(nose), Some(prev_nose)) = (current.nose_base, previous.nose_base) else {
            return false;
        };

        let (dx, dy) = displacement(prev_nose, nose);
        tracing::trace!(dx, dy, threshold = self.threshold, "nose displacement");

        if dx > self.threshold || dy > self.threshold {
            self.last_motion_millis = Some(now);
            tracing::debug!(dx, dy, at = now, "motion detected");
            true
        } else {
            false
        }
    }

    fn window_elapsed(&self, now: i64) -> bool {
        match self.last_motion_millis {
            None => true,
            Some(last) => now.saturating_sub(last) > self.window_ms as i64,
        }
    }

    pub fn reset(&mut self) {
        self.last_motion_millis = None;
    }
}

/// Absolute per-axis displacement between two landmark positions.
fn displacement(from: Point, to: Point) -> (f32, f32) {
    ((to.x - from.x).abs(), (to.y - from.y).abs())
}
