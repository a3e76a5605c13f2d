//! Debounced blink counting.
//!
//! A blink is the edge where both eyes go from open to closed within one
//! observation. Closing one eye, or staying closed across frames, does not
//! count. Two counted blinks must be more than the debounce interval apart.

use crate::types::FaceObservation;

#[derive(Debug, Clone)]
pub struct BlinkDetector {
    eye_open_threshold: f32,
    debounce_ms: u64,
    blink_count: u32,
    left_closed: bool,
    right_closed: bool,
    last_blink_millis: Option<i64>,
}

impl BlinkDetector {
    pub fn new(eye_open_threshold: f32, debounce_ms: u64) -> Self {
        Self {
            eye_open_threshold,
            debounce_ms,
            blink_count: 0,
            left_closed: false,
            right_closed: false,
            last_blink_millis: None,
        }
    }

    pub fn blink_count(&self) -> u32 {
        self.blink_count
    }

    pub fn last_blink_millis(&self) -> Option<i64> {
        self.last_blink_millis
    }

    /// Eye-closed flags from the last observation, `(left, right)`.
    pub fn eyes_closed(&self) -> (bool, bool) {
        (self.left_closed, self.right_closed)
    }

    /// Feed one observation. Returns true when it registered a new blink.
    pub fn observe(&mut self, face: &FaceObservation) -> bool {
        let left_open = face.left_eye_open();
        let right_open = face.right_eye_open();
        let left_closed = left_open < self.eye_open_threshold;
        let right_closed = right_open < self.eye_open_threshold;
        let now = face.timestamp_millis;

        tracing::trace!(
            left = left_open,
            right = right_open,
            threshold = self.eye_open_threshold,
            "eye open probabilities"
        );

        let closing_edge = !self.left_closed && !self.right_closed && left_closed && right_closed;
        let counted = closing_edge && self.outside_debounce(now);

        if counted {
            self.blink_count += 1;
            self.last_blink_millis = Some(now);
            tracing::debug!(count = self.blink_count, at = now, "blink detected");
        } else if closing_edge {
            tracing::debug!(at = now, "blink inside debounce window, ignored");
        }

        self.left_closed = left_closed;
        self.right_closed = right_closed;
        counted
    }

    fn outside_debounce(&self, now: i64) -> bool {
        match self.last_blink_millis {
            None => true,
            Some(last) => now.saturating_sub(last) > self.debounce_ms as i64,
        }
    }

    pub fn reset(&mut self) {
        self.blink_count = 0;
        self.left_closed = false;
        self.right_closed = false;
        self.last_blink_millis = None;
    }
}
