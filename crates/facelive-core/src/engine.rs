//! Liveness state machine.
//!
//! One engine instance serves one verification attempt. Every inbound event
//! produces exactly one new [`LivenessState`], which is stored, pushed to
//! every subscriber in subscription order, and returned before the call
//! completes.
//!
//! ```text
//! Initial ──face──▶ Processing ──blinks >= required──▶ Success
//!    ▲                  │  ▲
//!    │            off-center (evidence kept)
//!    │                  ▼  │
//!    └──reset── Failed ◀── no face / many faces / detector error (evidence dropped)
//! ```

use crate::blink::BlinkDetector;
use crate::config::{ConfigError, LivenessConfig};
use crate::geometry::OFF_CENTER_REASON;
use crate::motion::MotionDetector;
use crate::types::{DetectionEvent, FaceObservation, FrameSize, LivenessState};

pub const NO_FACE_REASON: &str = "No face detected";
pub const MANY_FACES_REASON: &str = "Multiple faces detected";

/// Receives every state the engine emits.
pub trait LivenessObserver: Send {
    fn on_state(&mut self, state: &LivenessState);
}

impl<F> LivenessObserver for F
where
    F: FnMut(&LivenessState) + Send,
{
    fn on_state(&mut self, state: &LivenessState) {
        self(state)
    }
}

pub struct LivenessEngine {
    config: LivenessConfig,
    blink: BlinkDetector,
    motion: MotionDetector,
    previous: Option<FaceObservation>,
    state: LivenessState,
    observers: Vec<Box<dyn LivenessObserver>>,
}

impl LivenessEngine {
    /// Build an engine, failing fast on an unusable configuration.
    pub fn new(config: LivenessConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            blink: BlinkDetector::new(config.eye_open_threshold, config.blink_debounce_ms),
            motion: MotionDetector::new(config.motion_threshold, config.motion_window_ms),
            config,
            previous: None,
            state: LivenessState::Initial,
            observers: Vec::new(),
        })
    }

    pub fn config(&self) -> &LivenessConfig {
        &self.config
    }

    pub fn state(&self) -> &LivenessState {
        &self.state
    }

    pub fn blink_count(&self) -> u32 {
        self.blink.blink_count()
    }

    /// Last observation that passed the admission gate since the last reset.
    pub fn previous_observation(&self) -> Option<&FaceObservation> {
        self.previous.as_ref()
    }

    /// Register a subscriber. It immediately receives the current state, then
    /// every subsequent one.
    pub fn subscribe(&mut self, mut observer: impl LivenessObserver + 'static) {
        observer.on_state(&self.state);
        self.observers.push(Box::new(observer));
    }

    /// Dispatch one upstream detection outcome.
    pub fn handle(&mut self, event: DetectionEvent) -> &LivenessState {
        match event {
            DetectionEvent::Face { observation, frame } => self.on_observation(observation, frame),
            DetectionEvent::NoFace => self.on_no_face(),
            DetectionEvent::ManyFaces { count } => self.on_many_faces(count),
            DetectionEvent::Error { message } => self.on_detection_error(&message),
        }
    }

    /// Process exactly one detected face.
    pub fn on_observation(&mut self, face: FaceObservation, frame: FrameSize) -> &LivenessState {
        if self.latched() {
            return self.republish();
        }

        if !self.config.admission.admits(&face.bounding_box, frame) {
            tracing::debug!(
                bbox = ?face.bounding_box,
                frame_width = frame.width,
                frame_height = frame.height,
                "face outside admission window"
            );
            return self.transition(LivenessState::Failed {
                reason: OFF_CENTER_REASON.to_string(),
            });
        }

        self.blink.observe(&face);
        let motion_detected = self.motion.observe(&face, self.previous.as_ref());

        let blink_count = self.blink.blink_count();
        let required_blinks = self.config.required_blinks;
        let next = if blink_count >= required_blinks {
            tracing::info!(blink_count, at = face.timestamp_millis, "liveness confirmed");
            LivenessState::Success {
                observation: face.clone(),
                blink_count,
            }
        } else {
            LivenessState::Processing {
                message: progress_message(&self.state, blink_count, required_blinks, motion_detected),
                blink_count,
                required_blinks,
                motion_detected,
            }
        };

        self.previous = Some(face);
        self.transition(next)
    }

    /// The detector found no face. Drops all evidence.
    pub fn on_no_face(&mut self) -> &LivenessState {
        self.invalidate(NO_FACE_REASON.to_string())
    }

    /// The detector found more than one face. Drops all evidence.
    pub fn on_many_faces(&mut self, count: usize) -> &LivenessState {
        tracing::debug!(count, "multiple faces in frame");
        self.invalidate(MANY_FACES_REASON.to_string())
    }

    /// The detector failed on this frame. Drops all evidence.
    pub fn on_detection_error(&mut self, message: &str) -> &LivenessState {
        tracing::warn!(error = message, "face detection failed");
        self.invalidate(format!("Face detection failed: {message}"))
    }

    /// Start a fresh attempt. Idempotent; always emits `Initial`.
    pub fn reset(&mut self) -> &LivenessState {
        self.clear_evidence();
        self.transition(LivenessState::Initial)
    }

    fn latched(&self) -> bool {
        self.config.latch_success && self.state.is_success()
    }

    fn invalidate(&mut self, reason: String) -> &LivenessState {
        if self.latched() {
            return self.republish();
        }
        self.clear_evidence();
        self.transition(LivenessState::Failed { reason })
    }

    fn clear_evidence(&mut self) {
        self.blink.reset();
        self.motion.reset();
        self.previous = None;
    }

    fn republish(&mut self) -> &LivenessState {
        let current = self.state.clone();
        self.transition(current)
    }

    fn transition(&mut self, next: LivenessState) -> &LivenessState {
        if next != self.state {
            tracing::debug!(from = %self.state, to = %next, "liveness state changed");
        }
        self.state = next;
        for observer in &mut self.observers {
            observer.on_state(&self.state);
        }
        &self.state
    }
}

/// Progress text for a `Processing` state. Motion only promotes the message
/// to "initial motion" when nothing has been reported since the last reset.
fn progress_message(
    prior: &LivenessState,
    blink_count: u32,
    required_blinks: u32,
    motion_detected: bool,
) -> String {
    match (motion_detected, prior) {
        (true, LivenessState::Initial) => "Detected initial motion.".to_string(),
        (true, _) => format!("Detected {blink_count}/{required_blinks} blinks and motion."),
        (false, _) => format!("Detected {blink_count}/{required_blinks} blinks."),
    }
}
