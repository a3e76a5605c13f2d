//! facelive-core — Blink-based liveness detection.
//!
//! Consumes per-frame face observations produced by an external detector
//! (eye-open probabilities, nose-base landmark, bounding box) and decides
//! whether the subject is a live person performing a natural blink.
//! Head motion is tracked as supporting evidence. No inference, no I/O.

pub mod blink;
pub mod config;
pub mod engine;
pub mod geometry;
pub mod motion;
pub mod types;

pub use config::{ConfigError, LivenessConfig};
pub use engine::{LivenessEngine, LivenessObserver};
pub use geometry::{AdmissionWindow, Bounds};
pub use types::{BoundingBox, DetectionEvent, FaceObservation, FrameSize, LivenessState, Point};
