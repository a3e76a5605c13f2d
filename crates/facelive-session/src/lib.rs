//! facelive-session — Runs a liveness engine for one camera session.
//!
//! Frames arrive from the capture pipeline one at a time (keep-latest
//! backpressure is the pipeline's job). Each detection outcome is forwarded
//! to an engine that lives on its own thread; the resulting state is returned
//! to the submitter and broadcast to every subscriber.

pub mod config;
pub mod session;

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

pub use config::SessionConfig;
pub use session::{spawn_session, SessionHandle};

#[derive(Error, Debug)]
pub enum SessionError {
    #[error(transparent)]
    Config(#[from] facelive_core::ConfigError),
    #[error("invalid configuration: channel_capacity must be at least 1")]
    ChannelCapacity,
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("failed to spawn session thread: {0}")]
    Spawn(#[source] std::io::Error),
    #[error("no successful blink within {0:?}")]
    TimedOut(Duration),
    #[error("session thread exited")]
    ChannelClosed,
}
