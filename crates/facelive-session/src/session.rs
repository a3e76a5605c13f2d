use std::time::Duration;

use facelive_core::{DetectionEvent, FaceObservation, FrameSize, LivenessEngine, LivenessState};
use tokio::sync::{mpsc, oneshot, watch};
use uuid::Uuid;

use crate::config::SessionConfig;
use crate::SessionError;

/// Messages sent from handles to the engine thread.
enum SessionRequest {
    Event {
        event: DetectionEvent,
        reply: oneshot::Sender<LivenessState>,
    },
    Reset {
        reply: oneshot::Sender<LivenessState>,
    },
}

/// Clone-safe handle to a liveness session running on its own thread.
///
/// The thread exits once every handle has been dropped.
#[derive(Clone)]
pub struct SessionHandle {
    tx: mpsc::Sender<SessionRequest>,
    states: watch::Receiver<LivenessState>,
    attempts: watch::Receiver<Uuid>,
    attempt_timeout: Option<Duration>,
}

impl SessionHandle {
    /// Feed one detection outcome and wait for the state it produced.
    pub async fn submit(&self, event: DetectionEvent) -> Result<LivenessState, SessionError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(SessionRequest::Event {
                event,
                reply: reply_tx,
            })
            .await
            .map_err(|_| SessionError::ChannelClosed)?;
        reply_rx.await.map_err(|_| SessionError::ChannelClosed)
    }

    /// Stamp `observation` with the current wall-clock time and submit it.
    pub async fn observe_now(
        &self,
        mut observation: FaceObservation,
        frame: FrameSize,
    ) -> Result<LivenessState, SessionError> {
        observation.timestamp_millis = chrono::Utc::now().timestamp_millis();
        self.submit(DetectionEvent::Face { observation, frame }).await
    }

    /// Discard all evidence and start a new attempt with a fresh id.
    pub async fn reset(&self) -> Result<LivenessState, SessionError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(SessionRequest::Reset { reply: reply_tx })
            .await
            .map_err(|_| SessionError::ChannelClosed)?;
        reply_rx.await.map_err(|_| SessionError::ChannelClosed)
    }

    /// Receiver that always holds the latest state.
    pub fn subscribe(&self) -> watch::Receiver<LivenessState> {
        self.states.clone()
    }

    pub fn current_state(&self) -> LivenessState {
        self.states.borrow().clone()
    }

    /// Id of the attempt currently in progress.
    pub fn attempt_id(&self) -> Uuid {
        *self.attempts.borrow()
    }

    /// Wait for `Success` using the configured attempt timeout.
    pub async fn wait_for_success(&self) -> Result<LivenessState, SessionError> {
        match self.attempt_timeout {
            Some(limit) => self.wait_for_success_within(limit).await,
            None => self.success().await,
        }
    }

    /// Wait for `Success`, giving up after `limit`.
    pub async fn wait_for_success_within(
        &self,
        limit: Duration,
    ) -> Result<LivenessState, SessionError> {
        tokio::time::timeout(limit, self.success())
            .await
            .map_err(|_| {
                tracing::info!(
                    attempt = %self.attempt_id(),
                    timeout = ?limit,
                    "liveness attempt timed out"
                );
                SessionError::TimedOut(limit)
            })?
    }

    async fn success(&self) -> Result<LivenessState, SessionError> {
        let mut rx = self.states.clone();
        loop {
            {
                let state = rx.borrow_and_update();
                if state.is_success() {
                    return Ok(state.clone());
                }
            }
            rx.changed().await.map_err(|_| SessionError::ChannelClosed)?;
        }
    }
}

/// Spawn a liveness session on a dedicated OS thread.
///
/// Validates the configuration first and fails fast on a bad one.
pub fn spawn_session(config: SessionConfig) -> Result<SessionHandle, SessionError> {
    config.validate()?;
    let mut engine = LivenessEngine::new(config.liveness.clone())?;

    let (state_tx, state_rx) = watch::channel(engine.state().clone());
    engine.subscribe(move |state: &LivenessState| {
        state_tx.send_replace(state.clone());
    });

    let mut attempt_id = Uuid::new_v4();
    let (attempt_tx, attempt_rx) = watch::channel(attempt_id);
    let (tx, mut rx) = mpsc::channel::<SessionRequest>(config.channel_capacity);

    std::thread::Builder::new()
        .name("facelive-session".into())
        .spawn(move || {
            tracing::info!(attempt = %attempt_id, "session thread started");
            while let Some(req) = rx.blocking_recv() {
                let span = tracing::debug_span!("attempt", id = %attempt_id);
                let _enter = span.enter();
                match req {
                    SessionRequest::Event { event, reply } => {
                        let state = engine.handle(event).clone();
                        let _ = reply.send(state);
                    }
                    SessionRequest::Reset { reply } => {
                        attempt_id = Uuid::new_v4();
                        attempt_tx.send_replace(attempt_id);
                        tracing::debug!(next = %attempt_id, "attempt reset");
                        let state = engine.reset().clone();
                        let _ = reply.send(state);
                    }
                }
            }
            tracing::info!("session thread exiting");
        })
        .map_err(SessionError::Spawn)?;

    let attempt_timeout = match config.attempt_timeout_secs {
        0 => None,
        secs => Some(Duration::from_secs(secs)),
    };

    Ok(SessionHandle {
        tx,
        states: state_rx,
        attempts: attempt_rx,
        attempt_timeout,
    })
}
