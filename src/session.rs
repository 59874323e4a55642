//! One timed playback run: setup, start, play for a while, shut down.

use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use tracing::{error, info, warn};

use crate::core::{AudioHost, PatchEngine};
use crate::{Error, PatchPlayer};

/// Create a linked stop handle / stop signal pair.
pub fn stop_channel() -> (StopHandle, StopSignal) {
    let (tx, rx) = crossbeam_channel::bounded(1);
    (StopHandle { tx }, StopSignal { rx })
}

/// Ends a running session early. Cloneable; any clone may stop it.
#[derive(Debug, Clone)]
pub struct StopHandle {
    tx: Sender<()>,
}

impl StopHandle {
    /// Request a stop. Repeated requests are ignored.
    pub fn stop(&self) {
        let _ = self.tx.try_send(());
    }
}

/// Receiving side of [`stop_channel`].
#[derive(Debug)]
pub struct StopSignal {
    rx: Receiver<()>,
}

impl StopSignal {
    /// Block for up to `timeout`. Returns `true` if a stop was requested.
    ///
    /// If every handle has been dropped no stop can arrive, so this sleeps
    /// out the rest of the timeout and returns `false`.
    pub fn wait(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        match self.rx.recv_timeout(timeout) {
            Ok(()) => true,
            Err(RecvTimeoutError::Timeout) => false,
            Err(RecvTimeoutError::Disconnected) => {
                std::thread::sleep(deadline.saturating_duration_since(Instant::now()));
                false
            }
        }
    }
}

/// How a session ended.
#[derive(Debug)]
pub enum SessionOutcome {
    /// Played for the full run duration.
    Completed,
    /// A stop was requested before the run duration elapsed.
    Stopped,
    /// Engine, patch or device setup failed. Audio never started.
    SetupFailed(Error),
    /// Setup succeeded but the device would not start. Resources were
    /// still released.
    StartFailed(Error),
}

impl SessionOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, SessionOutcome::Completed | SessionOutcome::Stopped)
    }
}

/// Drives a [`PatchPlayer`] through exactly one run.
pub struct Session<E: PatchEngine, H: AudioHost> {
    player: PatchPlayer<E, H>,
}

impl<E: PatchEngine, H: AudioHost> Session<E, H> {
    pub fn new(player: PatchPlayer<E, H>) -> Self {
        Self { player }
    }

    /// Run to completion or until `signal` fires.
    ///
    /// Blocks the calling thread for up to the configured run duration.
    /// Failures are logged and reported in the outcome; they never panic.
    pub fn run(&mut self, signal: &StopSignal) -> SessionOutcome {
        if let Err(e) = self.player.setup() {
            error!("setup failed: {e}");
            return SessionOutcome::SetupFailed(e);
        }

        if let Err(e) = self.player.start() {
            error!("start failed: {e}");
            self.shutdown();
            return SessionOutcome::StartFailed(e);
        }

        let duration = self.player.config().run_duration;
        info!(?duration, "playing");
        let stopped = signal.wait(duration);
        if stopped {
            info!("stop requested");
        }

        self.shutdown();

        if stopped {
            SessionOutcome::Stopped
        } else {
            SessionOutcome::Completed
        }
    }

    pub fn player(&self) -> &PatchPlayer<E, H> {
        &self.player
    }

    pub fn into_player(self) -> PatchPlayer<E, H> {
        self.player
    }

    fn shutdown(&mut self) {
        if let Err(e) = self.player.shutdown() {
            warn!("shutdown: {e}");
        }
    }
}
