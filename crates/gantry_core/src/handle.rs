//! Handle to a background apply.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::watch;
use tokio::task::AbortHandle;
use tracing::debug;

use crate::session::{ApplyOutcome, SessionState};

/// Observes and controls an apply running in the background.
///
/// Cloning yields another handle to the same apply.
#[derive(Debug, Clone)]
pub struct ApplyHandle {
    abort: AbortHandle,
    done: watch::Receiver<Option<ApplyOutcome>>,
}

impl ApplyHandle {
    pub(crate) fn new(abort: AbortHandle, done: watch::Receiver<Option<ApplyOutcome>>) -> Self {
        Self { abort, done }
    }

    /// Cancel the apply. Running tool processes are killed and the outcome
    /// becomes `failed("apply cancelled")`.
    pub fn abort(&self) {
        self.abort.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.done.borrow().is_some()
    }

    /// Wait for the apply to finish and return its final outcome.
    pub async fn wait(&self) -> ApplyOutcome {
        let mut done = self.done.clone();
        let outcome = match done.wait_for(Option::is_some).await {
            Ok(outcome) => outcome.clone(),
            Err(_) => None,
        };
        // The sender only goes away without a value if the task vanished
        outcome.unwrap_or_else(ApplyOutcome::cancelled)
    }
}

/// Clears the in-progress marker when an apply ends, however it ends.
///
/// Created before the apply task is spawned and moved into it, so an abort
/// that lands before the first poll still drops it.
pub(crate) struct InProgressGuard {
    session: Arc<Mutex<SessionState>>,
    done: watch::Sender<Option<ApplyOutcome>>,
}

impl InProgressGuard {
    pub fn new(session: Arc<Mutex<SessionState>>) -> (Self, watch::Receiver<Option<ApplyOutcome>>) {
        let (done, rx) = watch::channel(None);
        (Self { session, done }, rx)
    }
}

impl Drop for InProgressGuard {
    fn drop(&mut self) {
        let outcome = {
            let mut state = self.session.lock();
            state.in_progress = false;
            if state.outcome == ApplyOutcome::InProgress {
                debug!("Apply ended without an outcome; recording cancellation");
                state.outcome = ApplyOutcome::cancelled();
            }
            state.outcome.clone()
        };
        self.done.send_replace(Some(outcome));
    }
}
