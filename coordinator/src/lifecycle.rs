//! Start/stop bookkeeping for the single background loop of a coordinator
//!
//! A coordinator is either stopped or running exactly one loop. Cancellation is cooperative: the
//! loop observes its token between items and while idling, never in the middle of an item.

use crate::error::CoordinatorError;
use parking_lot::Mutex;
use std::future::Future;
use std::mem;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, Instrument, Span};

struct Running {
    token: CancellationToken,
    task: JoinHandle<()>,
}

enum State {
    Stopped,
    Running(Running),
    /// The loop has been cancelled and is finishing its current item
    Stopping,
}

/// How a call to [`Lifecycle::stop`] ended
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum Shutdown {
    /// Nothing was running
    Idle,
    /// The loop observed cancellation and returned
    Cancelled,
    /// The loop died on a panic
    Failed,
}

pub(crate) struct Lifecycle {
    state: Mutex<State>,
    span: Span,
}

impl Lifecycle {
    pub fn new(span: Span) -> Self {
        Self {
            state: Mutex::new(State::Stopped),
            span,
        }
    }

    pub fn span(&self) -> &Span {
        &self.span
    }

    /// A loop which is still draining after [`Lifecycle::stop`] counts as running
    pub fn is_running(&self) -> bool {
        match &*self.state.lock() {
            State::Stopped => false,
            State::Running(running) => !running.task.is_finished(),
            State::Stopping => true,
        }
    }

    /// Spawns the loop produced by `task` with a token linked to `parent`
    ///
    /// Cancelling `parent` stops the loop as well, but [`Lifecycle::stop`] only cancels the
    /// derived token and leaves `parent` untouched.
    pub fn start<F, Fut>(&self, parent: &CancellationToken, task: F) -> Result<(), CoordinatorError>
    where
        F: FnOnce(CancellationToken) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let mut state = self.state.lock();

        let busy = match &*state {
            State::Stopped => false,
            State::Running(running) => !running.task.is_finished(),
            State::Stopping => true,
        };

        if busy {
            self.span.in_scope(|| info!("Start ignored, loop is already running"));
            return Err(CoordinatorError::AlreadyRunning);
        }

        let token = parent.child_token();
        let task = tokio::spawn(task(token.clone()).instrument(self.span.clone()));

        *state = State::Running(Running { token, task });
        Ok(())
    }

    /// Cancels the loop and waits for it to exit
    ///
    /// Bounded by the item currently in flight plus one idle interval. Until the loop has exited
    /// any further start is refused. Calling this while stopped does nothing.
    pub async fn stop(&self) -> Shutdown {
        let running = {
            let mut state = self.state.lock();
            match mem::replace(&mut *state, State::Stopping) {
                State::Running(running) => running,
                other => {
                    *state = other;
                    return Shutdown::Idle;
                }
            }
        };

        let mut stopping = Stopping {
            state: &self.state,
            running: Some(running),
        };
        let Some(running) = stopping.running.as_mut() else {
            return Shutdown::Idle;
        };

        running.token.cancel();

        match (&mut running.task).await {
            Ok(()) => {
                self.span.in_scope(|| info!("Background loop has been cancelled"));
                Shutdown::Cancelled
            }
            Err(e) => {
                self.span.in_scope(
                    || error!(error = %e, "Unexpected error while stopping the background loop"),
                );
                Shutdown::Failed
            }
        }
    }
}

/// Settles the state once a stop completes, or is abandoned mid-way
struct Stopping<'a> {
    state: &'a Mutex<State>,
    running: Option<Running>,
}

impl Drop for Stopping<'_> {
    fn drop(&mut self) {
        let Some(running) = self.running.take() else {
            return;
        };

        // an abandoned stop hands the cancelled loop back so the next stop can await it
        *self.state.lock() = if running.task.is_finished() {
            State::Stopped
        } else {
            State::Running(running)
        };
    }
}
