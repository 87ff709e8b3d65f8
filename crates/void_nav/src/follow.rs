//! Follow loop
//!
//! A follow loop re-aims an agent at its target every
//! `time_between_compute` until it is cancelled:
//!
//! ```text
//! Idle ──target resolved──▶ Running ──cancel / agent gone──▶ Cancelled
//!                            │   ▲
//!                            └───┘ resolve, move, sleep
//! ```
//!
//! Cancellation is observed before each path query and during the
//! inter-cycle sleep. A cycle that has already invoked the query finishes,
//! walk included, before the loop stops.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::agent::AgentCore;
use crate::cancel::CancelToken;
use crate::config::MoveSettings;
use crate::controller::MoveController;
use crate::error::NavError;
use crate::target::Target;

/// Follow loop lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FollowState {
    /// Waiting for the target to exist
    Idle,
    /// Cycling
    Running,
    /// Stopped for good
    Cancelled,
}

struct FollowShared {
    state: watch::Sender<FollowState>,
    cycles: AtomicU64,
}

/// Observer and cancel switch for one follow loop
#[derive(Clone)]
pub struct FollowHandle {
    token: CancelToken,
    shared: Arc<FollowShared>,
}

impl FollowHandle {
    fn new() -> Self {
        let (state, _rx) = watch::channel(FollowState::Idle);
        Self {
            token: CancelToken::new(),
            shared: Arc::new(FollowShared {
                state,
                cycles: AtomicU64::new(0),
            }),
        }
    }

    /// Current lifecycle state
    pub fn state(&self) -> FollowState {
        *self.shared.state.borrow()
    }

    /// Whether the loop is still live and has not been asked to stop
    pub fn is_active(&self) -> bool {
        !self.token.is_cancelled() && self.state() != FollowState::Cancelled
    }

    /// Completed move cycles
    pub fn cycles(&self) -> u64 {
        self.shared.cycles.load(Ordering::Acquire)
    }

    /// Whether cancellation has been requested
    pub fn is_cancel_requested(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Resolves once the loop has fully stopped
    pub async fn finished(&self) {
        let mut rx = self.shared.state.subscribe();
        loop {
            if *rx.borrow_and_update() == FollowState::Cancelled {
                return;
            }
            if rx.changed().await.is_err() {
                return;
            }
        }
    }

    pub(crate) fn cancel(&self) {
        self.token.cancel();
    }

    fn set_state(&self, state: FollowState) {
        self.shared.state.send_replace(state);
    }
}

impl std::fmt::Debug for FollowHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FollowHandle")
            .field("state", &self.state())
            .field("cycles", &self.cycles())
            .field("cancel_requested", &self.is_cancel_requested())
            .finish()
    }
}

/// A follow loop owned by an agent
pub(crate) struct ActiveFollow {
    pub(crate) handle: FollowHandle,
    // Held so the task is not detached from its owner; the loop exits on its
    // own once cancelled.
    _task: JoinHandle<()>,
}

pub(crate) struct FollowLoop {
    core: Weak<AgentCore>,
    target: Target,
    settings: MoveSettings,
    handle: FollowHandle,
}

impl FollowLoop {
    /// `target` must already be pinned: a fixed point or an actor.
    ///
    /// The loop starts out `Running` when the target already has a usable
    /// position; only an actor that has not spawned yet starts `Idle`.
    pub(crate) fn new(core: &Arc<AgentCore>, target: Target, settings: MoveSettings) -> Self {
        let handle = FollowHandle::new();
        if target.current_position().is_some_and(|point| point.is_finite()) {
            handle.set_state(FollowState::Running);
        }
        Self {
            core: Arc::downgrade(core),
            target,
            settings,
            handle,
        }
    }

    pub(crate) fn spawn(self, runtime: &Handle) -> ActiveFollow {
        let handle = self.handle.clone();
        let task = runtime.spawn(self.run());
        ActiveFollow { handle, _task: task }
    }

    async fn run(self) {
        let token = self.handle.token.clone();
        let label = self
            .core
            .upgrade()
            .map(|core| core.id.to_string())
            .unwrap_or_default();

        // Idle -> Running
        let first = tokio::select! {
            biased;
            _ = token.cancelled() => None,
            resolved = self.target.resolve() => Some(resolved),
        };
        let mut goal = match first {
            None => return self.stop(&label, "cancelled while idle"),
            Some(Err(err)) => return self.abort(&label, err),
            Some(Ok(point)) => point,
        };
        if self.handle.state() == FollowState::Idle {
            self.handle.set_state(FollowState::Running);
        }
        log::debug!("{label}: following {:?}", self.target);

        loop {
            // Checkpoint: no new query after cancellation
            if token.is_cancelled() {
                return self.stop(&label, "cancelled");
            }

            let Some(core) = self.core.upgrade() else {
                return self.stop(&label, "agent dropped");
            };
            let interval = core.computation.time_between_compute();
            let result = MoveController::new(&core)
                .move_to(goal, &self.settings, &token)
                .await;
            drop(core);

            match result {
                Ok(_) => {}
                Err(NavError::UseAfterDestroy(_)) => return self.stop(&label, "agent destroyed"),
                Err(err) => return self.abort(&label, err),
            }
            self.handle.shared.cycles.fetch_add(1, Ordering::AcqRel);

            // Checkpoint: interruptible sleep
            tokio::select! {
                biased;
                _ = token.cancelled() => return self.stop(&label, "cancelled"),
                _ = tokio::time::sleep(interval) => {}
            }

            if self.target.is_dynamic() {
                goal = tokio::select! {
                    biased;
                    _ = token.cancelled() => return self.stop(&label, "cancelled"),
                    resolved = self.target.resolve() => match resolved {
                        Ok(point) => point,
                        Err(err) => return self.abort(&label, err),
                    },
                };
            }
        }
    }

    fn stop(&self, label: &str, reason: &str) {
        log::debug!("{label}: follow loop stopped ({reason}) after {} cycle(s)", self.handle.cycles());
        self.handle.set_state(FollowState::Cancelled);
    }

    fn abort(&self, label: &str, err: NavError) {
        log::warn!("{label}: follow loop aborted: {err}");
        self.handle.cancel();
        self.handle.set_state(FollowState::Cancelled);
    }
}
