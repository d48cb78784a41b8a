//! Server lifecycle state machine.
//!
//! A server process moves through
//! `Uninitialized -> Ready -> ShuttingDown -> Terminated`, never backwards.
//! The state is shared between the MCP handler (which marks the server ready
//! once a client has initialized) and the server builder (which owns the single
//! shutdown transition).

use std::fmt;
use std::sync::Arc;
use tokio::sync::watch;

/// Lifecycle states of a server process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LifecycleState {
    /// Waiting for the client's `initialize` request
    Uninitialized,
    /// Serving `tools/list` and `tools/call`
    Ready,
    /// Shutdown requested, transport closing
    ShuttingDown,
    /// Transport closed
    Terminated,
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LifecycleState::Uninitialized => write!(f, "uninitialized"),
            LifecycleState::Ready => write!(f, "ready"),
            LifecycleState::ShuttingDown => write!(f, "shutting down"),
            LifecycleState::Terminated => write!(f, "terminated"),
        }
    }
}

/// Shared handle to the lifecycle state.
#[derive(Debug, Clone)]
pub struct Lifecycle {
    state: Arc<watch::Sender<LifecycleState>>,
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self::new()
    }
}

impl Lifecycle {
    /// Create a lifecycle in the `Uninitialized` state.
    pub fn new() -> Self {
        let (state, _) = watch::channel(LifecycleState::Uninitialized);
        Self {
            state: Arc::new(state),
        }
    }

    /// Current state.
    pub fn state(&self) -> LifecycleState {
        *self.state.borrow()
    }

    /// Subscribe to state changes.
    pub fn subscribe(&self) -> watch::Receiver<LifecycleState> {
        self.state.subscribe()
    }

    /// Whether tool calls should be served.
    pub fn is_ready(&self) -> bool {
        self.state() == LifecycleState::Ready
    }

    /// Whether shutdown has begun or finished.
    pub fn is_stopping(&self) -> bool {
        self.state() >= LifecycleState::ShuttingDown
    }

    /// `Uninitialized -> Ready`. Returns `false` if the server was not waiting
    /// for initialization (repeated `initialize`, or already stopping).
    pub fn mark_ready(&self) -> bool {
        self.advance(LifecycleState::Ready, |from| from == LifecycleState::Uninitialized)
    }

    /// `Uninitialized | Ready -> ShuttingDown`. Returns `false` if shutdown
    /// was already underway.
    pub fn begin_shutdown(&self) -> bool {
        self.advance(LifecycleState::ShuttingDown, |from| from < LifecycleState::ShuttingDown)
    }

    /// Any state -> `Terminated`.
    pub fn terminate(&self) -> bool {
        self.advance(LifecycleState::Terminated, |from| from != LifecycleState::Terminated)
    }

    /// Wait until the state is at least `target`.
    pub async fn wait_for(&self, target: LifecycleState) {
        let mut rx = self.subscribe();
        // The sender lives in `self`, so the channel cannot close while we wait.
        let _ = rx.wait_for(|state| *state >= target).await;
    }

    fn advance(&self, to: LifecycleState, allowed: impl Fn(LifecycleState) -> bool) -> bool {
        let mut changed = false;
        self.state.send_if_modified(|state| {
            if allowed(*state) {
                tracing::debug!(from = %state, to = %to, "Lifecycle transition");
                *state = to;
                changed = true;
            }
            changed
        });
        changed
    }
}
