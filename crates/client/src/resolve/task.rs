//! Lifecycle of a single resolution task.

use std::sync::Arc;
use tokio::sync::watch;
use vidrelay_core::Admitted;

/// Where a resolution task is in its life.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    /// Admitted, waiting for a worker slot.
    Pending,
    /// Holding a slot and doing work.
    Running,
    /// Produced a result (possibly the empty one).
    Done,
    /// Evicted before producing a result.
    Cancelled,
}

impl TaskState {
    pub fn is_terminal(self) -> bool {
        matches!(self, TaskState::Done | TaskState::Cancelled)
    }
}

/// Shared control block for a task: the admission table holds one clone, the
/// running task another.
///
/// Cancellation is cooperative. The task observes the state at safe points and
/// while awaiting a slot or the network.
#[derive(Debug, Clone)]
pub struct TaskHandle {
    id: u64,
    state: Arc<watch::Sender<TaskState>>,
}

impl TaskHandle {
    pub(crate) fn new(id: u64) -> Self {
        let (state, _) = watch::channel(TaskState::Pending);
        Self { id, state: Arc::new(state) }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn state(&self) -> TaskState {
        *self.state.borrow()
    }

    pub fn is_cancelled(&self) -> bool {
        self.state() == TaskState::Cancelled
    }

    /// Pending -> Running. False if the task was cancelled first.
    pub(crate) fn start(&self) -> bool {
        self.transition(TaskState::Pending, TaskState::Running)
    }

    /// Running -> Done. False if the task was cancelled meanwhile.
    pub(crate) fn finish(&self) -> bool {
        self.transition(TaskState::Running, TaskState::Done)
    }

    /// Resolves once the task has been cancelled.
    pub(crate) async fn cancelled(&self) {
        let mut rx = self.state.subscribe();
        loop {
            let state = *rx.borrow_and_update();
            if state == TaskState::Cancelled {
                return;
            }
            if rx.changed().await.is_err() {
                // sender lives as long as self; unreachable in practice
                std::future::pending::<()>().await;
            }
        }
    }

    fn transition(&self, from: TaskState, to: TaskState) -> bool {
        self.state.send_if_modified(|state| {
            if *state == from {
                *state = to;
                true
            } else {
                false
            }
        })
    }
}

impl Admitted for TaskHandle {
    fn is_terminal(&self) -> bool {
        self.state().is_terminal()
    }

    fn cancel(&self) {
        self.state.send_if_modified(|state| {
            if state.is_terminal() {
                false
            } else {
                *state = TaskState::Cancelled;
                true
            }
        });
    }
}
