//! Single-task-in-flight gate with a published busy signal

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::watch;
use tracing::{debug, error, warn};

use crate::domain::errors::DomainError;
use crate::domain::model::Task;

/// Holds the task currently keeping the media engine busy.
///
/// Work is admitted only from [`Task::None`]; the busy flag is broadcast to
/// subscribers every time it flips.
#[derive(Debug)]
pub struct TaskGate {
    current: Mutex<Task>,
    busy: watch::Sender<bool>,
}

impl TaskGate {
    pub fn new() -> Arc<Self> {
        let (busy, _) = watch::channel(false);
        Arc::new(Self {
            current: Mutex::new(Task::None),
            busy,
        })
    }

    pub fn current(&self) -> Task {
        *self.current.lock()
    }

    pub fn is_busy(&self) -> bool {
        self.current().is_busy()
    }

    /// Receiver that observes every busy/idle change
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.busy.subscribe()
    }

    /// Enter `task`, or reject if another task is active
    pub fn begin(self: &Arc<Self>, task: Task) -> Result<TaskGuard, DomainError> {
        let mut current = self.current.lock();
        if current.is_busy() {
            warn!("Cannot start {} when busy with {}", task, *current);
            return Err(DomainError::Busy {
                active: *current,
                requested: task,
            });
        }
        if !current.can_transition_to(task) {
            error!("Trying to set invalid task transition {} -> {}", *current, task);
            return Err(DomainError::InvalidTransition {
                from: *current,
                to: task,
            });
        }
        *current = task;
        drop(current);

        debug!("Task started: {}", task);
        self.busy.send_replace(true);
        Ok(TaskGuard {
            gate: Arc::clone(self),
            task,
        })
    }

    /// Return to idle if `task` is still the active one
    pub fn release(&self, task: Task) -> bool {
        let mut current = self.current.lock();
        if *current != task || !task.is_busy() {
            return false;
        }
        *current = Task::None;
        drop(current);

        debug!("Task finished: {}", task);
        self.busy.send_replace(false);
        true
    }
}

/// Active task; dropping it returns the gate to idle
#[derive(Debug)]
pub struct TaskGuard {
    gate: Arc<TaskGate>,
    task: Task,
}

impl TaskGuard {
    pub fn task(&self) -> Task {
        self.task
    }
}

impl Drop for TaskGuard {
    fn drop(&mut self) {
        self.gate.release(self.task);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_begin_and_release() {
        let gate = TaskGate::new();
        let guard = gate.begin(Task::Rendering).unwrap();
        assert_eq!(gate.current(), Task::Rendering);
        assert!(gate.is_busy());
        drop(guard);
        assert_eq!(gate.current(), Task::None);
    }

    #[test]
    fn test_busy_rejects_second_task() {
        let gate = TaskGate::new();
        let _guard = gate.begin(Task::Rendering).unwrap();
        let err = gate.begin(Task::Extracting).unwrap_err();
        assert_eq!(
            err,
            DomainError::Busy {
                active: Task::Rendering,
                requested: Task::Extracting
            }
        );
        assert_eq!(gate.current(), Task::Rendering);
    }

    #[test]
    fn test_cannot_begin_idle_task() {
        let gate = TaskGate::new();
        let err = gate.begin(Task::None).unwrap_err();
        assert!(matches!(err, DomainError::InvalidTransition { .. }));
        assert_eq!(gate.current(), Task::None);
    }

    #[test]
    fn test_early_release_leaves_later_task_alone() {
        let gate = TaskGate::new();
        let first = gate.begin(Task::Removing).unwrap();
        assert!(gate.release(Task::Removing));
        let _second = gate.begin(Task::Merging).unwrap();
        drop(first);
        assert_eq!(gate.current(), Task::Merging);
    }

    #[test]
    fn test_busy_signal_follows_gate() {
        let gate = TaskGate::new();
        let mut busy = gate.subscribe();
        assert!(!*busy.borrow_and_update());

        let guard = gate.begin(Task::Writing).unwrap();
        assert!(busy.has_changed().unwrap());
        assert!(*busy.borrow_and_update());

        drop(guard);
        assert!(!*busy.borrow_and_update());
    }
}
