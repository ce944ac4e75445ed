//! Change detection across successive snapshots of one task.
//!
//! A chat message showing a task is edited as the tracker reports progress.
//! Snapshots whose state and statuses match the previously observed one are
//! skipped, and once a terminal snapshot has been rendered nothing further is.

use crate::task_embed_snapshot::Task;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskSnapshotDecision {
    /// Snapshot changed and the task is still active.
    Render,
    /// Snapshot changed and the task reached a terminal state; render it once
    /// and stop observing.
    RenderFinal,
    /// Same state and statuses as the previous snapshot.
    Unchanged,
    /// A terminal snapshot was already rendered.
    Finished,
}

impl TaskSnapshotDecision {
    pub fn should_render(self) -> bool {
        matches!(self, Self::Render | Self::RenderFinal)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Render => "render",
            Self::RenderFinal => "render_final",
            Self::Unchanged => "unchanged",
            Self::Finished => "finished",
        }
    }
}

#[derive(Debug, Default)]
pub struct TaskSnapshotTracker {
    previous: Option<Task>,
    finished: bool,
}

impl TaskSnapshotTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn observe(&mut self, task: &Task) -> TaskSnapshotDecision {
        if self.finished {
            return TaskSnapshotDecision::Finished;
        }

        if let Some(previous) = &self.previous {
            if previous.state == task.state && previous.statuses == task.statuses {
                tracing::debug!(task_id = %task.task_id, "task snapshot unchanged");
                return TaskSnapshotDecision::Unchanged;
            }
        }

        self.previous = Some(task.clone());

        let active = task.state.as_ref().is_some_and(|state| state.is_active());
        if active {
            TaskSnapshotDecision::Render
        } else {
            self.finished = true;
            TaskSnapshotDecision::RenderFinal
        }
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn last_snapshot(&self) -> Option<&Task> {
        self.previous.as_ref()
    }
}
