//! Deferred Work Queue
//!
//! Work that must run strictly after the current resolution turn. The host
//! decides when a turn ends (next frame, next event-loop tick, end of a
//! test step) and drains one turn at a time.

use std::collections::VecDeque;

use trellis_tree::InstanceId;

/// Deferred unit of work
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeferredTask {
    /// Deliver `subtree-resolved` on a page instance
    AnnouncePage(InstanceId),
}

/// FIFO of deferred tasks
#[derive(Debug, Default)]
pub struct DeferredQueue {
    tasks: VecDeque<DeferredTask>,
}

impl DeferredQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a task for a later turn
    pub fn defer(&mut self, task: DeferredTask) {
        self.tasks.push_back(task);
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Take every task queued so far.
    ///
    /// Tasks deferred while the returned batch runs land in the next turn.
    pub fn take_turn(&mut self) -> Vec<DeferredTask> {
        self.tasks.drain(..).collect()
    }

    /// Drop queued tasks for instances that no longer exist
    pub fn retain(&mut self, mut keep: impl FnMut(&DeferredTask) -> bool) {
        self.tasks.retain(|task| keep(task));
    }
}
