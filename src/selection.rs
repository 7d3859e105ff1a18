//! Selected-task set driving bulk re-parent operations.

use std::collections::HashSet;

use crate::task::{TaskId, TaskRecord};

/// Set of selected task identifiers.
///
/// Selection is independent of the current filter view: an id stays selected
/// while hidden by a filter. It is cleared explicitly, or by the task store
/// after a successful bulk re-parent consumes it. Callers replacing the
/// loaded collection should [`prune`](SelectionSet::prune) so the set never
/// holds an id the collection no longer contains.
#[derive(Debug, Clone, Default)]
pub struct SelectionSet {
    ids: HashSet<TaskId>,
}

impl SelectionSet {
    pub fn new() -> Self {
        SelectionSet::default()
    }

    /// Flip membership of `id`; returns whether it is now selected.
    pub fn toggle(&mut self, id: TaskId) -> bool {
        if self.ids.remove(&id) {
            false
        } else {
            self.ids.insert(id);
            true
        }
    }

    pub fn contains(&self, id: &TaskId) -> bool {
        self.ids.contains(id)
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Snapshot of the selected ids, in no particular order.
    pub fn ids(&self) -> Vec<TaskId> {
        self.ids.iter().cloned().collect()
    }

    /// Drop ids not present in the given collection.
    pub fn prune(&mut self, tasks: &[TaskRecord]) {
        self.ids.retain(|id| tasks.iter().any(|t| &t.id == id));
    }
}
