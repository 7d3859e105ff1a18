//! Hierarchical nesting and filtering of flat task collections.
//!
//! The backend hands over a flat list of rows linked by `parent_id`; the
//! table, Gantt and WBS views all want a tree. `nest_tasks` derives that tree
//! and `filter_forest` prunes it while keeping every ancestor chain that
//! leads to a match. Both are pure: the flat collection is the single source
//! of truth and the tree is recomputed whenever it changes.

use std::collections::HashMap;

use crate::task::{StatusId, TaskNode, TaskRecord, UserId};

/// Status/assignee predicate shared by the table and kanban views.
///
/// `None` is the "all" wildcard and matches every task.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskFilter {
    pub status: Option<StatusId>,
    pub assignee: Option<UserId>,
}

impl TaskFilter {
    pub fn matches(&self, task: &TaskRecord) -> bool {
        let status_ok = self.status.as_ref().map_or(true, |s| &task.status_id == s);
        let assignee_ok = self
            .assignee
            .as_ref()
            .map_or(true, |u| task.assignee_id.as_ref() == Some(u));
        status_ok && assignee_ok
    }
}

/// Convert a flat record sequence into a forest keyed by `parent_id`.
///
/// Single pass over the flat list; parent chains are never walked during
/// construction, so malformed links cannot loop. Every record lands in the
/// forest exactly once: a `parent_id` that is absent, unknown, or would close
/// a cycle puts the record at root level instead. Siblings and roots keep the
/// relative order of the input.
pub fn nest_tasks(records: &[TaskRecord]) -> Vec<TaskNode> {
    if records.is_empty() {
        return Vec::new();
    }

    let index: HashMap<_, _> = records
        .iter()
        .enumerate()
        .map(|(i, t)| (&t.id, i))
        .collect();

    // Effective parent per record: resolvable and not the record itself.
    // With duplicate ids (not a contracted input) the last record wins.
    let mut parent_of: Vec<Option<usize>> = records
        .iter()
        .map(|t| {
            t.parent_id
                .as_ref()
                .filter(|p| **p != t.id)
                .and_then(|p| index.get(p).copied())
        })
        .collect();

    // Cut parent cycles: walk each unvisited chain once; re-entering the
    // current walk means the chain loops, so the re-entered record is
    // promoted to root. Each record is walked once, keeping this linear.
    let mut state = vec![0u8; records.len()]; // 0 new, 1 on current walk, 2 settled
    for start in 0..records.len() {
        if state[start] != 0 {
            continue;
        }
        let mut walk = Vec::new();
        let mut cur = start;
        loop {
            state[cur] = 1;
            walk.push(cur);
            match parent_of[cur] {
                Some(next) if state[next] == 0 => cur = next,
                Some(next) if state[next] == 1 => {
                    parent_of[next] = None;
                    break;
                }
                _ => break,
            }
        }
        for i in walk {
            state[i] = 2;
        }
    }

    let mut children: Vec<Vec<usize>> = vec![Vec::new(); records.len()];
    let mut roots = Vec::new();
    for (i, parent) in parent_of.iter().enumerate() {
        match parent {
            Some(p) => children[*p].push(i),
            None => roots.push(i),
        }
    }

    fn build(i: usize, records: &[TaskRecord], children: &[Vec<usize>]) -> TaskNode {
        TaskNode {
            task: records[i].clone(),
            subtasks: children[i]
                .iter()
                .map(|&c| build(c, records, children))
                .collect(),
        }
    }

    roots
        .into_iter()
        .map(|i| build(i, records, &children))
        .collect()
}

/// Filter a forest, retaining any node that matches or has a matching
/// descendant. Ancestors of a match survive even when they fail the
/// predicate themselves; a failing leaf is dropped. Returns a new forest.
pub fn filter_forest(forest: &[TaskNode], filter: &TaskFilter) -> Vec<TaskNode> {
    forest
        .iter()
        .filter_map(|node| {
            let subtasks = filter_forest(&node.subtasks, filter);
            if filter.matches(&node.task) || !subtasks.is_empty() {
                Some(TaskNode {
                    task: node.task.clone(),
                    subtasks,
                })
            } else {
                None
            }
        })
        .collect()
}

/// Flat filtering for views without hierarchy semantics (kanban).
pub fn filter_flat<'a>(tasks: &'a [TaskRecord], filter: &TaskFilter) -> Vec<&'a TaskRecord> {
    tasks.iter().filter(|t| filter.matches(t)).collect()
}

/// Depth-first flattening of a forest back into record references.
pub fn flatten(forest: &[TaskNode]) -> Vec<&TaskRecord> {
    let mut out = Vec::new();
    fn walk<'a>(nodes: &'a [TaskNode], out: &mut Vec<&'a TaskRecord>) {
        for node in nodes {
            out.push(&node.task);
            walk(&node.subtasks, out);
        }
    }
    walk(forest, &mut out);
    out
}
