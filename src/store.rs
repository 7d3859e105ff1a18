//! Optimistic task-state management over a remote data source.
//!
//! The store owns the flat task collection for the selected scope and keeps
//! it behind a `watch` channel so views always see a consistent
//! `{scope, tasks, loading}` triple. Mutations follow one shape: clone a
//! rollback snapshot, publish the tentative state synchronously so the UI
//! reflects the change with zero latency, issue the remote write, and on
//! failure restore the snapshot and raise an error notification with the
//! backend's message.
//!
//! Overlapping mutations are not serialized. Each call captures its own
//! snapshot at call time, so if mutation A fails after mutation B applied,
//! A's rollback discards B's tentative effect until B's own remote call
//! resolves. Last writer to resolve wins; there is no queueing, cancellation
//! or timeout at this layer.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, warn};

use crate::notify::Notifier;
use crate::selection::SelectionSet;
use crate::source::{Scope, TaskSource};
use crate::task::{StatusId, TaskDraft, TaskId, TaskNode, TaskPatch, TaskRecord};
use crate::tree::nest_tasks;

/// Snapshot published to subscribers on every change.
#[derive(Debug, Clone)]
pub struct TasksState {
    pub scope: Option<Scope>,
    pub tasks: Vec<TaskRecord>,
    pub loading: bool,
}

/// Task collection for one scope, with optimistic mutations.
pub struct TaskStore {
    source: Arc<dyn TaskSource>,
    notifier: Notifier,
    state: watch::Sender<TasksState>,
}

impl TaskStore {
    pub fn new(source: Arc<dyn TaskSource>, notifier: Notifier) -> Self {
        let (state, _) = watch::channel(TasksState {
            scope: None,
            tasks: Vec::new(),
            loading: true,
        });
        TaskStore {
            source,
            notifier,
            state,
        }
    }

    /// Subscribe to `{scope, tasks, loading}` updates.
    pub fn subscribe(&self) -> watch::Receiver<TasksState> {
        self.state.subscribe()
    }

    /// Current flat collection.
    pub fn tasks(&self) -> Vec<TaskRecord> {
        self.state.borrow().tasks.clone()
    }

    /// Forest derived from the current flat collection.
    pub fn forest(&self) -> Vec<TaskNode> {
        nest_tasks(&self.state.borrow().tasks)
    }

    pub fn loading(&self) -> bool {
        self.state.borrow().loading
    }

    pub fn scope(&self) -> Option<Scope> {
        self.state.borrow().scope.clone()
    }

    /// Select a scope and reload. `None` clears the collection without a
    /// remote call.
    pub async fn set_scope(&self, scope: Option<Scope>) {
        self.state.send_modify(|s| s.scope = scope);
        self.refetch().await;
    }

    /// Wholesale replacement of the flat collection from the source.
    ///
    /// A fetch failure notifies and leaves an empty collection rather than
    /// stale rows from another scope.
    pub async fn refetch(&self) {
        let scope = match self.state.borrow().scope.clone() {
            Some(scope) => scope,
            None => {
                self.state.send_modify(|s| {
                    s.tasks.clear();
                    s.loading = false;
                });
                return;
            }
        };
        self.state.send_modify(|s| s.loading = true);
        match self.source.fetch_tasks(&scope).await {
            Ok(tasks) => {
                debug!(count = tasks.len(), "loaded tasks");
                self.state.send_modify(|s| {
                    s.tasks = tasks;
                    s.loading = false;
                });
            }
            Err(err) => {
                self.notifier.error("Failed to load tasks", &err);
                self.state.send_modify(|s| {
                    s.tasks.clear();
                    s.loading = false;
                });
            }
        }
    }

    /// Create a task.
    ///
    /// No tentative publish: a rejected create must leave local state
    /// untouched. On success the collection is refetched so backend-assigned
    /// fields (id, wbs code, joined names) come back authoritative.
    pub async fn add_task(&self, draft: TaskDraft) -> bool {
        match self.source.insert_task(&draft).await {
            Ok(created) => {
                debug!(task = %created.id, "task created");
                self.notifier.info("Task added");
                self.refetch().await;
                true
            }
            Err(err) => {
                self.notifier.error("Failed to add task", &err);
                false
            }
        }
    }

    /// Optimistically remove a task; restore the full collection on failure.
    pub async fn delete_task(&self, id: &TaskId) -> bool {
        let snapshot = self.tasks();
        self.state.send_modify(|s| s.tasks.retain(|t| &t.id != id));
        match self.source.delete_task(id).await {
            Ok(()) => {
                self.notifier.info("Task deleted");
                true
            }
            Err(err) => {
                warn!(task = %id, "delete failed, rolling back");
                self.state.send_modify(|s| s.tasks = snapshot);
                self.notifier.error("Failed to delete task", &err);
                false
            }
        }
    }

    /// Optimistically change a task's status. The remote write carries only
    /// the status field.
    pub async fn update_status(&self, id: &TaskId, status_id: StatusId) -> bool {
        let snapshot = self.tasks();
        self.state.send_modify(|s| {
            if let Some(task) = s.tasks.iter_mut().find(|t| &t.id == id) {
                task.status_id = status_id.clone();
            }
        });
        match self
            .source
            .update_task_fields(id, &TaskPatch::status(status_id))
            .await
        {
            Ok(()) => {
                self.notifier.info("Task status updated");
                true
            }
            Err(err) => {
                warn!(task = %id, "status update failed, rolling back");
                self.state.send_modify(|s| s.tasks = snapshot);
                self.notifier.error("Failed to update status", &err);
                false
            }
        }
    }

    /// Optimistically shallow-merge `patch` into a task, then write the full
    /// merged field set (tag associations included) in one remote call.
    pub async fn update_task(&self, id: &TaskId, patch: TaskPatch) -> bool {
        let snapshot = self.tasks();
        self.state.send_modify(|s| {
            if let Some(task) = s.tasks.iter_mut().find(|t| &t.id == id) {
                patch.apply_to(task);
            }
        });
        match self.source.update_task_fields(id, &patch).await {
            Ok(()) => {
                self.notifier.info("Task updated");
                true
            }
            Err(err) => {
                warn!(task = %id, "field update failed, rolling back");
                self.state.send_modify(|s| s.tasks = snapshot);
                self.notifier.error("Failed to update task", &err);
                false
            }
        }
    }

    /// Optimistic bulk re-parent of `ids` under `parent` (`None` clears).
    /// One batched remote write; failure restores the pre-batch snapshot
    /// for the whole collection.
    pub async fn set_parent(&self, ids: &[TaskId], parent: Option<&TaskId>) -> bool {
        let snapshot = self.tasks();
        self.state.send_modify(|s| {
            for task in s.tasks.iter_mut() {
                if ids.contains(&task.id) {
                    task.parent_id = parent.cloned();
                }
            }
        });
        match self.source.update_task_parent(ids, parent).await {
            Ok(()) => {
                self.notifier.info("Hierarchy updated");
                true
            }
            Err(err) => {
                warn!(count = ids.len(), "re-parent failed, rolling back");
                self.state.send_modify(|s| s.tasks = snapshot);
                self.notifier.error("Failed to set parent task", &err);
                false
            }
        }
    }

    /// Re-parent the selected tasks, clearing the selection only on
    /// success. A failed batch leaves the selection intact for retry.
    pub async fn reparent_selection(
        &self,
        selection: &mut SelectionSet,
        parent: Option<&TaskId>,
    ) -> bool {
        let ids = selection.ids();
        let ok = self.set_parent(&ids, parent).await;
        if ok {
            self.notifier.info_with(
                "Subtasks assigned",
                format!("{} tasks re-organised", ids.len()),
            );
            selection.clear();
        }
        ok
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use chrono::DateTime;
    use pretty_assertions::assert_eq;
    use serde_json::Map;
    use tokio::sync::{mpsc, oneshot};

    use super::*;
    use crate::notify::{Notification, Severity};
    use crate::source::SourceError;

    fn task(id: &str, parent: Option<&str>, status: &str) -> TaskRecord {
        TaskRecord {
            id: TaskId::from(id),
            name: format!("task {id}"),
            description: None,
            project_id: "p1".into(),
            project_name: None,
            assignee_id: None,
            assignee_name: None,
            status_id: status.into(),
            status_name: None,
            status_color: None,
            parent_id: parent.map(TaskId::from),
            start_date: None,
            end_date: None,
            progress: None,
            priority: None,
            created_at: DateTime::UNIX_EPOCH,
            wbs_code: String::new(),
            tags: Vec::new(),
            dependencies: Vec::new(),
            custom_fields: Map::new(),
            observation: None,
        }
    }

    #[derive(Default)]
    struct MockSource {
        tasks: Mutex<Vec<TaskRecord>>,
        fail_fetch: Mutex<Option<SourceError>>,
        fail_insert: Mutex<Option<SourceError>>,
        fail_update: Mutex<Option<SourceError>>,
        fail_parent: Mutex<Option<SourceError>>,
        fail_delete: Mutex<Option<SourceError>>,
        // When set, update_task_parent waits here before resolving.
        parent_gate: Mutex<Option<oneshot::Receiver<()>>>,
    }

    impl MockSource {
        fn seeded(tasks: Vec<TaskRecord>) -> Arc<Self> {
            let mock = MockSource::default();
            *mock.tasks.lock().unwrap() = tasks;
            Arc::new(mock)
        }
    }

    #[async_trait]
    impl TaskSource for MockSource {
        async fn fetch_tasks(&self, _scope: &Scope) -> Result<Vec<TaskRecord>, SourceError> {
            if let Some(err) = self.fail_fetch.lock().unwrap().take() {
                return Err(err);
            }
            Ok(self.tasks.lock().unwrap().clone())
        }

        async fn insert_task(&self, draft: &TaskDraft) -> Result<TaskRecord, SourceError> {
            if let Some(err) = self.fail_insert.lock().unwrap().take() {
                return Err(err);
            }
            let mut tasks = self.tasks.lock().unwrap();
            let mut created = task(&format!("new-{}", tasks.len() + 1), None, "open");
            created.name = draft.name.clone();
            created.project_id = draft.project_id.clone();
            tasks.push(created.clone());
            Ok(created)
        }

        async fn update_task_fields(
            &self,
            _id: &TaskId,
            _fields: &TaskPatch,
        ) -> Result<(), SourceError> {
            if let Some(err) = self.fail_update.lock().unwrap().take() {
                return Err(err);
            }
            Ok(())
        }

        async fn update_task_parent(
            &self,
            _ids: &[TaskId],
            _parent: Option<&TaskId>,
        ) -> Result<(), SourceError> {
            let gate = self.parent_gate.lock().unwrap().take();
            if let Some(rx) = gate {
                let _ = rx.await;
            }
            if let Some(err) = self.fail_parent.lock().unwrap().take() {
                return Err(err);
            }
            Ok(())
        }

        async fn delete_task(&self, _id: &TaskId) -> Result<(), SourceError> {
            if let Some(err) = self.fail_delete.lock().unwrap().take() {
                return Err(err);
            }
            Ok(())
        }
    }

    async fn seeded_store(
        tasks: Vec<TaskRecord>,
    ) -> (Arc<MockSource>, TaskStore, mpsc::UnboundedReceiver<Notification>) {
        let mock = MockSource::seeded(tasks);
        let (notifier, rx) = Notifier::channel();
        let store = TaskStore::new(mock.clone(), notifier);
        store.set_scope(Some(Scope::Consolidated)).await;
        (mock, store, rx)
    }

    #[tokio::test]
    async fn test_fetch_populates_and_clears_loading() {
        let (_mock, store, _rx) =
            seeded_store(vec![task("1", None, "open"), task("2", Some("1"), "open")]).await;
        assert!(!store.loading());
        assert_eq!(store.tasks().len(), 2);
        let forest = store.forest();
        assert_eq!(forest.len(), 1);
        assert_eq!(forest[0].subtasks.len(), 1);
    }

    #[tokio::test]
    async fn test_fetch_failure_notifies_and_empties() {
        let mock = MockSource::seeded(vec![task("1", None, "open")]);
        *mock.fail_fetch.lock().unwrap() = Some(SourceError::Transient("socket closed".into()));
        let (notifier, mut rx) = Notifier::channel();
        let store = TaskStore::new(mock, notifier);
        store.set_scope(Some(Scope::Consolidated)).await;

        assert!(store.tasks().is_empty());
        assert!(!store.loading());
        let n = rx.try_recv().unwrap();
        assert_eq!(n.severity, Severity::Error);
        assert_eq!(n.detail.as_deref(), Some("socket closed"));
    }

    #[tokio::test]
    async fn test_no_scope_clears_without_fetch() {
        let (_mock, store, _rx) = seeded_store(vec![task("1", None, "open")]).await;
        store.set_scope(None).await;
        assert!(store.tasks().is_empty());
        assert!(!store.loading());
    }

    #[tokio::test]
    async fn test_delete_commits_on_success() {
        let (_mock, store, _rx) =
            seeded_store(vec![task("1", None, "open"), task("2", None, "open")]).await;
        assert!(store.delete_task(&TaskId::from("1")).await);
        let ids: Vec<_> = store.tasks().into_iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![TaskId::from("2")]);
    }

    #[tokio::test]
    async fn test_delete_failure_restores_exact_snapshot() {
        let (mock, store, mut rx) =
            seeded_store(vec![task("1", None, "open"), task("2", Some("1"), "open")]).await;
        let before = store.tasks();
        *mock.fail_delete.lock().unwrap() = Some(SourceError::Transient("gateway timeout".into()));

        assert!(!store.delete_task(&TaskId::from("2")).await);
        assert_eq!(store.tasks(), before);
        let n = rx.try_recv().unwrap();
        assert_eq!(n.severity, Severity::Error);
        assert_eq!(n.detail.as_deref(), Some("gateway timeout"));
    }

    #[tokio::test]
    async fn test_update_status_commits_tentative_state() {
        let (_mock, store, _rx) = seeded_store(vec![task("1", None, "open")]).await;
        assert!(
            store
                .update_status(&TaskId::from("1"), StatusId::from("done"))
                .await
        );
        assert_eq!(store.tasks()[0].status_id, StatusId::from("done"));
    }

    #[tokio::test]
    async fn test_update_status_rolls_back_on_failure() {
        let (mock, store, _rx) = seeded_store(vec![task("1", None, "open")]).await;
        let before = store.tasks();
        *mock.fail_update.lock().unwrap() = Some(SourceError::NotFound("row vanished".into()));

        assert!(
            !store
                .update_status(&TaskId::from("1"), StatusId::from("done"))
                .await
        );
        assert_eq!(store.tasks(), before);
    }

    #[tokio::test]
    async fn test_update_task_merges_fields() {
        let (_mock, store, _rx) = seeded_store(vec![task("1", None, "open")]).await;
        let patch = TaskPatch {
            name: Some("renamed".into()),
            progress: Some(75),
            ..TaskPatch::default()
        };
        assert!(store.update_task(&TaskId::from("1"), patch).await);
        let updated = &store.tasks()[0];
        assert_eq!(updated.name, "renamed");
        assert_eq!(updated.progress, Some(75));
    }

    #[tokio::test]
    async fn test_update_task_rolls_back_on_failure() {
        let (mock, store, _rx) = seeded_store(vec![task("1", None, "open")]).await;
        let before = store.tasks();
        *mock.fail_update.lock().unwrap() = Some(SourceError::Transient("backend down".into()));
        let patch = TaskPatch {
            name: Some("renamed".into()),
            ..TaskPatch::default()
        };
        assert!(!store.update_task(&TaskId::from("1"), patch).await);
        assert_eq!(store.tasks(), before);
    }

    #[tokio::test]
    async fn test_add_task_refetches_on_success() {
        let (_mock, store, _rx) = seeded_store(vec![task("1", None, "open")]).await;
        let draft = TaskDraft {
            project_id: "p1".into(),
            name: "brand new".into(),
            status_id: "open".into(),
            ..TaskDraft::default()
        };
        assert!(store.add_task(draft).await);
        let tasks = store.tasks();
        assert_eq!(tasks.len(), 2);
        assert_eq!(tasks[1].name, "brand new");
    }

    #[tokio::test]
    async fn test_rejected_add_leaves_state_untouched() {
        let (mock, store, mut rx) = seeded_store(vec![task("1", None, "open")]).await;
        let before = store.tasks();
        *mock.fail_insert.lock().unwrap() =
            Some(SourceError::Validation("name must not be empty".into()));

        let draft = TaskDraft {
            project_id: "p1".into(),
            status_id: "open".into(),
            ..TaskDraft::default()
        };
        assert!(!store.add_task(draft).await);
        assert_eq!(store.tasks(), before);
        let n = rx.try_recv().unwrap();
        assert_eq!(n.detail.as_deref(), Some("name must not be empty"));
    }

    #[tokio::test]
    async fn test_reparent_failure_keeps_parents_and_selection() {
        let (mock, store, _rx) = seeded_store(vec![
            task("1", None, "open"),
            task("2", None, "open"),
            task("3", Some("1"), "open"),
        ]).await;
        *mock.fail_parent.lock().unwrap() = Some(SourceError::Transient("batch failed".into()));

        let mut selection = SelectionSet::new();
        selection.toggle(TaskId::from("2"));
        selection.toggle(TaskId::from("3"));
        let parent = TaskId::from("1");
        assert!(
            !store
                .reparent_selection(&mut selection, Some(&parent))
                .await
        );

        let tasks = store.tasks();
        let by_id = |id: &str| tasks.iter().find(|t| t.id.as_str() == id).unwrap();
        assert_eq!(by_id("2").parent_id, None);
        assert_eq!(by_id("3").parent_id, Some(TaskId::from("1")));
        // Clear only follows success.
        assert_eq!(selection.len(), 2);
    }

    #[tokio::test]
    async fn test_reparent_success_clears_selection() {
        let (_mock, store, _rx) =
            seeded_store(vec![task("1", None, "open"), task("2", None, "open")]).await;
        let mut selection = SelectionSet::new();
        selection.toggle(TaskId::from("2"));
        let parent = TaskId::from("1");
        assert!(
            store
                .reparent_selection(&mut selection, Some(&parent))
                .await
        );
        assert!(selection.is_empty());
        let tasks = store.tasks();
        assert_eq!(tasks[1].parent_id, Some(TaskId::from("1")));
    }

    #[tokio::test]
    async fn test_set_parent_publishes_tentative_state_before_resolution() {
        let (mock, store, _rx) =
            seeded_store(vec![task("1", None, "open"), task("2", None, "open")]).await;
        let (open_gate, gate) = oneshot::channel();
        *mock.parent_gate.lock().unwrap() = Some(gate);

        let store = Arc::new(store);
        let spawned = {
            let store = store.clone();
            tokio::spawn(async move {
                store
                    .set_parent(&[TaskId::from("2")], Some(&TaskId::from("1")))
                    .await
            })
        };
        tokio::task::yield_now().await;

        // Remote call still pending, but the view already shows the change.
        assert_eq!(store.tasks()[1].parent_id, Some(TaskId::from("1")));

        open_gate.send(()).unwrap();
        assert!(spawned.await.unwrap());
        assert_eq!(store.tasks()[1].parent_id, Some(TaskId::from("1")));
    }

    #[tokio::test]
    async fn test_overlapping_mutations_last_resolver_wins() {
        // Documented race: A (re-parent) snapshots, B (status) applies and
        // resolves, then A fails. A's rollback restores the pre-A snapshot,
        // discarding B's already-confirmed effect until the next refetch.
        let (mock, store, _rx) =
            seeded_store(vec![task("1", None, "open"), task("2", None, "open")]).await;
        let (open_gate, gate) = oneshot::channel();
        *mock.parent_gate.lock().unwrap() = Some(gate);
        *mock.fail_parent.lock().unwrap() = Some(SourceError::Transient("batch failed".into()));

        let store = Arc::new(store);
        let spawned = {
            let store = store.clone();
            tokio::spawn(async move {
                store
                    .set_parent(&[TaskId::from("2")], Some(&TaskId::from("1")))
                    .await
            })
        };
        tokio::task::yield_now().await;

        assert!(
            store
                .update_status(&TaskId::from("1"), StatusId::from("done"))
                .await
        );
        assert_eq!(store.tasks()[0].status_id, StatusId::from("done"));

        open_gate.send(()).unwrap();
        assert!(!spawned.await.unwrap());

        // A's rollback rewound B's committed status change as well.
        assert_eq!(store.tasks()[0].status_id, StatusId::from("open"));
        assert_eq!(store.tasks()[1].parent_id, None);
    }
}
