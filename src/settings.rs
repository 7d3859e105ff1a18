//! Workspace settings: task statuses, tags, and table column layout.
//!
//! Statuses and tags live in the backend and follow a remote-first flow with
//! the local list patched in place on success (no refetch; the mutation
//! result is authoritative enough for these small lists). Columns are purely
//! local view configuration and never touch the data source.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::debug;

use crate::fields::ColumnKind;
use crate::notify::Notifier;
use crate::source::SettingsSource;
use crate::task::{StatusId, Tag, TagId};

/// A task status row: user-editable, ordered, colored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskStatus {
    pub id: StatusId,
    pub name: String,
    pub color: String,
    #[serde(default)]
    pub display_order: Option<u32>,
}

/// Field set for creating or updating a status.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusDraft {
    pub name: String,
    pub color: String,
    pub display_order: Option<u32>,
}

/// A table column: built-in or user-defined.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    pub id: String,
    pub name: String,
    pub kind: ColumnKind,
}

fn built_in_columns() -> Vec<Column> {
    let col = |id: &str, name: &str, kind| Column {
        id: id.to_string(),
        name: name.to_string(),
        kind,
    };
    vec![
        col("formatted_id", "ID", ColumnKind::Text),
        col("project_name", "Project", ColumnKind::Text),
        col("assignee", "Assignee", ColumnKind::Text),
        col("status", "Status", ColumnKind::Text),
        col("priority", "Priority", ColumnKind::Text),
        col("tags", "Tags", ColumnKind::Text),
        col("progress", "Progress", ColumnKind::Progress),
        col("start_date", "Start", ColumnKind::Date),
        col("end_date", "End", ColumnKind::Date),
        col("duration", "Duration", ColumnKind::Number),
    ]
}

/// Snapshot published to subscribers.
#[derive(Debug, Clone)]
pub struct SettingsState {
    pub statuses: Vec<TaskStatus>,
    pub tags: Vec<Tag>,
    pub columns: Vec<Column>,
    pub visible_columns: Vec<String>,
    pub loading: bool,
}

/// Workspace settings store.
pub struct SettingsStore {
    source: Arc<dyn SettingsSource>,
    notifier: Notifier,
    state: watch::Sender<SettingsState>,
    next_custom: AtomicU32,
}

impl SettingsStore {
    pub fn new(source: Arc<dyn SettingsSource>, notifier: Notifier) -> Self {
        let columns = built_in_columns();
        let visible_columns = columns.iter().map(|c| c.id.clone()).collect();
        let (state, _) = watch::channel(SettingsState {
            statuses: Vec::new(),
            tags: Vec::new(),
            columns,
            visible_columns,
            loading: true,
        });
        SettingsStore {
            source,
            notifier,
            state,
            next_custom: AtomicU32::new(1),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<SettingsState> {
        self.state.subscribe()
    }

    pub fn statuses(&self) -> Vec<TaskStatus> {
        self.state.borrow().statuses.clone()
    }

    pub fn tags(&self) -> Vec<Tag> {
        self.state.borrow().tags.clone()
    }

    pub fn columns(&self) -> Vec<Column> {
        self.state.borrow().columns.clone()
    }

    pub fn visible_columns(&self) -> Vec<String> {
        self.state.borrow().visible_columns.clone()
    }

    pub fn loading(&self) -> bool {
        self.state.borrow().loading
    }

    pub async fn refetch(&self) {
        self.state.send_modify(|s| s.loading = true);
        match self.source.fetch_settings().await {
            Ok((statuses, tags)) => {
                debug!(
                    statuses = statuses.len(),
                    tags = tags.len(),
                    "loaded table settings"
                );
                self.state.send_modify(|s| {
                    s.statuses = statuses;
                    s.tags = tags;
                    s.loading = false;
                });
            }
            Err(err) => {
                self.notifier.error("Failed to load table settings", &err);
                self.state.send_modify(|s| s.loading = false);
            }
        }
    }

    /// Create a status remotely and append the created row locally.
    pub async fn add_status(&self, draft: StatusDraft) -> Option<TaskStatus> {
        match self.source.insert_status(&draft).await {
            Ok(created) => {
                self.state
                    .send_modify(|s| s.statuses.push(created.clone()));
                Some(created)
            }
            Err(err) => {
                self.notifier.error("Failed to add status", &err);
                None
            }
        }
    }

    pub async fn update_status(&self, id: &StatusId, draft: StatusDraft) -> bool {
        match self.source.update_status(id, &draft).await {
            Ok(()) => {
                self.state.send_modify(|s| {
                    if let Some(status) = s.statuses.iter_mut().find(|st| &st.id == id) {
                        status.name = draft.name.clone();
                        status.color = draft.color.clone();
                        status.display_order = draft.display_order;
                    }
                });
                true
            }
            Err(err) => {
                self.notifier.error("Failed to update status", &err);
                false
            }
        }
    }

    pub async fn delete_status(&self, id: &StatusId) -> bool {
        match self.source.delete_status(id).await {
            Ok(()) => {
                self.state
                    .send_modify(|s| s.statuses.retain(|st| &st.id != id));
                true
            }
            Err(err) => {
                self.notifier.error("Failed to delete status", &err);
                false
            }
        }
    }

    pub async fn add_tag(&self, name: &str) -> Option<Tag> {
        match self.source.insert_tag(name).await {
            Ok(created) => {
                self.state.send_modify(|s| s.tags.push(created.clone()));
                Some(created)
            }
            Err(err) => {
                self.notifier.error("Failed to add tag", &err);
                None
            }
        }
    }

    pub async fn update_tag(&self, id: &TagId, name: &str) -> bool {
        match self.source.update_tag(id, name).await {
            Ok(()) => {
                self.state.send_modify(|s| {
                    if let Some(tag) = s.tags.iter_mut().find(|t| &t.id == id) {
                        tag.name = name.to_string();
                    }
                });
                true
            }
            Err(err) => {
                self.notifier.error("Failed to update tag", &err);
                false
            }
        }
    }

    pub async fn delete_tag(&self, id: &TagId) -> bool {
        match self.source.delete_tag(id).await {
            Ok(()) => {
                self.state.send_modify(|s| s.tags.retain(|t| &t.id != id));
                true
            }
            Err(err) => {
                self.notifier.error("Failed to delete tag", &err);
                false
            }
        }
    }

    /// Add a user-defined column and make it visible.
    pub fn add_column(&self, name: &str, kind: ColumnKind) -> Column {
        let n = self.next_custom.fetch_add(1, Ordering::Relaxed);
        let column = Column {
            id: format!("custom_{n}"),
            name: name.to_string(),
            kind,
        };
        self.state.send_modify(|s| {
            s.columns.push(column.clone());
            s.visible_columns.push(column.id.clone());
        });
        column
    }

    pub fn update_column(&self, id: &str, name: &str, kind: ColumnKind) {
        self.state.send_modify(|s| {
            if let Some(column) = s.columns.iter_mut().find(|c| c.id == id) {
                column.name = name.to_string();
                column.kind = kind;
            }
        });
    }

    /// Duplicate a column under a fresh id with a "(copy)" suffix.
    pub fn duplicate_column(&self, id: &str) -> Option<Column> {
        let existing = self
            .state
            .borrow()
            .columns
            .iter()
            .find(|c| c.id == id)
            .cloned()?;
        let n = self.next_custom.fetch_add(1, Ordering::Relaxed);
        let column = Column {
            id: format!("{}_{n}", existing.id),
            name: format!("{} (copy)", existing.name),
            kind: existing.kind,
        };
        self.state.send_modify(|s| {
            s.columns.push(column.clone());
            s.visible_columns.push(column.id.clone());
        });
        Some(column)
    }

    /// Remove a column, dropping it from the visible set as well.
    pub fn delete_column(&self, id: &str) {
        self.state.send_modify(|s| {
            s.columns.retain(|c| c.id != id);
            s.visible_columns.retain(|v| v != id);
        });
    }

    pub fn set_visible_columns(&self, ids: Vec<String>) {
        self.state.send_modify(|s| s.visible_columns = ids);
    }
}
