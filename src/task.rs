//! Task data structures and partial-update types.
//!
//! This module defines the flat `TaskRecord` exactly as the data source hands
//! it over, the derived `TaskNode` tree shape, and the typed creation/update
//! payloads (`TaskDraft`, `TaskPatch`) sent back to the source.

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::fields::Priority;

macro_rules! id_type {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(raw: impl Into<String>) -> Self {
                Self(raw.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(raw: &str) -> Self {
                Self(raw.to_string())
            }
        }
    };
}

id_type!(
    /// Opaque task identifier issued by the backend.
    TaskId
);
id_type!(
    /// Opaque project identifier.
    ProjectId
);
id_type!(
    /// Opaque user identifier.
    UserId
);
id_type!(
    /// Opaque task-status identifier. Statuses are user-editable backend rows.
    StatusId
);
id_type!(
    /// Opaque tag identifier.
    TagId
);

/// A tag as attached to a task row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub id: TagId,
    pub name: String,
}

/// A flat task row as received from the data source.
///
/// `*_name` and `status_color` fields are denormalised display values the
/// backend joins in; they go stale under local edits and refresh on the next
/// fetch. `parent_id` is the only hierarchy link; the nested tree shape is
/// always derived, never stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskRecord {
    pub id: TaskId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub project_id: ProjectId,
    #[serde(default)]
    pub project_name: Option<String>,
    #[serde(default)]
    pub assignee_id: Option<UserId>,
    #[serde(default)]
    pub assignee_name: Option<String>,
    pub status_id: StatusId,
    #[serde(default)]
    pub status_name: Option<String>,
    #[serde(default)]
    pub status_color: Option<String>,
    #[serde(default)]
    pub parent_id: Option<TaskId>,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub progress: Option<u8>,
    #[serde(default)]
    pub priority: Option<Priority>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub wbs_code: String,
    #[serde(default)]
    pub tags: Vec<Tag>,
    #[serde(default)]
    pub dependencies: Vec<TaskId>,
    #[serde(default)]
    pub custom_fields: Map<String, Value>,
    #[serde(default)]
    pub observation: Option<String>,
}

impl TaskRecord {
    /// Progress with absence treated as zero, the convention every
    /// aggregation in this crate uses.
    pub fn progress_or_zero(&self) -> u8 {
        self.progress.unwrap_or(0)
    }
}

/// A task with its nested subtasks, derived from the flat collection.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskNode {
    #[serde(flatten)]
    pub task: TaskRecord,
    pub subtasks: Vec<TaskNode>,
}

/// Three-state field update: leave alone, clear to null, or set a value.
///
/// Distinguishes "not provided" from "explicitly unset", which an
/// `Option<Option<T>>` would bury.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Patch<T> {
    #[default]
    Keep,
    Clear,
    Set(T),
}

impl<T> Patch<T> {
    pub fn is_keep(&self) -> bool {
        matches!(self, Patch::Keep)
    }

    /// Apply this patch to an optional slot.
    pub fn apply_to(&self, slot: &mut Option<T>)
    where
        T: Clone,
    {
        match self {
            Patch::Keep => {}
            Patch::Clear => *slot = None,
            Patch::Set(value) => *slot = Some(value.clone()),
        }
    }
}

/// Partial update for a task.
///
/// Required fields use `Option` (provided or not); nullable fields use
/// [`Patch`] so callers can clear them. The remote write carries the full
/// field set, tag associations included, in a single call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskPatch {
    pub name: Option<String>,
    pub description: Patch<String>,
    pub assignee_id: Patch<UserId>,
    pub status_id: Option<StatusId>,
    pub priority: Patch<Priority>,
    pub progress: Option<u8>,
    pub start_date: Patch<NaiveDate>,
    pub end_date: Patch<NaiveDate>,
    pub parent_id: Patch<TaskId>,
    pub dependencies: Option<Vec<TaskId>>,
    pub custom_fields: Option<Map<String, Value>>,
    /// Replaces the task's tag associations wholesale when provided.
    pub tag_ids: Option<Vec<TagId>>,
    pub observation: Patch<String>,
}

impl TaskPatch {
    /// Patch that changes only the status, as a kanban drag produces.
    pub fn status(status_id: StatusId) -> Self {
        TaskPatch {
            status_id: Some(status_id),
            ..TaskPatch::default()
        }
    }

    /// Shallow-merge the provided fields into a task record.
    ///
    /// Tag associations only round-trip through the backend: `tags` and the
    /// other denormalised display fields are left for the next fetch.
    pub fn apply_to(&self, task: &mut TaskRecord) {
        if let Some(name) = &self.name {
            task.name = name.clone();
        }
        self.description.apply_to(&mut task.description);
        self.assignee_id.apply_to(&mut task.assignee_id);
        if let Some(status_id) = &self.status_id {
            task.status_id = status_id.clone();
        }
        self.priority.apply_to(&mut task.priority);
        if let Some(progress) = self.progress {
            task.progress = Some(progress);
        }
        self.start_date.apply_to(&mut task.start_date);
        self.end_date.apply_to(&mut task.end_date);
        self.parent_id.apply_to(&mut task.parent_id);
        if let Some(dependencies) = &self.dependencies {
            task.dependencies = dependencies.clone();
        }
        if let Some(custom_fields) = &self.custom_fields {
            task.custom_fields = custom_fields.clone();
        }
        self.observation.apply_to(&mut task.observation);
    }
}

/// Full field set for creating a task.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskDraft {
    pub project_id: ProjectId,
    pub name: String,
    pub description: Option<String>,
    pub assignee_id: Option<UserId>,
    pub status_id: StatusId,
    pub priority: Option<Priority>,
    pub progress: Option<u8>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub parent_id: Option<TaskId>,
    pub dependencies: Vec<TaskId>,
    pub tag_ids: Vec<TagId>,
    pub custom_fields: Map<String, Value>,
}
