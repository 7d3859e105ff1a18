//! Remote data-source contracts.
//!
//! The hosted backend sits behind these traits: the stores never build a
//! query or touch a wire format, they call a method and get rows or a typed
//! failure. Implementations own retries, timeouts and auth; none of that
//! leaks into the state layer. All traits are async and injected as explicit
//! dependencies (`Arc<dyn ...>`), never reached through globals.

use async_trait::async_trait;
use thiserror::Error;

use crate::project::{ProjectDraft, ProjectRecord};
use crate::settings::{StatusDraft, TaskStatus};
use crate::task::{
    ProjectId, StatusId, Tag, TagId, TaskDraft, TaskId, TaskPatch, TaskRecord,
};

/// Which tasks a fetch covers: one project, or everything the current user
/// can see.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scope {
    Consolidated,
    Project(ProjectId),
}

/// Failure taxonomy for remote calls.
///
/// Each variant carries the backend's message verbatim; it is surfaced to
/// the user unchanged. No variant is fatal: every failure path rolls local
/// state back to the previous consistent snapshot and the store stays ready
/// for the next operation.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SourceError {
    /// Network or backend failure. Recoverable: roll back and let the user
    /// retry.
    #[error("{0}")]
    Transient(String),
    /// The backend rejected the payload.
    #[error("{0}")]
    Validation(String),
    /// The target row no longer exists remotely. Rollback leaves a local
    /// discrepancy that the next full fetch resolves.
    #[error("{0}")]
    NotFound(String),
}

/// Task rows and task mutations.
#[async_trait]
pub trait TaskSource: Send + Sync {
    /// Fetch every task in scope. Collections are replaced wholesale; there
    /// is no incremental merge.
    async fn fetch_tasks(&self, scope: &Scope) -> Result<Vec<TaskRecord>, SourceError>;

    /// Create a task with the full field set, tag associations included.
    async fn insert_task(&self, draft: &TaskDraft) -> Result<TaskRecord, SourceError>;

    /// Write the merged field set for one task in a single call.
    async fn update_task_fields(&self, id: &TaskId, fields: &TaskPatch)
        -> Result<(), SourceError>;

    /// Batched re-parent: set `parent` on every task in `ids`. `None`
    /// clears the parent link.
    async fn update_task_parent(
        &self,
        ids: &[TaskId],
        parent: Option<&TaskId>,
    ) -> Result<(), SourceError>;

    async fn delete_task(&self, id: &TaskId) -> Result<(), SourceError>;
}

/// Project list CRUD.
#[async_trait]
pub trait ProjectSource: Send + Sync {
    async fn fetch_projects(&self) -> Result<Vec<ProjectRecord>, SourceError>;
    async fn insert_project(&self, draft: &ProjectDraft) -> Result<(), SourceError>;
    async fn update_project(&self, id: &ProjectId, draft: &ProjectDraft)
        -> Result<(), SourceError>;
    async fn delete_project(&self, id: &ProjectId) -> Result<(), SourceError>;
}

/// Workspace-level settings rows: task statuses and tags.
#[async_trait]
pub trait SettingsSource: Send + Sync {
    /// Fetch statuses (ordered by display order) and tags together.
    async fn fetch_settings(&self) -> Result<(Vec<TaskStatus>, Vec<Tag>), SourceError>;
    async fn insert_status(&self, draft: &StatusDraft) -> Result<TaskStatus, SourceError>;
    async fn update_status(&self, id: &StatusId, draft: &StatusDraft)
        -> Result<(), SourceError>;
    async fn delete_status(&self, id: &StatusId) -> Result<(), SourceError>;
    async fn insert_tag(&self, name: &str) -> Result<Tag, SourceError>;
    async fn update_tag(&self, id: &TagId, name: &str) -> Result<(), SourceError>;
    async fn delete_tag(&self, id: &TagId) -> Result<(), SourceError>;
}
