//! # taskdeck - task hierarchy and optimistic mutation core
//!
//! State layer for a project-management app whose data lives in a hosted
//! relational backend. The backend is reached through injected async source
//! traits; this crate owns everything between the wire and the views:
//!
//! - **Hierarchy**: a flat `parent_id`-linked task list nested into a forest
//!   ([`tree::nest_tasks`]) and filtered with ancestor chains preserved
//!   ([`tree::filter_forest`]) for the table, Gantt and WBS views.
//! - **Optimistic mutations**: [`store::TaskStore`] publishes tentative
//!   state synchronously, issues the remote write, and rolls back to its
//!   call-time snapshot on failure. Overlapping mutations are an accepted
//!   last-writer-wins race, documented on the store.
//! - **Selection**: [`selection::SelectionSet`] batches tasks for bulk
//!   re-parenting; cleared only after the batch commits.
//! - **Projects and settings**: remote-first CRUD for the project list,
//!   task statuses and tags, plus local table-column configuration.
//! - **Dashboard**: pure KPI aggregation over the loaded collections.
//!
//! Views subscribe to `tokio::sync::watch` state and drain a notification
//! channel; every remote failure is caught at the mutation boundary, rolled
//! back, and surfaced with the backend's message verbatim.

pub mod dashboard;
pub mod fields;
pub mod notify;
pub mod project;
pub mod selection;
pub mod settings;
pub mod source;
pub mod store;
pub mod task;
pub mod tree;

pub use fields::{ColumnKind, Priority};
pub use notify::{Notification, Notifier, Severity};
pub use project::{ProjectDraft, ProjectRecord, ProjectStore};
pub use selection::SelectionSet;
pub use settings::{Column, SettingsStore, StatusDraft, TaskStatus};
pub use source::{ProjectSource, Scope, SettingsSource, SourceError, TaskSource};
pub use store::{TaskStore, TasksState};
pub use task::{
    Patch, ProjectId, StatusId, Tag, TagId, TaskDraft, TaskId, TaskNode, TaskPatch, TaskRecord,
    UserId,
};
pub use tree::{filter_flat, filter_forest, flatten, nest_tasks, TaskFilter};
