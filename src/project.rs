//! Project list state and CRUD against the data source.
//!
//! Unlike the task store, project mutations are not optimistic: the original
//! flow is write-then-refetch, and the list is small enough that a round
//! trip after every change is cheaper than rollback bookkeeping.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::debug;

use crate::notify::Notifier;
use crate::source::ProjectSource;
use crate::task::{ProjectId, UserId};

/// A project row as received from the data source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectRecord {
    pub id: ProjectId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub owner_id: UserId,
    #[serde(default)]
    pub budget: Option<f64>,
    #[serde(default)]
    pub spent: Option<f64>,
    pub created_at: DateTime<Utc>,
}

/// Field set for creating or updating a project.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProjectDraft {
    pub name: String,
    pub description: Option<String>,
    pub owner_id: UserId,
    pub budget: Option<f64>,
    pub spent: Option<f64>,
}

/// Snapshot published to subscribers.
#[derive(Debug, Clone)]
pub struct ProjectsState {
    pub projects: Vec<ProjectRecord>,
    pub loading: bool,
}

/// Project list with remote-first mutations.
pub struct ProjectStore {
    source: Arc<dyn ProjectSource>,
    notifier: Notifier,
    state: watch::Sender<ProjectsState>,
}

impl ProjectStore {
    pub fn new(source: Arc<dyn ProjectSource>, notifier: Notifier) -> Self {
        let (state, _) = watch::channel(ProjectsState {
            projects: Vec::new(),
            loading: true,
        });
        ProjectStore {
            source,
            notifier,
            state,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<ProjectsState> {
        self.state.subscribe()
    }

    pub fn projects(&self) -> Vec<ProjectRecord> {
        self.state.borrow().projects.clone()
    }

    pub fn loading(&self) -> bool {
        self.state.borrow().loading
    }

    pub fn find(&self, id: &ProjectId) -> Option<ProjectRecord> {
        self.state.borrow().projects.iter().find(|p| &p.id == id).cloned()
    }

    pub async fn refetch(&self) {
        self.state.send_modify(|s| s.loading = true);
        match self.source.fetch_projects().await {
            Ok(projects) => {
                debug!(count = projects.len(), "loaded projects");
                self.state.send_modify(|s| {
                    s.projects = projects;
                    s.loading = false;
                });
            }
            Err(err) => {
                self.notifier.error("Failed to load projects", &err);
                self.state.send_modify(|s| s.loading = false);
            }
        }
    }

    pub async fn add_project(&self, draft: ProjectDraft) -> bool {
        match self.source.insert_project(&draft).await {
            Ok(()) => {
                self.notifier.info("Project added");
                self.refetch().await;
                true
            }
            Err(err) => {
                self.notifier.error("Failed to add project", &err);
                false
            }
        }
    }

    pub async fn update_project(&self, id: &ProjectId, draft: ProjectDraft) -> bool {
        match self.source.update_project(id, &draft).await {
            Ok(()) => {
                self.notifier.info("Project updated");
                self.refetch().await;
                true
            }
            Err(err) => {
                self.notifier.error("Failed to update project", &err);
                false
            }
        }
    }

    pub async fn delete_project(&self, id: &ProjectId) -> bool {
        match self.source.delete_project(id).await {
            Ok(()) => {
                self.notifier.info("Project deleted");
                self.refetch().await;
                true
            }
            Err(err) => {
                self.notifier.error("Failed to delete project", &err);
                false
            }
        }
    }
}
