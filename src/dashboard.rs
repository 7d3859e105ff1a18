//! Dashboard aggregation over the loaded project and task collections.
//!
//! Pure functions only: the dashboard derives everything client-side from
//! whatever the stores currently hold, so these take slices and a reference
//! date and never touch the data source. Completion is keyed by a
//! caller-supplied "done" status id because statuses are user-editable rows,
//! not a closed enum.

use chrono::NaiveDate;

use crate::project::ProjectRecord;
use crate::task::{StatusId, TaskRecord};

/// KPI block for a single project.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectKpis {
    pub total_tasks: usize,
    pub completed_tasks: usize,
    /// Mean task progress, 0-100. Missing progress counts as zero.
    pub mean_progress: f64,
    pub tasks_at_risk: usize,
    pub budget: f64,
    pub spent: f64,
}

/// KPI block for the consolidated (all projects) view.
#[derive(Debug, Clone, PartialEq)]
pub struct ConsolidatedKpis {
    pub total_projects: usize,
    pub total_budget: f64,
    /// Mean of the per-project mean progress; projects without tasks count
    /// as zero.
    pub overall_progress: f64,
    pub total_tasks: usize,
    pub completed_tasks: usize,
    pub tasks_at_risk: usize,
}

/// A task is at risk when it is not done and its end date has passed.
/// Tasks without an end date are never at risk.
pub fn is_at_risk(task: &TaskRecord, done_status: &StatusId, today: NaiveDate) -> bool {
    &task.status_id != done_status && task.end_date.map_or(false, |end| end < today)
}

fn mean_progress(tasks: &[&TaskRecord]) -> f64 {
    if tasks.is_empty() {
        return 0.0;
    }
    let sum: u32 = tasks.iter().map(|t| u32::from(t.progress_or_zero())).sum();
    f64::from(sum) / tasks.len() as f64
}

/// Compute the KPI block for one project from the loaded task collection.
pub fn project_kpis(
    project: &ProjectRecord,
    tasks: &[TaskRecord],
    done_status: &StatusId,
    today: NaiveDate,
) -> ProjectKpis {
    let project_tasks: Vec<&TaskRecord> =
        tasks.iter().filter(|t| t.project_id == project.id).collect();
    let completed = project_tasks
        .iter()
        .filter(|t| &t.status_id == done_status)
        .count();
    let at_risk = project_tasks
        .iter()
        .filter(|t| is_at_risk(t, done_status, today))
        .count();

    ProjectKpis {
        total_tasks: project_tasks.len(),
        completed_tasks: completed,
        mean_progress: mean_progress(&project_tasks),
        tasks_at_risk: at_risk,
        budget: project.budget.unwrap_or(0.0),
        spent: project.spent.unwrap_or(0.0),
    }
}

/// Compute the consolidated KPI block across all projects.
pub fn consolidated_kpis(
    projects: &[ProjectRecord],
    tasks: &[TaskRecord],
    done_status: &StatusId,
    today: NaiveDate,
) -> ConsolidatedKpis {
    let overall_progress = if projects.is_empty() {
        0.0
    } else {
        let per_project: f64 = projects
            .iter()
            .map(|p| {
                let project_tasks: Vec<&TaskRecord> =
                    tasks.iter().filter(|t| t.project_id == p.id).collect();
                mean_progress(&project_tasks)
            })
            .sum();
        per_project / projects.len() as f64
    };

    ConsolidatedKpis {
        total_projects: projects.len(),
        total_budget: projects.iter().filter_map(|p| p.budget).sum(),
        overall_progress,
        total_tasks: tasks.len(),
        completed_tasks: tasks.iter().filter(|t| &t.status_id == done_status).count(),
        tasks_at_risk: tasks
            .iter()
            .filter(|t| is_at_risk(t, done_status, today))
            .count(),
    }
}

/// Most recently created tasks first, capped at `limit`.
pub fn recent_tasks(tasks: &[TaskRecord], limit: usize) -> Vec<&TaskRecord> {
    let mut sorted: Vec<&TaskRecord> = tasks.iter().collect();
    sorted.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    sorted.truncate(limit);
    sorted
}
