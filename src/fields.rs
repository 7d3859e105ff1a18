//! Enumerations and field types shared across the task and settings models.
//!
//! These are the closed vocabularies of the data model. Statuses and tags are
//! deliberately *not* here: the backend owns those as user-editable rows, so
//! they travel as opaque identifiers plus display metadata.

use serde::{Deserialize, Serialize};

/// Priority ladder used by the table, kanban and Gantt views.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "kebab-case")]
pub enum Priority {
    Low,
    Medium,
    High,
    Urgent,
}

/// Value kind of a table column, driving how a cell is rendered and edited.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ColumnKind {
    Text,
    Number,
    Date,
    Progress,
}

/// Format a priority for display.
pub fn format_priority(p: Option<Priority>) -> &'static str {
    match p {
        Some(Priority::Low) => "Low",
        Some(Priority::Medium) => "Medium",
        Some(Priority::High) => "High",
        Some(Priority::Urgent) => "Urgent",
        None => "-",
    }
}
