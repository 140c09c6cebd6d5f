//! Data Transfer Objects (DTOs)
//!
//! Commands going into the application services and read views coming out.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::aggregates::{
    Assignment, AssignmentTerms, DisplayStatus, Inspection, InspectionOverrides, Template,
};
use crate::domain::value_objects::{AssignmentId, InspectionId, Section, TemplateId, UserId};

// =============================================================================
// Inspection Commands
// =============================================================================

/// Source for a new inspection
#[derive(Clone, Debug)]
pub enum MaterializeFrom {
    Template(TemplateId),
    /// Ad-hoc inspection with embedded sections
    Sections(Vec<Section>),
}

#[derive(Clone, Debug)]
pub struct MaterializeCommand {
    pub source: MaterializeFrom,
    pub overrides: InspectionOverrides,
}

// =============================================================================
// Assignment Commands
// =============================================================================

/// What is being assigned
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AssignmentTarget {
    /// Materialized into a fresh inspection first
    Template(TemplateId),
    Inspection(InspectionId),
}

#[derive(Clone, Debug)]
pub struct CreateAssignmentCommand {
    pub target: AssignmentTarget,
    pub assignee: UserId,
    pub terms: AssignmentTerms,
}

// =============================================================================
// Views & Reports
// =============================================================================

/// Assignment with its read-time status
#[derive(Clone, Debug, Serialize)]
pub struct AssignmentView {
    #[serde(flatten)]
    pub assignment: Assignment,
    pub display_status: DisplayStatus,
    pub overdue: bool,
}

impl AssignmentView {
    pub fn at(assignment: Assignment, now: DateTime<Utc>) -> Self {
        Self {
            display_status: assignment.display_status_at(now),
            overdue: assignment.is_overdue_at(now),
            assignment,
        }
    }

    pub fn now(assignment: Assignment) -> Self {
        Self::at(assignment, Utc::now())
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct AssignmentCreated {
    pub assignment: AssignmentView,
    pub inspection: Inspection,
}

/// Outcome of the best-effort assignment update after completion
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "result", content = "detail", rename_all = "snake_case")]
pub enum AssignmentSync {
    Updated(AssignmentId),
    AlreadyCompleted(AssignmentId),
    NotLinked,
    Failed(String),
}

#[derive(Clone, Debug, Serialize)]
pub struct CompletionReport {
    pub inspection: Inspection,
    pub assignment: AssignmentSync,
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct SeedReport {
    pub seeded: Vec<TemplateId>,
    /// Titles already present as prebuilt
    pub skipped: Vec<String>,
}

#[derive(Clone, Debug, Serialize)]
pub struct ImportReport {
    pub template: Template,
    pub dropped_fields: usize,
}
