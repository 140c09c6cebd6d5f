//! Domain Events
//!
//! Events raised by aggregates to communicate state changes.

use chrono::{DateTime, Utc};

use crate::domain::value_objects::{AssignmentId, InspectionId, TemplateId, UserId};

/// All domain events in the inspection bounded context
#[derive(Clone, Debug, PartialEq)]
pub enum DomainEvent {
    Template(TemplateEvent),
    Inspection(InspectionEvent),
    Assignment(AssignmentEvent),
}

#[derive(Clone, Debug, PartialEq)]
pub enum TemplateEvent {
    Created {
        template_id: TemplateId,
        title: String,
        created_by: UserId,
        prebuilt: bool,
    },
    Updated {
        template_id: TemplateId,
        updated_at: DateTime<Utc>,
    },
    Deleted {
        template_id: TemplateId,
    },
}

#[derive(Clone, Debug, PartialEq)]
pub enum InspectionEvent {
    Materialized {
        inspection_id: InspectionId,
        template_id: Option<TemplateId>,
        field_count: usize,
    },
    Started {
        inspection_id: InspectionId,
        started_at: DateTime<Utc>,
    },
    ResponseRecorded {
        inspection_id: InspectionId,
        field_id: String,
    },
    Completed {
        inspection_id: InspectionId,
        completed_at: DateTime<Utc>,
    },
}

#[derive(Clone, Debug, PartialEq)]
pub enum AssignmentEvent {
    Created {
        assignment_id: AssignmentId,
        inspection_id: InspectionId,
        assigned_to: UserId,
        assigned_by: UserId,
    },
    Started {
        assignment_id: AssignmentId,
    },
    Completed {
        assignment_id: AssignmentId,
    },
    Removed {
        assignment_id: AssignmentId,
    },
}

impl DomainEvent {
    /// Id of the aggregate this event belongs to
    pub fn aggregate_id(&self) -> &str {
        match self {
            DomainEvent::Template(e) => match e {
                TemplateEvent::Created { template_id, .. }
                | TemplateEvent::Updated { template_id, .. }
                | TemplateEvent::Deleted { template_id } => template_id.as_str(),
            },
            DomainEvent::Inspection(e) => match e {
                InspectionEvent::Materialized { inspection_id, .. }
                | InspectionEvent::Started { inspection_id, .. }
                | InspectionEvent::ResponseRecorded { inspection_id, .. }
                | InspectionEvent::Completed { inspection_id, .. } => inspection_id.as_str(),
            },
            DomainEvent::Assignment(e) => match e {
                AssignmentEvent::Created { assignment_id, .. }
                | AssignmentEvent::Started { assignment_id }
                | AssignmentEvent::Completed { assignment_id }
                | AssignmentEvent::Removed { assignment_id } => assignment_id.as_str(),
            },
        }
    }

    pub fn event_type(&self) -> &'static str {
        match self {
            DomainEvent::Template(e) => match e {
                TemplateEvent::Created { .. } => "template.created",
                TemplateEvent::Updated { .. } => "template.updated",
                TemplateEvent::Deleted { .. } => "template.deleted",
            },
            DomainEvent::Inspection(e) => match e {
                InspectionEvent::Materialized { .. } => "inspection.materialized",
                InspectionEvent::Started { .. } => "inspection.started",
                InspectionEvent::ResponseRecorded { .. } => "inspection.response_recorded",
                InspectionEvent::Completed { .. } => "inspection.completed",
            },
            DomainEvent::Assignment(e) => match e {
                AssignmentEvent::Created { .. } => "assignment.created",
                AssignmentEvent::Started { .. } => "assignment.started",
                AssignmentEvent::Completed { .. } => "assignment.completed",
                AssignmentEvent::Removed { .. } => "assignment.removed",
            },
        }
    }
}
