//! Assignment Aggregate
//!
//! Binds one inspection to one inspector. Persisted status is only ever
//! `assigned`, `in_progress` or `completed`; `overdue` is computed at read
//! time and never stored.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::domain::events::{AssignmentEvent, DomainEvent};
use crate::domain::value_objects::{AssignmentId, AssignmentPriority, InspectionId, UserId};

/// Assignment aggregate root
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Assignment {
    id: AssignmentId,
    inspection_id: InspectionId,
    assigned_to: UserId,
    assigned_by: UserId,
    assigned_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    due_date: Option<DateTime<Utc>>,
    #[serde(default)]
    priority: AssignmentPriority,
    #[serde(default)]
    status: AssignmentStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    notes: Option<String>,
    #[serde(skip)]
    events: Vec<DomainEvent>,
}

/// Persisted assignment status
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssignmentStatus {
    #[default]
    Assigned,
    InProgress,
    Completed,
}

impl fmt::Display for AssignmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Assigned => "assigned",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
        })
    }
}

/// Status as shown to users, including the derived `overdue` state
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisplayStatus {
    Assigned,
    InProgress,
    Completed,
    Overdue,
}

impl fmt::Display for DisplayStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Assigned => "assigned",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Overdue => "overdue",
        })
    }
}

impl From<AssignmentStatus> for DisplayStatus {
    fn from(status: AssignmentStatus) -> Self {
        match status {
            AssignmentStatus::Assigned => Self::Assigned,
            AssignmentStatus::InProgress => Self::InProgress,
            AssignmentStatus::Completed => Self::Completed,
        }
    }
}

/// Optional terms attached when an assignment is created
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AssignmentTerms {
    pub priority: AssignmentPriority,
    pub due_date: Option<DateTime<Utc>>,
    pub notes: Option<String>,
}

impl Assignment {
    pub fn create(
        inspection_id: InspectionId,
        assigned_to: UserId,
        assigned_by: UserId,
        terms: AssignmentTerms,
    ) -> Self {
        let id = AssignmentId::new();
        let mut assignment = Self {
            id: id.clone(),
            inspection_id: inspection_id.clone(),
            assigned_to: assigned_to.clone(),
            assigned_by: assigned_by.clone(),
            assigned_at: Utc::now(),
            due_date: terms.due_date,
            priority: terms.priority,
            status: AssignmentStatus::Assigned,
            notes: terms.notes,
            events: vec![],
        };

        assignment.raise_event(DomainEvent::Assignment(AssignmentEvent::Created {
            assignment_id: id,
            inspection_id,
            assigned_to,
            assigned_by,
        }));
        assignment
    }

    // Getters
    pub fn id(&self) -> &AssignmentId { &self.id }
    pub fn inspection_id(&self) -> &InspectionId { &self.inspection_id }
    pub fn assigned_to(&self) -> &UserId { &self.assigned_to }
    pub fn assigned_by(&self) -> &UserId { &self.assigned_by }
    pub fn assigned_at(&self) -> DateTime<Utc> { self.assigned_at }
    pub fn due_date(&self) -> Option<DateTime<Utc>> { self.due_date }
    pub fn priority(&self) -> AssignmentPriority { self.priority }
    pub fn status(&self) -> AssignmentStatus { self.status }
    pub fn notes(&self) -> Option<&str> { self.notes.as_deref() }

    /// `assigned` → `in_progress`. Returns `Ok(false)` if already started.
    pub fn start(&mut self) -> Result<bool, AssignmentError> {
        match self.status {
            AssignmentStatus::Assigned => {
                self.status = AssignmentStatus::InProgress;
                self.raise_event(DomainEvent::Assignment(AssignmentEvent::Started {
                    assignment_id: self.id.clone(),
                }));
                Ok(true)
            }
            AssignmentStatus::InProgress => Ok(false),
            AssignmentStatus::Completed => Err(AssignmentError::AlreadyCompleted(self.id.clone())),
        }
    }

    /// Mirror the bound inspection's completion. Returns `false` if the
    /// assignment was already completed.
    pub fn complete(&mut self) -> bool {
        if self.status == AssignmentStatus::Completed {
            return false;
        }
        self.status = AssignmentStatus::Completed;
        self.raise_event(DomainEvent::Assignment(AssignmentEvent::Completed {
            assignment_id: self.id.clone(),
        }));
        true
    }

    /// Record removal; the caller deletes the row.
    pub fn mark_removed(&mut self) {
        self.raise_event(DomainEvent::Assignment(AssignmentEvent::Removed {
            assignment_id: self.id.clone(),
        }));
    }

    pub fn is_overdue_at(&self, now: DateTime<Utc>) -> bool {
        self.status != AssignmentStatus::Completed && self.due_date.is_some_and(|due| due < now)
    }

    pub fn display_status_at(&self, now: DateTime<Utc>) -> DisplayStatus {
        if self.is_overdue_at(now) {
            DisplayStatus::Overdue
        } else {
            self.status.into()
        }
    }

    pub fn take_events(&mut self) -> Vec<DomainEvent> {
        std::mem::take(&mut self.events)
    }

    fn raise_event(&mut self, event: DomainEvent) {
        self.events.push(event);
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssignmentError {
    #[error("assignment {0} is already completed")]
    AlreadyCompleted(AssignmentId),
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn assignment(due_date: Option<DateTime<Utc>>) -> Assignment {
        Assignment::create(
            InspectionId::from_string("insp-1"),
            UserId::from_string("i1"),
            UserId::from_string("m1"),
            AssignmentTerms { due_date, ..Default::default() },
        )
    }

    #[test]
    fn test_create() {
        let mut a = assignment(None);
        assert_eq!(a.status(), AssignmentStatus::Assigned);
        assert_eq!(a.priority(), AssignmentPriority::Medium);
        assert_eq!(a.take_events().len(), 1);
    }

    #[test]
    fn test_start_is_idempotent() {
        let mut a = assignment(None);
        assert_eq!(a.start(), Ok(true));
        assert_eq!(a.start(), Ok(false));
        assert_eq!(a.status(), AssignmentStatus::InProgress);
    }

    #[test]
    fn test_start_after_completion_rejected() {
        let mut a = assignment(None);
        assert!(a.complete());
        assert!(!a.complete());
        assert!(matches!(a.start(), Err(AssignmentError::AlreadyCompleted(_))));
    }

    #[test]
    fn test_overdue_is_derived() {
        let now = Utc::now();
        let mut a = assignment(Some(now - Duration::days(1)));
        a.start().unwrap();

        assert!(a.is_overdue_at(now));
        assert_eq!(a.display_status_at(now), DisplayStatus::Overdue);
        assert_eq!(a.status(), AssignmentStatus::InProgress);

        let json = serde_json::to_value(&a).unwrap();
        assert_eq!(json["status"], "in_progress");
    }

    #[test]
    fn test_completed_never_overdue() {
        let now = Utc::now();
        let mut a = assignment(Some(now - Duration::days(3)));
        a.complete();
        assert!(!a.is_overdue_at(now));
        assert_eq!(a.display_status_at(now), DisplayStatus::Completed);
    }

    #[test]
    fn test_no_due_date_never_overdue() {
        let a = assignment(None);
        assert!(!a.is_overdue_at(Utc::now() + Duration::days(365)));
    }

    #[test]
    fn test_snake_case_document() {
        let a = assignment(None);
        let json = serde_json::to_value(&a).unwrap();
        assert_eq!(json["inspection_id"], "insp-1");
        assert_eq!(json["assigned_to"], "i1");
        assert!(json.get("due_date").is_none());
    }
}
