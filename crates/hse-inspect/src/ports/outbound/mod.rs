//! Outbound ports (Store traits)
//!
//! Hexagonal architecture: these are the interfaces that infrastructure must implement.
//! Every call is an independent async operation returning a consistent snapshot.
//! Writes are last-write-wins per id.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::aggregates::{
    Assignment, Inspection, InspectionStatus, Template, TemplateFilter,
};
use crate::domain::events::DomainEvent;
use crate::domain::services::{Caller, Role};
use crate::domain::value_objects::{AssignmentId, InspectionId, TemplateId, UserId};

pub type StoreResult<T> = Result<T, StoreError>;

/// Template store port
#[async_trait]
pub trait TemplateStore: Send + Sync {
    /// List templates matching the filter
    async fn list(&self, filter: &TemplateFilter) -> StoreResult<Vec<Template>>;

    /// Find template by ID
    async fn get(&self, id: &TemplateId) -> StoreResult<Option<Template>>;

    /// Insert or replace
    async fn upsert(&self, template: Template) -> StoreResult<Template>;

    async fn delete(&self, id: &TemplateId) -> StoreResult<()>;
}

/// Inspection store port
#[async_trait]
pub trait InspectionStore: Send + Sync {
    async fn get(&self, id: &InspectionId) -> StoreResult<Option<Inspection>>;

    /// Insert or replace
    async fn upsert(&self, inspection: Inspection) -> StoreResult<Inspection>;

    async fn list_by_status(&self, status: InspectionStatus) -> StoreResult<Vec<Inspection>>;

    async fn delete(&self, id: &InspectionId) -> StoreResult<()>;
}

/// Assignment store port
#[async_trait]
pub trait AssignmentStore: Send + Sync {
    async fn get(&self, id: &AssignmentId) -> StoreResult<Option<Assignment>>;

    /// Insert or replace
    async fn upsert(&self, assignment: Assignment) -> StoreResult<Assignment>;

    /// Assignments handed to an inspector
    async fn list_by_assignee(&self, user_id: &UserId) -> StoreResult<Vec<Assignment>>;

    /// Assignments created by a manager or admin
    async fn list_by_assigner(&self, user_id: &UserId) -> StoreResult<Vec<Assignment>>;

    async fn list_all(&self) -> StoreResult<Vec<Assignment>>;

    /// Assignment bound to an inspection, if any
    async fn find_by_inspection(
        &self,
        inspection_id: &InspectionId,
    ) -> StoreResult<Option<Assignment>>;

    async fn delete(&self, id: &AssignmentId) -> StoreResult<()>;
}

/// Directory entry for a user
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub role: Role,
    pub display_name: String,
}

impl User {
    pub fn new(id: impl Into<String>, role: Role, display_name: impl Into<String>) -> Self {
        Self { id: UserId::from_string(id), role, display_name: display_name.into() }
    }

    pub fn caller(&self) -> Caller {
        Caller { id: self.id.clone(), role: self.role, display_name: self.display_name.clone() }
    }
}

/// Authentication collaborator
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// The signed-in user
    async fn current_user(&self) -> StoreResult<User>;

    async fn get(&self, id: &UserId) -> StoreResult<Option<User>>;

    /// Users holding a role, e.g. to populate available inspectors
    async fn list_by_role(&self, role: Role) -> StoreResult<Vec<User>>;

    /// Insert or replace
    async fn upsert(&self, user: User) -> StoreResult<User>;
}

/// Event publisher port
#[async_trait]
pub trait EventPublisher: Send + Sync {
    /// Publish domain events
    async fn publish(&self, events: Vec<DomainEvent>) -> StoreResult<()>;
}

/// Collaborator failure; the cause is preserved
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("record not found: {0}")]
    NotFound(String),

    #[error("write conflict: {0}")]
    Conflict(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}
