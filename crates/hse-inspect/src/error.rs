//! Error types for the inspection core

use std::fmt;

use thiserror::Error;

use crate::domain::aggregates::{AssignmentError, InspectionError, TemplateError};
use crate::domain::services::{Capability, Role, SubmitBlock};
use crate::ports::outbound::StoreError;

/// Kind of record a lookup failed on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Template,
    Inspection,
    Assignment,
    User,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Template => "template",
            Self::Inspection => "inspection",
            Self::Assignment => "assignment",
            Self::User => "user",
        };
        f.write_str(name)
    }
}

/// Error returned by every application use case
#[derive(Debug, Error)]
pub enum HseError {
    /// Submission attempted with an incomplete or invalid field
    #[error("validation failed: {0}")]
    Validation(SubmitBlock),

    /// Capability check failed for the caller's role
    #[error("permission denied: {role} may not {capability}")]
    PermissionDenied { role: Role, capability: Capability },

    /// Referenced record has no backing entry
    #[error("{entity} not found: {id}")]
    NotFound { entity: EntityKind, id: String },

    /// Prebuilt mutation or forward-only transition violation
    #[error("conflict: {0}")]
    Conflict(String),

    /// Collaborator I/O failure
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

impl HseError {
    pub fn not_found(entity: EntityKind, id: impl ToString) -> Self {
        Self::NotFound { entity, id: id.to_string() }
    }

    pub fn is_permission_denied(&self) -> bool {
        matches!(self, Self::PermissionDenied { .. })
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict(_))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

impl From<TemplateError> for HseError {
    fn from(err: TemplateError) -> Self {
        Self::Conflict(err.to_string())
    }
}

impl From<InspectionError> for HseError {
    fn from(err: InspectionError) -> Self {
        match err {
            InspectionError::Incomplete(block) => Self::Validation(block),
            other => Self::Conflict(other.to_string()),
        }
    }
}

impl From<AssignmentError> for HseError {
    fn from(err: AssignmentError) -> Self {
        Self::Conflict(err.to_string())
    }
}

/// Result type for use cases
pub type HseResult<T> = Result<T, HseError>;
