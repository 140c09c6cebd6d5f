//! HSE Inspections Core
//!
//! Inspection template authoring, inspection lifecycle and assignment workflow
//! for Health/Safety/Environment inspection programmes.
//!
//! ## Architecture
//!
//! - **Domain Layer**: Template, Inspection and Assignment aggregates, field
//!   validation, role policy, domain events
//! - **Application Layer**: Use case orchestration around the stores
//! - **Ports Layer**: Store and directory interfaces (hexagonal architecture)
//! - **Infrastructure Layer**: In-memory and JSON file stores, event publishers
//!
//! ## Lifecycles
//!
//! ```text
//! Inspection:  pending ──► in-progress ──► completed
//! Assignment:  assigned ──► in_progress ──► completed      (overdue is derived)
//! ```
//!
//! Aggregates are synchronous state machines operating on owned snapshots.
//! The only suspension points are the store calls made by the application
//! services.

pub mod application;
pub mod config;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod ports;

// Re-exports for convenience
pub use application::{AssignmentService, InspectionService, TemplateService};
pub use config::HseConfig;
pub use domain::aggregates::{
    Assignment, AssignmentStatus, Inspection, InspectionStatus, Template, TemplateStatus,
};
pub use domain::events::{AssignmentEvent, DomainEvent, InspectionEvent, TemplateEvent};
pub use domain::services::{Caller, Capability, Role, RolePolicy};
pub use domain::value_objects::{
    AssignmentId, Field, FieldKind, InspectionId, Section, SectionId, TemplateId, UserId,
};
pub use error::{HseError, HseResult};
pub use ports::inbound::{AssignmentUseCases, InspectionUseCases, TemplateUseCases};
pub use ports::outbound::{
    AssignmentStore, EventPublisher, InspectionStore, StoreError, TemplateStore, UserDirectory,
};
