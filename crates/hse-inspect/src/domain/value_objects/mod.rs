//! Value Objects module
//!
//! Identifiers, the field/section schema and recorded responses.

pub mod field;
pub mod ids;
pub mod priority;
pub mod response;
pub mod section;

pub use field::{Field, FieldKind, FieldValidation, MalformedField, RawField};
pub use ids::{AssignmentId, InspectionId, TemplateId, UserId};
pub use priority::{AssignmentPriority, InspectionPriority};
pub use response::Response;
pub use section::{RawSection, SanitizedSection, Section, SectionId};
