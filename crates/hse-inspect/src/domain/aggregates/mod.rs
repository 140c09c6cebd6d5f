//! Aggregates module
//!
//! Aggregate roots for the inspection bounded context.

pub mod assignment;
pub mod inspection;
pub mod template;

pub use assignment::{Assignment, AssignmentError, AssignmentStatus, AssignmentTerms, DisplayStatus};
pub use inspection::{
    Findings, Inspection, InspectionError, InspectionOverrides, InspectionProgress,
    InspectionSource, InspectionStatus, SectionProgress,
};
pub use template::{Template, TemplateDraft, TemplateError, TemplateFilter, TemplateStatus};
