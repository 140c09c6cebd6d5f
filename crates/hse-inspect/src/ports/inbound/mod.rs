//! Inbound ports (Use case traits)
//!
//! Hexagonal architecture: application service interfaces. Every operation
//! takes the acting [`Caller`] explicitly.

use async_trait::async_trait;
use serde_json::Value;

use crate::application::dto::*;
use crate::domain::aggregates::{
    Findings, Inspection, InspectionStatus, Template, TemplateDraft, TemplateFilter,
};
use crate::domain::services::{Caller, SubmitBlock};
use crate::domain::value_objects::{AssignmentId, InspectionId, TemplateId, UserId};
use crate::error::HseResult;

/// Template authoring use cases
#[async_trait]
pub trait TemplateUseCases: Send + Sync {
    async fn create_template(&self, caller: &Caller, draft: TemplateDraft) -> HseResult<Template>;

    /// Full replace of an existing template
    async fn update_template(
        &self,
        caller: &Caller,
        id: &TemplateId,
        draft: TemplateDraft,
    ) -> HseResult<Template>;

    async fn delete_template(&self, caller: &Caller, id: &TemplateId) -> HseResult<()>;

    async fn get_template(&self, caller: &Caller, id: &TemplateId) -> HseResult<Option<Template>>;

    async fn list_templates(
        &self,
        caller: &Caller,
        filter: &TemplateFilter,
    ) -> HseResult<Vec<Template>>;

    /// Create a template from an imported document, reporting how many
    /// malformed fields were dropped while reading it
    async fn import_template(
        &self,
        caller: &Caller,
        draft: TemplateDraft,
    ) -> HseResult<ImportReport>;

    /// Seed prebuilt templates, skipping titles already seeded
    async fn seed_prebuilt(&self, defaults: Vec<TemplateDraft>) -> HseResult<SeedReport>;
}

/// Inspection lifecycle use cases
#[async_trait]
pub trait InspectionUseCases: Send + Sync {
    async fn materialize(
        &self,
        caller: &Caller,
        command: MaterializeCommand,
    ) -> HseResult<Inspection>;

    async fn get_inspection(
        &self,
        caller: &Caller,
        id: &InspectionId,
    ) -> HseResult<Option<Inspection>>;

    async fn list_inspections(
        &self,
        caller: &Caller,
        status: InspectionStatus,
    ) -> HseResult<Vec<Inspection>>;

    /// Upsert one answer; no-op on a completed inspection
    async fn record_response(
        &self,
        caller: &Caller,
        id: &InspectionId,
        field_id: &str,
        value: Value,
    ) -> HseResult<Inspection>;

    async fn begin_work(&self, caller: &Caller, id: &InspectionId) -> HseResult<Inspection>;

    /// `None` when the inspection can be submitted
    async fn validate_for_submit(
        &self,
        caller: &Caller,
        id: &InspectionId,
    ) -> HseResult<Option<SubmitBlock>>;

    /// Complete the inspection, then best-effort complete its assignment
    async fn complete(
        &self,
        caller: &Caller,
        id: &InspectionId,
        findings: Option<Findings>,
    ) -> HseResult<CompletionReport>;

    /// Persist a pending inspection once its first section is filled in
    async fn save_draft(&self, caller: &Caller, inspection: Inspection) -> HseResult<Inspection>;

    async fn attach_photo(
        &self,
        caller: &Caller,
        id: &InspectionId,
        uri: &str,
    ) -> HseResult<Inspection>;
}

/// Assignment workflow use cases
#[async_trait]
pub trait AssignmentUseCases: Send + Sync {
    async fn create_assignment(
        &self,
        caller: &Caller,
        command: CreateAssignmentCommand,
    ) -> HseResult<AssignmentCreated>;

    /// Start work; also moves the bound inspection to in-progress
    async fn start_assignment(
        &self,
        caller: &Caller,
        id: &AssignmentId,
    ) -> HseResult<AssignmentView>;

    /// Delete the assignment row; the inspection is kept
    async fn remove_assignment(&self, caller: &Caller, id: &AssignmentId) -> HseResult<()>;

    async fn get_assignment(
        &self,
        caller: &Caller,
        id: &AssignmentId,
    ) -> HseResult<Option<AssignmentView>>;

    async fn list_for_inspector(
        &self,
        caller: &Caller,
        inspector: &UserId,
    ) -> HseResult<Vec<AssignmentView>>;

    async fn list_for_manager(
        &self,
        caller: &Caller,
        manager: &UserId,
    ) -> HseResult<Vec<AssignmentView>>;

    async fn list_all(&self, caller: &Caller) -> HseResult<Vec<AssignmentView>>;
}
