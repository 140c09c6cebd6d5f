//! Inspection application service
//!
//! Completion is two sequential writes: the inspection first, then the bound
//! assignment. The second write is best-effort; its failure is logged and
//! reported but never undoes the completed inspection.

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

use crate::application::dto::{
    AssignmentSync, CompletionReport, MaterializeCommand, MaterializeFrom,
};
use crate::config::MaterializeConfig;
use crate::domain::aggregates::{
    Findings, Inspection, InspectionError, InspectionSource, InspectionStatus,
};
use crate::domain::services::{Caller, Capability, RolePolicy, SubmitBlock};
use crate::domain::value_objects::InspectionId;
use crate::error::{EntityKind, HseError, HseResult};
use crate::ports::inbound::InspectionUseCases;
use crate::ports::outbound::{AssignmentStore, EventPublisher, InspectionStore, TemplateStore};

use super::publish_committed;

/// Inspection application service
pub struct InspectionService {
    templates: Arc<dyn TemplateStore>,
    inspections: Arc<dyn InspectionStore>,
    assignments: Arc<dyn AssignmentStore>,
    event_publisher: Arc<dyn EventPublisher>,
    policy: RolePolicy,
    defaults: MaterializeConfig,
}

impl InspectionService {
    pub fn new(
        templates: Arc<dyn TemplateStore>,
        inspections: Arc<dyn InspectionStore>,
        assignments: Arc<dyn AssignmentStore>,
        event_publisher: Arc<dyn EventPublisher>,
        policy: RolePolicy,
        defaults: MaterializeConfig,
    ) -> Self {
        Self { templates, inspections, assignments, event_publisher, policy, defaults }
    }

    async fn load(&self, id: &InspectionId) -> HseResult<Inspection> {
        self.inspections
            .get(id)
            .await?
            .ok_or_else(|| HseError::not_found(EntityKind::Inspection, id))
    }

    async fn persist(&self, mut inspection: Inspection) -> HseResult<Inspection> {
        let events = inspection.take_events();
        let inspection = self.inspections.upsert(inspection).await?;
        publish_committed(self.event_publisher.as_ref(), events).await;
        Ok(inspection)
    }

    /// Creating inspections is open to anyone who fills or assigns them
    fn require_create(&self, caller: &Caller) -> HseResult<()> {
        if self.policy.allows(caller.role, Capability::FillInspections)
            || self.policy.allows(caller.role, Capability::AssignInspections)
        {
            Ok(())
        } else {
            Err(HseError::PermissionDenied {
                role: caller.role,
                capability: Capability::FillInspections,
            })
        }
    }

    /// Filling needs the capability and, for an assigned inspection, being
    /// its assignee (admins excepted).
    async fn require_fill(&self, caller: &Caller, id: &InspectionId) -> HseResult<()> {
        self.policy.require(caller, Capability::FillInspections)?;
        if caller.is_admin() {
            return Ok(());
        }
        match self.assignments.find_by_inspection(id).await? {
            Some(assignment) if assignment.assigned_to() != &caller.id => {
                Err(HseError::PermissionDenied {
                    role: caller.role,
                    capability: Capability::FillInspections,
                })
            }
            _ => Ok(()),
        }
    }

    async fn sync_assignment(&self, id: &InspectionId) -> AssignmentSync {
        match self.try_sync_assignment(id).await {
            Ok(sync) => sync,
            Err(e) => {
                tracing::warn!(
                    inspection = %id,
                    error = %e,
                    "Assignment not updated after inspection completion"
                );
                AssignmentSync::Failed(e.to_string())
            }
        }
    }

    async fn try_sync_assignment(&self, id: &InspectionId) -> HseResult<AssignmentSync> {
        let Some(mut assignment) = self.assignments.find_by_inspection(id).await? else {
            return Ok(AssignmentSync::NotLinked);
        };
        let assignment_id = assignment.id().clone();
        if !assignment.complete() {
            return Ok(AssignmentSync::AlreadyCompleted(assignment_id));
        }

        let events = assignment.take_events();
        self.assignments.upsert(assignment).await?;
        publish_committed(self.event_publisher.as_ref(), events).await;
        tracing::info!(assignment = %assignment_id, inspection = %id, "Assignment completed");
        Ok(AssignmentSync::Updated(assignment_id))
    }
}

#[async_trait]
impl InspectionUseCases for InspectionService {
    async fn materialize(
        &self,
        caller: &Caller,
        command: MaterializeCommand,
    ) -> HseResult<Inspection> {
        self.require_create(caller)?;

        let inspection = match command.source {
            MaterializeFrom::Template(template_id) => {
                let template = self
                    .templates
                    .get(&template_id)
                    .await?
                    .ok_or_else(|| HseError::not_found(EntityKind::Template, &template_id))?;
                let source = InspectionSource::Template(&template);
                Inspection::materialize(source, command.overrides, &self.defaults)
            }
            MaterializeFrom::Sections(sections) => {
                let source = InspectionSource::Sections(sections);
                Inspection::materialize(source, command.overrides, &self.defaults)
            }
        };
        let inspection = self.persist(inspection).await?;

        tracing::info!(inspection = %inspection.id(), by = %caller.id, "Inspection materialized");
        Ok(inspection)
    }

    async fn get_inspection(
        &self,
        caller: &Caller,
        id: &InspectionId,
    ) -> HseResult<Option<Inspection>> {
        self.policy.require(caller, Capability::ViewTemplates)?;

        let inspection = self.inspections.get(id).await?;
        let dropped = inspection.as_ref().map(Inspection::dropped_fields).filter(|d| *d > 0);
        if let Some(dropped) = dropped {
            tracing::warn!(inspection = %id, dropped, "Inspection has malformed fields");
        }
        Ok(inspection)
    }

    async fn list_inspections(
        &self,
        caller: &Caller,
        status: InspectionStatus,
    ) -> HseResult<Vec<Inspection>> {
        self.policy.require(caller, Capability::ViewTemplates)?;
        Ok(self.inspections.list_by_status(status).await?)
    }

    async fn record_response(
        &self,
        caller: &Caller,
        id: &InspectionId,
        field_id: &str,
        value: Value,
    ) -> HseResult<Inspection> {
        self.require_fill(caller, id).await?;

        let mut inspection = self.load(id).await?;
        if !inspection.record_response(field_id, value) {
            return Ok(inspection);
        }
        self.persist(inspection).await
    }

    async fn begin_work(&self, caller: &Caller, id: &InspectionId) -> HseResult<Inspection> {
        self.require_fill(caller, id).await?;

        let mut inspection = self.load(id).await?;
        if !inspection.begin_work() {
            tracing::debug!(inspection = %id, status = %inspection.status(), "Begin work ignored");
            return Ok(inspection);
        }
        let inspection = self.persist(inspection).await?;

        tracing::info!(inspection = %id, by = %caller.id, "Inspection started");
        Ok(inspection)
    }

    async fn validate_for_submit(
        &self,
        caller: &Caller,
        id: &InspectionId,
    ) -> HseResult<Option<SubmitBlock>> {
        self.policy.require(caller, Capability::ViewTemplates)?;

        let inspection = self.load(id).await?;
        Ok(inspection.validate_for_submit().err())
    }

    async fn complete(
        &self,
        caller: &Caller,
        id: &InspectionId,
        findings: Option<Findings>,
    ) -> HseResult<CompletionReport> {
        self.require_fill(caller, id).await?;

        let mut inspection = self.load(id).await?;
        inspection.complete(findings)?;
        let inspection = self.persist(inspection).await?;
        tracing::info!(inspection = %id, by = %caller.id, "Inspection completed");

        let assignment = self.sync_assignment(id).await;
        Ok(CompletionReport { inspection, assignment })
    }

    async fn save_draft(&self, caller: &Caller, inspection: Inspection) -> HseResult<Inspection> {
        self.require_create(caller)?;

        if let Some(stored) = self.inspections.get(inspection.id()).await? {
            self.require_fill(caller, stored.id()).await?;
            if stored.status() != InspectionStatus::Pending {
                return Err(InspectionError::NotPending(stored.status()).into());
            }
        }
        inspection.check_draft()?;

        let inspection = self.persist(inspection).await?;
        tracing::debug!(inspection = %inspection.id(), "Draft saved");
        Ok(inspection)
    }

    async fn attach_photo(
        &self,
        caller: &Caller,
        id: &InspectionId,
        uri: &str,
    ) -> HseResult<Inspection> {
        self.require_fill(caller, id).await?;

        let mut inspection = self.load(id).await?;
        inspection.attach_photo(uri)?;
        self.persist(inspection).await
    }
}
