//! Assignment application service

use async_trait::async_trait;
use std::sync::Arc;

use crate::application::dto::{
    AssignmentCreated, AssignmentTarget, AssignmentView, CreateAssignmentCommand,
};
use crate::config::MaterializeConfig;
use crate::domain::aggregates::{Assignment, Inspection, InspectionOverrides, InspectionSource};
use crate::domain::services::{Caller, Capability, RolePolicy};
use crate::domain::value_objects::{AssignmentId, UserId};
use crate::error::{EntityKind, HseError, HseResult};
use crate::ports::inbound::AssignmentUseCases;
use crate::ports::outbound::{
    AssignmentStore, EventPublisher, InspectionStore, TemplateStore, User, UserDirectory,
};

use super::publish_committed;

/// Assignment application service
pub struct AssignmentService {
    templates: Arc<dyn TemplateStore>,
    inspections: Arc<dyn InspectionStore>,
    assignments: Arc<dyn AssignmentStore>,
    users: Arc<dyn UserDirectory>,
    event_publisher: Arc<dyn EventPublisher>,
    policy: RolePolicy,
    defaults: MaterializeConfig,
}

impl AssignmentService {
    pub fn new(
        templates: Arc<dyn TemplateStore>,
        inspections: Arc<dyn InspectionStore>,
        assignments: Arc<dyn AssignmentStore>,
        users: Arc<dyn UserDirectory>,
        event_publisher: Arc<dyn EventPublisher>,
        policy: RolePolicy,
        defaults: MaterializeConfig,
    ) -> Self {
        Self { templates, inspections, assignments, users, event_publisher, policy, defaults }
    }

    async fn load(&self, id: &AssignmentId) -> HseResult<Assignment> {
        self.assignments
            .get(id)
            .await?
            .ok_or_else(|| HseError::not_found(EntityKind::Assignment, id))
    }

    /// The assignee must hold a role that can fill inspections
    async fn resolve_assignee(&self, id: &UserId) -> HseResult<User> {
        for role in self.policy.inspector_capable_roles() {
            let candidates = self.users.list_by_role(role).await?;
            if let Some(user) = candidates.into_iter().find(|u| &u.id == id) {
                return Ok(user);
            }
        }
        Err(HseError::not_found(EntityKind::User, id))
    }

    async fn persist_inspection(&self, mut inspection: Inspection) -> HseResult<Inspection> {
        let events = inspection.take_events();
        let inspection = self.inspections.upsert(inspection).await?;
        publish_committed(self.event_publisher.as_ref(), events).await;
        Ok(inspection)
    }

    async fn persist(&self, mut assignment: Assignment) -> HseResult<Assignment> {
        let events = assignment.take_events();
        let assignment = self.assignments.upsert(assignment).await?;
        publish_committed(self.event_publisher.as_ref(), events).await;
        Ok(assignment)
    }

    /// Fresh inspection for a template target, or the unassigned open one
    async fn target_inspection(
        &self,
        command: &CreateAssignmentCommand,
        assignee: &User,
    ) -> HseResult<Inspection> {
        match &command.target {
            AssignmentTarget::Template(template_id) => {
                let template = self
                    .templates
                    .get(template_id)
                    .await?
                    .ok_or_else(|| HseError::not_found(EntityKind::Template, template_id))?;
                let overrides = InspectionOverrides {
                    title: Some(format!("{} - {}", template.title(), assignee.display_name)),
                    inspector: Some(assignee.display_name.clone()),
                    priority: Some(command.terms.priority.into()),
                    ..InspectionOverrides::default()
                };
                let source = InspectionSource::Template(&template);
                let inspection = Inspection::materialize(source, overrides, &self.defaults);
                self.persist_inspection(inspection).await
            }
            AssignmentTarget::Inspection(inspection_id) => {
                let inspection = self
                    .inspections
                    .get(inspection_id)
                    .await?
                    .ok_or_else(|| HseError::not_found(EntityKind::Inspection, inspection_id))?;
                if inspection.is_completed() {
                    return Err(HseError::Conflict(format!(
                        "inspection {inspection_id} is already completed"
                    )));
                }
                if let Some(existing) = self.assignments.find_by_inspection(inspection_id).await? {
                    return Err(HseError::Conflict(format!(
                        "inspection {inspection_id} is already assigned ({})",
                        existing.id()
                    )));
                }
                Ok(inspection)
            }
        }
    }

    fn can_see(&self, caller: &Caller, assignment: &Assignment) -> bool {
        self.policy.allows(caller.role, Capability::ViewAllAssignments)
            || assignment.assigned_to() == &caller.id
            || assignment.assigned_by() == &caller.id
    }
}

fn views(assignments: Vec<Assignment>) -> Vec<AssignmentView> {
    let now = chrono::Utc::now();
    assignments.into_iter().map(|a| AssignmentView::at(a, now)).collect()
}

#[async_trait]
impl AssignmentUseCases for AssignmentService {
    async fn create_assignment(
        &self,
        caller: &Caller,
        command: CreateAssignmentCommand,
    ) -> HseResult<AssignmentCreated> {
        self.policy.require(caller, Capability::AssignInspections)?;

        let assignee = self.resolve_assignee(&command.assignee).await?;
        let inspection = self.target_inspection(&command, &assignee).await?;

        let assignment = Assignment::create(
            inspection.id().clone(),
            assignee.id.clone(),
            caller.id.clone(),
            command.terms,
        );
        let assignment = self.persist(assignment).await?;

        tracing::info!(
            assignment = %assignment.id(),
            inspection = %inspection.id(),
            to = %assignee.id,
            by = %caller.id,
            "Assignment created"
        );
        Ok(AssignmentCreated { assignment: AssignmentView::now(assignment), inspection })
    }

    async fn start_assignment(
        &self,
        caller: &Caller,
        id: &AssignmentId,
    ) -> HseResult<AssignmentView> {
        self.policy.require(caller, Capability::FillInspections)?;

        let mut assignment = self.load(id).await?;
        if !caller.is_admin() && assignment.assigned_to() != &caller.id {
            return Err(HseError::PermissionDenied {
                role: caller.role,
                capability: Capability::FillInspections,
            });
        }
        let inspection_id = assignment.inspection_id().clone();
        let mut inspection = self
            .inspections
            .get(&inspection_id)
            .await?
            .ok_or_else(|| HseError::not_found(EntityKind::Inspection, &inspection_id))?;

        if assignment.start()? {
            assignment = self.persist(assignment).await?;
            tracing::info!(assignment = %id, by = %caller.id, "Assignment started");
        } else {
            tracing::debug!(assignment = %id, "Assignment already in progress");
        }

        if inspection.begin_work() {
            inspection = self.persist_inspection(inspection).await?;
            tracing::info!(inspection = %inspection.id(), "Inspection started");
        }

        Ok(AssignmentView::now(assignment))
    }

    async fn remove_assignment(&self, caller: &Caller, id: &AssignmentId) -> HseResult<()> {
        let mut assignment = self.load(id).await?;
        self.policy
            .require_owned(caller, assignment.assigned_by(), Capability::AssignInspections)?;

        assignment.mark_removed();
        self.assignments.delete(id).await?;
        publish_committed(self.event_publisher.as_ref(), assignment.take_events()).await;

        tracing::info!(
            assignment = %id,
            inspection = %assignment.inspection_id(),
            by = %caller.id,
            "Assignment removed"
        );
        Ok(())
    }

    async fn get_assignment(
        &self,
        caller: &Caller,
        id: &AssignmentId,
    ) -> HseResult<Option<AssignmentView>> {
        let Some(assignment) = self.assignments.get(id).await? else {
            return Ok(None);
        };
        if !self.can_see(caller, &assignment) {
            return Err(HseError::PermissionDenied {
                role: caller.role,
                capability: Capability::ViewAllAssignments,
            });
        }
        Ok(Some(AssignmentView::now(assignment)))
    }

    async fn list_for_inspector(
        &self,
        caller: &Caller,
        inspector: &UserId,
    ) -> HseResult<Vec<AssignmentView>> {
        if &caller.id != inspector {
            self.policy.require(caller, Capability::ViewAllAssignments)?;
        }
        Ok(views(self.assignments.list_by_assignee(inspector).await?))
    }

    async fn list_for_manager(
        &self,
        caller: &Caller,
        manager: &UserId,
    ) -> HseResult<Vec<AssignmentView>> {
        self.policy.require_owned(caller, manager, Capability::AssignInspections)?;
        Ok(views(self.assignments.list_by_assigner(manager).await?))
    }

    async fn list_all(&self, caller: &Caller) -> HseResult<Vec<AssignmentView>> {
        self.policy.require(caller, Capability::ViewAllAssignments)?;
        Ok(views(self.assignments.list_all().await?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::commands::InspectionService;
    use crate::application::dto::AssignmentSync;
    use crate::domain::aggregates::{
        AssignmentStatus, AssignmentTerms, DisplayStatus, InspectionStatus, Template, TemplateDraft,
    };
    use crate::domain::services::Role;
    use crate::domain::value_objects::{
        AssignmentPriority, Field, FieldKind, InspectionPriority, Section, TemplateId,
    };
    use crate::infrastructure::{
        InMemoryAssignmentStore, InMemoryInspectionStore, InMemoryTemplateStore,
        InMemoryUserDirectory, NoOpEventPublisher,
    };
    use crate::ports::inbound::InspectionUseCases;
    use chrono::{Duration, Utc};
    use serde_json::json;

    struct Fixture {
        inspections: Arc<InMemoryInspectionStore>,
        assignments: Arc<InMemoryAssignmentStore>,
        template_id: TemplateId,
        service: AssignmentService,
        inspection_service: InspectionService,
    }

    async fn fixture() -> Fixture {
        let templates = Arc::new(InMemoryTemplateStore::new());
        let inspections = Arc::new(InMemoryInspectionStore::new());
        let assignments = Arc::new(InMemoryAssignmentStore::new());
        let users = Arc::new(InMemoryUserDirectory::with_users([
            User::new("a1", Role::Admin, "Ada"),
            User::new("m1", Role::Manager, "Mo"),
            User::new("m2", Role::Manager, "Mia"),
            User::new("i1", Role::Inspector, "Ines"),
            User::new("i2", Role::Inspector, "Ivo"),
        ]));

        let template = templates
            .upsert(Template::create(
                TemplateDraft::new("Crane Check").with_section(
                    Section::new("s", "Checks")
                        .with_field(
                            Field::new("limit_switch", "Limit switch OK", FieldKind::Boolean)
                                .required(),
                        ),
                ),
                &UserId::from_string("m1"),
            ))
            .await
            .unwrap();

        let publisher = Arc::new(NoOpEventPublisher);
        let service = AssignmentService::new(
            templates.clone(),
            inspections.clone(),
            assignments.clone(),
            users,
            publisher.clone(),
            RolePolicy::default(),
            MaterializeConfig::default(),
        );
        let inspection_service = InspectionService::new(
            templates,
            inspections.clone(),
            assignments.clone(),
            publisher,
            RolePolicy::default(),
            MaterializeConfig::default(),
        );
        Fixture {
            inspections,
            assignments,
            template_id: template.id().clone(),
            service,
            inspection_service,
        }
    }

    fn admin() -> Caller {
        Caller::new("a1", Role::Admin, "Ada")
    }

    fn manager(id: &str) -> Caller {
        Caller::new(id, Role::Manager, "Mo")
    }

    fn inspector(id: &str) -> Caller {
        Caller::new(id, Role::Inspector, "Ines")
    }

    fn assign_template(f: &Fixture, to: &str) -> CreateAssignmentCommand {
        CreateAssignmentCommand {
            target: AssignmentTarget::Template(f.template_id.clone()),
            assignee: UserId::from_string(to),
            terms: AssignmentTerms { priority: AssignmentPriority::Urgent, ..Default::default() },
        }
    }

    #[tokio::test]
    async fn test_assignment_inspection_lockstep() {
        let f = fixture().await;
        let created = f
            .service
            .create_assignment(&manager("m1"), assign_template(&f, "i1"))
            .await
            .unwrap();

        assert_eq!(f.inspections.len(), 1);
        assert_eq!(f.assignments.len(), 1);
        assert_eq!(created.inspection.status(), InspectionStatus::Pending);
        assert_eq!(created.inspection.title(), "Crane Check - Ines");
        assert_eq!(created.inspection.location(), "To be determined");
        assert_eq!(created.inspection.inspector(), "Ines");
        assert_eq!(created.inspection.priority(), InspectionPriority::Critical);
        assert_eq!(created.assignment.assignment.status(), AssignmentStatus::Assigned);
        assert_eq!(created.assignment.assignment.inspection_id(), created.inspection.id());

        let assignment_id = created.assignment.assignment.id().clone();
        let started = f.service.start_assignment(&inspector("i1"), &assignment_id).await.unwrap();
        assert_eq!(started.assignment.status(), AssignmentStatus::InProgress);
        let inspection = InspectionStore::get(f.inspections.as_ref(), created.inspection.id())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(inspection.status(), InspectionStatus::InProgress);

        let again = f.service.start_assignment(&inspector("i1"), &assignment_id).await.unwrap();
        assert_eq!(again.assignment.status(), AssignmentStatus::InProgress);

        f.inspection_service
            .record_response(&inspector("i1"), inspection.id(), "limit_switch", json!(false))
            .await
            .unwrap();
        let report = f
            .inspection_service
            .complete(&inspector("i1"), inspection.id(), None)
            .await
            .unwrap();
        assert_eq!(report.assignment, AssignmentSync::Updated(assignment_id.clone()));

        let stored =
            AssignmentStore::get(f.assignments.as_ref(), &assignment_id).await.unwrap().unwrap();
        assert_eq!(stored.status(), AssignmentStatus::Completed);

        let err = f.service.start_assignment(&inspector("i1"), &assignment_id).await.unwrap_err();
        assert!(err.is_conflict());
    }

    #[tokio::test]
    async fn test_overdue_is_derived_not_stored() {
        let f = fixture().await;
        let mut command = assign_template(&f, "i1");
        command.terms.due_date = Some(Utc::now() - Duration::hours(2));
        let created = f.service.create_assignment(&admin(), command).await.unwrap();
        let id = created.assignment.assignment.id().clone();
        assert!(created.assignment.overdue);

        let view = f.service.start_assignment(&inspector("i1"), &id).await.unwrap();
        assert!(view.overdue);
        assert_eq!(view.display_status, DisplayStatus::Overdue);

        let stored = AssignmentStore::get(f.assignments.as_ref(), &id).await.unwrap().unwrap();
        assert_eq!(stored.status(), AssignmentStatus::InProgress);
        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["status"], "in_progress");
        assert_eq!(json["display_status"], "overdue");
    }

    #[tokio::test]
    async fn test_role_gating() {
        let f = fixture().await;
        let err = f
            .service
            .create_assignment(&inspector("i1"), assign_template(&f, "i2"))
            .await
            .unwrap_err();
        assert!(err.is_permission_denied());
        assert!(f.inspections.is_empty());

        f.service.create_assignment(&admin(), assign_template(&f, "i2")).await.unwrap();
    }

    #[tokio::test]
    async fn test_assignee_must_be_inspector_capable() {
        let f = fixture().await;
        for who in ["m2", "ghost"] {
            let err = f
                .service
                .create_assignment(&manager("m1"), assign_template(&f, who))
                .await
                .unwrap_err();
            assert!(matches!(err, HseError::NotFound { entity: EntityKind::User, .. }));
        }
        assert!(f.inspections.is_empty());

        f.service.create_assignment(&manager("m1"), assign_template(&f, "a1")).await.unwrap();
    }

    #[tokio::test]
    async fn test_assign_existing_inspection() {
        let f = fixture().await;
        let created = f
            .service
            .create_assignment(&admin(), assign_template(&f, "i1"))
            .await
            .unwrap();
        let inspection_id = created.inspection.id().clone();

        let again = CreateAssignmentCommand {
            target: AssignmentTarget::Inspection(inspection_id.clone()),
            assignee: UserId::from_string("i2"),
            terms: AssignmentTerms::default(),
        };
        let err = f.service.create_assignment(&admin(), again.clone()).await.unwrap_err();
        assert!(err.is_conflict());

        f.service
            .remove_assignment(&admin(), created.assignment.assignment.id())
            .await
            .unwrap();
        let reassigned = f.service.create_assignment(&admin(), again).await.unwrap();
        assert_eq!(reassigned.inspection.id(), &inspection_id);
        assert_eq!(f.inspections.len(), 1);
    }

    #[tokio::test]
    async fn test_remove_keeps_inspection() {
        let f = fixture().await;
        let created = f
            .service
            .create_assignment(&manager("m1"), assign_template(&f, "i1"))
            .await
            .unwrap();
        let id = created.assignment.assignment.id().clone();

        let err = f.service.remove_assignment(&manager("m2"), &id).await.unwrap_err();
        assert!(err.is_permission_denied());
        let err = f.service.remove_assignment(&inspector("i1"), &id).await.unwrap_err();
        assert!(err.is_permission_denied());

        f.service.remove_assignment(&manager("m1"), &id).await.unwrap();
        assert!(f.assignments.is_empty());
        assert_eq!(f.inspections.len(), 1);
    }

    #[tokio::test]
    async fn test_listing_scopes() {
        let f = fixture().await;
        f.service.create_assignment(&manager("m1"), assign_template(&f, "i1")).await.unwrap();
        f.service.create_assignment(&manager("m2"), assign_template(&f, "i2")).await.unwrap();

        let mine = f
            .service
            .list_for_inspector(&inspector("i1"), &UserId::from_string("i1"))
            .await
            .unwrap();
        assert_eq!(mine.len(), 1);
        assert!(f
            .service
            .list_for_inspector(&inspector("i1"), &UserId::from_string("i2"))
            .await
            .unwrap_err()
            .is_permission_denied());

        let by_m1 = f
            .service
            .list_for_manager(&manager("m1"), &UserId::from_string("m1"))
            .await
            .unwrap();
        assert_eq!(by_m1.len(), 1);
        assert!(f
            .service
            .list_for_manager(&manager("m1"), &UserId::from_string("m2"))
            .await
            .unwrap_err()
            .is_permission_denied());

        assert!(f.service.list_all(&manager("m1")).await.unwrap_err().is_permission_denied());
        assert_eq!(f.service.list_all(&admin()).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_only_assignee_starts() {
        let f = fixture().await;
        let created = f
            .service
            .create_assignment(&admin(), assign_template(&f, "i1"))
            .await
            .unwrap();
        let id = created.assignment.assignment.id().clone();

        let err = f.service.start_assignment(&inspector("i2"), &id).await.unwrap_err();
        assert!(err.is_permission_denied());
        let err = f.service.get_assignment(&inspector("i2"), &id).await.unwrap_err();
        assert!(err.is_permission_denied());
        assert!(f.service.get_assignment(&inspector("i1"), &id).await.unwrap().is_some());
    }
}
