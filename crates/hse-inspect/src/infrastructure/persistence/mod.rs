//! In-memory store implementations for testing and development

pub mod file;

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;

use crate::domain::aggregates::{
    Assignment, Inspection, InspectionStatus, Template, TemplateFilter,
};
use crate::domain::services::Role;
use crate::domain::value_objects::{AssignmentId, InspectionId, TemplateId, UserId};
use crate::ports::outbound::{
    AssignmentStore, InspectionStore, StoreError, StoreResult, TemplateStore, User, UserDirectory,
};

pub use file::FileStore;

/// In-memory template store
#[derive(Default)]
pub struct InMemoryTemplateStore {
    templates: RwLock<HashMap<String, Template>>,
}

impl InMemoryTemplateStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.templates.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.read().is_empty()
    }
}

#[async_trait]
impl TemplateStore for InMemoryTemplateStore {
    async fn list(&self, filter: &TemplateFilter) -> StoreResult<Vec<Template>> {
        let mut found: Vec<Template> = self
            .templates
            .read()
            .values()
            .filter(|t| filter.matches(t))
            .cloned()
            .collect();
        found.sort_by_key(|t| t.created_at());
        Ok(found)
    }

    async fn get(&self, id: &TemplateId) -> StoreResult<Option<Template>> {
        Ok(self.templates.read().get(id.as_str()).cloned())
    }

    async fn upsert(&self, template: Template) -> StoreResult<Template> {
        self.templates
            .write()
            .insert(template.id().to_string(), template.clone());
        Ok(template)
    }

    async fn delete(&self, id: &TemplateId) -> StoreResult<()> {
        self.templates.write().remove(id.as_str());
        Ok(())
    }
}

/// In-memory inspection store
#[derive(Default)]
pub struct InMemoryInspectionStore {
    inspections: RwLock<HashMap<String, Inspection>>,
}

impl InMemoryInspectionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.inspections.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inspections.read().is_empty()
    }
}

#[async_trait]
impl InspectionStore for InMemoryInspectionStore {
    async fn get(&self, id: &InspectionId) -> StoreResult<Option<Inspection>> {
        Ok(self.inspections.read().get(id.as_str()).cloned())
    }

    async fn upsert(&self, inspection: Inspection) -> StoreResult<Inspection> {
        self.inspections
            .write()
            .insert(inspection.id().to_string(), inspection.clone());
        Ok(inspection)
    }

    async fn list_by_status(&self, status: InspectionStatus) -> StoreResult<Vec<Inspection>> {
        let mut found: Vec<Inspection> = self
            .inspections
            .read()
            .values()
            .filter(|i| i.status() == status)
            .cloned()
            .collect();
        found.sort_by_key(|i| i.created_at());
        Ok(found)
    }

    async fn delete(&self, id: &InspectionId) -> StoreResult<()> {
        self.inspections.write().remove(id.as_str());
        Ok(())
    }
}

/// In-memory assignment store
#[derive(Default)]
pub struct InMemoryAssignmentStore {
    assignments: RwLock<HashMap<String, Assignment>>,
}

impl InMemoryAssignmentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.assignments.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.assignments.read().is_empty()
    }

    fn collect<F>(&self, predicate: F) -> Vec<Assignment>
    where
        F: Fn(&Assignment) -> bool,
    {
        let mut found: Vec<Assignment> = self
            .assignments
            .read()
            .values()
            .filter(|a| predicate(a))
            .cloned()
            .collect();
        found.sort_by_key(|a| a.assigned_at());
        found
    }
}

#[async_trait]
impl AssignmentStore for InMemoryAssignmentStore {
    async fn get(&self, id: &AssignmentId) -> StoreResult<Option<Assignment>> {
        Ok(self.assignments.read().get(id.as_str()).cloned())
    }

    async fn upsert(&self, assignment: Assignment) -> StoreResult<Assignment> {
        self.assignments
            .write()
            .insert(assignment.id().to_string(), assignment.clone());
        Ok(assignment)
    }

    async fn list_by_assignee(&self, user_id: &UserId) -> StoreResult<Vec<Assignment>> {
        Ok(self.collect(|a| a.assigned_to() == user_id))
    }

    async fn list_by_assigner(&self, user_id: &UserId) -> StoreResult<Vec<Assignment>> {
        Ok(self.collect(|a| a.assigned_by() == user_id))
    }

    async fn list_all(&self) -> StoreResult<Vec<Assignment>> {
        Ok(self.collect(|_| true))
    }

    async fn find_by_inspection(
        &self,
        inspection_id: &InspectionId,
    ) -> StoreResult<Option<Assignment>> {
        Ok(self
            .assignments
            .read()
            .values()
            .find(|a| a.inspection_id() == inspection_id)
            .cloned())
    }

    async fn delete(&self, id: &AssignmentId) -> StoreResult<()> {
        self.assignments.write().remove(id.as_str());
        Ok(())
    }
}

/// In-memory user directory with a fixed signed-in user
#[derive(Default)]
pub struct InMemoryUserDirectory {
    users: RwLock<HashMap<String, User>>,
    current: RwLock<Option<UserId>>,
}

impl InMemoryUserDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_users<I>(users: I) -> Self
    where
        I: IntoIterator<Item = User>,
    {
        let directory = Self::new();
        {
            let mut map = directory.users.write();
            for user in users {
                map.insert(user.id.to_string(), user);
            }
        }
        directory
    }

    pub fn sign_in(&self, id: &UserId) {
        *self.current.write() = Some(id.clone());
    }
}

#[async_trait]
impl UserDirectory for InMemoryUserDirectory {
    async fn current_user(&self) -> StoreResult<User> {
        let current = self
            .current
            .read()
            .clone()
            .ok_or_else(|| StoreError::NotFound("no signed-in user".into()))?;
        self.users
            .read()
            .get(current.as_str())
            .cloned()
            .ok_or_else(|| StoreError::NotFound(current.to_string()))
    }

    async fn get(&self, id: &UserId) -> StoreResult<Option<User>> {
        Ok(self.users.read().get(id.as_str()).cloned())
    }

    async fn list_by_role(&self, role: Role) -> StoreResult<Vec<User>> {
        let mut found: Vec<User> = self
            .users
            .read()
            .values()
            .filter(|u| u.role == role)
            .cloned()
            .collect();
        found.sort_by(|a, b| a.display_name.cmp(&b.display_name));
        Ok(found)
    }

    async fn upsert(&self, user: User) -> StoreResult<User> {
        self.users.write().insert(user.id.to_string(), user.clone());
        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::aggregates::{AssignmentTerms, TemplateDraft, TemplateStatus};

    #[tokio::test]
    async fn test_template_store_filters() {
        let store = InMemoryTemplateStore::new();
        let owner = UserId::from_string("m1");
        let forklift = TemplateDraft::new("Forklift Check").with_category("maintenance");
        store.upsert(Template::create(forklift, &owner)).await.unwrap();
        store
            .upsert(Template::create(
                TemplateDraft::new("Spill Drill").with_status(TemplateStatus::Draft),
                &owner,
            ))
            .await
            .unwrap();

        let drafts = store
            .list(&TemplateFilter { status: Some(TemplateStatus::Draft), ..Default::default() })
            .await
            .unwrap();
        assert_eq!(drafts.len(), 1);
        assert_eq!(drafts[0].title(), "Spill Drill");

        let search = store
            .list(&TemplateFilter { search: Some("forklift".into()), ..Default::default() })
            .await
            .unwrap();
        assert_eq!(search.len(), 1);
        assert_eq!(store.len(), 2);
    }

    #[tokio::test]
    async fn test_assignment_store_queries() {
        let store = InMemoryAssignmentStore::new();
        let inspection = InspectionId::from_string("insp-1");
        let a = Assignment::create(
            inspection.clone(),
            UserId::from_string("i1"),
            UserId::from_string("m1"),
            AssignmentTerms::default(),
        );
        store.upsert(a.clone()).await.unwrap();

        assert_eq!(store.list_by_assignee(&UserId::from_string("i1")).await.unwrap().len(), 1);
        assert_eq!(store.list_by_assigner(&UserId::from_string("m1")).await.unwrap().len(), 1);
        assert!(store.list_by_assigner(&UserId::from_string("i1")).await.unwrap().is_empty());
        assert_eq!(
            store.find_by_inspection(&inspection).await.unwrap().map(|a| a.id().clone()),
            Some(a.id().clone())
        );

        store.delete(a.id()).await.unwrap();
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_user_directory() {
        let directory = InMemoryUserDirectory::with_users([
            User::new("i1", Role::Inspector, "Ines"),
            User::new("m1", Role::Manager, "Mo"),
        ]);
        assert!(directory.current_user().await.is_err());

        directory.sign_in(&UserId::from_string("m1"));
        assert_eq!(directory.current_user().await.unwrap().display_name, "Mo");
        assert_eq!(directory.list_by_role(Role::Inspector).await.unwrap().len(), 1);
    }
}
