//! JSON file store
//!
//! Keeps every collection in one JSON document. Each call reads a complete
//! snapshot; writes are serialized through an async mutex and land by
//! writing a sibling temp file and renaming it over the original.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

use crate::domain::aggregates::{
    Assignment, Inspection, InspectionStatus, Template, TemplateFilter,
};
use crate::domain::services::Role;
use crate::domain::value_objects::{AssignmentId, InspectionId, TemplateId, UserId};
use crate::ports::outbound::{
    AssignmentStore, InspectionStore, StoreError, StoreResult, TemplateStore, User, UserDirectory,
};

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
struct Document {
    templates: BTreeMap<String, Template>,
    inspections: BTreeMap<String, Inspection>,
    assignments: BTreeMap<String, Assignment>,
    users: BTreeMap<String, User>,
}

/// Store backed by a single JSON file
pub struct FileStore {
    path: PathBuf,
    write_lock: Mutex<()>,
    acting_as: Option<UserId>,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), write_lock: Mutex::new(()), acting_as: None }
    }

    /// Set the user reported by [`UserDirectory::current_user`]
    pub fn acting_as(mut self, user: UserId) -> Self {
        self.acting_as = Some(user);
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> StoreResult<Document> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) if bytes.is_empty() => Ok(Document::default()),
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Document::default()),
            Err(e) => Err(e.into()),
        }
    }

    async fn save(&self, document: &Document) -> StoreResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let bytes = serde_json::to_vec_pretty(document)?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, bytes).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        tracing::debug!(path = %self.path.display(), "Store file written");
        Ok(())
    }

    async fn read<T, F>(&self, f: F) -> StoreResult<T>
    where
        F: FnOnce(&Document) -> T,
    {
        let document = self.load().await?;
        Ok(f(&document))
    }

    async fn update<T, F>(&self, f: F) -> StoreResult<T>
    where
        F: FnOnce(&mut Document) -> T,
    {
        let _guard = self.write_lock.lock().await;
        let mut document = self.load().await?;
        let result = f(&mut document);
        self.save(&document).await?;
        Ok(result)
    }
}

fn sorted_by<T, K: Ord>(mut items: Vec<T>, key: impl Fn(&T) -> K) -> Vec<T> {
    items.sort_by_key(|item| key(item));
    items
}

#[async_trait]
impl TemplateStore for FileStore {
    async fn list(&self, filter: &TemplateFilter) -> StoreResult<Vec<Template>> {
        let found: Vec<Template> = self
            .read(|doc| doc.templates.values().filter(|t| filter.matches(t)).cloned().collect())
            .await?;
        Ok(sorted_by(found, Template::created_at))
    }

    async fn get(&self, id: &TemplateId) -> StoreResult<Option<Template>> {
        self.read(|doc| doc.templates.get(id.as_str()).cloned()).await
    }

    async fn upsert(&self, template: Template) -> StoreResult<Template> {
        let stored = template.clone();
        self.update(move |doc| doc.templates.insert(template.id().to_string(), template))
            .await?;
        Ok(stored)
    }

    async fn delete(&self, id: &TemplateId) -> StoreResult<()> {
        self.update(|doc| doc.templates.remove(id.as_str())).await?;
        Ok(())
    }
}

#[async_trait]
impl InspectionStore for FileStore {
    async fn get(&self, id: &InspectionId) -> StoreResult<Option<Inspection>> {
        self.read(|doc| doc.inspections.get(id.as_str()).cloned()).await
    }

    async fn upsert(&self, inspection: Inspection) -> StoreResult<Inspection> {
        let stored = inspection.clone();
        self.update(move |doc| doc.inspections.insert(inspection.id().to_string(), inspection))
            .await?;
        Ok(stored)
    }

    async fn list_by_status(&self, status: InspectionStatus) -> StoreResult<Vec<Inspection>> {
        let found: Vec<Inspection> = self
            .read(|doc| {
                doc.inspections.values().filter(|i| i.status() == status).cloned().collect()
            })
            .await?;
        Ok(sorted_by(found, Inspection::created_at))
    }

    async fn delete(&self, id: &InspectionId) -> StoreResult<()> {
        self.update(|doc| doc.inspections.remove(id.as_str())).await?;
        Ok(())
    }
}

#[async_trait]
impl AssignmentStore for FileStore {
    async fn get(&self, id: &AssignmentId) -> StoreResult<Option<Assignment>> {
        self.read(|doc| doc.assignments.get(id.as_str()).cloned()).await
    }

    async fn upsert(&self, assignment: Assignment) -> StoreResult<Assignment> {
        let stored = assignment.clone();
        self.update(move |doc| doc.assignments.insert(assignment.id().to_string(), assignment))
            .await?;
        Ok(stored)
    }

    async fn list_by_assignee(&self, user_id: &UserId) -> StoreResult<Vec<Assignment>> {
        let found: Vec<Assignment> = self
            .read(|doc| {
                doc.assignments.values().filter(|a| a.assigned_to() == user_id).cloned().collect()
            })
            .await?;
        Ok(sorted_by(found, Assignment::assigned_at))
    }

    async fn list_by_assigner(&self, user_id: &UserId) -> StoreResult<Vec<Assignment>> {
        let found: Vec<Assignment> = self
            .read(|doc| {
                doc.assignments.values().filter(|a| a.assigned_by() == user_id).cloned().collect()
            })
            .await?;
        Ok(sorted_by(found, Assignment::assigned_at))
    }

    async fn list_all(&self) -> StoreResult<Vec<Assignment>> {
        let found: Vec<Assignment> =
            self.read(|doc| doc.assignments.values().cloned().collect()).await?;
        Ok(sorted_by(found, Assignment::assigned_at))
    }

    async fn find_by_inspection(
        &self,
        inspection_id: &InspectionId,
    ) -> StoreResult<Option<Assignment>> {
        self.read(|doc| {
            doc.assignments
                .values()
                .find(|a| a.inspection_id() == inspection_id)
                .cloned()
        })
        .await
    }

    async fn delete(&self, id: &AssignmentId) -> StoreResult<()> {
        self.update(|doc| doc.assignments.remove(id.as_str())).await?;
        Ok(())
    }
}

#[async_trait]
impl UserDirectory for FileStore {
    async fn current_user(&self) -> StoreResult<User> {
        let id = self
            .acting_as
            .clone()
            .ok_or_else(|| StoreError::NotFound("no acting user configured".into()))?;
        self.read(|doc| doc.users.get(id.as_str()).cloned())
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("user {id}")))
    }

    async fn get(&self, id: &UserId) -> StoreResult<Option<User>> {
        self.read(|doc| doc.users.get(id.as_str()).cloned()).await
    }

    async fn list_by_role(&self, role: Role) -> StoreResult<Vec<User>> {
        let found: Vec<User> = self
            .read(|doc| doc.users.values().filter(|u| u.role == role).cloned().collect())
            .await?;
        Ok(sorted_by(found, |u: &User| u.display_name.clone()))
    }

    async fn upsert(&self, user: User) -> StoreResult<User> {
        let stored = user.clone();
        self.update(move |doc| doc.users.insert(user.id.to_string(), user)).await?;
        Ok(stored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MaterializeConfig;
    use crate::domain::aggregates::{InspectionOverrides, InspectionSource, TemplateDraft};
    use crate::domain::value_objects::{Field, FieldKind, Section};
    use serde_json::json;
    use tempfile::TempDir;

    fn template() -> Template {
        Template::create(
            TemplateDraft::new("Guard Check").with_section(
                Section::new("s1", "Checks")
                    .with_field(Field::new("guard", "Guard fitted", FieldKind::Boolean).required())
                    .with_field(Field::new("note", "Note", FieldKind::Text)),
            ),
            &UserId::from_string("m1"),
        )
    }

    #[tokio::test]
    async fn test_missing_file_reads_empty() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::new(dir.path().join("none.json"));
        assert!(TemplateStore::list(&store, &TemplateFilter::default()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_boolean_false_round_trips() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("data").join("hse.json");
        let store = FileStore::new(&path);

        let t = template();
        let mut inspection = Inspection::materialize(
            InspectionSource::Template(&t),
            InspectionOverrides::default(),
            &MaterializeConfig::default(),
        );
        inspection.record_response("guard", json!(false));
        InspectionStore::upsert(&store, inspection.clone()).await.unwrap();

        let reopened = FileStore::new(&path);
        let loaded = InspectionStore::get(&reopened, inspection.id()).await.unwrap().unwrap();
        assert_eq!(loaded.response_value("guard"), Some(&json!(false)));
        assert_eq!(loaded.response_value("note"), Some(&json!("")));
        assert!(loaded.validate_for_submit().is_ok());
    }

    #[tokio::test]
    async fn test_template_round_trip_and_delete() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::new(dir.path().join("hse.json"));
        let t = template();
        TemplateStore::upsert(&store, t.clone()).await.unwrap();

        let loaded = TemplateStore::get(&store, t.id()).await.unwrap().unwrap();
        assert_eq!(loaded.sections(), t.sections());
        assert_eq!(loaded.created_at(), t.created_at());

        TemplateStore::delete(&store, t.id()).await.unwrap();
        assert!(TemplateStore::get(&store, t.id()).await.unwrap().is_none());
        assert!(!dir.path().join("hse.json.tmp").exists());
    }

    #[tokio::test]
    async fn test_malformed_fields_dropped_on_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("hse.json");
        let document = json!({
            "templates": {
                "t1": {
                    "id": "t1",
                    "title": "Legacy",
                    "createdBy": "u1",
                    "createdAt": "2024-01-01T00:00:00Z",
                    "updatedAt": "2024-01-01T00:00:00Z",
                    "sections": [
                        {
                            "id": 1,
                            "title": "A",
                            "fields": [
                                {"id": "ok", "label": "OK", "type": "text"},
                                {"label": "broken"}
                            ]
                        },
                        {"id": 2, "title": "B", "fields": "not a list"}
                    ]
                }
            }
        });
        std::fs::write(&path, serde_json::to_vec(&document).unwrap()).unwrap();

        let store = FileStore::new(&path);
        let t = TemplateStore::get(&store, &TemplateId::from_string("t1")).await.unwrap().unwrap();
        assert_eq!(t.field_count(), 1);
        assert_eq!(t.dropped_fields(), 1);
        assert!(t.sections()[1].fields.is_empty());
    }

    #[tokio::test]
    async fn test_current_user() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("hse.json");
        let store = FileStore::new(&path);
        UserDirectory::upsert(&store, User::new("a1", Role::Admin, "Ada")).await.unwrap();
        assert!(store.current_user().await.is_err());

        let store = FileStore::new(&path).acting_as(UserId::from_string("a1"));
        assert_eq!(store.current_user().await.unwrap().role, Role::Admin);
    }
}
