//! Template Aggregate
//!
//! Reusable inspection definition: ordered sections of typed fields.
//!
//! # Invariants
//! - Prebuilt templates are read-only: no replace, no delete
//! - Saves are full replacements; `id`, `createdAt`, `createdBy` and
//!   `isPrebuilt` survive a replace

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::domain::events::{DomainEvent, TemplateEvent};
use crate::domain::value_objects::{Section, TemplateId, UserId};

const SYSTEM_USER: &str = "system";

/// Template aggregate root
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Template {
    id: TemplateId,
    title: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    category: String,
    #[serde(default)]
    tags: Vec<String>,
    #[serde(default)]
    sections: Vec<Section>,
    #[serde(default)]
    status: TemplateStatus,
    #[serde(default = "default_true")]
    is_active: bool,
    #[serde(default)]
    is_prebuilt: bool,
    created_by: UserId,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    #[serde(skip)]
    events: Vec<DomainEvent>,
}

fn default_true() -> bool {
    true
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TemplateStatus {
    #[default]
    Active,
    Draft,
    Archived,
}

impl fmt::Display for TemplateStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Active => "active",
            Self::Draft => "draft",
            Self::Archived => "archived",
        };
        f.write_str(s)
    }
}

impl FromStr for TemplateStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "active" => Ok(Self::Active),
            "draft" => Ok(Self::Draft),
            "archived" => Ok(Self::Archived),
            other => Err(format!("unknown template status: {other}")),
        }
    }
}

/// Caller-supplied template document used for both create and replace
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TemplateDraft {
    pub id: Option<TemplateId>,
    pub title: String,
    pub description: String,
    pub category: String,
    pub tags: Vec<String>,
    pub sections: Vec<Section>,
    pub status: Option<TemplateStatus>,
    pub is_active: Option<bool>,
    pub created_by: Option<UserId>,
    pub created_at: Option<DateTime<Utc>>,
}

impl TemplateDraft {
    pub fn new(title: impl Into<String>) -> Self {
        Self { title: title.into(), ..Self::default() }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_section(mut self, section: Section) -> Self {
        self.sections.push(section);
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_status(mut self, status: TemplateStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Malformed fields dropped while this draft was deserialized
    pub fn dropped_fields(&self) -> usize {
        self.sections.iter().map(Section::dropped_fields).sum()
    }
}

impl Template {
    /// Create a user-authored template
    pub fn create(draft: TemplateDraft, creator: &UserId) -> Self {
        Self::build(draft, creator, false)
    }

    /// Create a system-seeded, read-only template
    pub fn create_prebuilt(draft: TemplateDraft) -> Self {
        Self::build(draft, &UserId::from_string(SYSTEM_USER), true)
    }

    fn build(draft: TemplateDraft, creator: &UserId, is_prebuilt: bool) -> Self {
        let now = Utc::now();
        let id = draft.id.unwrap_or_default();
        let created_by = draft.created_by.unwrap_or_else(|| creator.clone());

        let mut template = Self {
            id: id.clone(),
            title: draft.title,
            description: draft.description,
            category: draft.category,
            tags: draft.tags,
            sections: draft.sections,
            status: draft.status.unwrap_or_default(),
            is_active: draft.is_active.unwrap_or(true),
            is_prebuilt,
            created_by: created_by.clone(),
            created_at: now,
            updated_at: now,
            events: vec![],
        };

        template.raise_event(DomainEvent::Template(TemplateEvent::Created {
            template_id: id,
            title: template.title.clone(),
            created_by,
            prebuilt: is_prebuilt,
        }));
        template
    }

    // =========================================================================
    // Getters
    // =========================================================================

    pub fn id(&self) -> &TemplateId { &self.id }
    pub fn title(&self) -> &str { &self.title }
    pub fn description(&self) -> &str { &self.description }
    pub fn category(&self) -> &str { &self.category }
    pub fn tags(&self) -> &[String] { &self.tags }
    pub fn sections(&self) -> &[Section] { &self.sections }
    pub fn status(&self) -> TemplateStatus { self.status }
    pub fn is_active(&self) -> bool { self.is_active }
    pub fn is_prebuilt(&self) -> bool { self.is_prebuilt }
    pub fn created_by(&self) -> &UserId { &self.created_by }
    pub fn created_at(&self) -> DateTime<Utc> { self.created_at }
    pub fn updated_at(&self) -> DateTime<Utc> { self.updated_at }

    pub fn field_count(&self) -> usize {
        self.sections.iter().map(|s| s.fields.len()).sum()
    }

    /// Malformed fields dropped when this template was loaded
    pub fn dropped_fields(&self) -> usize {
        self.sections.iter().map(Section::dropped_fields).sum()
    }

    // =========================================================================
    // Business Operations
    // =========================================================================

    /// Replace the whole document. Omitted `createdAt`/`createdBy` keep their
    /// prior values; `isPrebuilt` and `id` always do.
    pub fn replace(&mut self, draft: TemplateDraft) -> Result<(), TemplateError> {
        self.ensure_mutable()?;

        self.title = draft.title;
        self.description = draft.description;
        self.category = draft.category;
        self.tags = draft.tags;
        self.sections = draft.sections;
        self.status = draft.status.unwrap_or_default();
        self.is_active = draft.is_active.unwrap_or(true);
        if let Some(created_by) = draft.created_by {
            self.created_by = created_by;
        }
        if let Some(created_at) = draft.created_at {
            self.created_at = created_at;
        }
        self.updated_at = Utc::now();

        self.raise_event(DomainEvent::Template(TemplateEvent::Updated {
            template_id: self.id.clone(),
            updated_at: self.updated_at,
        }));
        Ok(())
    }

    pub fn ensure_mutable(&self) -> Result<(), TemplateError> {
        if self.is_prebuilt {
            return Err(TemplateError::Prebuilt(self.id.clone()));
        }
        Ok(())
    }

    /// Record deletion; the caller removes the row.
    pub fn mark_deleted(&mut self) -> Result<(), TemplateError> {
        self.ensure_mutable()?;
        self.raise_event(DomainEvent::Template(TemplateEvent::Deleted {
            template_id: self.id.clone(),
        }));
        Ok(())
    }

    pub fn take_events(&mut self) -> Vec<DomainEvent> {
        std::mem::take(&mut self.events)
    }

    fn raise_event(&mut self, event: DomainEvent) {
        self.events.push(event);
    }
}

/// Template list filter shared by every store implementation
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TemplateFilter {
    pub status: Option<TemplateStatus>,
    pub category: Option<String>,
    /// Case-insensitive match on title and description
    pub search: Option<String>,
    pub prebuilt: Option<bool>,
}

impl TemplateFilter {
    pub fn prebuilt_only() -> Self {
        Self { prebuilt: Some(true), ..Self::default() }
    }

    pub fn matches(&self, template: &Template) -> bool {
        if let Some(status) = self.status {
            if template.status != status {
                return false;
            }
        }
        if let Some(category) = &self.category {
            if !template.category.eq_ignore_ascii_case(category) {
                return false;
            }
        }
        if let Some(prebuilt) = self.prebuilt {
            if template.is_prebuilt != prebuilt {
                return false;
            }
        }
        if let Some(search) = &self.search {
            let needle = search.to_lowercase();
            if !template.title.to_lowercase().contains(&needle)
                && !template.description.to_lowercase().contains(&needle)
            {
                return false;
            }
        }
        true
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    #[error("template {0} is prebuilt and read-only")]
    Prebuilt(TemplateId),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_objects::{Field, FieldKind};

    fn draft() -> TemplateDraft {
        TemplateDraft::new("Scaffold Check")
            .with_category("safety")
            .with_description("Weekly scaffold inspection")
            .with_section(
                Section::new("general", "General")
                    .with_field(Field::new("site", "Site", FieldKind::Text).required()),
            )
    }

    #[test]
    fn test_create_defaults() {
        let creator = UserId::from_string("m1");
        let mut t = Template::create(draft(), &creator);

        assert_eq!(t.status(), TemplateStatus::Active);
        assert!(t.is_active());
        assert!(!t.is_prebuilt());
        assert_eq!(t.created_by(), &creator);
        assert_eq!(t.created_at(), t.updated_at());
        assert!(uuid::Uuid::parse_str(t.id().as_str()).is_ok());
        assert_eq!(t.take_events().len(), 1);
    }

    #[test]
    fn test_supplied_id_kept() {
        let mut d = draft();
        d.id = Some(TemplateId::from_string("tpl-1"));
        let t = Template::create(d, &UserId::from_string("m1"));
        assert_eq!(t.id().as_str(), "tpl-1");
    }

    #[test]
    fn test_replace_preserves_provenance() {
        let mut t = Template::create(draft(), &UserId::from_string("m1"));
        let created_at = t.created_at();

        let mut replacement =
            TemplateDraft::new("Scaffold Check v2").with_status(TemplateStatus::Draft);
        replacement.is_active = Some(false);
        t.replace(replacement).unwrap();

        assert_eq!(t.title(), "Scaffold Check v2");
        assert_eq!(t.category(), "");
        assert!(t.sections().is_empty());
        assert_eq!(t.status(), TemplateStatus::Draft);
        assert!(!t.is_active());
        assert_eq!(t.created_at(), created_at);
        assert_eq!(t.created_by().as_str(), "m1");
        assert!(t.updated_at() >= created_at);
    }

    #[test]
    fn test_prebuilt_is_read_only() {
        let mut t = Template::create_prebuilt(draft());
        assert!(t.is_prebuilt());
        assert_eq!(t.created_by().as_str(), "system");
        assert!(matches!(t.replace(draft()), Err(TemplateError::Prebuilt(_))));
        assert!(t.mark_deleted().is_err());
    }

    #[test]
    fn test_filter_search_is_case_insensitive() {
        let t = Template::create(draft(), &UserId::from_string("m1"));
        let hit = TemplateFilter { search: Some("SCAFFOLD".into()), ..Default::default() };
        let desc_hit = TemplateFilter { search: Some("weekly".into()), ..Default::default() };
        let miss = TemplateFilter { search: Some("forklift".into()), ..Default::default() };
        assert!(hit.matches(&t));
        assert!(desc_hit.matches(&t));
        assert!(!miss.matches(&t));
    }

    #[test]
    fn test_filter_status_and_category() {
        let t = Template::create(draft(), &UserId::from_string("m1"));
        let f = TemplateFilter {
            status: Some(TemplateStatus::Active),
            category: Some("Safety".into()),
            ..Default::default()
        };
        assert!(f.matches(&t));
        let archived =
            TemplateFilter { status: Some(TemplateStatus::Archived), ..Default::default() };
        assert!(!archived.matches(&t));
        assert!(!TemplateFilter::prebuilt_only().matches(&t));
    }

    #[test]
    fn test_stored_document_with_defaults_loads() {
        let json = serde_json::json!({
            "id": "t1",
            "title": "Legacy",
            "createdBy": "u1",
            "createdAt": "2024-01-01T00:00:00Z",
            "updatedAt": "2024-01-01T00:00:00Z",
            "sections": [{"id": 1, "title": "A", "fields": [{"id": "x", "label": "X"}]}]
        });
        let t: Template = serde_json::from_value(json).unwrap();
        assert!(t.is_active());
        assert_eq!(t.status(), TemplateStatus::Active);
        assert_eq!(t.field_count(), 0);
        assert_eq!(t.dropped_fields(), 1);
    }
}
