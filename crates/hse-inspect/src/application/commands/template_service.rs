//! Template application service

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Arc;

use crate::application::dto::{ImportReport, SeedReport};
use crate::domain::aggregates::{Template, TemplateDraft, TemplateFilter};
use crate::domain::services::{Caller, Capability, RolePolicy};
use crate::domain::value_objects::TemplateId;
use crate::error::{EntityKind, HseError, HseResult};
use crate::ports::inbound::TemplateUseCases;
use crate::ports::outbound::{EventPublisher, TemplateStore};

use super::publish_committed;

/// Template application service
pub struct TemplateService {
    store: Arc<dyn TemplateStore>,
    event_publisher: Arc<dyn EventPublisher>,
    policy: RolePolicy,
}

impl TemplateService {
    pub fn new(
        store: Arc<dyn TemplateStore>,
        event_publisher: Arc<dyn EventPublisher>,
        policy: RolePolicy,
    ) -> Self {
        Self { store, event_publisher, policy }
    }

    async fn load(&self, id: &TemplateId) -> HseResult<Template> {
        self.store
            .get(id)
            .await?
            .ok_or_else(|| HseError::not_found(EntityKind::Template, id))
    }

    async fn persist(&self, mut template: Template) -> HseResult<Template> {
        let events = template.take_events();
        let template = self.store.upsert(template).await?;
        publish_committed(self.event_publisher.as_ref(), events).await;
        Ok(template)
    }

    fn report_dropped(template: &Template) {
        let dropped = template.dropped_fields();
        if dropped > 0 {
            tracing::warn!(template = %template.id(), dropped, "Template has malformed fields");
        }
    }
}

#[async_trait]
impl TemplateUseCases for TemplateService {
    async fn create_template(&self, caller: &Caller, draft: TemplateDraft) -> HseResult<Template> {
        self.policy.require(caller, Capability::CreateTemplates)?;

        let template = Template::create(draft, &caller.id);
        Self::report_dropped(&template);
        let template = self.persist(template).await?;

        tracing::info!(
            template = %template.id(),
            title = template.title(),
            by = %caller.id,
            "Template created"
        );
        Ok(template)
    }

    async fn update_template(
        &self,
        caller: &Caller,
        id: &TemplateId,
        draft: TemplateDraft,
    ) -> HseResult<Template> {
        self.policy.require(caller, Capability::EditTemplates)?;

        let mut template = self.load(id).await?;
        template.replace(draft)?;
        Self::report_dropped(&template);
        let template = self.persist(template).await?;

        tracing::info!(template = %id, by = %caller.id, "Template updated");
        Ok(template)
    }

    async fn delete_template(&self, caller: &Caller, id: &TemplateId) -> HseResult<()> {
        self.policy.require(caller, Capability::DeleteTemplates)?;

        let mut template = self.load(id).await?;
        template.ensure_mutable()?;
        self.policy
            .require_owned(caller, template.created_by(), Capability::DeleteTemplates)?;

        template.mark_deleted()?;
        self.store.delete(id).await?;
        publish_committed(self.event_publisher.as_ref(), template.take_events()).await;

        tracing::info!(template = %id, by = %caller.id, "Template deleted");
        Ok(())
    }

    async fn get_template(&self, caller: &Caller, id: &TemplateId) -> HseResult<Option<Template>> {
        self.policy.require(caller, Capability::ViewTemplates)?;

        let template = self.store.get(id).await?;
        tracing::debug!(template = %id, found = template.is_some(), "Template lookup");
        if let Some(template) = &template {
            Self::report_dropped(template);
        }
        Ok(template)
    }

    async fn list_templates(
        &self,
        caller: &Caller,
        filter: &TemplateFilter,
    ) -> HseResult<Vec<Template>> {
        self.policy.require(caller, Capability::ViewTemplates)?;
        Ok(self.store.list(filter).await?)
    }

    async fn import_template(
        &self,
        caller: &Caller,
        draft: TemplateDraft,
    ) -> HseResult<ImportReport> {
        let dropped_fields = draft.dropped_fields();
        let template = self.create_template(caller, draft).await?;
        Ok(ImportReport { template, dropped_fields })
    }

    async fn seed_prebuilt(&self, defaults: Vec<TemplateDraft>) -> HseResult<SeedReport> {
        let mut seeded_titles: HashSet<String> = self
            .store
            .list(&TemplateFilter::prebuilt_only())
            .await?
            .into_iter()
            .map(|t| t.title().to_string())
            .collect();

        let mut report = SeedReport::default();
        for draft in defaults {
            if !seeded_titles.insert(draft.title.clone()) {
                tracing::debug!(title = %draft.title, "Prebuilt template already present");
                report.skipped.push(draft.title);
                continue;
            }
            let template = self.persist(Template::create_prebuilt(draft)).await?;
            tracing::info!(
                template = %template.id(),
                title = template.title(),
                "Prebuilt template seeded"
            );
            report.seeded.push(template.id().clone());
        }
        Ok(report)
    }
}
