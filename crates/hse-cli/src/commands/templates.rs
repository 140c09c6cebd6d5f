//! Templates commands

use anyhow::Context as _;
use hse_inspect::domain::prebuilt::default_templates;
use hse_inspect::domain::{TemplateDraft, TemplateFilter};
use hse_inspect::{Template, TemplateId, TemplateStatus, TemplateUseCases};
use std::path::Path;
use tabled::Tabled;

use super::Context;
use crate::output::{self, Detail};
use crate::TemplateCommands;

#[derive(Tabled)]
struct TemplateRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Title")]
    title: String,
    #[tabled(rename = "Category")]
    category: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Fields")]
    fields: usize,
    #[tabled(rename = "Prebuilt")]
    prebuilt: String,
}

impl From<&Template> for TemplateRow {
    fn from(t: &Template) -> Self {
        Self {
            id: t.id().to_string(),
            title: t.title().to_string(),
            category: t.category().to_string(),
            status: output::status(t.status().to_string()).to_string(),
            fields: t.field_count(),
            prebuilt: if t.is_prebuilt() { "yes".into() } else { String::new() },
        }
    }
}

fn read_draft(path: &Path) -> anyhow::Result<TemplateDraft> {
    let content =
        std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("{} is not a template document", path.display()))
}

fn template_details(t: &Template) -> Vec<Detail> {
    let mut rows = vec![
        Detail::new("id", t.id()),
        Detail::new("title", t.title()),
        Detail::new("category", t.category()),
        Detail::new("status", output::status(t.status().to_string())),
        Detail::new("prebuilt", t.is_prebuilt()),
        Detail::new("created by", t.created_by()),
        Detail::new("updated", t.updated_at().to_rfc3339()),
    ];
    if !t.description().is_empty() {
        rows.insert(2, Detail::new("description", t.description()));
    }
    for section in t.sections() {
        let fields: Vec<String> = section
            .fields
            .iter()
            .map(|f| {
                let marker = if f.required { "*" } else { "" };
                format!("{}{} ({})", f.id, marker, f.kind.type_name())
            })
            .collect();
        rows.push(Detail::new("section", format!("{}: {}", section.title, fields.join(", "))));
    }
    rows
}

pub async fn seed(ctx: &Context) -> anyhow::Result<()> {
    let report = ctx.templates.seed_prebuilt(default_templates()).await?;
    let message =
        format!("{} seeded, {} already present", report.seeded.len(), report.skipped.len());
    ctx.format.confirm(&report, &message)
}

pub async fn handle(action: TemplateCommands, ctx: &Context) -> anyhow::Result<()> {
    match action {
        TemplateCommands::List { status, category, search, prebuilt } => {
            let filter = TemplateFilter {
                status: status
                    .as_deref()
                    .map(str::parse::<TemplateStatus>)
                    .transpose()
                    .map_err(anyhow::Error::msg)?,
                category,
                search,
                prebuilt: prebuilt.then_some(true),
            };
            let templates = ctx.templates.list_templates(&ctx.caller, &filter).await?;
            ctx.format.print(&templates, || templates.iter().map(TemplateRow::from).collect())?;
        }
        TemplateCommands::Show { id } => {
            let template = ctx
                .templates
                .get_template(&ctx.caller, &TemplateId::from_string(id.as_str()))
                .await?
                .with_context(|| format!("template {id} not found"))?;
            ctx.format.print(&template, || template_details(&template))?;
        }
        TemplateCommands::Import { file } => {
            let report = ctx.templates.import_template(&ctx.caller, read_draft(&file)?).await?;
            let mut message = format!("Imported template {}", report.template.id());
            if report.dropped_fields > 0 {
                message.push_str(&format!(" ({} malformed fields dropped)", report.dropped_fields));
            }
            ctx.format.confirm(&report, &message)?;
        }
        TemplateCommands::Update { id, file } => {
            let draft = read_draft(&file)?;
            let template = ctx
                .templates
                .update_template(&ctx.caller, &TemplateId::from_string(id.as_str()), draft)
                .await?;
            ctx.format.confirm(&template, &format!("Updated template {}", template.id()))?;
        }
        TemplateCommands::Delete { id } => {
            ctx.templates
                .delete_template(&ctx.caller, &TemplateId::from_string(id.as_str()))
                .await?;
            println!("Deleted template: {}", id);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_draft_rejects_non_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t.json");
        std::fs::write(&path, "not json").unwrap();
        assert!(read_draft(&path).is_err());
    }

    #[test]
    fn test_read_draft() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t.json");
        std::fs::write(&path, r#"{"title": "Ladder check", "category": "safety"}"#).unwrap();
        let draft = read_draft(&path).unwrap();
        assert_eq!(draft.title, "Ladder check");
    }

    #[test]
    fn test_prebuilt_row() {
        let mut drafts = default_templates();
        let template = Template::create_prebuilt(drafts.remove(0));
        let row = TemplateRow::from(&template);
        assert_eq!(row.prebuilt, "yes");
        assert_eq!(row.fields, template.field_count());
    }
}
