//! Inspections commands

use anyhow::Context as _;
use hse_inspect::application::{AssignmentSync, MaterializeCommand, MaterializeFrom};
use hse_inspect::domain::{Findings, InspectionOverrides, InspectionPriority};
use hse_inspect::{Inspection, InspectionId, InspectionStatus, InspectionUseCases, TemplateId};
use serde_json::{json, Value};
use tabled::Tabled;

use super::Context;
use crate::output::{self, or_dash, Detail};
use crate::InspectionCommands;

#[derive(Tabled)]
struct InspectionRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Title")]
    title: String,
    #[tabled(rename = "Location")]
    location: String,
    #[tabled(rename = "Inspector")]
    inspector: String,
    #[tabled(rename = "Date")]
    date: String,
    #[tabled(rename = "Priority")]
    priority: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Progress")]
    progress: String,
}

impl From<&Inspection> for InspectionRow {
    fn from(i: &Inspection) -> Self {
        Self {
            id: i.id().to_string(),
            title: i.title().to_string(),
            location: i.location().to_string(),
            inspector: i.inspector().to_string(),
            date: i.date().to_string(),
            priority: output::priority(i.priority().to_string()).to_string(),
            status: output::status(i.status().to_string()).to_string(),
            progress: format!("{}%", i.progress().percent),
        }
    }
}

/// JSON when it parses, otherwise the raw text
fn parse_value(raw: String) -> Value {
    serde_json::from_str(&raw).unwrap_or(Value::String(raw))
}

fn parse_priority(raw: &str) -> anyhow::Result<InspectionPriority> {
    serde_json::from_value(Value::String(raw.to_ascii_lowercase()))
        .with_context(|| format!("unknown priority: {raw}"))
}

fn inspection_details(i: &Inspection) -> Vec<Detail> {
    let mut rows = vec![
        Detail::new("id", i.id()),
        Detail::new("template", or_dash(i.template_id())),
        Detail::new("title", i.title()),
        Detail::new("location", i.location()),
        Detail::new("inspector", i.inspector()),
        Detail::new("scheduled", format!("{} {}", i.date(), i.time())),
        Detail::new("priority", output::priority(i.priority().to_string())),
        Detail::new("status", output::status(i.status().to_string())),
        Detail::new("issues", i.issues()),
        Detail::new("score", or_dash(i.score())),
        Detail::new("photos", i.photos().len()),
    ];
    for section in i.progress().sections {
        let mark = if section.complete { "✓" } else { " " };
        let counts = format!("{}/{} required", section.answered_required, section.required);
        rows.push(Detail::new("section", format!("[{mark}] {} ({counts})", section.title)));
    }
    for section in i.sections() {
        for field in &section.fields {
            let value = i.response_value(&field.id).map(Value::to_string);
            rows.push(Detail::new("answer", format!("{} = {}", field.id, or_dash(value))));
        }
    }
    rows
}

async fn load(ctx: &Context, id: &InspectionId) -> anyhow::Result<Inspection> {
    ctx.inspections
        .get_inspection(&ctx.caller, id)
        .await?
        .with_context(|| format!("inspection {id} not found"))
}

pub async fn handle(action: InspectionCommands, ctx: &Context) -> anyhow::Result<()> {
    match action {
        InspectionCommands::List { status } => {
            let status: InspectionStatus = status.parse().map_err(anyhow::Error::msg)?;
            let inspections = ctx.inspections.list_inspections(&ctx.caller, status).await?;
            ctx.format
                .print(&inspections, || inspections.iter().map(InspectionRow::from).collect())?;
        }
        InspectionCommands::Show { id } => {
            let inspection = load(ctx, &InspectionId::from_string(id)).await?;
            ctx.format.print(&inspection, || inspection_details(&inspection))?;
        }
        InspectionCommands::New { template, title, location, priority } => {
            let overrides = InspectionOverrides {
                title,
                location,
                inspector: Some(ctx.caller.display_name.clone()),
                priority: priority.as_deref().map(parse_priority).transpose()?,
                ..InspectionOverrides::default()
            };
            let inspection = ctx
                .inspections
                .materialize(
                    &ctx.caller,
                    MaterializeCommand {
                        source: MaterializeFrom::Template(TemplateId::from_string(template)),
                        overrides,
                    },
                )
                .await?;
            ctx.format.confirm(&inspection, &format!("Created inspection {}", inspection.id()))?;
        }
        InspectionCommands::Start { id } => {
            let inspection = ctx
                .inspections
                .begin_work(&ctx.caller, &InspectionId::from_string(id))
                .await?;
            let message = format!("Inspection {} is {}", inspection.id(), inspection.status());
            ctx.format.confirm(&inspection, &message)?;
        }
        InspectionCommands::Respond { id, field, value } => {
            let id = InspectionId::from_string(id);
            let inspection = ctx
                .inspections
                .record_response(&ctx.caller, &id, &field, parse_value(value))
                .await?;
            if inspection.is_completed() {
                eprintln!("Inspection {} is completed; answer not recorded", inspection.id());
            }
            let percent = inspection.progress().percent;
            let message = format!("{field} ({percent}% of required answered)");
            ctx.format.confirm(&inspection, &message)?;
        }
        InspectionCommands::Check { id } => {
            let block = ctx
                .inspections
                .validate_for_submit(&ctx.caller, &InspectionId::from_string(id))
                .await?;
            let summary = json!({
                "ready": block.is_none(),
                "fieldId": block.as_ref().map(|b| b.field_id.clone()),
                "reason": block.as_ref().map(ToString::to_string),
            });
            match &block {
                None => ctx.format.confirm(&summary, "Ready to submit")?,
                Some(b) => ctx.format.print(&summary, || vec![Detail::new("blocked", b)])?,
            }
        }
        InspectionCommands::Submit { id, issues, score } => {
            let findings = (issues.is_some() || score.is_some())
                .then(|| Findings { issues: issues.unwrap_or(0), score });
            let report = ctx
                .inspections
                .complete(&ctx.caller, &InspectionId::from_string(id), findings)
                .await?;
            let mut message = format!("Inspection {} completed", report.inspection.id());
            match &report.assignment {
                AssignmentSync::Updated(a) => {
                    message.push_str(&format!("; assignment {a} completed"))
                }
                AssignmentSync::AlreadyCompleted(a) => {
                    message.push_str(&format!("; assignment {a} was already completed"))
                }
                AssignmentSync::NotLinked => {}
                AssignmentSync::Failed(e) => eprintln!("Warning: assignment not updated: {e}"),
            }
            ctx.format.confirm(&report, &message)?;
        }
        InspectionCommands::Photo { id, uri } => {
            let inspection = ctx
                .inspections
                .attach_photo(&ctx.caller, &InspectionId::from_string(id), &uri)
                .await?;
            let message = format!("{} photo(s) attached", inspection.photos().len());
            ctx.format.confirm(&inspection, &message)?;
        }
    }
    Ok(())
}
