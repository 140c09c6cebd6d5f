//! Assignments commands

use anyhow::Context as _;
use chrono::{DateTime, NaiveDate, Utc};
use hse_inspect::application::{AssignmentTarget, AssignmentView, CreateAssignmentCommand};
use hse_inspect::domain::AssignmentTerms;
use hse_inspect::{AssignmentId, AssignmentUseCases, InspectionId, TemplateId, UserId};
use tabled::Tabled;

use super::Context;
use crate::output::{self, or_dash, Detail};
use crate::{AssignArgs, AssignmentCommands};

#[derive(Tabled)]
struct AssignmentRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Inspection")]
    inspection: String,
    #[tabled(rename = "Assignee")]
    assigned_to: String,
    #[tabled(rename = "By")]
    assigned_by: String,
    #[tabled(rename = "Priority")]
    priority: String,
    #[tabled(rename = "Due")]
    due: String,
    #[tabled(rename = "Status")]
    status: String,
}

impl From<&AssignmentView> for AssignmentRow {
    fn from(view: &AssignmentView) -> Self {
        let a = &view.assignment;
        Self {
            id: a.id().to_string(),
            inspection: a.inspection_id().to_string(),
            assigned_to: a.assigned_to().to_string(),
            assigned_by: a.assigned_by().to_string(),
            priority: output::priority(a.priority().to_string()).to_string(),
            due: or_dash(a.due_date().map(|d| d.format("%Y-%m-%d %H:%M"))),
            status: output::status(view.display_status.to_string()).to_string(),
        }
    }
}

/// RFC 3339, or a bare date meaning the end of that day (UTC)
fn parse_due(input: &str) -> anyhow::Result<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(input) {
        return Ok(ts.with_timezone(&Utc));
    }
    let date = NaiveDate::parse_from_str(input, "%Y-%m-%d")
        .with_context(|| format!("invalid due date '{input}', expected RFC 3339 or YYYY-MM-DD"))?;
    let end_of_day = date.and_hms_opt(23, 59, 59).context("invalid due date")?;
    Ok(end_of_day.and_utc())
}

fn command_from(args: AssignArgs) -> anyhow::Result<CreateAssignmentCommand> {
    let target = match (args.template, args.inspection) {
        (Some(t), None) => AssignmentTarget::Template(TemplateId::from_string(t)),
        (None, Some(i)) => AssignmentTarget::Inspection(InspectionId::from_string(i)),
        _ => anyhow::bail!("pass exactly one of --template or --inspection"),
    };
    Ok(CreateAssignmentCommand {
        target,
        assignee: UserId::from_string(args.to),
        terms: AssignmentTerms {
            priority: args.priority.parse().map_err(anyhow::Error::msg)?,
            due_date: args.due.as_deref().map(parse_due).transpose()?,
            notes: args.notes,
        },
    })
}

pub async fn assign(args: AssignArgs, ctx: &Context) -> anyhow::Result<()> {
    let created = ctx.assignments.create_assignment(&ctx.caller, command_from(args)?).await?;
    let message = format!(
        "Assigned inspection {} to {} (assignment {})",
        created.inspection.id(),
        created.assignment.assignment.assigned_to(),
        created.assignment.assignment.id()
    );
    ctx.format.confirm(&created, &message)
}

pub async fn handle(action: AssignmentCommands, ctx: &Context) -> anyhow::Result<()> {
    match action {
        AssignmentCommands::List { mine: _, by, all } => {
            let views = if all {
                ctx.assignments.list_all(&ctx.caller).await?
            } else if let Some(manager) = by {
                ctx.assignments
                    .list_for_manager(&ctx.caller, &UserId::from_string(manager))
                    .await?
            } else {
                ctx.assignments.list_for_inspector(&ctx.caller, &ctx.caller.id).await?
            };
            ctx.format.print(&views, || views.iter().map(AssignmentRow::from).collect())?;
        }
        AssignmentCommands::Show { id } => {
            let view = ctx
                .assignments
                .get_assignment(&ctx.caller, &AssignmentId::from_string(id.as_str()))
                .await?
                .with_context(|| format!("assignment {id} not found"))?;
            ctx.format.print(&view, || {
                let a = &view.assignment;
                vec![
                    Detail::new("id", a.id()),
                    Detail::new("inspection", a.inspection_id()),
                    Detail::new("assigned to", a.assigned_to()),
                    Detail::new("assigned by", a.assigned_by()),
                    Detail::new("assigned at", a.assigned_at().to_rfc3339()),
                    Detail::new("priority", output::priority(a.priority().to_string())),
                    Detail::new("due", or_dash(a.due_date().map(|d| d.to_rfc3339()))),
                    Detail::new("status", output::status(view.display_status.to_string())),
                    Detail::new("notes", or_dash(a.notes())),
                ]
            })?;
        }
        AssignmentCommands::Start { id } => {
            let view = ctx
                .assignments
                .start_assignment(&ctx.caller, &AssignmentId::from_string(id.as_str()))
                .await?;
            ctx.format.confirm(&view, &format!("Started assignment {id}"))?;
        }
        AssignmentCommands::Remove { id } => {
            ctx.assignments
                .remove_assignment(&ctx.caller, &AssignmentId::from_string(id.as_str()))
                .await?;
            println!("Removed assignment: {}", id);
        }
    }
    Ok(())
}
