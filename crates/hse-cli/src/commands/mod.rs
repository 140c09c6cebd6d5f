//! CLI Commands

pub mod assignments;
pub mod inspections;
pub mod templates;
pub mod users;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context as _};
use hse_inspect::config::HseConfig;
use hse_inspect::domain::prebuilt::default_templates;
use hse_inspect::infrastructure::{FileStore, TracingEventPublisher};
use hse_inspect::ports::outbound::User;
use hse_inspect::{
    AssignmentService, Caller, InspectionService, Role, RolePolicy, TemplateService,
    TemplateUseCases, UserDirectory, UserId,
};

use crate::output::OutputFormat;

/// Resolved global options
pub struct Settings {
    pub data_file: PathBuf,
    pub acting_as: Option<String>,
    pub format: OutputFormat,
    pub core: HseConfig,
}

/// Services wired against the data file, plus who is calling
pub struct Context {
    pub store: Arc<FileStore>,
    pub templates: TemplateService,
    pub inspections: InspectionService,
    pub assignments: AssignmentService,
    pub policy: RolePolicy,
    pub caller: Caller,
    pub format: OutputFormat,
}

impl Context {
    pub async fn open(settings: Settings) -> anyhow::Result<Self> {
        let Settings { data_file, acting_as, format, core } = settings;

        let mut store = FileStore::new(&data_file);
        if let Some(user) = &acting_as {
            store = store.acting_as(UserId::from_string(user.as_str()));
        }
        let store = Arc::new(store);
        tracing::debug!(path = %data_file.display(), "Opened data file");

        let events = Arc::new(TracingEventPublisher);
        let policy = RolePolicy::new(core.policy.clone());

        let templates = TemplateService::new(store.clone(), events.clone(), policy.clone());
        let inspections = InspectionService::new(
            store.clone(),
            store.clone(),
            store.clone(),
            events.clone(),
            policy.clone(),
            core.materialize.clone(),
        );
        let assignments = AssignmentService::new(
            store.clone(),
            store.clone(),
            store.clone(),
            store.clone(),
            events,
            policy.clone(),
            core.materialize.clone(),
        );

        if core.seed_prebuilt_on_start {
            let report = templates.seed_prebuilt(default_templates()).await?;
            if !report.seeded.is_empty() {
                tracing::info!(count = report.seeded.len(), "Seeded prebuilt templates");
            }
        }

        let caller = resolve_caller(store.as_ref(), acting_as.as_deref()).await?;
        tracing::debug!(user = %caller.id, role = %caller.role, "Acting user");

        Ok(Self { store, templates, inspections, assignments, policy, caller, format })
    }
}

/// The acting user, or the system identity while no users exist yet
async fn resolve_caller(
    directory: &dyn UserDirectory,
    acting_as: Option<&str>,
) -> anyhow::Result<Caller> {
    let users = all_users(directory).await?;
    if users.is_empty() {
        return Ok(Caller::system());
    }
    if acting_as.is_none() {
        bail!("no acting user; pass --as <USER> or set HSE_USER");
    }
    let user = directory
        .current_user()
        .await
        .with_context(|| format!("unknown user {}", acting_as.unwrap_or_default()))?;
    Ok(user.caller())
}

pub async fn all_users(directory: &dyn UserDirectory) -> anyhow::Result<Vec<User>> {
    let mut users = Vec::new();
    for role in Role::ALL {
        users.extend(directory.list_by_role(role).await?);
    }
    Ok(users)
}
