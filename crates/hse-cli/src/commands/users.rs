//! Users commands

use hse_inspect::ports::outbound::User;
use hse_inspect::{Capability, Role, UserDirectory};
use serde::Serialize;
use tabled::Tabled;

use super::{all_users, Context};
use crate::output::Detail;
use crate::UserCommands;

#[derive(Tabled)]
struct UserRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Role")]
    role: Role,
}

impl From<&User> for UserRow {
    fn from(u: &User) -> Self {
        Self { id: u.id.to_string(), name: u.display_name.clone(), role: u.role }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct WhoAmI<'a> {
    #[serde(flatten)]
    caller: &'a hse_inspect::Caller,
    capabilities: hse_inspect::domain::Capabilities,
}

pub async fn handle(action: UserCommands, ctx: &Context) -> anyhow::Result<()> {
    let directory: &dyn UserDirectory = ctx.store.as_ref();
    match action {
        UserCommands::List { role } => {
            let users = match role {
                Some(r) => directory.list_by_role(r.parse().map_err(anyhow::Error::msg)?).await?,
                None => all_users(directory).await?,
            };
            ctx.format.print(&users, || users.iter().map(UserRow::from).collect())?;
        }
        UserCommands::Whoami => {
            let me = WhoAmI {
                caller: &ctx.caller,
                capabilities: ctx.policy.capabilities(ctx.caller.role),
            };
            ctx.format.print(&me, || {
                let c = me.capabilities;
                vec![
                    Detail::new("id", &ctx.caller.id),
                    Detail::new("name", &ctx.caller.display_name),
                    Detail::new("role", ctx.caller.role),
                    Detail::new("create templates", c.can_create_templates),
                    Detail::new("edit templates", c.can_edit_templates),
                    Detail::new("delete templates", c.can_delete_templates),
                    Detail::new("assign", c.can_assign),
                    Detail::new("view all assignments", c.can_view_all_assignments),
                    Detail::new("fill inspections", c.can_fill_inspections),
                    Detail::new("manage users", c.can_manage_users),
                ]
            })?;
        }
        UserCommands::Add { id, name, role } => {
            ctx.policy.require(&ctx.caller, Capability::ManageUsers)?;
            let role: Role = role.parse().map_err(anyhow::Error::msg)?;
            let user = directory.upsert(User::new(id, role, name)).await?;
            tracing::info!(user = %user.id, role = %user.role, by = %ctx.caller.id, "User saved");
            ctx.format.confirm(&user, &format!("Saved user {} ({})", user.id, user.role))?;
        }
    }
    Ok(())
}
