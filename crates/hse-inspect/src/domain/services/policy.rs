//! Role/Permission Policy
//!
//! Pure mapping from a caller's role to the capabilities it holds. Every
//! capability-gated use case checks here before touching a store.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::config::PolicyConfig;
use crate::domain::value_objects::UserId;
use crate::error::{HseError, HseResult};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Manager,
    Inspector,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Admin, Role::Manager, Role::Inspector];
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Admin => "admin",
            Self::Manager => "manager",
            Self::Inspector => "inspector",
        };
        f.write_str(s)
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "admin" => Ok(Self::Admin),
            "manager" => Ok(Self::Manager),
            "inspector" => Ok(Self::Inspector),
            other => Err(format!("unknown role: {other}")),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Capability {
    CreateTemplates,
    EditTemplates,
    DeleteTemplates,
    ViewTemplates,
    AssignInspections,
    ViewAllAssignments,
    FillInspections,
    ManageUsers,
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::CreateTemplates => "create templates",
            Self::EditTemplates => "edit templates",
            Self::DeleteTemplates => "delete templates",
            Self::ViewTemplates => "view templates",
            Self::AssignInspections => "assign inspections",
            Self::ViewAllAssignments => "view all assignments",
            Self::FillInspections => "fill inspections",
            Self::ManageUsers => "manage users",
        };
        f.write_str(s)
    }
}

/// Capability set for one role
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Capabilities {
    pub can_create_templates: bool,
    pub can_edit_templates: bool,
    pub can_delete_templates: bool,
    pub can_view_templates: bool,
    pub can_assign: bool,
    pub can_view_all_assignments: bool,
    pub can_fill_inspections: bool,
    pub can_manage_users: bool,
}

impl Capabilities {
    pub fn has(&self, capability: Capability) -> bool {
        match capability {
            Capability::CreateTemplates => self.can_create_templates,
            Capability::EditTemplates => self.can_edit_templates,
            Capability::DeleteTemplates => self.can_delete_templates,
            Capability::ViewTemplates => self.can_view_templates,
            Capability::AssignInspections => self.can_assign,
            Capability::ViewAllAssignments => self.can_view_all_assignments,
            Capability::FillInspections => self.can_fill_inspections,
            Capability::ManageUsers => self.can_manage_users,
        }
    }
}

/// Identity of whoever invokes a use case
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Caller {
    pub id: UserId,
    pub role: Role,
    pub display_name: String,
}

impl Caller {
    pub fn new(id: impl Into<String>, role: Role, display_name: impl Into<String>) -> Self {
        Self { id: UserId::from_string(id), role, display_name: display_name.into() }
    }

    /// Identity used for seeding and other system-initiated work
    pub fn system() -> Self {
        Self::new("system", Role::Admin, "System")
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

#[derive(Clone, Debug, Default)]
pub struct RolePolicy {
    config: PolicyConfig,
}

impl RolePolicy {
    pub fn new(config: PolicyConfig) -> Self {
        Self { config }
    }

    pub fn capabilities(&self, role: Role) -> Capabilities {
        match role {
            Role::Admin => Capabilities {
                can_create_templates: true,
                can_edit_templates: true,
                can_delete_templates: true,
                can_view_templates: true,
                can_assign: true,
                can_view_all_assignments: true,
                can_fill_inspections: true,
                can_manage_users: true,
            },
            // Deletion is further restricted to the manager's own records.
            Role::Manager => Capabilities {
                can_create_templates: true,
                can_edit_templates: true,
                can_delete_templates: true,
                can_view_templates: true,
                can_assign: true,
                can_view_all_assignments: false,
                can_fill_inspections: false,
                can_manage_users: self.config.managers_can_manage_users,
            },
            Role::Inspector => Capabilities {
                can_view_templates: true,
                can_fill_inspections: true,
                ..Capabilities::default()
            },
        }
    }

    pub fn allows(&self, role: Role, capability: Capability) -> bool {
        self.capabilities(role).has(capability)
    }

    pub fn require(&self, caller: &Caller, capability: Capability) -> HseResult<()> {
        if self.allows(caller.role, capability) {
            Ok(())
        } else {
            tracing::debug!(
                user = %caller.id,
                role = %caller.role,
                %capability,
                "Capability denied"
            );
            Err(HseError::PermissionDenied { role: caller.role, capability })
        }
    }

    /// Like [`require`](Self::require), and non-admins may only act on
    /// records they own.
    pub fn require_owned(
        &self,
        caller: &Caller,
        owner: &UserId,
        capability: Capability,
    ) -> HseResult<()> {
        self.require(caller, capability)?;
        if caller.is_admin() || &caller.id == owner {
            Ok(())
        } else {
            Err(HseError::PermissionDenied { role: caller.role, capability })
        }
    }

    /// Roles whose members may be handed an inspection
    pub fn inspector_capable_roles(&self) -> Vec<Role> {
        Role::ALL
            .into_iter()
            .filter(|role| self.allows(*role, Capability::FillInspections))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_admin_has_everything() {
        let policy = RolePolicy::default();
        let caps = policy.capabilities(Role::Admin);
        assert!(caps.can_manage_users && caps.can_assign && caps.can_delete_templates);
    }

    #[test]
    fn test_inspector_restricted() {
        let policy = RolePolicy::default();
        let inspector = Caller::new("i1", Role::Inspector, "Ines");
        for cap in [
            Capability::CreateTemplates,
            Capability::EditTemplates,
            Capability::DeleteTemplates,
            Capability::AssignInspections,
            Capability::ManageUsers,
        ] {
            assert!(policy.require(&inspector, cap).unwrap_err().is_permission_denied());
        }
        assert!(policy.require(&inspector, Capability::FillInspections).is_ok());
        assert!(policy.require(&inspector, Capability::ViewTemplates).is_ok());
    }

    #[test]
    fn test_manager_user_management_configurable() {
        assert!(RolePolicy::default().allows(Role::Manager, Capability::ManageUsers));
        let strict = RolePolicy::new(PolicyConfig { managers_can_manage_users: false });
        assert!(!strict.allows(Role::Manager, Capability::ManageUsers));
    }

    #[test]
    fn test_manager_scope_limited_to_own_records() {
        let policy = RolePolicy::default();
        let manager = Caller::new("m1", Role::Manager, "Mo");
        let other = UserId::from_string("m2");
        assert!(policy.require_owned(&manager, &manager.id, Capability::DeleteTemplates).is_ok());
        assert!(policy
            .require_owned(&manager, &other, Capability::DeleteTemplates)
            .unwrap_err()
            .is_permission_denied());
        let system = Caller::system();
        assert!(policy.require_owned(&system, &other, Capability::DeleteTemplates).is_ok());
    }

    #[test]
    fn test_inspector_capable_roles() {
        let roles = RolePolicy::default().inspector_capable_roles();
        assert_eq!(roles, vec![Role::Admin, Role::Inspector]);
    }
}
