//! Authorization module - role registry and access guard
//!
//! One unified registry for every actor role in the marketplace; the two
//! parallel staff enumerations of the legacy back office are collapsed into a
//! single `Role` type. The matrix is fixed at compile time and fails closed:
//! a role grants nothing unless the registry says otherwise.

mod guard;
mod registry;

pub use guard::{authorize, ensure_not_protected, ensure_not_self};
pub use registry::{capabilities_for, has_capability};

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Actor roles. `super_admin`/`admin` form the administrator tier; moderator,
/// support and collaborator are restricted staff; craftsman and customer have
/// no back-office access at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    SuperAdmin,
    Admin,
    Moderator,
    Support,
    Collaborator,
    Craftsman,
    Customer,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::SuperAdmin => "super_admin",
            Role::Admin => "admin",
            Role::Moderator => "moderator",
            Role::Support => "support",
            Role::Collaborator => "collaborator",
            Role::Craftsman => "craftsman",
            Role::Customer => "customer",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "super_admin" => Some(Role::SuperAdmin),
            "admin" => Some(Role::Admin),
            "moderator" => Some(Role::Moderator),
            "support" => Some(Role::Support),
            "collaborator" => Some(Role::Collaborator),
            "craftsman" => Some(Role::Craftsman),
            "customer" => Some(Role::Customer),
            _ => None,
        }
    }

    /// Ordering used by the protected-target rule: an actor may never alter
    /// an account on a strictly higher tier.
    pub fn tier(&self) -> u8 {
        match self {
            Role::SuperAdmin => 100,
            Role::Admin => 80,
            Role::Moderator | Role::Support | Role::Collaborator => 50,
            Role::Craftsman | Role::Customer => 10,
        }
    }

    /// Roles that may hold a back-office account.
    pub fn is_staff(&self) -> bool {
        self.tier() >= 50
    }
}

/// Named permissions granted per role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    ViewUsers,
    EditUsers,
    ViewCraftsmen,
    EditCraftsmen,
    ViewContent,
    EditContent,
    ViewAnalytics,
    ViewLogs,
}

impl Capability {
    pub fn as_str(&self) -> &'static str {
        match self {
            Capability::ViewUsers => "view_users",
            Capability::EditUsers => "edit_users",
            Capability::ViewCraftsmen => "view_craftsmen",
            Capability::EditCraftsmen => "edit_craftsmen",
            Capability::ViewContent => "view_content",
            Capability::EditContent => "edit_content",
            Capability::ViewAnalytics => "view_analytics",
            Capability::ViewLogs => "view_logs",
        }
    }

    pub const ALL: [Capability; 8] = [
        Capability::ViewUsers,
        Capability::EditUsers,
        Capability::ViewCraftsmen,
        Capability::EditCraftsmen,
        Capability::ViewContent,
        Capability::EditContent,
        Capability::ViewAnalytics,
        Capability::ViewLogs,
    ];
}
