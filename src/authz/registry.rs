use super::{Capability, Role};

/// Static role -> capability matrix. Fixed at deployment time; there is no
/// runtime mutation and no per-user grant layer.
pub fn capabilities_for(role: Role) -> &'static [Capability] {
    use Capability::*;

    match role {
        // Administrator tier holds everything.
        Role::SuperAdmin | Role::Admin => &Capability::ALL,
        Role::Moderator => &[ViewUsers, ViewCraftsmen, ViewContent, EditContent, ViewLogs],
        Role::Support => &[ViewUsers, ViewCraftsmen, ViewContent, ViewLogs],
        // Restricted tier: view-only for most capabilities, edit only for
        // craftsman management.
        Role::Collaborator => &[
            ViewUsers,
            ViewCraftsmen,
            EditCraftsmen,
            ViewContent,
            ViewAnalytics,
        ],
        Role::Craftsman | Role::Customer => &[],
    }
}

pub fn has_capability(role: Role, capability: Capability) -> bool {
    capabilities_for(role).contains(&capability)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn administrator_tier_holds_every_capability() {
        for cap in Capability::ALL {
            assert!(has_capability(Role::SuperAdmin, cap));
            assert!(has_capability(Role::Admin, cap));
        }
    }

    #[test]
    fn collaborator_edits_craftsmen_only() {
        assert!(has_capability(Role::Collaborator, Capability::EditCraftsmen));
        assert!(!has_capability(Role::Collaborator, Capability::EditUsers));
        assert!(!has_capability(Role::Collaborator, Capability::EditContent));
        assert!(!has_capability(Role::Collaborator, Capability::ViewLogs));
        assert!(has_capability(Role::Collaborator, Capability::ViewAnalytics));
    }

    #[test]
    fn marketplace_roles_hold_nothing() {
        for cap in Capability::ALL {
            assert!(!has_capability(Role::Craftsman, cap));
            assert!(!has_capability(Role::Customer, cap));
        }
    }

    #[test]
    fn tier_ordering() {
        assert!(Role::SuperAdmin.tier() > Role::Admin.tier());
        assert!(Role::Admin.tier() > Role::Collaborator.tier());
        assert_eq!(Role::Moderator.tier(), Role::Support.tier());
        assert!(Role::Collaborator.tier() > Role::Customer.tier());
    }
}
