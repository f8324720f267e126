use uuid::Uuid;

use super::{has_capability, Capability, Role};
use crate::errors::AppError;

/// Central access check. Every privileged route calls this before touching
/// the repository layer; a deny produces no side effect.
pub fn authorize(role: Role, capability: Capability) -> Result<(), AppError> {
    if has_capability(role, capability) {
        Ok(())
    } else {
        tracing::debug!(role = role.as_str(), capability = capability.as_str(), "access denied");
        Err(AppError::forbidden("permisiuni insuficiente"))
    }
}

/// Team-management self-protection: an actor may never modify or delete its
/// own administrative account through these endpoints.
pub fn ensure_not_self(actor_id: Uuid, target_id: Uuid) -> Result<(), AppError> {
    if actor_id == target_id {
        Err(AppError::self_modification(
            "nu îți poți modifica propriul cont de pe această rută",
        ))
    } else {
        Ok(())
    }
}

/// Tier rule: a restricted actor may never alter an account on a strictly
/// higher tier (collaborator vs. admin, admin vs. super_admin).
pub fn ensure_not_protected(actor: Role, target: Role) -> Result<(), AppError> {
    if target.tier() > actor.tier() {
        Err(AppError::protected_target(
            "nu poți modifica un cont cu drepturi superioare",
        ))
    } else {
        Ok(())
    }
}
