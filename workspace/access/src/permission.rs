//! Role-based permission rules for administrative mutations.

use tracing::{debug, trace};

use crate::error::{AccessError, Result};
use crate::identity::Actor;

/// Lower-cased name of the role nobody may modify through the dashboard.
pub const PROTECTED_ROLE: &str = "super_admin";

/// Roles allowed to perform administrative mutations.
pub const ADMIN_ROLES: [&str; 2] = ["super_admin", "sub_admin"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Create,
    Edit,
    Delete,
}

impl Action {
    fn verb(&self) -> &'static str {
        match self {
            Action::Create => "create",
            Action::Edit => "edit",
            Action::Delete => "delete",
        }
    }

    fn past_tense(&self) -> &'static str {
        match self {
            Action::Create => "created",
            Action::Edit => "edited",
            Action::Delete => "deleted",
        }
    }
}

/// What an action is aimed at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target<'a> {
    /// An entity that does not exist yet and touches no role membership.
    New,
    Role { role_name: &'a str },
    /// A user, identified by the role it holds (or is about to hold).
    User { role_name: Option<&'a str> },
}

impl Target<'_> {
    fn is_protected(&self) -> bool {
        match self {
            Target::New => false,
            Target::Role { role_name } => is_protected_role(role_name),
            Target::User { role_name } => role_name.is_some_and(is_protected_role),
        }
    }
}

pub fn is_protected_role(role_name: &str) -> bool {
    role_name.eq_ignore_ascii_case(PROTECTED_ROLE)
}

pub fn is_admin_role(role_name: &str) -> bool {
    ADMIN_ROLES
        .iter()
        .any(|admin| role_name.eq_ignore_ascii_case(admin))
}

/// Decides whether an actor holding `actor_role` may perform `action` on
/// `target`. The protected role and its members are off limits for every
/// action, including placing a user into that role.
pub fn can_perform(actor_role: Option<&str>, action: Action, target: Target<'_>) -> bool {
    let allowed = match actor_role {
        Some(role) if is_admin_role(role) => !target.is_protected(),
        _ => false,
    };
    trace!(?actor_role, ?action, ?target, allowed, "Permission evaluated");
    allowed
}

/// Gate run before the target is loaded: only the actor's role matters.
pub fn ensure_actor_allowed(actor: Option<&Actor>, action: Action, entity: &str) -> Result<()> {
    authorize(actor, action, Target::New, entity)
}

/// Full gate including the target. Fails with `Forbidden` and a message
/// that distinguishes a missing privilege from a protected target.
pub fn authorize(
    actor: Option<&Actor>,
    action: Action,
    target: Target<'_>,
    entity: &str,
) -> Result<()> {
    let role = actor.map(|a| a.role_name.as_str());
    if can_perform(role, action, target) {
        return Ok(());
    }

    let message = if role.is_some_and(is_admin_role) {
        match action {
            Action::Create => "Users cannot be assigned to the protected role".to_string(),
            Action::Edit | Action::Delete => format!(
                "The protected role and its members cannot be {}",
                action.past_tense()
            ),
        }
    } else {
        format!("You do not have permission to {} {}", action.verb(), entity)
    };
    debug!(?role, ?action, "Denied: {}", message);
    Err(AccessError::Forbidden(message))
}
