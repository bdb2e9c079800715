//! Per-request identity claims and their resolution against storage.
//!
//! The dashboard passes the logged-in user's ids in two headers. They are
//! only a claim: every request re-reads the user and its role, so a
//! deactivated account or a changed role takes effect immediately.

use model::entities::{role, user};
use sea_orm::{DatabaseConnection, EntityTrait};
use tracing::{debug, instrument, warn};

use crate::error::Result;
use crate::permission;

pub const USER_ID_HEADER: &str = "x-user-id";
pub const ROLE_ID_HEADER: &str = "x-role-id";

/// Identity asserted by the client for a single request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdentityClaim {
    pub user_id: i32,
    pub role_id: i32,
}

impl IdentityClaim {
    /// Reads the claim from header name/value pairs. Names match
    /// case-insensitively; both ids must be positive integers.
    pub fn from_headers<'a, I>(headers: I) -> Option<Self>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut user_id = None;
        let mut role_id = None;

        for (name, value) in headers {
            if name.eq_ignore_ascii_case(USER_ID_HEADER) {
                user_id = parse_positive_id(value);
            } else if name.eq_ignore_ascii_case(ROLE_ID_HEADER) {
                role_id = parse_positive_id(value);
            }
        }

        Some(Self {
            user_id: user_id?,
            role_id: role_id?,
        })
    }
}

fn parse_positive_id(value: &str) -> Option<i32> {
    value.trim().parse::<i32>().ok().filter(|id| *id > 0)
}

/// The authenticated caller of an administrative operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub user_id: i32,
    pub role_id: i32,
    /// Lower-cased role name, e.g. `sub_admin`
    pub role_name: String,
}

impl Actor {
    pub fn is_admin(&self) -> bool {
        permission::is_admin_role(&self.role_name)
    }
}

/// Resolves a claim to an actor. Any mismatch with storage yields `None`,
/// which callers treat as "not authorized".
#[instrument(skip(db))]
pub async fn resolve_actor(
    db: &DatabaseConnection,
    claim: Option<IdentityClaim>,
) -> Result<Option<Actor>> {
    let Some(claim) = claim else {
        debug!("No identity claim on request");
        return Ok(None);
    };

    let found = user::Entity::find_by_id(claim.user_id)
        .find_also_related(role::Entity)
        .one(db)
        .await?;

    let Some((user, role)) = found else {
        warn!(user_id = claim.user_id, "Identity claim references unknown user");
        return Ok(None);
    };
    let Some(role) = role else {
        warn!(user_id = user.user_id, "User has no resolvable role");
        return Ok(None);
    };

    if user.is_deleted() || !user.status {
        warn!(user_id = user.user_id, "Identity claim references an inactive user");
        return Ok(None);
    }
    if user.role_id != claim.role_id {
        warn!(
            user_id = user.user_id,
            claimed = claim.role_id,
            stored = user.role_id,
            "Stale role claim rejected"
        );
        return Ok(None);
    }

    let actor = Actor {
        user_id: user.user_id,
        role_id: role.role_id,
        role_name: role.role_name.to_lowercase(),
    };
    debug!(user_id = actor.user_id, role = %actor.role_name, "Resolved actor");
    Ok(Some(actor))
}
