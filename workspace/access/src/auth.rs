use common::LoginDto;
use model::entities::{role, user};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};
use tracing::{debug, info, instrument};

use crate::error::{AccessError, Result};
use crate::password::{SharedHasher, verify_password};
use crate::permission::is_admin_role;
use crate::user::to_dto;
use crate::validation::LoginInput;

pub const ADMIN_DASHBOARD: &str = "/admin";
pub const CUSTOMER_DASHBOARD: &str = "/customer";

/// Checks credentials of an active, non-deleted user. `username` may be
/// either the username or the email. Every failure is the same
/// `Unauthenticated` so callers cannot probe which accounts exist.
#[instrument(skip(db, hasher, input), fields(login = input.username.as_deref()))]
pub async fn login(
    db: &DatabaseConnection,
    hasher: &SharedHasher,
    input: LoginInput,
) -> Result<LoginDto> {
    let (Some(identifier), Some(password)) = (
        input.username.filter(|u| !u.trim().is_empty()),
        input.password.filter(|p| !p.is_empty()),
    ) else {
        debug!("Login attempt without credentials");
        return Err(AccessError::Unauthenticated);
    };
    let identifier = identifier.trim();

    let Some((user, role)) = find_by_identifier(db, identifier).await? else {
        debug!("Login failed: no matching active user");
        return Err(AccessError::Unauthenticated);
    };
    if !verify_password(hasher, password, user.password_hash.clone()).await? {
        debug!(user_id = user.user_id, "Login failed: wrong password");
        return Err(AccessError::Unauthenticated);
    }

    let redirect_to = match role.as_ref() {
        Some(r) if is_admin_role(&r.role_name) => ADMIN_DASHBOARD,
        _ => CUSTOMER_DASHBOARD,
    };
    info!(user_id = user.user_id, redirect_to, "User logged in");

    Ok(LoginDto {
        user: to_dto(user, role.as_ref()),
        redirect_to: redirect_to.to_string(),
    })
}

/// Username match first, email second: a username shaped like another
/// account's email still logs in as its owner.
async fn find_by_identifier(
    db: &DatabaseConnection,
    identifier: &str,
) -> Result<Option<(user::Model, Option<role::Model>)>> {
    for column in [user::Column::Username, user::Column::Email] {
        let found = user::Entity::find()
            .filter(column.eq(identifier))
            .filter(user::Column::DeletedAt.is_null())
            .filter(user::Column::Status.eq(true))
            .find_also_related(role::Entity)
            .one(db)
            .await?;
        if found.is_some() {
            return Ok(found);
        }
    }
    Ok(None)
}
