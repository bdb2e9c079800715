//! Advisory uniqueness checks run before writes.
//!
//! The database indexes remain the authority; these reads only give a
//! precise 409 before attempting the write.

use model::entities::{role, user};
use sea_orm::{ColumnTrait, Condition, DatabaseConnection, EntityTrait, QueryFilter};
use tracing::debug;

use crate::error::{AccessError, ConflictField, Result};

/// Candidate values to check, per entity type.
#[derive(Debug, Clone, Copy)]
pub enum Candidate<'a> {
    User {
        username: Option<&'a str>,
        email: Option<&'a str>,
    },
    Role {
        role_name: &'a str,
    },
}

/// Returns the first field that collides with a stored row, ignoring the row
/// with id `exclude_id`.
pub async fn check_conflict(
    db: &DatabaseConnection,
    candidate: Candidate<'_>,
    exclude_id: Option<i32>,
) -> Result<Option<ConflictField>> {
    match candidate {
        Candidate::User { username, email } => {
            check_user_conflict(db, username, email, exclude_id).await
        }
        Candidate::Role { role_name } => check_role_conflict(db, role_name, exclude_id).await,
    }
}

/// Same as [`check_conflict`] but fails with a 409-style error.
pub async fn ensure_unique(
    db: &DatabaseConnection,
    candidate: Candidate<'_>,
    exclude_id: Option<i32>,
) -> Result<()> {
    match check_conflict(db, candidate, exclude_id).await? {
        Some(field) => {
            debug!(%field, "Uniqueness check failed");
            Err(AccessError::conflict(field))
        }
        None => Ok(()),
    }
}

/// Checks the present fields against users that are not soft-deleted.
pub async fn check_user_conflict(
    db: &DatabaseConnection,
    username: Option<&str>,
    email: Option<&str>,
    exclude_id: Option<i32>,
) -> Result<Option<ConflictField>> {
    if username.is_none() && email.is_none() {
        return Ok(None);
    }

    let mut any = Condition::any();
    if let Some(username) = username {
        any = any.add(user::Column::Username.eq(username));
    }
    if let Some(email) = email {
        any = any.add(user::Column::Email.eq(email));
    }

    let mut query = user::Entity::find()
        .filter(user::Column::DeletedAt.is_null())
        .filter(any);
    if let Some(id) = exclude_id {
        query = query.filter(user::Column::UserId.ne(id));
    }

    let existing = query.one(db).await?;
    Ok(existing.map(|row| {
        if username.is_some_and(|u| row.username == u) {
            ConflictField::Username
        } else {
            ConflictField::Email
        }
    }))
}

/// Exact match on the already normalized role name.
pub async fn check_role_conflict(
    db: &DatabaseConnection,
    role_name: &str,
    exclude_id: Option<i32>,
) -> Result<Option<ConflictField>> {
    let mut query = role::Entity::find().filter(role::Column::RoleName.eq(role_name));
    if let Some(id) = exclude_id {
        query = query.filter(role::Column::RoleId.ne(id));
    }
    Ok(query.one(db).await?.map(|_| ConflictField::RoleName))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{insert_user, role_id, setup_db, soft_delete_row};

    #[tokio::test]
    async fn reports_username_before_email() {
        let db = setup_db().await;
        let existing = insert_user(&db, "jdoe", "STUDENT").await;

        let field = check_user_conflict(&db, Some("jdoe"), Some(&existing.email), None)
            .await
            .unwrap();
        assert_eq!(field, Some(ConflictField::Username));

        let field = check_user_conflict(&db, Some("someone"), Some(&existing.email), None)
            .await
            .unwrap();
        assert_eq!(field, Some(ConflictField::Email));
    }

    #[tokio::test]
    async fn excluded_row_does_not_conflict_with_itself() {
        let db = setup_db().await;
        let existing = insert_user(&db, "jdoe", "STUDENT").await;

        let field = check_user_conflict(&db, Some("jdoe"), None, Some(existing.user_id))
            .await
            .unwrap();
        assert_eq!(field, None);
        assert_eq!(check_user_conflict(&db, None, None, None).await.unwrap(), None);
    }

    #[tokio::test]
    async fn soft_deleted_users_do_not_conflict() {
        let db = setup_db().await;
        let existing = insert_user(&db, "jdoe", "STUDENT").await;
        soft_delete_row(&db, existing).await;

        let field = check_conflict(
            &db,
            Candidate::User {
                username: Some("jdoe"),
                email: None,
            },
            None,
        )
        .await
        .unwrap();
        assert_eq!(field, None);
    }

    #[tokio::test]
    async fn role_names_are_exact_matches() {
        let db = setup_db().await;
        let student = role_id(&db, "STUDENT").await;

        assert_eq!(
            check_role_conflict(&db, "STUDENT", None).await.unwrap(),
            Some(ConflictField::RoleName)
        );
        assert_eq!(check_role_conflict(&db, "STUDENT", Some(student)).await.unwrap(), None);

        let err = ensure_unique(&db, Candidate::Role { role_name: "SUB_ADMIN" }, None)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AccessError::Conflict {
                field: ConflictField::RoleName,
                ..
            }
        ));
    }
}
