//! Role lifecycle: `ACTIVE <-> INACTIVE -> HARD_DELETED`.

use std::collections::HashMap;

use chrono::Utc;
use common::{RoleCount, RoleDto};
use model::entities::{role, user};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};
use tracing::{debug, info, instrument, warn};

use crate::error::{AccessError, ConflictField, Result};
use crate::identity::Actor;
use crate::permission::{Action, Target, authorize, ensure_actor_allowed};
use crate::uniqueness::{Candidate, ensure_unique};
use crate::validation::{CreateRoleInput, UpdateRoleInput, take_required, validate_input};

const ENTITY: &str = "roles";

/// Canonical form of a role name: whitespace-separated tokens joined with
/// `_` and upper-cased. `"content  editor "` becomes `CONTENT_EDITOR`.
pub fn normalize_role_name(raw: &str) -> String {
    raw.split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
        .to_uppercase()
}

pub fn to_dto(model: role::Model, users: u64) -> RoleDto {
    RoleDto {
        role_id: model.role_id,
        role_name: model.role_name,
        description: model.description,
        status: model.status,
        created_by: model.created_by,
        modified_by: model.modified_by,
        created_at: model.created_at,
        updated_at: model.updated_at,
        deleted_at: model.deleted_at,
        count: RoleCount { users },
    }
}

pub struct RoleLifecycle<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> RoleLifecycle<'a> {
    pub fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }

    /// All roles ordered by id, each with its user count.
    #[instrument(skip(self))]
    pub async fn list(&self) -> Result<Vec<RoleDto>> {
        let roles = role::Entity::find()
            .order_by_asc(role::Column::RoleId)
            .all(self.db)
            .await?;

        let counts: HashMap<i32, i64> = user::Entity::find()
            .select_only()
            .column(user::Column::RoleId)
            .column_as(user::Column::UserId.count(), "users")
            .group_by(user::Column::RoleId)
            .into_tuple::<(i32, i64)>()
            .all(self.db)
            .await?
            .into_iter()
            .collect();

        debug!("Listing {} roles", roles.len());
        Ok(roles
            .into_iter()
            .map(|r| {
                let users = counts.get(&r.role_id).copied().unwrap_or(0).max(0) as u64;
                to_dto(r, users)
            })
            .collect())
    }

    #[instrument(skip(self))]
    pub async fn get(&self, role_id: i32) -> Result<RoleDto> {
        let role = self.find(role_id).await?;
        let users = self.user_count(role_id).await?;
        Ok(to_dto(role, users))
    }

    #[instrument(skip(self, input), fields(actor = actor.map(|a| a.user_id)))]
    pub async fn create(&self, actor: Option<&Actor>, input: CreateRoleInput) -> Result<RoleDto> {
        ensure_actor_allowed(actor, Action::Create, ENTITY)?;
        validate_input(&input)?;

        let role_name = normalize_role_name(&take_required(input.role_name, "role_name")?);
        ensure_unique(self.db, Candidate::Role { role_name: &role_name }, None).await?;

        let now = Utc::now();
        let created = role::ActiveModel {
            role_name: Set(role_name),
            description: Set(input.description),
            status: Set(input.status.unwrap_or(true)),
            created_by: Set(actor.map(|a| a.user_id)),
            modified_by: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
            deleted_at: Set(None),
            ..Default::default()
        }
        .insert(self.db)
        .await
        .map_err(|e| AccessError::from_write(e, ConflictField::RoleName))?;

        info!(role_id = created.role_id, role_name = %created.role_name, "Role created");
        Ok(to_dto(created, 0))
    }

    #[instrument(skip(self, input), fields(actor = actor.map(|a| a.user_id)))]
    pub async fn update(
        &self,
        actor: Option<&Actor>,
        role_id: i32,
        input: UpdateRoleInput,
    ) -> Result<RoleDto> {
        ensure_actor_allowed(actor, Action::Edit, ENTITY)?;
        validate_input(&input)?;

        let existing = self.find(role_id).await?;
        authorize(
            actor,
            Action::Edit,
            Target::Role {
                role_name: &existing.role_name,
            },
            ENTITY,
        )?;

        let role_name = input.role_name.as_deref().map(normalize_role_name);
        if let Some(name) = role_name.as_deref() {
            ensure_unique(self.db, Candidate::Role { role_name: name }, Some(role_id)).await?;
        }

        let now = Utc::now();
        let deleted_at = existing.deleted_at;
        let mut active: role::ActiveModel = existing.into();
        if let Some(name) = role_name {
            active.role_name = Set(name);
        }
        if let Some(description) = input.description {
            active.description = Set(Some(description));
        }
        // `status` and `deleted_at` always move together.
        match (input.status, deleted_at) {
            (Some(true), Some(_)) => active.deleted_at = Set(None),
            (Some(false), None) => active.deleted_at = Set(Some(now)),
            _ => {}
        }
        if let Some(status) = input.status {
            active.status = Set(status);
        }
        active.modified_by = Set(actor.map(|a| a.user_id));
        active.updated_at = Set(now);

        let updated = active
            .update(self.db)
            .await
            .map_err(|e| AccessError::from_write(e, ConflictField::RoleName))?;
        let users = self.user_count(role_id).await?;

        info!(role_id, "Role updated");
        Ok(to_dto(updated, users))
    }

    /// Deactivates a role. Allowed even while users are assigned to it.
    #[instrument(skip(self), fields(actor = actor.map(|a| a.user_id)))]
    pub async fn soft_delete(&self, actor: Option<&Actor>, role_id: i32) -> Result<RoleDto> {
        ensure_actor_allowed(actor, Action::Delete, ENTITY)?;
        let existing = self.find(role_id).await?;
        authorize(
            actor,
            Action::Delete,
            Target::Role {
                role_name: &existing.role_name,
            },
            ENTITY,
        )?;

        if !existing.is_active() {
            return Err(AccessError::StateConflict("Role is already inactive".to_string()));
        }

        let mut active: role::ActiveModel = existing.into();
        active.status = Set(false);
        active.deleted_at = Set(Some(Utc::now()));
        active.modified_by = Set(actor.map(|a| a.user_id));
        let updated = active.update(self.db).await?;
        let users = self.user_count(role_id).await?;

        if users > 0 {
            warn!(role_id, users, "Soft-deleted role still has users assigned");
        }
        info!(role_id, "Role soft-deleted");
        Ok(to_dto(updated, users))
    }

    /// Removes the row. Refused while any user, deleted or not, references it.
    #[instrument(skip(self), fields(actor = actor.map(|a| a.user_id)))]
    pub async fn hard_delete(&self, actor: Option<&Actor>, role_id: i32) -> Result<()> {
        ensure_actor_allowed(actor, Action::Delete, ENTITY)?;
        let existing = self.find(role_id).await?;
        authorize(
            actor,
            Action::Delete,
            Target::Role {
                role_name: &existing.role_name,
            },
            ENTITY,
        )?;

        let users = self.user_count(role_id).await?;
        if users > 0 {
            debug!(role_id, users, "Hard delete refused");
            return Err(AccessError::StateConflict(format!(
                "Cannot delete role. {} user(s) are assigned to this role.",
                users
            )));
        }

        role::Entity::delete_by_id(role_id)
            .exec(self.db)
            .await
            .map_err(|e| AccessError::from_write(e, ConflictField::RoleName))?;

        info!(role_id, "Role permanently deleted");
        Ok(())
    }

    #[instrument(skip(self), fields(actor = actor.map(|a| a.user_id)))]
    pub async fn restore(&self, actor: Option<&Actor>, role_id: i32) -> Result<RoleDto> {
        ensure_actor_allowed(actor, Action::Edit, ENTITY)?;
        let existing = self.find(role_id).await?;
        authorize(
            actor,
            Action::Edit,
            Target::Role {
                role_name: &existing.role_name,
            },
            ENTITY,
        )?;

        if existing.is_active() {
            return Err(AccessError::StateConflict("Role is not deleted".to_string()));
        }

        let mut active: role::ActiveModel = existing.into();
        active.status = Set(true);
        active.deleted_at = Set(None);
        active.modified_by = Set(actor.map(|a| a.user_id));
        let updated = active.update(self.db).await?;
        let users = self.user_count(role_id).await?;

        info!(role_id, "Role restored");
        Ok(to_dto(updated, users))
    }

    async fn find(&self, role_id: i32) -> Result<role::Model> {
        role::Entity::find_by_id(role_id)
            .one(self.db)
            .await?
            .ok_or_else(|| AccessError::NotFound("Role not found".to_string()))
    }

    async fn user_count(&self, role_id: i32) -> Result<u64> {
        Ok(user::Entity::find()
            .filter(user::Column::RoleId.eq(role_id))
            .count(self.db)
            .await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{actor, insert_user, role_id, setup_db};

    fn new_role(name: &str) -> CreateRoleInput {
        CreateRoleInput {
            role_name: Some(name.to_string()),
            description: Some("Edits course content".to_string()),
            status: None,
        }
    }

    #[test]
    fn normalization_examples() {
        assert_eq!(normalize_role_name("content editor"), "CONTENT_EDITOR");
        assert_eq!(normalize_role_name("  Course   Reviewer  "), "COURSE_REVIEWER");
        assert_eq!(normalize_role_name("admin"), "ADMIN");
        assert_eq!(normalize_role_name("   "), "");
        assert_eq!(normalize_role_name("  multi   space  "), "MULTI_SPACE");
    }

    #[test]
    fn normalization_is_idempotent() {
        for raw in ["content editor", "a\tb\nc", "ALREADY_DONE", " x "] {
            let once = normalize_role_name(raw);
            assert_eq!(normalize_role_name(&once), once);
        }
    }

    #[tokio::test]
    async fn create_normalizes_and_records_creator() {
        let db = setup_db().await;
        let admin = actor(&db, "root", "SUPER_ADMIN").await;
        let roles = RoleLifecycle::new(&db);

        let created = roles
            .create(Some(&admin), new_role("content editor"))
            .await
            .unwrap();

        assert_eq!(created.role_name, "CONTENT_EDITOR");
        assert!(created.status);
        assert_eq!(created.created_by, Some(admin.user_id));
        assert_eq!(created.count.users, 0);
    }

    #[tokio::test]
    async fn create_rejects_duplicate_after_normalization() {
        let db = setup_db().await;
        let admin = actor(&db, "subby", "SUB_ADMIN").await;
        let roles = RoleLifecycle::new(&db);

        roles.create(Some(&admin), new_role("content editor")).await.unwrap();
        let err = roles
            .create(Some(&admin), new_role("Content   Editor"))
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

    #[tokio::test]
    async fn students_cannot_create_roles() {
        let db = setup_db().await;
        let student = actor(&db, "learner", "STUDENT").await;
        let roles = RoleLifecycle::new(&db);

        let err = roles.create(Some(&student), new_role("x")).await.unwrap_err();
        assert!(matches!(err, AccessError::Forbidden(_)));
        let err = roles.create(None, new_role("x")).await.unwrap_err();
        assert!(matches!(err, AccessError::Forbidden(_)));
    }

    #[tokio::test]
    async fn protected_role_is_immutable() {
        let db = setup_db().await;
        let admin = actor(&db, "root", "SUPER_ADMIN").await;
        let roles = RoleLifecycle::new(&db);
        let protected = role_id(&db, "SUPER_ADMIN").await;

        let rename = UpdateRoleInput {
            role_name: Some("owner".into()),
            ..Default::default()
        };
        assert!(matches!(
            roles.update(Some(&admin), protected, rename).await,
            Err(AccessError::Forbidden(_))
        ));
        assert!(matches!(
            roles.soft_delete(Some(&admin), protected).await,
            Err(AccessError::Forbidden(_))
        ));
        assert!(matches!(
            roles.hard_delete(Some(&admin), protected).await,
            Err(AccessError::Forbidden(_))
        ));

        let unchanged = roles.get(protected).await.unwrap();
        assert_eq!(unchanged.role_name, "SUPER_ADMIN");
        assert!(unchanged.status);
    }

    #[tokio::test]
    async fn update_renames_and_tracks_modifier() {
        let db = setup_db().await;
        let admin = actor(&db, "subby", "SUB_ADMIN").await;
        let roles = RoleLifecycle::new(&db);
        let created = roles.create(Some(&admin), new_role("reviewer")).await.unwrap();

        let updated = roles
            .update(
                Some(&admin),
                created.role_id,
                UpdateRoleInput {
                    role_name: Some("course reviewer".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.role_name, "COURSE_REVIEWER");
        assert_eq!(updated.description, created.description);
        assert_eq!(updated.modified_by, Some(admin.user_id));

        let err = roles
            .update(
                Some(&admin),
                created.role_id,
                UpdateRoleInput {
                    role_name: Some("student".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AccessError::Conflict { .. }));
    }

    #[tokio::test]
    async fn missing_role_is_not_found() {
        let db = setup_db().await;
        let admin = actor(&db, "subby", "SUB_ADMIN").await;
        let roles = RoleLifecycle::new(&db);

        assert!(matches!(roles.get(4242).await, Err(AccessError::NotFound(_))));
        assert!(matches!(
            roles.soft_delete(Some(&admin), 4242).await,
            Err(AccessError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn hard_delete_guarded_by_assigned_users() {
        let db = setup_db().await;
        let admin = actor(&db, "subby", "SUB_ADMIN").await;
        let roles = RoleLifecycle::new(&db);
        let created = roles.create(Some(&admin), new_role("mentor")).await.unwrap();

        insert_user(&db, "mentor1", "MENTOR").await;
        insert_user(&db, "mentor2", "MENTOR").await;

        let err = roles.hard_delete(Some(&admin), created.role_id).await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "Cannot delete role. 2 user(s) are assigned to this role."
        );
        assert_eq!(roles.get(created.role_id).await.unwrap().count.users, 2);

        let empty = roles.create(Some(&admin), new_role("unused")).await.unwrap();
        roles.hard_delete(Some(&admin), empty.role_id).await.unwrap();
        assert!(matches!(
            roles.get(empty.role_id).await,
            Err(AccessError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn soft_delete_and_restore() {
        let db = setup_db().await;
        let admin = actor(&db, "subby", "SUB_ADMIN").await;
        let roles = RoleLifecycle::new(&db);
        let created = roles.create(Some(&admin), new_role("mentor")).await.unwrap();
        insert_user(&db, "mentor1", "MENTOR").await;

        let deleted = roles.soft_delete(Some(&admin), created.role_id).await.unwrap();
        assert!(!deleted.status);
        assert!(deleted.deleted_at.is_some());
        assert_eq!(deleted.count.users, 1);

        assert!(matches!(
            roles.soft_delete(Some(&admin), created.role_id).await,
            Err(AccessError::StateConflict(_))
        ));

        let restored = roles.restore(Some(&admin), created.role_id).await.unwrap();
        assert!(restored.status);
        assert_eq!(restored.deleted_at, None);
        assert!(matches!(
            roles.restore(Some(&admin), created.role_id).await,
            Err(AccessError::StateConflict(_))
        ));
    }

    #[tokio::test]
    async fn status_update_keeps_deleted_at_in_step() {
        let db = setup_db().await;
        let admin = actor(&db, "subby", "SUB_ADMIN").await;
        let roles = RoleLifecycle::new(&db);
        let created = roles.create(Some(&admin), new_role("mentor")).await.unwrap();

        let deactivated = roles
            .update(
                Some(&admin),
                created.role_id,
                UpdateRoleInput {
                    status: Some(false),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!(!deactivated.status);
        assert!(deactivated.deleted_at.is_some());

        // Already inactive: the original stamp is kept.
        let again = roles
            .update(
                Some(&admin),
                created.role_id,
                UpdateRoleInput {
                    status: Some(false),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(again.deleted_at, deactivated.deleted_at);

        let reactivated = roles
            .update(
                Some(&admin),
                created.role_id,
                UpdateRoleInput {
                    status: Some(true),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!(reactivated.status);
        assert_eq!(reactivated.deleted_at, None);
    }

    #[tokio::test]
    async fn list_includes_counts() {
        let db = setup_db().await;
        insert_user(&db, "learner1", "STUDENT").await;
        insert_user(&db, "learner2", "STUDENT").await;

        let listed = RoleLifecycle::new(&db).list().await.unwrap();
        let names: Vec<&str> = listed.iter().map(|r| r.role_name.as_str()).collect();
        assert_eq!(names, vec!["SUPER_ADMIN", "SUB_ADMIN", "STUDENT"]);

        let students = listed.iter().find(|r| r.role_name == "STUDENT").unwrap();
        assert_eq!(students.count.users, 2);
        assert_eq!(listed[0].count.users, 0);
    }
}
