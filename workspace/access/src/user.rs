//! User lifecycle: `ACTIVE <-> INACTIVE -> HARD_DELETED`, plus restore.

use std::collections::HashMap;

use chrono::Utc;
use common::{RoleSummary, UserDto, UserStatusDto, ValidationIssue};
use model::entities::{role, user};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set,
};
use tracing::{debug, info, instrument};

use crate::error::{AccessError, ConflictField, Result};
use crate::identity::Actor;
use crate::password::{SharedHasher, hash_password};
use crate::permission::{Action, PROTECTED_ROLE, Target, authorize, ensure_actor_allowed};
use crate::role::normalize_role_name;
use crate::uniqueness::{Candidate, ensure_unique};
use crate::validation::{
    CreateUserInput, UpdateUserInput, UpdateUserStatusInput, UserListQuery, take_required,
    validate_input,
};

const ENTITY: &str = "users";

pub fn to_dto(model: user::Model, role: Option<&role::Model>) -> UserDto {
    UserDto {
        user_id: model.user_id,
        username: model.username,
        email: model.email,
        full_name: model.full_name,
        avatar_url: model.avatar_url,
        role_id: model.role_id,
        role: role.map(|r| RoleSummary {
            role_name: r.role_name.clone(),
        }),
        status: model.status,
        created_at: model.created_at,
        updated_at: model.updated_at,
        deleted_at: model.deleted_at,
    }
}

/// Nobody toggles their own account, and a soft-deleted user only comes
/// back through `restore`.
fn check_status_change(actor: Option<&Actor>, target: &user::Model, status: bool) -> Result<()> {
    if actor.is_some_and(|a| a.user_id == target.user_id) {
        return Err(AccessError::Forbidden(
            "You cannot change the status of your own account".to_string(),
        ));
    }
    if status && target.is_deleted() {
        return Err(AccessError::StateConflict(
            "User is deleted; restore it instead".to_string(),
        ));
    }
    Ok(())
}

pub struct UserLifecycle<'a> {
    db: &'a DatabaseConnection,
    hasher: &'a SharedHasher,
}

impl<'a> UserLifecycle<'a> {
    pub fn new(db: &'a DatabaseConnection, hasher: &'a SharedHasher) -> Self {
        Self { db, hasher }
    }

    /// Newest first. Soft-deleted users only appear with `include_deleted`.
    #[instrument(skip(self))]
    pub async fn list(&self, query: UserListQuery) -> Result<Vec<UserDto>> {
        validate_input(&query)?;

        let mut select = user::Entity::find()
            .order_by_desc(user::Column::CreatedAt)
            .order_by_desc(user::Column::UserId);
        if !query.include_deleted.unwrap_or(false) {
            select = select.filter(user::Column::DeletedAt.is_null());
        }

        let users = select
            .paginate(self.db, query.limit())
            .fetch_page(query.page() - 1)
            .await?;

        let role_ids: Vec<i32> = users.iter().map(|u| u.role_id).collect();
        let roles: HashMap<i32, role::Model> = role::Entity::find()
            .filter(role::Column::RoleId.is_in(role_ids))
            .all(self.db)
            .await?
            .into_iter()
            .map(|r| (r.role_id, r))
            .collect();

        debug!("Listing {} users", users.len());
        Ok(users
            .into_iter()
            .map(|u| {
                let role = roles.get(&u.role_id);
                to_dto(u, role)
            })
            .collect())
    }

    #[instrument(skip(self))]
    pub async fn get(&self, user_id: i32) -> Result<UserDto> {
        let (user, role) = self.find_with_role(user_id).await?;
        Ok(to_dto(user, role.as_ref()))
    }

    #[instrument(skip(self, input), fields(actor = actor.map(|a| a.user_id)))]
    pub async fn create(&self, actor: Option<&Actor>, input: CreateUserInput) -> Result<UserDto> {
        ensure_actor_allowed(actor, Action::Create, ENTITY)?;
        validate_input(&input)?;

        let role = self
            .assignable_role(take_required(input.role_id, "role_id")?)
            .await?;
        authorize(
            actor,
            Action::Create,
            Target::User {
                role_name: Some(&role.role_name),
            },
            ENTITY,
        )?;

        self.insert(input, role).await
    }

    /// Creates a user in the protected role. Only reachable from the
    /// operator CLI, never over HTTP.
    #[instrument(skip(self, input))]
    pub async fn bootstrap_super_admin(&self, mut input: CreateUserInput) -> Result<UserDto> {
        let role_name = normalize_role_name(PROTECTED_ROLE);
        let role = role::Entity::find()
            .filter(role::Column::RoleName.eq(role_name.as_str()))
            .one(self.db)
            .await?
            .ok_or_else(|| AccessError::NotFound(format!("Role {} not found", role_name)))?;

        input.role_id = Some(role.role_id);
        validate_input(&input)?;
        self.insert(input, role).await
    }

    #[instrument(skip(self, input), fields(actor = actor.map(|a| a.user_id)))]
    pub async fn update(
        &self,
        actor: Option<&Actor>,
        user_id: i32,
        input: UpdateUserInput,
    ) -> Result<UserDto> {
        ensure_actor_allowed(actor, Action::Edit, ENTITY)?;
        validate_input(&input)?;

        let (existing, current_role) = self.find_with_role(user_id).await?;
        authorize(
            actor,
            Action::Edit,
            Target::User {
                role_name: current_role.as_ref().map(|r| r.role_name.as_str()),
            },
            ENTITY,
        )?;
        if let Some(status) = input.status {
            check_status_change(actor, &existing, status)?;
        }

        let mut new_role = None;
        if let Some(role_id) = input.role_id.filter(|id| *id != existing.role_id) {
            let role = self.assignable_role(role_id).await?;
            authorize(
                actor,
                Action::Edit,
                Target::User {
                    role_name: Some(&role.role_name),
                },
                ENTITY,
            )?;
            new_role = Some(role);
        }

        ensure_unique(
            self.db,
            Candidate::User {
                username: input.username.as_deref(),
                email: input.email.as_deref(),
            },
            Some(user_id),
        )
        .await?;

        let password_hash = match input.password {
            Some(password) => Some(hash_password(self.hasher, password).await?),
            None => None,
        };

        let mut active: user::ActiveModel = existing.into();
        if let Some(username) = input.username {
            active.username = Set(username);
        }
        if let Some(email) = input.email {
            active.email = Set(email);
        }
        if let Some(hash) = password_hash {
            active.password_hash = Set(hash);
        }
        if let Some(full_name) = input.full_name {
            active.full_name = Set(Some(full_name));
        }
        if let Some(avatar_url) = input.avatar_url {
            active.avatar_url = Set(Some(avatar_url));
        }
        if let Some(role) = new_role.as_ref() {
            active.role_id = Set(role.role_id);
        }
        if let Some(status) = input.status {
            active.status = Set(status);
        }
        active.updated_at = Set(Utc::now());

        let updated = active
            .update(self.db)
            .await
            .map_err(|e| AccessError::from_write(e, ConflictField::Username))?;

        info!(user_id, "User updated");
        Ok(to_dto(updated, new_role.as_ref().or(current_role.as_ref())))
    }

    #[instrument(skip(self, input), fields(actor = actor.map(|a| a.user_id)))]
    pub async fn set_status(
        &self,
        actor: Option<&Actor>,
        user_id: i32,
        input: UpdateUserStatusInput,
    ) -> Result<UserStatusDto> {
        ensure_actor_allowed(actor, Action::Edit, ENTITY)?;
        validate_input(&input)?;
        let status = take_required(input.status, "status")?;

        let (existing, role) = self.find_with_role(user_id).await?;
        authorize(
            actor,
            Action::Edit,
            Target::User {
                role_name: role.as_ref().map(|r| r.role_name.as_str()),
            },
            ENTITY,
        )?;
        check_status_change(actor, &existing, status)?;

        let mut active: user::ActiveModel = existing.into();
        active.status = Set(status);
        active.updated_at = Set(Utc::now());
        let updated = active.update(self.db).await?;

        info!(user_id, status, "User status changed");
        Ok(UserStatusDto {
            user_id: updated.user_id,
            username: updated.username,
            status: updated.status,
        })
    }

    /// Deactivates the account and stamps `deleted_at`. Nothing else changes,
    /// so a later restore yields the same row.
    #[instrument(skip(self), fields(actor = actor.map(|a| a.user_id)))]
    pub async fn soft_delete(&self, actor: Option<&Actor>, user_id: i32) -> Result<UserDto> {
        let (existing, role) = self.deletable(actor, user_id).await?;
        if existing.is_deleted() {
            return Err(AccessError::StateConflict("User is already deleted".to_string()));
        }

        let mut active: user::ActiveModel = existing.into();
        active.status = Set(false);
        active.deleted_at = Set(Some(Utc::now()));
        let updated = active.update(self.db).await?;

        info!(user_id, "User soft-deleted");
        Ok(to_dto(updated, role.as_ref()))
    }

    /// Removes the row unless roles still record this user as creator or modifier.
    #[instrument(skip(self), fields(actor = actor.map(|a| a.user_id)))]
    pub async fn hard_delete(&self, actor: Option<&Actor>, user_id: i32) -> Result<()> {
        self.deletable(actor, user_id).await?;

        let audited_roles = role::Entity::find()
            .filter(
                Condition::any()
                    .add(role::Column::CreatedBy.eq(user_id))
                    .add(role::Column::ModifiedBy.eq(user_id)),
            )
            .count(self.db)
            .await?;
        if audited_roles > 0 {
            debug!(user_id, audited_roles, "Hard delete refused");
            return Err(AccessError::StateConflict(format!(
                "Cannot delete user. {} role(s) were created or modified by this user. Reassign them before deleting.",
                audited_roles
            )));
        }

        user::Entity::delete_by_id(user_id)
            .exec(self.db)
            .await
            .map_err(|e| AccessError::from_write(e, ConflictField::Username))?;

        info!(user_id, "User permanently deleted");
        Ok(())
    }

    #[instrument(skip(self), fields(actor = actor.map(|a| a.user_id)))]
    pub async fn restore(&self, actor: Option<&Actor>, user_id: i32) -> Result<UserDto> {
        ensure_actor_allowed(actor, Action::Edit, ENTITY)?;
        let (existing, role) = self.find_with_role(user_id).await?;
        authorize(
            actor,
            Action::Edit,
            Target::User {
                role_name: role.as_ref().map(|r| r.role_name.as_str()),
            },
            ENTITY,
        )?;

        if !existing.is_deleted() {
            return Err(AccessError::StateConflict("User is not deleted".to_string()));
        }
        ensure_unique(
            self.db,
            Candidate::User {
                username: Some(&existing.username),
                email: Some(&existing.email),
            },
            Some(user_id),
        )
        .await?;

        let mut active: user::ActiveModel = existing.into();
        active.status = Set(true);
        active.deleted_at = Set(None);
        let updated = active
            .update(self.db)
            .await
            .map_err(|e| AccessError::from_write(e, ConflictField::Username))?;

        info!(user_id, "User restored");
        Ok(to_dto(updated, role.as_ref()))
    }

    /// Shared gate of both delete flavours: actor, existence, protected
    /// target and self-deletion.
    async fn deletable(
        &self,
        actor: Option<&Actor>,
        user_id: i32,
    ) -> Result<(user::Model, Option<role::Model>)> {
        ensure_actor_allowed(actor, Action::Delete, ENTITY)?;
        let (existing, role) = self.find_with_role(user_id).await?;
        authorize(
            actor,
            Action::Delete,
            Target::User {
                role_name: role.as_ref().map(|r| r.role_name.as_str()),
            },
            ENTITY,
        )?;
        if actor.is_some_and(|a| a.user_id == user_id) {
            return Err(AccessError::Forbidden(
                "You cannot delete your own account".to_string(),
            ));
        }
        Ok((existing, role))
    }

    async fn insert(&self, input: CreateUserInput, role: role::Model) -> Result<UserDto> {
        let username = take_required(input.username, "username")?;
        let email = take_required(input.email, "email")?;
        let password = take_required(input.password, "password")?;

        ensure_unique(
            self.db,
            Candidate::User {
                username: Some(&username),
                email: Some(&email),
            },
            None,
        )
        .await?;

        let password_hash = hash_password(self.hasher, password).await?;
        let now = Utc::now();
        let created = user::ActiveModel {
            username: Set(username),
            email: Set(email),
            password_hash: Set(password_hash),
            full_name: Set(input.full_name),
            avatar_url: Set(input.avatar_url),
            role_id: Set(role.role_id),
            status: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
            deleted_at: Set(None),
            ..Default::default()
        }
        .insert(self.db)
        .await
        .map_err(|e| AccessError::from_write(e, ConflictField::Username))?;

        info!(user_id = created.user_id, role = %role.role_name, "User created");
        Ok(to_dto(created, Some(&role)))
    }

    /// A role a user may be placed in: it must exist and be active.
    async fn assignable_role(&self, role_id: i32) -> Result<role::Model> {
        match role::Entity::find_by_id(role_id).one(self.db).await? {
            Some(role) if role.is_active() => Ok(role),
            _ => {
                debug!(role_id, "Role cannot be assigned");
                Err(AccessError::Validation(vec![ValidationIssue {
                    path: vec!["role_id".to_string()],
                    message: "Role does not exist or is inactive".to_string(),
                    code: "invalid_role".to_string(),
                }]))
            }
        }
    }

    async fn find_with_role(&self, user_id: i32) -> Result<(user::Model, Option<role::Model>)> {
        user::Entity::find_by_id(user_id)
            .find_also_related(role::Entity)
            .one(self.db)
            .await?
            .ok_or_else(|| AccessError::NotFound("User not found".to_string()))
    }
}
