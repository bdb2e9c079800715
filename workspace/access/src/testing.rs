//! Shared fixtures for the database tests of this crate.

use std::sync::Arc;

use chrono::Utc;
use migration::{Migrator, MigratorTrait};
use model::entities::{role, user};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Database, DatabaseConnection, EntityTrait, QueryFilter, Set,
};

use crate::identity::Actor;
use crate::password::{BcryptHasher, SharedHasher};

pub const TEST_PASSWORD: &str = "Passw0rdX";

/// Lowest cost bcrypt accepts, keeps the tests fast.
pub fn hasher() -> SharedHasher {
    Arc::new(BcryptHasher::new(4))
}

pub async fn setup_db() -> DatabaseConnection {
    let _ = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(tracing::Level::WARN)
        .try_init();

    let db = Database::connect("sqlite::memory:")
        .await
        .expect("Failed to connect to test database");
    Migrator::up(&db, None).await.expect("Migrations failed.");
    db
}

pub async fn role_id(db: &DatabaseConnection, role_name: &str) -> i32 {
    role::Entity::find()
        .filter(role::Column::RoleName.eq(role_name))
        .one(db)
        .await
        .expect("role query failed")
        .unwrap_or_else(|| panic!("role {role_name} should exist"))
        .role_id
}

/// Inserts an active user with [`TEST_PASSWORD`] and email `<username>@example.com`.
pub async fn insert_user(db: &DatabaseConnection, username: &str, role_name: &str) -> user::Model {
    let role_id = role_id(db, role_name).await;
    let now = Utc::now();
    user::ActiveModel {
        username: Set(username.to_string()),
        email: Set(format!("{username}@example.com")),
        password_hash: Set(hasher().hash(TEST_PASSWORD).expect("hashing failed")),
        full_name: Set(None),
        avatar_url: Set(None),
        role_id: Set(role_id),
        status: Set(true),
        created_at: Set(now),
        updated_at: Set(now),
        deleted_at: Set(None),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("insert user failed")
}

pub async fn soft_delete_row(db: &DatabaseConnection, user: user::Model) -> user::Model {
    let mut active: user::ActiveModel = user.into();
    active.deleted_at = Set(Some(Utc::now()));
    active.status = Set(false);
    active.update(db).await.expect("soft delete failed")
}

/// Inserts a user holding `role_name` and returns it as an actor.
pub async fn actor(db: &DatabaseConnection, username: &str, role_name: &str) -> Actor {
    let user = insert_user(db, username, role_name).await;
    Actor {
        user_id: user.user_id,
        role_id: user.role_id,
        role_name: role_name.to_lowercase(),
    }
}
