use chrono::Utc;
use model::entities::role;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set};
use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

/// Roles every deployment starts with. `SUPER_ADMIN` is the protected role
/// and is inserted first so it receives id 1.
const BUILTIN_ROLES: [(&str, &str); 3] = [
    ("SUPER_ADMIN", "Full platform administrator"),
    ("SUB_ADMIN", "Administrator managing users and roles"),
    ("STUDENT", "Learner account"),
];

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        let now = Utc::now();

        for (name, description) in BUILTIN_ROLES {
            let exists = role::Entity::find()
                .filter(role::Column::RoleName.eq(name))
                .one(db)
                .await?
                .is_some();
            if exists {
                continue;
            }

            role::ActiveModel {
                role_name: Set(name.to_string()),
                description: Set(Some(description.to_string())),
                status: Set(true),
                created_by: Set(None),
                modified_by: Set(None),
                created_at: Set(now),
                updated_at: Set(now),
                deleted_at: Set(None),
                ..Default::default()
            }
            .insert(db)
            .await?;
        }

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let names: Vec<&str> = BUILTIN_ROLES.iter().map(|(name, _)| *name).collect();
        role::Entity::delete_many()
            .filter(role::Column::RoleName.is_in(names))
            .exec(manager.get_connection())
            .await?;
        Ok(())
    }
}
