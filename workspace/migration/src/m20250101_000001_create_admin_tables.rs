use sea_orm_migration::{prelude::*, schema::*};
use sea_orm::ConnectionTrait;

#[derive(DeriveMigrationName)]
pub struct Migration;

/// Uniqueness of usernames and emails only applies to users that are not
/// soft-deleted, so a removed account's identifiers can be reused.
const PARTIAL_USER_INDEXES: [&str; 2] = [
    "CREATE UNIQUE INDEX IF NOT EXISTS idx_users_username_live ON users (username) WHERE deleted_at IS NULL",
    "CREATE UNIQUE INDEX IF NOT EXISTS idx_users_email_live ON users (email) WHERE deleted_at IS NULL",
];

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Create roles table
        manager
            .create_table(
                Table::create()
                    .table(Roles::Table)
                    .if_not_exists()
                    .col(pk_auto(Roles::RoleId))
                    .col(string(Roles::RoleName).unique_key())
                    .col(string_null(Roles::Description))
                    .col(boolean(Roles::Status).default(true))
                    // No foreign keys here: users reference roles, and the
                    // audit columns are guarded by the user hard-delete check.
                    .col(integer_null(Roles::CreatedBy))
                    .col(integer_null(Roles::ModifiedBy))
                    .col(timestamp_with_time_zone(Roles::CreatedAt))
                    .col(timestamp_with_time_zone(Roles::UpdatedAt))
                    .col(timestamp_with_time_zone_null(Roles::DeletedAt))
                    .to_owned(),
            )
            .await?;

        // Create users table
        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(pk_auto(Users::UserId))
                    .col(string(Users::Username))
                    .col(string(Users::Email))
                    .col(string(Users::PasswordHash))
                    .col(string_null(Users::FullName))
                    .col(string_null(Users::AvatarUrl))
                    .col(integer(Users::RoleId))
                    .col(boolean(Users::Status).default(true))
                    .col(timestamp_with_time_zone(Users::CreatedAt))
                    .col(timestamp_with_time_zone(Users::UpdatedAt))
                    .col(timestamp_with_time_zone_null(Users::DeletedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_user_role")
                            .from(Users::Table, Users::RoleId)
                            .to(Roles::Table, Roles::RoleId)
                            .on_delete(ForeignKeyAction::Restrict)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        let connection = manager.get_connection();
        for statement in PARTIAL_USER_INDEXES {
            connection.execute_unprepared(statement).await?;
        }

        manager
            .create_index(
                Index::create()
                    .name("idx_users_role_id")
                    .table(Users::Table)
                    .col(Users::RoleId)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        // Create students table
        manager
            .create_table(
                Table::create()
                    .table(Students::Table)
                    .if_not_exists()
                    .col(pk_auto(Students::StudentId))
                    .col(string(Students::FullName))
                    .col(string(Students::Email).unique_key())
                    .col(string(Students::Address))
                    .col(date(Students::DateOfBirth))
                    .col(string_null(Students::Avatar))
                    .col(boolean(Students::Status).default(true))
                    .col(timestamp_with_time_zone(Students::CreatedAt))
                    .col(timestamp_with_time_zone(Students::UpdatedAt))
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Students::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Users::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Roles::Table).to_owned())
            .await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
enum Roles {
    Table,
    RoleId,
    RoleName,
    Description,
    Status,
    CreatedBy,
    ModifiedBy,
    CreatedAt,
    UpdatedAt,
    DeletedAt,
}

#[derive(DeriveIden)]
enum Users {
    Table,
    UserId,
    Username,
    Email,
    PasswordHash,
    FullName,
    AvatarUrl,
    RoleId,
    Status,
    CreatedAt,
    UpdatedAt,
    DeletedAt,
}

#[derive(DeriveIden)]
enum Students {
    Table,
    StudentId,
    FullName,
    Email,
    Address,
    DateOfBirth,
    Avatar,
    Status,
    CreatedAt,
    UpdatedAt,
}
