use sea_orm::entity::prelude::*;

/// A named role that users are assigned to.
///
/// Roles are soft-deleted by flipping `status` to false and stamping
/// `deleted_at`; both fields always move together.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "roles")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub role_id: i32,
    /// Upper-snake-case name, e.g. `CONTENT_EDITOR`.
    #[sea_orm(unique)]
    pub role_name: String,
    pub description: Option<String>,
    pub status: bool,
    /// User that created the role, if known.
    pub created_by: Option<i32>,
    /// User that last modified the role, if any.
    pub modified_by: Option<i32>,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
    pub deleted_at: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Users currently assigned to this role.
    #[sea_orm(has_many = "super::user::Entity")]
    User,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Returns true when the role can be assigned to users.
    pub fn is_active(&self) -> bool {
        self.status && self.deleted_at.is_none()
    }
}
