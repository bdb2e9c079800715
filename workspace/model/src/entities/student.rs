use sea_orm::entity::prelude::*;

/// A learner registered through the public signup form.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "students")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub student_id: i32,
    pub full_name: String,
    #[sea_orm(unique)]
    pub email: String,
    pub address: String,
    pub date_of_birth: Date,
    pub avatar: Option<String>,
    pub status: bool,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
