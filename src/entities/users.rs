use sea_orm::entity::prelude::*;

/// No unique index on `user_name` or `email`: uniqueness is checked by the
/// service before insert.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub user_id: i64,

    pub user_name: String,

    pub first_name: String,

    pub last_name: String,

    pub email: String,

    /// Single-letter status code: I, A or T.
    pub user_status: String,

    pub department: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
