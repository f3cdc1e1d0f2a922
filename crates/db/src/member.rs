//! Role membership of a directory user.
//!
//! For the [`MEMBER`] role every user owns a single record, whose end date
//! is the only machine-readable indicator of a paid-up membership.
//!
//! [`MEMBER`]: super::role::MEMBER

use sea_orm::entity::prelude::*;

/// Value of [`Model::approved`] for an approved membership.
pub const APPROVED: i16 = 1;

/// Member model.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "adm_members")]
pub struct Model {
    #[sea_orm(primary_key, column_name = "mem_id")]
    pub id: i64,
    #[sea_orm(column_name = "mem_uuid")]
    pub uuid: String,
    #[sea_orm(column_name = "mem_usr_id")]
    pub user_id: i64,
    #[sea_orm(column_name = "mem_rol_id")]
    pub role_id: i64,
    #[sea_orm(column_name = "mem_begin")]
    pub begin: DateTimeUtc,
    #[sea_orm(column_name = "mem_end")]
    pub end: DateTimeUtc,
    #[sea_orm(column_name = "mem_approved")]
    pub approved: Option<i16>,
}

impl Model {
    /// Check whether this membership covers the whole membership `year`.
    pub fn is_paid_up(&self, year: i32) -> bool {
        common::calendar::is_entitled(self.end, year)
    }
}

/// Member model relations.
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id"
    )]
    User,

    #[sea_orm(
        belongs_to = "super::role::Entity",
        from = "Column::RoleId",
        to = "super::role::Column::Id"
    )]
    Role,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::role::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Role.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
