//! Directory user.
//!
//! Users created by a membership sale are locked: their password is the
//! [`LOCKED_PASSWORD`] placeholder until the member activates the account
//! through the password reset flow.

use sea_orm::entity::prelude::*;

/// Password placeholder that denies interactive login.
pub const LOCKED_PASSWORD: &str = "*LK*";

/// User model.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "adm_users")]
pub struct Model {
    #[sea_orm(primary_key, column_name = "usr_id")]
    pub id: i64,
    #[sea_orm(column_name = "usr_uuid")]
    pub uuid: String,
    #[sea_orm(column_name = "usr_login_name")]
    pub login_name: String,
    #[sea_orm(column_name = "usr_password")]
    pub password: String,
    #[sea_orm(column_name = "usr_valid")]
    pub valid: bool,
}

/// User model relations.
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::member::Entity")]
    Members,

    #[sea_orm(has_many = "super::user_data::Entity")]
    UserData,
}

impl Related<super::member::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Members.def()
    }
}

impl Related<super::user_data::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::UserData.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
