use sea_orm::entity::prelude::*;

/// Value of a single profile field for a single user.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "adm_user_data")]
pub struct Model {
    #[sea_orm(primary_key, column_name = "usd_id")]
    pub id: i64,
    #[sea_orm(column_name = "usd_usr_id")]
    pub user_id: i64,
    #[sea_orm(column_name = "usd_usf_id")]
    pub field_id: i64,
    #[sea_orm(column_name = "usd_value")]
    pub value: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id"
    )]
    User,

    #[sea_orm(
        belongs_to = "super::user_field::Entity",
        from = "Column::FieldId",
        to = "super::user_field::Column::Id"
    )]
    Field,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::user_field::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Field.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
