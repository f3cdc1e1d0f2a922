use sea_orm::entity::prelude::*;

/// Role every paying member belongs to.
pub const MEMBER: &str = "Member";

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "adm_roles")]
pub struct Model {
    #[sea_orm(primary_key, column_name = "rol_id")]
    pub id: i64,
    #[sea_orm(column_name = "rol_name")]
    pub name: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::member::Entity")]
    Members,
}

impl Related<super::member::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Members.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
