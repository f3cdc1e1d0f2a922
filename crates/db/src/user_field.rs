//! Profile field definitions.
//!
//! Each field is a typed key/value slot which may be attached to a user.
//! Fields are addressed by their internal name only, identifiers are
//! resolved at runtime by the directory adapter.

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "adm_user_fields")]
pub struct Model {
    #[sea_orm(primary_key, column_name = "usf_id")]
    pub id: i64,
    #[sea_orm(column_name = "usf_uuid")]
    pub uuid: String,
    #[sea_orm(column_name = "usf_name_intern")]
    pub name_intern: String,
    #[sea_orm(column_name = "usf_name")]
    pub name: String,
    #[sea_orm(column_name = "usf_type")]
    pub field_type: FieldType,
}

/// Semantic type of the textual field value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(Some(30))")]
pub enum FieldType {
    #[sea_orm(string_value = "TEXT")]
    Text,
    #[sea_orm(string_value = "EMAIL")]
    Email,
    #[sea_orm(string_value = "PHONE")]
    Phone,
    #[sea_orm(string_value = "NUMBER")]
    Number,
    #[sea_orm(string_value = "DECIMAL")]
    Decimal,
    #[sea_orm(string_value = "DATE")]
    Date,
    #[sea_orm(string_value = "CHECKBOX")]
    Checkbox,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::user_data::Entity")]
    UserData,
}

impl Related<super::user_data::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::UserData.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
