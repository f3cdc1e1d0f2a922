//! Membership sale.
//!
//! One row per customer interaction, owned by this service rather than
//! the directory. Member columns reference directory users and are null
//! until the sale is reconciled.

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "membership_sales")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub payment_service: String,
    pub status: Status,
    pub payment_id: String,
    pub transaction_type: TransactionType,
    pub membership_year: i32,
    pub usr1_id: Option<i64>,
    pub usr1_first_name: String,
    pub usr1_last_name: String,
    pub usr1_email: String,
    pub usr1_fee: Decimal,
    pub usr1_friend: bool,
    pub usr1_friend_fee: Decimal,
    pub usr2_id: Option<i64>,
    pub usr2_first_name: String,
    pub usr2_last_name: String,
    pub usr2_email: String,
    pub usr2_fee: Decimal,
    pub usr2_friend: bool,
    pub usr2_friend_fee: Decimal,
    pub donation_to_society: Decimal,
    pub donation_to_museum: Decimal,
    pub giftaid: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(Some(20))")]
pub enum Status {
    #[sea_orm(string_value = "Pending")]
    Pending,
    #[sea_orm(string_value = "Complete")]
    Complete,
    #[sea_orm(string_value = "Cancelled")]
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(Some(20))")]
pub enum TransactionType {
    #[sea_orm(string_value = "NewMember")]
    NewMember,
    #[sea_orm(string_value = "Renewal")]
    Renewal,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
