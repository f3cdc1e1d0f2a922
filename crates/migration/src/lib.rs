pub use sea_orm_migration::prelude::*;

use sea_orm::ConnectionTrait;

mod m20240101_000001_create_roles_table;
mod m20240101_000002_create_users_table;
mod m20240101_000003_create_members_table;
mod m20240101_000004_create_user_fields_table;
mod m20240101_000005_create_user_data_table;
mod m20240101_000006_create_membership_sales_table;

pub(crate) use m20240101_000001_create_roles_table::Roles;
pub(crate) use m20240101_000002_create_users_table::Users;
pub(crate) use m20240101_000004_create_user_fields_table::UserFields;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240101_000001_create_roles_table::Migration),
            Box::new(m20240101_000002_create_users_table::Migration),
            Box::new(m20240101_000003_create_members_table::Migration),
            Box::new(m20240101_000004_create_user_fields_table::Migration),
            Box::new(m20240101_000005_create_user_data_table::Migration),
            Box::new(m20240101_000006_create_membership_sales_table::Migration),
        ]
    }
}

/// Execute a data statement as part of a migration.
pub(crate) async fn exec_data<S: sea_orm::StatementBuilder>(
    manager: &SchemaManager<'_>,
    statement: &S,
) -> Result<(), DbErr> {
    let db = manager.get_connection();
    db.execute(db.get_database_backend().build(statement))
        .await
        .map(|_| ())
}
