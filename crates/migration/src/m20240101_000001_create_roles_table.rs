use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

/// Roles every directory installation starts with.
const ROLES: [(&str, &str); 2] = [
    ("Administrator", "4b0a8c58-5e0c-4a53-9c5b-0b1f5b1e6d01"),
    ("Member", "4b0a8c58-5e0c-4a53-9c5b-0b1f5b1e6d02"),
];

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Roles::Table)
                    .col(
                        ColumnDef::new(Roles::RolId)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Roles::RolUuid)
                            .string_len(36)
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(Roles::RolName)
                            .string_len(100)
                            .not_null()
                            .unique_key(),
                    )
                    .to_owned(),
            )
            .await?;

        let mut insert = Query::insert();
        insert
            .into_table(Roles::Table)
            .columns([Roles::RolName, Roles::RolUuid]);

        for (name, uuid) in ROLES {
            insert.values_panic([name.into(), uuid.into()]);
        }

        crate::exec_data(manager, &insert).await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Roles::Table).to_owned())
            .await
    }
}

/// Learn more at https://docs.rs/sea-query#iden
#[derive(Iden)]
pub(crate) enum Roles {
    #[iden = "adm_roles"]
    Table,
    RolId,
    RolUuid,
    RolName,
}
