use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(UserData::Table)
                    .col(
                        ColumnDef::new(UserData::UsdId)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(UserData::UsdUsrId).big_integer().not_null())
                    .col(ColumnDef::new(UserData::UsdUsfId).big_integer().not_null())
                    .col(ColumnDef::new(UserData::UsdValue).text().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .from(UserData::Table, UserData::UsdUsrId)
                            .to(crate::Users::Table, crate::Users::UsrId)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(UserData::Table, UserData::UsdUsfId)
                            .to(crate::UserFields::Table, crate::UserFields::UsfId)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_adm_user_data_usr_usf")
                    .table(UserData::Table)
                    .col(UserData::UsdUsrId)
                    .col(UserData::UsdUsfId)
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(UserData::Table).to_owned())
            .await
    }
}

/// Learn more at https://docs.rs/sea-query#iden
#[derive(Iden)]
enum UserData {
    #[iden = "adm_user_data"]
    Table,
    UsdId,
    UsdUsrId,
    UsdUsfId,
    UsdValue,
}
