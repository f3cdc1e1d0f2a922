use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Members::Table)
                    .col(
                        ColumnDef::new(Members::MemId)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Members::MemUuid)
                            .string_len(36)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Members::MemUsrId).big_integer().not_null())
                    .col(ColumnDef::new(Members::MemRolId).big_integer().not_null())
                    .col(
                        ColumnDef::new(Members::MemBegin)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Members::MemEnd)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Members::MemApproved).small_integer())
                    .foreign_key(
                        ForeignKey::create()
                            .from(Members::Table, Members::MemUsrId)
                            .to(crate::Users::Table, crate::Users::UsrId)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(Members::Table, Members::MemRolId)
                            .to(crate::Roles::Table, crate::Roles::RolId)
                            .on_delete(ForeignKeyAction::Restrict)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_adm_members_usr_rol")
                    .table(Members::Table)
                    .col(Members::MemUsrId)
                    .col(Members::MemRolId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Members::Table).to_owned())
            .await
    }
}

/// Learn more at https://docs.rs/sea-query#iden
#[derive(Iden)]
enum Members {
    #[iden = "adm_members"]
    Table,
    MemId,
    MemUuid,
    MemUsrId,
    MemRolId,
    MemBegin,
    MemEnd,
    MemApproved,
}
