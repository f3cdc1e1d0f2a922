use sea_orm_migration::{prelude::*, sea_orm::DbBackend};

#[derive(DeriveMigrationName)]
pub struct Migration;

/// Column holding an amount in pounds.
///
/// SQLite has no fixed point type, amounts there are stored as reals.
fn money(backend: DbBackend, column: MembershipSales) -> ColumnDef {
    let mut def = ColumnDef::new(column);

    match backend {
        DbBackend::Sqlite => def.double(),
        _ => def.decimal_len(10, 2),
    };

    def.not_null().default(0).to_owned()
}

fn text(column: MembershipSales) -> ColumnDef {
    ColumnDef::new(column)
        .string()
        .not_null()
        .default("")
        .to_owned()
}

fn flag(column: MembershipSales) -> ColumnDef {
    ColumnDef::new(column)
        .boolean()
        .not_null()
        .default(false)
        .to_owned()
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let backend = manager.get_database_backend();

        manager
            .create_table(
                Table::create()
                    .table(MembershipSales::Table)
                    .col(
                        ColumnDef::new(MembershipSales::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(&mut text(MembershipSales::PaymentService))
                    .col(
                        ColumnDef::new(MembershipSales::Status)
                            .string_len(20)
                            .not_null()
                            .default("Pending"),
                    )
                    .col(&mut text(MembershipSales::PaymentId))
                    .col(
                        ColumnDef::new(MembershipSales::TransactionType)
                            .string_len(20)
                            .not_null()
                            .default("NewMember"),
                    )
                    .col(
                        ColumnDef::new(MembershipSales::MembershipYear)
                            .integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(MembershipSales::Usr1Id).big_integer())
                    .col(&mut text(MembershipSales::Usr1FirstName))
                    .col(&mut text(MembershipSales::Usr1LastName))
                    .col(&mut text(MembershipSales::Usr1Email))
                    .col(&mut money(backend, MembershipSales::Usr1Fee))
                    .col(&mut flag(MembershipSales::Usr1Friend))
                    .col(&mut money(backend, MembershipSales::Usr1FriendFee))
                    .col(ColumnDef::new(MembershipSales::Usr2Id).big_integer())
                    .col(&mut text(MembershipSales::Usr2FirstName))
                    .col(&mut text(MembershipSales::Usr2LastName))
                    .col(&mut text(MembershipSales::Usr2Email))
                    .col(&mut money(backend, MembershipSales::Usr2Fee))
                    .col(&mut flag(MembershipSales::Usr2Friend))
                    .col(&mut money(backend, MembershipSales::Usr2FriendFee))
                    .col(&mut money(backend, MembershipSales::DonationToSociety))
                    .col(&mut money(backend, MembershipSales::DonationToMuseum))
                    .col(&mut flag(MembershipSales::Giftaid))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_membership_sales_payment_id")
                    .table(MembershipSales::Table)
                    .col(MembershipSales::PaymentId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(MembershipSales::Table).to_owned())
            .await
    }
}

/// Learn more at https://docs.rs/sea-query#iden
#[derive(Iden, Clone, Copy)]
enum MembershipSales {
    Table,
    Id,
    PaymentService,
    Status,
    PaymentId,
    TransactionType,
    MembershipYear,
    Usr1Id,
    Usr1FirstName,
    Usr1LastName,
    Usr1Email,
    Usr1Fee,
    Usr1Friend,
    Usr1FriendFee,
    Usr2Id,
    Usr2FirstName,
    Usr2LastName,
    Usr2Email,
    Usr2Fee,
    Usr2Friend,
    Usr2FriendFee,
    DonationToSociety,
    DonationToMuseum,
    Giftaid,
}
