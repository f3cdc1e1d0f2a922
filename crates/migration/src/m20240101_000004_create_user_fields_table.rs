use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

/// Profile fields used by membership processing.
///
/// Tuples hold the internal name, display name, and value type.
const FIELDS: [(&str, &str, &str); 15] = [
    ("FIRST_NAME", "First name", "TEXT"),
    ("LAST_NAME", "Last name", "TEXT"),
    ("EMAIL", "E-mail", "EMAIL"),
    ("STREET", "Street", "TEXT"),
    ("POSTCODE", "Postcode", "TEXT"),
    ("FRIEND_OF_THE_MUSEUM", "Friend of the museum", "CHECKBOX"),
    ("GIFT_AID", "Gift aid", "CHECKBOX"),
    ("DATE_LAST_PAID", "Date last paid", "DATE"),
    ("VALUE_OF_LAST_PAYMENT", "Value of last payment", "DECIMAL"),
    (
        "VALUE_OF_DONATION_TO_LDLHS",
        "Value of donation to the society",
        "DECIMAL",
    ),
    (
        "VALUE_OF_DONATION_TO_THE_MUSEUM",
        "Value of donation to the museum",
        "DECIMAL",
    ),
    ("MEMBERS_AT_ADDRESS", "Members at address", "NUMBER"),
    (
        "NUMBER_OF_FRIENDS_OF_THE_MUSEUM_AT_THIS_ADDRESS",
        "Friends of the museum at this address",
        "NUMBER",
    ),
    (
        "PERMISSION_TO_SEND_EMAILS",
        "Permission to send e-mails",
        "CHECKBOX",
    ),
    (
        "DATA_PROTECTION_PERMISSION",
        "Data protection permission",
        "CHECKBOX",
    ),
];

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(UserFields::Table)
                    .col(
                        ColumnDef::new(UserFields::UsfId)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(UserFields::UsfUuid)
                            .string_len(36)
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(UserFields::UsfNameIntern)
                            .string_len(110)
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(UserFields::UsfName)
                            .string_len(100)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(UserFields::UsfType)
                            .string_len(30)
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        let mut insert = Query::insert();
        insert.into_table(UserFields::Table).columns([
            UserFields::UsfUuid,
            UserFields::UsfNameIntern,
            UserFields::UsfName,
            UserFields::UsfType,
        ]);

        for (index, (name_intern, name, field_type)) in FIELDS.into_iter().enumerate() {
            let uuid = format!("7d3f6a2e-1c4b-4e8a-9f10-{:012x}", index + 1);
            insert.values_panic([
                uuid.into(),
                name_intern.into(),
                name.into(),
                field_type.into(),
            ]);
        }

        crate::exec_data(manager, &insert).await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(UserFields::Table).to_owned())
            .await
    }
}

/// Learn more at https://docs.rs/sea-query#iden
#[derive(Iden)]
pub(crate) enum UserFields {
    #[iden = "adm_user_fields"]
    Table,
    UsfId,
    UsfUuid,
    UsfNameIntern,
    UsfName,
    UsfType,
}
