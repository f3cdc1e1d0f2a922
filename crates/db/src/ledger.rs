//! Sale ledger.
//!
//! Durable record of every membership sale, kept apart from the directory.
//! All operations run inside a caller-owned [`DatabaseTransaction`] and never
//! commit or roll back by themselves.
//!
//! Update and delete must affect exactly one row, anything else points at a
//! logic error or a concurrent delete and is reported as
//! [`LedgerError::RowsAffected`].

use derive_more::{Display, Error, From};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveValue, ColumnTrait, DatabaseTransaction, DbErr, EntityTrait, QueryFilter,
};

use crate::sale::{self, Status, TransactionType};

/// Errors raised by the sale ledger.
#[derive(Debug, Display, From, Error)]
pub enum LedgerError {
    /// Database-related error.
    DatabaseError(DbErr),

    /// Requested sale does not exist.
    #[from(ignore)]
    #[display(fmt = "sale {} not found", _0)]
    NotFound(#[error(ignore)] i64),

    /// Update or delete did not affect exactly one row.
    #[from(ignore)]
    #[display(
        fmt = "{} of sale {} affected {} rows instead of one",
        operation,
        sale_id,
        rows
    )]
    RowsAffected {
        operation: &'static str,
        sale_id: i64,
        rows: u64,
    },
}

/// One person paying through a sale.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SaleMember {
    /// Directory user, `0` until the sale is reconciled.
    pub user_id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    /// Membership fee, ordinary for the primary member and associate otherwise.
    pub fee: Decimal,
    /// Friend of the museum.
    pub friend: bool,
    pub friend_fee: Decimal,
}

impl SaleMember {
    /// An associate is present only when a first name was provided.
    pub fn is_present(&self) -> bool {
        !self.first_name.is_empty()
    }
}

/// Customer interaction, from form submission to provisioned membership.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Sale {
    pub id: i64,
    /// Payment provider tag.
    pub payment_service: String,
    pub status: Status,
    /// Provider transaction identifier, empty while pending.
    pub payment_id: String,
    pub transaction_type: TransactionType,
    pub membership_year: i32,
    pub primary: SaleMember,
    pub associate: SaleMember,
    pub donation_to_society: Decimal,
    pub donation_to_museum: Decimal,
    pub giftaid: bool,
}

impl Sale {
    /// Create a new pending sale for `membership_year`.
    pub fn new(payment_service: impl Into<String>, membership_year: i32) -> Self {
        Self {
            id: 0,
            payment_service: payment_service.into(),
            status: Status::Pending,
            payment_id: String::new(),
            transaction_type: TransactionType::NewMember,
            membership_year,
            primary: SaleMember::default(),
            associate: SaleMember::default(),
            donation_to_society: Decimal::ZERO,
            donation_to_museum: Decimal::ZERO,
            giftaid: false,
        }
    }

    /// Total amount to be paid.
    ///
    /// The primary member's friend fee only counts when they are a friend
    /// of the museum. Returns zero if any of the summands is negative.
    pub fn total(&self) -> Decimal {
        let primary_friend_fee = if self.primary.friend {
            self.primary.friend_fee
        } else {
            Decimal::ZERO
        };

        let summands = [
            self.primary.fee,
            primary_friend_fee,
            self.associate.fee,
            self.associate.friend_fee,
            self.donation_to_society,
            self.donation_to_museum,
        ];

        if summands.iter().any(|amount| *amount < Decimal::ZERO) {
            return Decimal::ZERO;
        }

        summands.iter().sum()
    }

    /// Associate's own email, empty when missing or shared with the
    /// primary member.
    pub fn associate_email(&self) -> &str {
        let email = self.associate.email.trim();

        if email.eq_ignore_ascii_case(self.primary.email.trim()) {
            ""
        } else {
            email
        }
    }

    fn active_model(&self) -> sale::ActiveModel {
        let associate_id = if self.associate.is_present() {
            user_ref(self.associate.user_id)
        } else {
            None
        };

        sale::ActiveModel {
            id: ActiveValue::NotSet,
            payment_service: ActiveValue::Set(self.payment_service.clone()),
            status: ActiveValue::Set(self.status),
            payment_id: ActiveValue::Set(self.payment_id.clone()),
            transaction_type: ActiveValue::Set(self.transaction_type),
            membership_year: ActiveValue::Set(self.membership_year),
            usr1_id: ActiveValue::Set(user_ref(self.primary.user_id)),
            usr1_first_name: ActiveValue::Set(self.primary.first_name.clone()),
            usr1_last_name: ActiveValue::Set(self.primary.last_name.clone()),
            usr1_email: ActiveValue::Set(self.primary.email.clone()),
            usr1_fee: ActiveValue::Set(self.primary.fee),
            usr1_friend: ActiveValue::Set(self.primary.friend),
            usr1_friend_fee: ActiveValue::Set(self.primary.friend_fee),
            usr2_id: ActiveValue::Set(associate_id),
            usr2_first_name: ActiveValue::Set(self.associate.first_name.clone()),
            usr2_last_name: ActiveValue::Set(self.associate.last_name.clone()),
            usr2_email: ActiveValue::Set(self.associate.email.clone()),
            usr2_fee: ActiveValue::Set(self.associate.fee),
            usr2_friend: ActiveValue::Set(self.associate.friend),
            usr2_friend_fee: ActiveValue::Set(self.associate.friend_fee),
            donation_to_society: ActiveValue::Set(self.donation_to_society),
            donation_to_museum: ActiveValue::Set(self.donation_to_museum),
            giftaid: ActiveValue::Set(self.giftaid),
        }
    }
}

impl From<sale::Model> for Sale {
    fn from(model: sale::Model) -> Self {
        Self {
            id: model.id,
            payment_service: model.payment_service,
            status: model.status,
            payment_id: model.payment_id,
            transaction_type: model.transaction_type,
            membership_year: model.membership_year,
            primary: SaleMember {
                user_id: model.usr1_id.unwrap_or_default(),
                first_name: model.usr1_first_name,
                last_name: model.usr1_last_name,
                email: model.usr1_email,
                fee: model.usr1_fee,
                friend: model.usr1_friend,
                friend_fee: model.usr1_friend_fee,
            },
            associate: SaleMember {
                user_id: model.usr2_id.unwrap_or_default(),
                first_name: model.usr2_first_name,
                last_name: model.usr2_last_name,
                email: model.usr2_email,
                fee: model.usr2_fee,
                friend: model.usr2_friend,
                friend_fee: model.usr2_friend_fee,
            },
            donation_to_society: model.donation_to_society,
            donation_to_museum: model.donation_to_museum,
            giftaid: model.giftaid,
        }
    }
}

/// Unreconciled members are stored as null references.
fn user_ref(user_id: i64) -> Option<i64> {
    (user_id > 0).then_some(user_id)
}

/// Insert a new sale row, assigning the generated identifier back to `sale`.
pub async fn create(txn: &DatabaseTransaction, sale: &mut Sale) -> Result<i64, LedgerError> {
    let result = sale::Entity::insert(sale.active_model()).exec(txn).await?;

    sale.id = result.last_insert_id;

    Ok(sale.id)
}

/// Fetch a sale by its identifier.
pub async fn fetch_by_id(txn: &DatabaseTransaction, id: i64) -> Result<Sale, LedgerError> {
    sale::Entity::find_by_id(id)
        .one(txn)
        .await?
        .map(Sale::from)
        .ok_or(LedgerError::NotFound(id))
}

/// Overwrite every column of an existing sale.
pub async fn update(txn: &DatabaseTransaction, sale: &Sale) -> Result<(), LedgerError> {
    let result = sale::Entity::update_many()
        .set(sale.active_model())
        .filter(sale::Column::Id.eq(sale.id))
        .exec(txn)
        .await?;

    expect_single_row("update", sale.id, result.rows_affected)
}

/// Delete a sale, zeroing its identifier on success.
pub async fn delete(txn: &DatabaseTransaction, sale: &mut Sale) -> Result<(), LedgerError> {
    let result = sale::Entity::delete_by_id(sale.id).exec(txn).await?;

    expect_single_row("delete", sale.id, result.rows_affected)?;

    sale.id = 0;

    Ok(())
}

fn expect_single_row(operation: &'static str, sale_id: i64, rows: u64) -> Result<(), LedgerError> {
    if rows == 1 {
        Ok(())
    } else {
        Err(LedgerError::RowsAffected {
            operation,
            sale_id,
            rows,
        })
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;
    use sea_orm::TransactionTrait;

    use super::{create, delete, fetch_by_id, update, LedgerError, Sale, SaleMember};
    use crate::{
        sale::{Status, TransactionType},
        testing::create_database,
    };

    fn ada() -> Sale {
        let mut sale = Sale::new("Stripe", 2025);

        sale.primary = SaleMember {
            first_name: String::from("Ada"),
            last_name: String::from("Lovelace"),
            email: String::from("ada@example.org"),
            fee: Decimal::new(2400, 2),
            ..Default::default()
        };

        sale
    }

    fn curies() -> Sale {
        let mut sale = Sale::new("Stripe", 2025);

        sale.primary = SaleMember {
            first_name: String::from("Pierre"),
            last_name: String::from("Curie"),
            email: String::from("pc@ex.org"),
            fee: Decimal::new(24, 0),
            friend: true,
            friend_fee: Decimal::new(5, 0),
            ..Default::default()
        };
        sale.associate = SaleMember {
            first_name: String::from("Marie"),
            last_name: String::from("Curie"),
            fee: Decimal::new(6, 0),
            friend: true,
            friend_fee: Decimal::new(5, 0),
            ..Default::default()
        };
        sale.donation_to_society = Decimal::new(150, 2);
        sale.donation_to_museum = Decimal::new(250, 2);
        sale.giftaid = true;

        sale
    }

    #[test]
    fn total() {
        assert_eq!(ada().total(), Decimal::new(2400, 2));
        assert_eq!(curies().total(), Decimal::new(4400, 2));
    }

    #[test]
    fn friend_fee_needs_friend() {
        let mut sale = ada();
        sale.primary.friend_fee = Decimal::new(5, 0);

        assert_eq!(sale.total(), Decimal::new(24, 0));

        sale.primary.friend = true;

        assert_eq!(sale.total(), Decimal::new(29, 0));
    }

    #[test]
    fn associate_email() {
        let mut sale = curies();

        assert_eq!(sale.associate_email(), "");

        sale.associate.email = String::from(" PC@ex.org ");
        assert_eq!(sale.associate_email(), "");

        sale.associate.email = String::from("mc@ex.org ");
        assert_eq!(sale.associate_email(), "mc@ex.org");
    }

    #[test]
    fn negative_total() {
        let mut sale = curies();
        sale.donation_to_museum = Decimal::new(-100, 2);

        assert_eq!(sale.total(), Decimal::ZERO);
    }

    #[tokio::test]
    async fn create_and_fetch() {
        let db = create_database().await;
        let txn = db.begin().await.unwrap();

        let mut sale = curies();
        let id = create(&txn, &mut sale).await.unwrap();

        assert!(id > 0);
        assert_eq!(sale.id, id);

        let fetched = fetch_by_id(&txn, id).await.unwrap();

        assert_eq!(fetched.status, Status::Pending);
        assert_eq!(fetched.transaction_type, TransactionType::NewMember);
        assert_eq!(fetched.primary.user_id, 0);
        assert_eq!(fetched.associate.user_id, 0);
        assert_eq!(fetched.associate.first_name, "Marie");
        assert_eq!(fetched.total(), Decimal::new(44, 0));
        assert!(fetched.giftaid);
    }

    #[tokio::test]
    async fn missing_sale() {
        let db = create_database().await;
        let txn = db.begin().await.unwrap();

        assert!(matches!(
            fetch_by_id(&txn, 42).await,
            Err(LedgerError::NotFound(42))
        ));
    }

    #[tokio::test]
    async fn update_overwrites_columns() {
        let db = create_database().await;
        let txn = db.begin().await.unwrap();

        let mut sale = ada();
        create(&txn, &mut sale).await.unwrap();

        sale.status = Status::Complete;
        sale.payment_id = String::from("cs_test_1");
        sale.transaction_type = TransactionType::Renewal;
        sale.primary.user_id = 7;

        update(&txn, &sale).await.unwrap();

        let fetched = fetch_by_id(&txn, sale.id).await.unwrap();

        assert_eq!(fetched.status, Status::Complete);
        assert_eq!(fetched.payment_id, "cs_test_1");
        assert_eq!(fetched.transaction_type, TransactionType::Renewal);
        assert_eq!(fetched.primary.user_id, 7);
        assert_eq!(fetched.associate.user_id, 0);
    }

    #[tokio::test]
    async fn delete_zeroes_identifier() {
        let db = create_database().await;
        let txn = db.begin().await.unwrap();

        let mut sale = ada();
        let id = create(&txn, &mut sale).await.unwrap();

        delete(&txn, &mut sale).await.unwrap();

        assert_eq!(sale.id, 0);
        assert!(matches!(
            fetch_by_id(&txn, id).await,
            Err(LedgerError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn update_of_deleted_sale_fails() {
        let db = create_database().await;
        let txn = db.begin().await.unwrap();

        let mut sale = ada();
        let id = create(&txn, &mut sale).await.unwrap();

        let mut copy = sale.clone();
        delete(&txn, &mut copy).await.unwrap();

        assert!(matches!(
            update(&txn, &sale).await,
            Err(LedgerError::RowsAffected {
                operation: "update",
                rows: 0,
                ..
            })
        ));

        assert!(matches!(
            delete(&txn, &mut sale).await,
            Err(LedgerError::RowsAffected {
                operation: "delete",
                ..
            })
        ));
        assert_eq!(sale.id, id);
    }
}
