//! Reconciliation of paid sales.
//!
//! Provisioning runs in two transactions. The first one creates or
//! extends the memberships and marks the sale complete, once it commits
//! the customer is a member for the year. The second one records the
//! household bookkeeping values, its failures are logged and otherwise
//! ignored, so they can never undo the first commit.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use common::{
    calendar::{self, Clock},
    config::Config,
};
use db::{
    directory::{
        fields::{self, Field, FieldValue},
        Directory, DirectoryError,
    },
    ledger::{self, Sale, SaleMember},
    role,
    sale::{Status, TransactionType},
    DatabaseConnection, DatabaseTransaction, TransactionTrait,
};
use tracing::{error, info, instrument, warn};

use crate::{
    error::{Failure, StepError},
    resolver,
};

/// Result of a reconciliation request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// Members were provisioned by this request.
    Reconciled(Sale),

    /// Sale had been completed before, nothing was written.
    AlreadyComplete(Sale),
}

impl Outcome {
    pub fn sale(&self) -> &Sale {
        match self {
            Outcome::Reconciled(sale) | Outcome::AlreadyComplete(sale) => sale,
        }
    }
}

/// Reconciliation engine.
pub struct Reconciler {
    directory: Arc<Directory>,
    clock: Arc<dyn Clock>,
    config: Arc<Config>,
}

impl Reconciler {
    pub fn new(directory: Arc<Directory>, clock: Arc<dyn Clock>, config: Arc<Config>) -> Self {
        Self {
            directory,
            clock,
            config,
        }
    }

    /// Provision the members paid for by sale `sale_id`.
    ///
    /// Errors are only returned for failures that happen before the sale
    /// is marked complete, in which case nothing is written at all.
    #[instrument(skip(self, db, payment_id), err)]
    pub async fn reconcile(
        &self,
        db: &DatabaseConnection,
        sale_id: i64,
        payment_id: String,
    ) -> Result<Outcome, StepError> {
        let directory = self.directory.clone();
        let now = self.clock.now();
        let with_associate = self.config.enable_other_member_types;

        let outcome = db
            .transaction::<_, Outcome, StepError>(move |txn| {
                Box::pin(async move {
                    let mut sale = ledger::fetch_by_id(txn, sale_id)
                        .await
                        .map_err(|err| StepError::new("fetch sale", sale_id, err))?;

                    if sale.status == Status::Complete {
                        return Ok(Outcome::AlreadyComplete(sale));
                    }

                    provision(&directory, txn, &mut sale, now, with_associate).await?;

                    sale.status = Status::Complete;
                    sale.payment_id = payment_id;

                    ledger::update(txn, &sale)
                        .await
                        .map_err(|err| StepError::new("update sale", sale_id, err))?;

                    Ok(Outcome::Reconciled(sale))
                })
            })
            .await
            .map_err(|err| StepError::from_transaction(err, sale_id))?;

        match &outcome {
            Outcome::Reconciled(sale) => {
                info!(
                    sale_id,
                    transaction_type = ?sale.transaction_type,
                    primary = sale.primary.user_id,
                    associate = sale.associate.user_id,
                    "membership provisioned"
                );

                let failures = self.bookkeeping(db, sale, now).await;

                if failures > 0 {
                    warn!(sale_id, failures, "bookkeeping incomplete");
                }
            }
            Outcome::AlreadyComplete(_) => {
                info!(sale_id, "sale already complete");
            }
        }

        Ok(outcome)
    }

    /// Record payment details on the provisioned members.
    ///
    /// Returns the number of failed writes.
    async fn bookkeeping(&self, db: &DatabaseConnection, sale: &Sale, now: DateTime<Utc>) -> usize {
        let txn = match db.begin().await {
            Ok(txn) => txn,
            Err(err) => {
                error!(sale_id = sale.id, %err, "unable to begin bookkeeping transaction");
                return 1;
            }
        };

        let mut book = Book {
            directory: &self.directory,
            txn: &txn,
            sale_id: sale.id,
            failures: 0,
        };

        let primary = sale.primary.user_id;
        let associate = (sale.associate.user_id > 0).then_some(sale.associate.user_id);

        let household = [Some(primary), associate];
        let members_at_address = household.iter().flatten().count() as i32;
        let friends = [
            sale.primary.friend,
            associate.is_some() && sale.associate.friend,
        ]
        .iter()
        .filter(|friend| **friend)
        .count() as i32;

        let today = calendar::london_today(now);

        for user_id in household.into_iter().flatten() {
            book.record(fields::DATE_LAST_PAID, user_id, today).await;
            book.record(fields::MEMBERS_AT_ADDRESS, user_id, members_at_address)
                .await;
            book.record(
                fields::NUMBER_OF_FRIENDS_OF_THE_MUSEUM_AT_THIS_ADDRESS,
                user_id,
                friends,
            )
            .await;
        }

        book.record(fields::VALUE_OF_LAST_PAYMENT, primary, sale.total())
            .await;
        book.record(fields::FRIEND_OF_THE_MUSEUM, primary, sale.primary.friend)
            .await;

        if let Some(associate) = associate {
            book.record(fields::FRIEND_OF_THE_MUSEUM, associate, sale.associate.friend)
                .await;
        }

        book.record(
            fields::VALUE_OF_DONATION_TO_LDLHS,
            primary,
            sale.donation_to_society,
        )
        .await;
        book.record(
            fields::VALUE_OF_DONATION_TO_THE_MUSEUM,
            primary,
            sale.donation_to_museum,
        )
        .await;
        book.record(
            fields::GIFT_AID,
            primary,
            self.config.enable_giftaid && sale.giftaid,
        )
        .await;

        let failures = book.failures;

        if let Err(err) = txn.commit().await {
            error!(sale_id = sale.id, %err, "unable to commit bookkeeping");
            return failures + 1;
        }

        failures
    }
}

/// Best-effort profile writes for a single sale.
struct Book<'a> {
    directory: &'a Directory,
    txn: &'a DatabaseTransaction,
    sale_id: i64,
    failures: usize,
}

impl Book<'_> {
    async fn record<T: FieldValue>(&mut self, field: Field<T>, user_id: i64, value: T) {
        if let Err(err) = self
            .directory
            .set_value(self.txn, field, user_id, &value)
            .await
        {
            self.failures += 1;

            error!(
                sale_id = self.sale_id,
                user_id,
                field = field.name(),
                %err,
                "bookkeeping write failed"
            );
        }
    }
}

/// Create or extend the memberships paid for by `sale`.
async fn provision(
    directory: &Directory,
    txn: &DatabaseTransaction,
    sale: &mut Sale,
    now: DateTime<Utc>,
    with_associate: bool,
) -> Result<(), StepError> {
    let sale_id = sale.id;

    let resolved = resolver::resolve(directory, txn, sale)
        .await
        .map_err(|err| StepError::new("resolve members", sale_id, err))?;

    sale.transaction_type = if resolved.is_renewal() {
        TransactionType::Renewal
    } else {
        TransactionType::NewMember
    };

    let year = sale.membership_year;
    let primary_login = sale.primary.email.trim().to_owned();

    if !resolved.is_renewal() && primary_login.is_empty() {
        return Err(StepError::new(
            "provision primary member",
            sale_id,
            Failure::MissingEmail,
        ));
    }

    sale.primary.user_id = provision_person(
        directory,
        txn,
        &sale.primary,
        resolved.primary,
        &primary_login,
        now,
        year,
    )
    .await
    .map_err(|err| StepError::new("provision primary member", sale_id, err))?;

    if with_associate && sale.associate.is_present() {
        let login = associate_login(sale);

        sale.associate.user_id = provision_person(
            directory,
            txn,
            &sale.associate,
            resolved.associate,
            &login,
            now,
            year,
        )
        .await
        .map_err(|err| StepError::new("provision associate member", sale_id, err))?;
    } else {
        sale.associate.user_id = 0;
    }

    Ok(())
}

/// Extend the membership of `existing` or create a new one, returning the
/// member's user identifier.
async fn provision_person(
    directory: &Directory,
    txn: &DatabaseTransaction,
    person: &SaleMember,
    existing: i64,
    login: &str,
    now: DateTime<Utc>,
    year: i32,
) -> Result<i64, Failure> {
    if existing > 0 {
        directory.set_member_end_date(txn, existing, year).await?;
        return Ok(existing);
    }

    let user = match directory
        .get_by_login_name(txn, login)
        .await?
        .into_iter()
        .next()
    {
        Some(user) => user,
        None => directory.create_locked(txn, login).await?,
    };

    match directory.get_member_for_user(txn, user.id).await {
        Ok(_) => {
            directory.set_member_end_date(txn, user.id, year).await?;
        }
        Err(DirectoryError::MemberNotFound(_)) => {
            directory
                .create_member(
                    txn,
                    user.id,
                    role::MEMBER,
                    now,
                    calendar::membership_end(year),
                )
                .await?;
        }
        Err(err) => return Err(err.into()),
    }

    directory
        .set_value(txn, fields::FIRST_NAME, user.id, &person.first_name)
        .await?;
    directory
        .set_value(txn, fields::LAST_NAME, user.id, &person.last_name)
        .await?;

    if !person.email.trim().is_empty() {
        directory
            .set_value(txn, fields::EMAIL, user.id, &person.email.trim().to_owned())
            .await?;
    }

    Ok(user.id)
}

/// Login name of a new associate member.
///
/// The associate's own email is used when it differs from the primary's,
/// otherwise the login is synthesized from the associate's names.
fn associate_login(sale: &Sale) -> String {
    let email = sale.associate_email();

    if !email.is_empty() {
        return email.to_owned();
    }

    format!("{} {}", sale.associate.first_name, sale.associate.last_name)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(".")
        .to_lowercase()
}
