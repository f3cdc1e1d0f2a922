//! Checkout orchestration.
//!
//! A checkout is split across two requests. [`Checkout::begin`] records
//! a pending sale and opens a payment session for it, the sale is
//! committed before the provider learns its identifier so that the
//! callback can always find it. [`Checkout::complete`] runs when the
//! provider redirects the customer back and provisions the members.

use std::sync::Arc;

use common::{
    calendar::{self, Clock},
    config::Config,
};
use db::{
    directory::Directory,
    ledger::{self, Sale, SaleMember},
    DatabaseConnection, TransactionTrait,
};
use payments::{CheckoutParams, CheckoutSession, PaymentProvider};
use rust_decimal::{prelude::ToPrimitive, Decimal, RoundingStrategy};
use tracing::{info, instrument};

use crate::{
    error::{CheckoutError, Failure, StepError},
    reconciler::{Outcome, Reconciler},
};

/// Person named on a membership form.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Applicant {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    /// Wants to become a friend of the museum.
    pub friend: bool,
}

/// Validated membership form.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Order {
    pub primary: Applicant,
    pub associate: Option<Applicant>,
    pub donation_to_society: Decimal,
    pub donation_to_museum: Decimal,
    pub giftaid: bool,
}

/// Checkout orchestrator.
pub struct Checkout {
    db: Arc<DatabaseConnection>,
    provider: Arc<dyn PaymentProvider>,
    clock: Arc<dyn Clock>,
    config: Arc<Config>,
    reconciler: Reconciler,
}

impl Checkout {
    pub fn new(
        db: Arc<DatabaseConnection>,
        directory: Arc<Directory>,
        provider: Arc<dyn PaymentProvider>,
        clock: Arc<dyn Clock>,
        config: Arc<Config>,
    ) -> Self {
        let reconciler = Reconciler::new(directory, clock.clone(), config.clone());

        Self {
            db,
            provider,
            clock,
            config,
            reconciler,
        }
    }

    /// Price `order` for the current membership year.
    ///
    /// Associate and friend fees only apply when other member types are
    /// enabled, gift aid only when it is enabled.
    pub fn price(&self, order: &Order) -> Sale {
        let config = &self.config;
        let others = config.enable_other_member_types;
        let year = calendar::membership_year(self.clock.now());

        let mut sale = Sale::new(config.payment_service.clone(), year);

        sale.primary = self.sale_member(&order.primary, config.ordinary_member_fee);

        if let Some(associate) = order.associate.as_ref().filter(|_| others) {
            if !associate.first_name.trim().is_empty() {
                sale.associate = self.sale_member(associate, config.associate_member_fee);
            }
        }

        sale.donation_to_society = order.donation_to_society;
        sale.donation_to_museum = order.donation_to_museum;
        sale.giftaid = config.enable_giftaid && order.giftaid;

        sale
    }

    fn sale_member(&self, applicant: &Applicant, fee: Decimal) -> SaleMember {
        let friend = self.config.enable_other_member_types && applicant.friend;

        SaleMember {
            user_id: 0,
            first_name: applicant.first_name.trim().to_owned(),
            last_name: applicant.last_name.trim().to_owned(),
            email: applicant.email.trim().to_owned(),
            fee,
            friend,
            friend_fee: if friend {
                self.config.friend_fee
            } else {
                Decimal::ZERO
            },
        }
    }

    /// Record a pending sale for `order` and open a payment session for it.
    #[instrument(skip_all, err)]
    pub async fn begin(&self, order: &Order) -> Result<CheckoutSession, CheckoutError> {
        let sale = self.price(order);
        let total = sale.total();

        if total <= Decimal::ZERO {
            return Err(CheckoutError::PrePayment(StepError::new(
                "price sale",
                0,
                Failure::ZeroTotal,
            )));
        }

        let unit_amount_pennies = pennies(total).ok_or_else(|| {
            CheckoutError::PrePayment(StepError::new(
                "price sale",
                0,
                Failure::InvalidAmount(total),
            ))
        })?;

        let pending = sale.clone();
        let sale_id = self
            .db
            .transaction::<_, i64, StepError>(move |txn| {
                Box::pin(async move {
                    let mut pending = pending;

                    ledger::create(txn, &mut pending)
                        .await
                        .map_err(|err| StepError::new("create sale", 0, err))
                })
            })
            .await
            .map_err(|err| CheckoutError::PrePayment(StepError::from_transaction(err, 0)))?;

        info!(sale_id, %total, year = sale.membership_year, "created pending sale");

        let params = CheckoutParams {
            unit_amount_pennies,
            client_reference_id: sale_id.to_string(),
            success_url: self.config.success_url(),
            cancel_url: self.config.cancel_url(),
            customer_email: Some(sale.primary.email.clone()).filter(|email| !email.is_empty()),
            description: format!(
                "{} membership {}",
                self.config.organisation_name, sale.membership_year
            ),
        };

        let session = self.provider.create_session(&params).await.map_err(|err| {
            CheckoutError::PrePayment(StepError::new("create payment session", sale_id, err))
        })?;

        info!(sale_id, session_id = %session.id, "payment session created");

        Ok(session)
    }

    /// Provision the members paid for in payment session `session_id`.
    #[instrument(skip(self), err)]
    pub async fn complete(&self, session_id: &str) -> Result<Outcome, CheckoutError> {
        let details = self.provider.get_session(session_id).await.map_err(|err| {
            CheckoutError::PostPayment(StepError::new("fetch payment session", 0, err))
        })?;

        let sale_id = details
            .client_reference_id
            .as_deref()
            .and_then(|reference| reference.trim().parse::<i64>().ok())
            .filter(|id| *id > 0)
            .ok_or_else(|| {
                CheckoutError::PostPayment(StepError::new(
                    "read client reference",
                    0,
                    Failure::InvalidReference(details.client_reference_id.clone()),
                ))
            })?;

        if !details.is_paid() {
            return Err(CheckoutError::PostPayment(StepError::new(
                "check payment status",
                sale_id,
                Failure::NotPaid(details.status),
            )));
        }

        self.reconciler
            .reconcile(&self.db, sale_id, session_id.to_owned())
            .await
            .map_err(CheckoutError::PostPayment)
    }
}

/// Amount in pennies, rounding half-pennies away from zero.
fn pennies(total: Decimal) -> Option<i64> {
    (total * Decimal::ONE_HUNDRED)
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::{Datelike, NaiveDate};
    use common::{calendar::FixedClock, config::Config};
    use db::{
        directory::{
            fields::{self, Field},
            Directory, DirectoryError,
        },
        ledger::{self, SaleMember},
        member,
        sale::{Status, TransactionType},
        user, user_data, user_field, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter,
        TransactionTrait,
    };
    use payments::{testing::FakeProvider, PaymentError};
    use rust_decimal::Decimal;

    use super::{pennies, Applicant, Checkout, Order};
    use crate::{
        error::{CheckoutError, Failure},
        reconciler::Outcome,
        testing::create_database,
    };

    struct Harness {
        db: Arc<DatabaseConnection>,
        provider: Arc<FakeProvider>,
        checkout: Checkout,
        directory: Directory,
    }

    async fn harness(config: Config) -> Harness {
        let db = Arc::new(create_database().await);
        let provider = Arc::new(FakeProvider::new());

        let checkout = Checkout::new(
            db.clone(),
            Arc::new(Directory::new()),
            provider.clone(),
            Arc::new(FixedClock::london(2025, 4, 2, 10, 0, 0)),
            Arc::new(config),
        );

        Harness {
            db,
            provider,
            checkout,
            directory: Directory::new(),
        }
    }

    fn ada() -> Order {
        Order {
            primary: Applicant {
                first_name: String::from("Ada"),
                last_name: String::from("Lovelace"),
                email: String::from("ada@example.org"),
                friend: false,
            },
            ..Default::default()
        }
    }

    fn curies() -> Order {
        Order {
            primary: Applicant {
                first_name: String::from("Pierre"),
                last_name: String::from("Curie"),
                email: String::from("pc@ex.org"),
                friend: true,
            },
            associate: Some(Applicant {
                first_name: String::from("Marie"),
                last_name: String::from("Curie"),
                email: String::new(),
                friend: true,
            }),
            donation_to_society: Decimal::new(150, 2),
            donation_to_museum: Decimal::new(250, 2),
            giftaid: true,
        }
    }

    fn reconciled(outcome: Outcome) -> ledger::Sale {
        match outcome {
            Outcome::Reconciled(sale) => sale,
            Outcome::AlreadyComplete(_) => panic!("sale was already complete"),
        }
    }

    #[test]
    fn amount_in_pennies() {
        assert_eq!(pennies(Decimal::new(44, 0)), Some(4400));
        assert_eq!(pennies(Decimal::new(2450, 2)), Some(2450));
        assert_eq!(pennies(Decimal::new(10005, 3)), Some(1001));
    }

    #[tokio::test]
    async fn pricing_follows_config() {
        let mut config = Config::for_tests();
        config.enable_other_member_types = false;
        config.enable_giftaid = false;

        let harness = harness(config).await;
        let sale = harness.checkout.price(&curies());

        assert_eq!(sale.membership_year, 2025);
        assert!(!sale.primary.friend);
        assert_eq!(sale.primary.friend_fee, Decimal::ZERO);
        assert_eq!(sale.associate, SaleMember::default());
        assert!(!sale.giftaid);
        assert_eq!(sale.total(), Decimal::new(28, 0));
    }

    #[tokio::test]
    async fn new_member() {
        let harness = harness(Config::for_tests()).await;

        let session = harness.checkout.begin(&ada()).await.unwrap();

        let sessions = harness.provider.sessions();
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].unit_amount_pennies, 2400);
        assert_eq!(sessions[0].customer_email.as_deref(), Some("ada@example.org"));

        let sale_id: i64 = sessions[0].client_reference_id.parse().unwrap();

        let sale = reconciled(harness.checkout.complete(&session.id).await.unwrap());

        assert_eq!(sale.id, sale_id);
        assert_eq!(sale.status, Status::Complete);
        assert_eq!(sale.payment_id, session.id);
        assert_eq!(sale.transaction_type, TransactionType::NewMember);
        assert_eq!(sale.total(), Decimal::new(24, 0));

        let directory = &harness.directory;
        let txn = harness.db.begin().await.unwrap();

        let users = directory
            .get_by_login_name(&txn, "ada@example.org")
            .await
            .unwrap();
        assert_eq!(users.len(), 1);
        assert_eq!(users[0].id, sale.primary.user_id);
        assert_eq!(users[0].password, user::LOCKED_PASSWORD);
        assert!(users[0].valid);

        let member = directory
            .get_member_for_user(&txn, users[0].id)
            .await
            .unwrap();
        assert_eq!(member.end.date_naive(), NaiveDate::from_ymd_opt(2025, 12, 31).unwrap());
        assert_eq!(member.approved, Some(member::APPROVED));
        assert!(member.is_paid_up(2025));
        assert!(!member.is_paid_up(2026));

        let user_id = users[0].id;

        assert_eq!(
            directory
                .get_value(&txn, fields::DATE_LAST_PAID, user_id)
                .await
                .unwrap(),
            NaiveDate::from_ymd_opt(2025, 4, 2).unwrap()
        );
        assert_eq!(
            directory
                .get_value(&txn, fields::VALUE_OF_LAST_PAYMENT, user_id)
                .await
                .unwrap(),
            Decimal::new(2400, 2)
        );
        assert_eq!(
            directory
                .get_value(&txn, fields::MEMBERS_AT_ADDRESS, user_id)
                .await
                .unwrap(),
            1
        );
        assert_eq!(
            directory
                .get_value(&txn, Field::<String>::new("FRIEND_OF_THE_MUSEUM"), user_id)
                .await
                .unwrap(),
            "0"
        );
        assert_eq!(
            directory
                .get_value(&txn, fields::FIRST_NAME, user_id)
                .await
                .unwrap(),
            "Ada"
        );
        assert_eq!(
            directory
                .get_value(&txn, fields::EMAIL, user_id)
                .await
                .unwrap(),
            "ada@example.org"
        );
    }

    #[tokio::test]
    async fn household_of_friends() {
        let harness = harness(Config::for_tests()).await;

        let session = harness.checkout.begin(&curies()).await.unwrap();

        assert_eq!(harness.provider.sessions()[0].unit_amount_pennies, 4400);

        let sale = reconciled(harness.checkout.complete(&session.id).await.unwrap());

        assert_eq!(sale.total(), Decimal::new(44, 0));
        assert!(sale.primary.user_id > 0);
        assert!(sale.associate.user_id > 0);
        assert_ne!(sale.primary.user_id, sale.associate.user_id);

        let directory = &harness.directory;
        let txn = harness.db.begin().await.unwrap();

        let marie = directory
            .get_by_login_name(&txn, "marie.curie")
            .await
            .unwrap();
        assert_eq!(marie.len(), 1);
        assert_eq!(marie[0].id, sale.associate.user_id);

        for user_id in [sale.primary.user_id, sale.associate.user_id] {
            let member = directory.get_member_for_user(&txn, user_id).await.unwrap();
            assert_eq!(member.end.year(), 2025);
            assert!(member.is_paid_up(2025));

            assert_eq!(
                directory
                    .get_value(&txn, Field::<String>::new("MEMBERS_AT_ADDRESS"), user_id)
                    .await
                    .unwrap(),
                "2"
            );
            assert_eq!(
                directory
                    .get_value(
                        &txn,
                        fields::NUMBER_OF_FRIENDS_OF_THE_MUSEUM_AT_THIS_ADDRESS,
                        user_id
                    )
                    .await
                    .unwrap(),
                2
            );
            assert!(directory
                .get_value(&txn, fields::FRIEND_OF_THE_MUSEUM, user_id)
                .await
                .unwrap());
        }

        let primary = sale.primary.user_id;

        assert_eq!(
            directory
                .get_value(&txn, Field::<String>::new("GIFT_AID"), primary)
                .await
                .unwrap(),
            "1"
        );
        assert_eq!(
            directory
                .get_value(&txn, fields::VALUE_OF_DONATION_TO_LDLHS, primary)
                .await
                .unwrap(),
            Decimal::new(150, 2)
        );
        assert_eq!(
            directory
                .get_value(&txn, fields::VALUE_OF_DONATION_TO_THE_MUSEUM, primary)
                .await
                .unwrap(),
            Decimal::new(250, 2)
        );
        assert_eq!(
            directory
                .get_value(&txn, fields::VALUE_OF_LAST_PAYMENT, primary)
                .await
                .unwrap(),
            Decimal::new(44, 0)
        );
    }

    #[tokio::test]
    async fn renewal() {
        let harness = harness(Config::for_tests()).await;
        let directory = &harness.directory;

        let ada_id = {
            let txn = harness.db.begin().await.unwrap();

            let ada = directory
                .create_locked(&txn, "ada@example.org")
                .await
                .unwrap();
            directory
                .create_member(
                    &txn,
                    ada.id,
                    db::role::MEMBER,
                    common::calendar::membership_end(2023),
                    common::calendar::membership_end(2024),
                )
                .await
                .unwrap();

            txn.commit().await.unwrap();

            ada.id
        };

        let session = harness.checkout.begin(&ada()).await.unwrap();
        let sale = reconciled(harness.checkout.complete(&session.id).await.unwrap());

        assert_eq!(sale.transaction_type, TransactionType::Renewal);
        assert_eq!(sale.primary.user_id, ada_id);

        let txn = harness.db.begin().await.unwrap();

        assert_eq!(user::Entity::find().all(&txn).await.unwrap().len(), 1);

        let members = member::Entity::find().all(&txn).await.unwrap();
        assert_eq!(members.len(), 1);
        assert_eq!(members[0].end.year(), 2025);
        assert!(members[0].is_paid_up(2025));

        let stored = ledger::fetch_by_id(&txn, sale.id).await.unwrap();
        assert_eq!(stored.transaction_type, TransactionType::Renewal);
        assert_eq!(stored.primary.user_id, ada_id);
    }

    #[tokio::test]
    async fn renewal_with_associate_sharing_email() {
        let harness = harness(Config::for_tests()).await;
        let directory = &harness.directory;

        let pierre_id = {
            let txn = harness.db.begin().await.unwrap();

            let pierre = directory.create_locked(&txn, "pc@ex.org").await.unwrap();
            directory
                .create_member(
                    &txn,
                    pierre.id,
                    db::role::MEMBER,
                    common::calendar::membership_end(2023),
                    common::calendar::membership_end(2024),
                )
                .await
                .unwrap();

            txn.commit().await.unwrap();

            pierre.id
        };

        let mut order = curies();
        if let Some(associate) = order.associate.as_mut() {
            associate.email = String::from("PC@ex.org");
        }

        let session = harness.checkout.begin(&order).await.unwrap();
        let sale = reconciled(harness.checkout.complete(&session.id).await.unwrap());

        assert_eq!(sale.transaction_type, TransactionType::Renewal);
        assert_eq!(sale.primary.user_id, pierre_id);
        assert!(sale.associate.user_id > 0);
        assert_ne!(sale.associate.user_id, pierre_id);

        let txn = harness.db.begin().await.unwrap();

        let marie = directory
            .get_by_login_name(&txn, "marie.curie")
            .await
            .unwrap();
        assert_eq!(marie.len(), 1);
        assert_eq!(marie[0].id, sale.associate.user_id);

        assert_eq!(member::Entity::find().all(&txn).await.unwrap().len(), 2);

        for user_id in [pierre_id, sale.associate.user_id] {
            let member = directory.get_member_for_user(&txn, user_id).await.unwrap();
            assert!(member.is_paid_up(2025));

            assert_eq!(
                directory
                    .get_value(&txn, fields::MEMBERS_AT_ADDRESS, user_id)
                    .await
                    .unwrap(),
                2
            );
        }
    }

    #[tokio::test]
    async fn unpaid_session() {
        let harness = harness(Config::for_tests()).await;

        let session = harness.checkout.begin(&ada()).await.unwrap();
        harness.provider.set_status("unpaid");

        let err = harness.checkout.complete(&session.id).await.unwrap_err();

        assert!(matches!(&err, CheckoutError::PostPayment(_)));
        assert!(matches!(err.step().source, Failure::NotPaid(_)));

        let txn = harness.db.begin().await.unwrap();

        assert!(user::Entity::find().all(&txn).await.unwrap().is_empty());
        assert!(member::Entity::find().all(&txn).await.unwrap().is_empty());

        let sale = ledger::fetch_by_id(&txn, err.step().sale_id).await.unwrap();
        assert_eq!(sale.status, Status::Pending);
        assert!(sale.payment_id.is_empty());
    }

    #[tokio::test]
    async fn bookkeeping_failure_keeps_membership() {
        let harness = harness(Config::for_tests()).await;

        user_field::Entity::delete_many()
            .filter(user_field::Column::NameIntern.eq(fields::MEMBERS_AT_ADDRESS.name()))
            .exec(&*harness.db)
            .await
            .unwrap();

        let session = harness.checkout.begin(&ada()).await.unwrap();
        let sale = reconciled(harness.checkout.complete(&session.id).await.unwrap());

        let directory = &harness.directory;
        let txn = harness.db.begin().await.unwrap();

        let member = directory
            .get_member_for_user(&txn, sale.primary.user_id)
            .await
            .unwrap();
        assert!(member.is_paid_up(2025));

        assert!(matches!(
            directory
                .get_value(&txn, fields::MEMBERS_AT_ADDRESS, sale.primary.user_id)
                .await,
            Err(DirectoryError::UnknownField("MEMBERS_AT_ADDRESS"))
        ));
        assert_eq!(
            directory
                .get_value(&txn, fields::VALUE_OF_LAST_PAYMENT, sale.primary.user_id)
                .await
                .unwrap(),
            Decimal::new(24, 0)
        );
    }

    #[tokio::test]
    async fn repeated_callback() {
        let harness = harness(Config::for_tests()).await;

        let session = harness.checkout.begin(&curies()).await.unwrap();
        let first = reconciled(harness.checkout.complete(&session.id).await.unwrap());

        let (members, values) = {
            let txn = harness.db.begin().await.unwrap();

            (
                member::Entity::find().all(&txn).await.unwrap(),
                user_data::Entity::find().all(&txn).await.unwrap(),
            )
        };

        let second = harness.checkout.complete(&session.id).await.unwrap();

        assert!(matches!(&second, Outcome::AlreadyComplete(_)));
        assert_eq!(second.sale(), &first);

        let txn = harness.db.begin().await.unwrap();

        assert_eq!(member::Entity::find().all(&txn).await.unwrap(), members);
        assert_eq!(user_data::Entity::find().all(&txn).await.unwrap(), values);
        assert_eq!(user::Entity::find().all(&txn).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn zero_total_is_not_charged() {
        let mut config = Config::for_tests();
        config.ordinary_member_fee = Decimal::ZERO;

        let harness = harness(config).await;

        let err = harness.checkout.begin(&ada()).await.unwrap_err();

        assert!(matches!(&err, CheckoutError::PrePayment(_)));
        assert!(matches!(err.step().source, Failure::ZeroTotal));
        assert!(harness.provider.sessions().is_empty());
    }

    #[tokio::test]
    async fn unknown_session() {
        let harness = harness(Config::for_tests()).await;

        let err = harness.checkout.complete("cs_test_404").await.unwrap_err();

        assert!(matches!(&err, CheckoutError::PostPayment(_)));
        assert!(matches!(
            err.step().source,
            Failure::PaymentError(PaymentError::SessionNotFound(_))
        ));
    }
}
