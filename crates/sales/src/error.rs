use db::{directory::DirectoryError, ledger::LedgerError, DbErr, TransactionError};
use derive_more::{Display, Error, From};
use payments::PaymentError;

/// Cause of a failed checkout step.
#[derive(Debug, Display, From, Error)]
pub enum Failure {
    /// Database-related error.
    DatabaseError(DbErr),

    /// Directory adapter error.
    DirectoryError(DirectoryError),

    /// Sale ledger error.
    LedgerError(LedgerError),

    /// Payment provider error.
    PaymentError(PaymentError),

    #[from(ignore)]
    #[display(fmt = "primary member has no email address")]
    MissingEmail,

    #[from(ignore)]
    #[display(fmt = "sale total is zero")]
    ZeroTotal,

    #[from(ignore)]
    #[display(fmt = "sale total {} can't be charged", _0)]
    InvalidAmount(#[error(not(source))] rust_decimal::Decimal),

    #[from(ignore)]
    #[display(fmt = "invalid client reference {:?}", _0)]
    InvalidReference(#[error(not(source))] Option<String>),

    #[from(ignore)]
    #[display(fmt = "payment status is {:?}", _0)]
    NotPaid(#[error(not(source))] String),
}

/// Failed operation, tagged with the sale it was performed for.
#[derive(Debug, Display, Error)]
#[display(fmt = "{} failed for sale {}: {}", operation, sale_id, source)]
pub struct StepError {
    pub operation: &'static str,
    pub sale_id: i64,
    pub source: Failure,
}

impl StepError {
    pub fn new(operation: &'static str, sale_id: i64, source: impl Into<Failure>) -> Self {
        Self {
            operation,
            sale_id,
            source: source.into(),
        }
    }

    /// Flatten a failed transaction, tagging connection-level failures.
    pub(crate) fn from_transaction(err: TransactionError<StepError>, sale_id: i64) -> Self {
        match err {
            TransactionError::Connection(err) => Self::new("transaction", sale_id, err),
            TransactionError::Transaction(err) => err,
        }
    }
}

/// Checkout failure as seen by the customer.
#[derive(Debug, Display, Error)]
pub enum CheckoutError {
    /// Customer hasn't been charged.
    #[display(fmt = "checkout failed before payment: {}", _0)]
    PrePayment(StepError),

    /// Customer has been charged but could not be provisioned.
    #[display(fmt = "checkout failed after payment: {}", _0)]
    PostPayment(StepError),
}

impl CheckoutError {
    pub fn step(&self) -> &StepError {
        match self {
            CheckoutError::PrePayment(err) | CheckoutError::PostPayment(err) => err,
        }
    }
}
