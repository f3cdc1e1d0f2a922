//! Membership sales.
//!
//! Turns a submitted membership form into a pending sale, hands the
//! customer over to the payment provider and, once the provider reports
//! the payment, provisions the paying members in the directory.

pub mod checkout;
pub mod error;
pub mod reconciler;
pub mod resolver;

pub use checkout::{Applicant, Checkout, Order};
pub use error::{CheckoutError, Failure, StepError};
pub use reconciler::{Outcome, Reconciler};
