//! Payment provider client.
//!
//! The checkout flow consumes a narrow interface: create a hosted checkout
//! session for a single amount, then look the session up again once the
//! customer is redirected back.

pub mod stripe;

#[cfg(feature = "test-utils")]
pub mod testing;

use async_trait::async_trait;
use derive_more::{Display, Error, From};

/// Payment status value reported for a settled session.
pub const PAID: &str = "paid";

/// Errors that may occur while talking to a payment provider.
#[derive(Debug, Display, Error, From)]
pub enum PaymentError {
    /// Provider could not be reached, or returned a malformed response.
    #[display(fmt = "payment provider request failed: {}", _0)]
    Http(reqwest::Error),

    /// Provider rejected the request.
    #[display(fmt = "payment provider returned {}: {}", status, message)]
    #[from(ignore)]
    Rejected { status: u16, message: String },

    /// Requested session is unknown to the provider.
    #[display(fmt = "payment session {} not found", _0)]
    #[from(ignore)]
    SessionNotFound(#[error(not(source))] String),
}

/// Parameters of a hosted checkout session.
///
/// Sessions are always one-off payments in pounds sterling with a single
/// line item.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CheckoutParams {
    /// Amount to charge, in pennies.
    pub unit_amount_pennies: i64,

    /// Identifier of our own record, echoed back by the provider.
    pub client_reference_id: String,

    /// Redirect target after payment, may contain the session placeholder.
    pub success_url: String,

    /// Redirect target after cancellation.
    pub cancel_url: String,

    /// Customer email used to prefill the checkout page.
    pub customer_email: Option<String>,

    /// Line item description shown to the customer.
    pub description: String,
}

/// Newly created checkout session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CheckoutSession {
    pub id: String,

    /// Hosted checkout page the customer is redirected to.
    pub url: String,
}

/// Checkout session as reported on callback.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionDetails {
    /// Payment status, [`PAID`] once the payment has settled.
    pub status: String,
    pub client_reference_id: Option<String>,
    pub customer_id: Option<String>,
    pub customer_email: Option<String>,
}

impl SessionDetails {
    pub fn is_paid(&self) -> bool {
        self.status == PAID
    }
}

/// Hosted checkout provider.
#[async_trait]
pub trait PaymentProvider: Send + Sync {
    /// Create a hosted checkout session.
    async fn create_session(&self, params: &CheckoutParams)
        -> Result<CheckoutSession, PaymentError>;

    /// Fetch the current state of a checkout session.
    async fn get_session(&self, session_id: &str) -> Result<SessionDetails, PaymentError>;
}
