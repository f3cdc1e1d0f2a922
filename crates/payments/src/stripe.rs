//! Stripe hosted checkout.

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::{CheckoutParams, CheckoutSession, PaymentError, PaymentProvider, SessionDetails};

/// Stripe API base URL.
const API_BASE: &str = "https://api.stripe.com/v1";

/// Currency every session is charged in.
const CURRENCY: &str = "gbp";

/// Checkout mode for one-off payments.
const MODE: &str = "payment";

#[derive(Debug, Deserialize)]
struct CreateSessionResponse {
    id: String,
    url: String,
}

#[derive(Debug, Deserialize)]
struct CustomerDetails {
    email: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SessionResponse {
    payment_status: String,
    client_reference_id: Option<String>,
    customer: Option<String>,
    customer_email: Option<String>,
    customer_details: Option<CustomerDetails>,
}

impl From<SessionResponse> for SessionDetails {
    fn from(session: SessionResponse) -> Self {
        let customer_email = session
            .customer_email
            .or_else(|| session.customer_details.and_then(|details| details.email));

        SessionDetails {
            status: session.payment_status,
            client_reference_id: session.client_reference_id,
            customer_id: session.customer,
            customer_email,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorBody,
}

/// Stripe API client.
#[derive(Clone, Debug)]
pub struct StripeClient {
    client: Client,
    secret_key: String,
    base_url: String,
}

impl StripeClient {
    pub fn new(secret_key: String) -> Self {
        Self::with_base_url(secret_key, String::from(API_BASE))
    }

    /// Create client that talks to an API compatible server at `base_url`.
    pub fn with_base_url(secret_key: String, base_url: String) -> Self {
        Self {
            client: Client::new(),
            secret_key,
            base_url,
        }
    }

    async fn check(response: Response) -> Result<Response, PaymentError> {
        let status = response.status();

        if status.is_success() {
            return Ok(response);
        }

        let message = match response.json::<ErrorResponse>().await {
            Ok(body) => body.error.message.unwrap_or_default(),
            Err(_) => String::new(),
        };

        warn!(%status, %message, "stripe request rejected");

        Err(PaymentError::Rejected {
            status: status.as_u16(),
            message,
        })
    }
}

/// Form fields of a checkout session creation request.
fn session_form(params: &CheckoutParams) -> Vec<(&'static str, String)> {
    let mut form = vec![
        ("mode", String::from(MODE)),
        ("success_url", params.success_url.clone()),
        ("cancel_url", params.cancel_url.clone()),
        ("client_reference_id", params.client_reference_id.clone()),
        ("line_items[0][quantity]", String::from("1")),
        ("line_items[0][price_data][currency]", String::from(CURRENCY)),
        (
            "line_items[0][price_data][unit_amount]",
            params.unit_amount_pennies.to_string(),
        ),
        (
            "line_items[0][price_data][product_data][name]",
            params.description.clone(),
        ),
    ];

    if let Some(email) = &params.customer_email {
        form.push(("customer_email", email.clone()));
    }

    form
}

#[async_trait]
impl PaymentProvider for StripeClient {
    async fn create_session(
        &self,
        params: &CheckoutParams,
    ) -> Result<CheckoutSession, PaymentError> {
        let response = self
            .client
            .post(format!("{}/checkout/sessions", self.base_url))
            .basic_auth(&self.secret_key, None::<&str>)
            .form(&session_form(params))
            .send()
            .await?;

        let session: CreateSessionResponse = Self::check(response).await?.json().await?;

        debug!(
            session_id = %session.id,
            reference = %params.client_reference_id,
            "created checkout session"
        );

        Ok(CheckoutSession {
            id: session.id,
            url: session.url,
        })
    }

    async fn get_session(&self, session_id: &str) -> Result<SessionDetails, PaymentError> {
        let url = session_url(&self.base_url, session_id)
            .ok_or_else(|| PaymentError::SessionNotFound(session_id.to_owned()))?;

        let response = self
            .client
            .get(url)
            .basic_auth(&self.secret_key, None::<&str>)
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(PaymentError::SessionNotFound(session_id.to_owned()));
        }

        let session: SessionResponse = Self::check(response).await?.json().await?;

        Ok(session.into())
    }
}

/// Session lookup URL, `None` unless `session_id` only holds ASCII
/// letters, digits and underscores.
fn session_url(base_url: &str, session_id: &str) -> Option<String> {
    let valid = !session_id.is_empty()
        && session_id
            .bytes()
            .all(|byte| byte.is_ascii_alphanumeric() || byte == b'_');

    valid.then(|| format!("{base_url}/checkout/sessions/{session_id}"))
}
