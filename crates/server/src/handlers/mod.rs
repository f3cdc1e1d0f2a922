/// Payment callback and cancellation routes.
mod callback;

/// Payment session creation route.
mod checkout;

/// Membership form routes.
pub(crate) mod form;

use std::sync::Arc;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use common::config::Config;
use sales::{Checkout, CheckoutError};
use tracing::error;

use crate::pages;

/// Create a [`Router`] that serves the membership payment pages.
pub(crate) fn routes() -> Router<Arc<Checkout>> {
    Router::new()
        .route("/", get(form::redirect))
        .route("/displayPaymentForm", get(form::show).post(form::submit))
        .route("/checkout", post(checkout::checkout))
        .route("/success", get(callback::success))
        .route("/cancel", get(callback::cancel))
}

/// Failed checkout, rendered as the matching error page.
pub(crate) struct PageError {
    config: Arc<Config>,
    error: CheckoutError,
}

impl PageError {
    pub(crate) fn new(config: Arc<Config>, error: CheckoutError) -> Self {
        Self { config, error }
    }
}

impl IntoResponse for PageError {
    fn into_response(self) -> Response {
        let step = self.error.step();

        error!(
            sale_id = step.sale_id,
            operation = step.operation,
            error = %self.error,
            "checkout failed"
        );

        let page = match self.error {
            CheckoutError::PrePayment(_) => pages::pre_payment_error(&self.config),
            CheckoutError::PostPayment(_) => pages::post_payment_error(&self.config),
        };

        (StatusCode::INTERNAL_SERVER_ERROR, page).into_response()
    }
}
