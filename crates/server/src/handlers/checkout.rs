use std::sync::Arc;

use axum::{
    extract::State,
    response::{IntoResponse, Redirect, Response},
    Extension, Form,
};
use common::config::Config;
use sales::Checkout;

use super::{form::PaymentForm, PageError};
use crate::{pages, validation};

/// Record a pending sale and send the customer to the payment provider.
///
/// The form is validated again, as it comes back from the browser.
pub(super) async fn checkout(
    State(checkout): State<Arc<Checkout>>,
    Extension(config): Extension<Arc<Config>>,
    Form(form): Form<PaymentForm>,
) -> Result<Response, PageError> {
    if let Err(errors) = validation::check(&form) {
        return Ok(pages::form(&config, &form, &errors).into_response());
    }

    let session = checkout
        .begin(&form.order())
        .await
        .map_err(|err| PageError::new(config.clone(), err))?;

    Ok(Redirect::to(&session.url).into_response())
}

#[cfg(test)]
mod tests {
    use axum::http::{header::LOCATION, StatusCode};
    use common::config::Config;
    use rust_decimal::Decimal;
    use tower::ServiceExt;

    use crate::testing::{form_request, ResponseBodyExt, TestApp};

    const ADA: &str = "first_name=Ada&last_name=Lovelace&email=ada%40example.org";

    #[tokio::test]
    async fn redirects_to_provider() {
        let app = TestApp::new(Config::for_tests()).await;

        let response = app
            .router
            .oneshot(form_request("/checkout", ADA))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            response.headers()[LOCATION],
            "https://checkout.example.org/pay/cs_test_1"
        );

        let sessions = app.provider.sessions();

        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].unit_amount_pennies, 2400);
        assert_eq!(
            sessions[0].success_url,
            "http://localhost:8080/success?session_id={CHECKOUT_SESSION_ID}"
        );
        assert_eq!(sessions[0].cancel_url, "http://localhost:8080/cancel");
    }

    #[tokio::test]
    async fn invalid_form_is_not_charged() {
        let app = TestApp::new(Config::for_tests()).await;

        let response = app
            .router
            .oneshot(form_request(
                "/checkout",
                "first_name=Ada&last_name=Lovelace&email=ada%40example.org&donation_to_museum=x",
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.text().await.contains("must be a number"));
        assert!(app.provider.sessions().is_empty());
    }

    #[tokio::test]
    async fn zero_total() {
        let mut config = Config::for_tests();
        config.ordinary_member_fee = Decimal::ZERO;

        let app = TestApp::new(config).await;

        let response = app
            .router
            .oneshot(form_request("/checkout", ADA))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(response.text().await.contains("questions@example.org"));
        assert!(app.provider.sessions().is_empty());
    }
}
