use std::sync::Arc;

use axum::{
    extract::{Query, State},
    response::Html,
    Extension,
};
use common::config::Config;
use sales::Checkout;
use serde::Deserialize;

use super::PageError;
use crate::pages;

#[derive(Deserialize)]
pub(super) struct SuccessQuery {
    #[serde(default)]
    session_id: String,
}

/// Payment provider redirect after a successful payment.
pub(super) async fn success(
    State(checkout): State<Arc<Checkout>>,
    Extension(config): Extension<Arc<Config>>,
    Query(query): Query<SuccessQuery>,
) -> Result<Html<String>, PageError> {
    let outcome = checkout
        .complete(&query.session_id)
        .await
        .map_err(|err| PageError::new(config.clone(), err))?;

    Ok(pages::success(&config, outcome.sale()))
}

/// Payment provider redirect after the customer gave up.
///
/// The pending sale is left as is.
pub(super) async fn cancel(Extension(config): Extension<Arc<Config>>) -> Html<String> {
    pages::cancel(&config)
}
