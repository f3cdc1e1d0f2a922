use std::sync::Arc;

use axum::{
    extract::State,
    response::{Html, Redirect},
    Extension, Form,
};
use common::config::Config;
use sales::{Applicant, Checkout, Order};
use serde::Deserialize;
use validator::Validate;

use crate::{
    pages,
    validation::{self, amount, optional_email, required, required_email, FieldErrors},
};

/// Membership form, as submitted by the browser.
///
/// Checkboxes are present only when ticked.
#[derive(Clone, Debug, Default, Deserialize, Validate)]
#[serde(default)]
pub(crate) struct PaymentForm {
    #[validate(custom = "required")]
    pub(crate) first_name: String,

    #[validate(custom = "required")]
    pub(crate) last_name: String,

    #[validate(custom = "required_email")]
    pub(crate) email: String,

    pub(crate) friend: Option<String>,

    pub(crate) associate_first_name: String,

    pub(crate) associate_last_name: String,

    #[validate(custom = "optional_email")]
    pub(crate) associate_email: String,

    pub(crate) associate_friend: Option<String>,

    #[validate(custom = "amount")]
    pub(crate) donation_to_society: String,

    #[validate(custom = "amount")]
    pub(crate) donation_to_museum: String,

    pub(crate) giftaid: Option<String>,
}

impl PaymentForm {
    /// Convert a validated form into an order.
    pub(crate) fn order(&self) -> Order {
        let associate = (!self.associate_first_name.trim().is_empty()).then(|| Applicant {
            first_name: self.associate_first_name.clone(),
            last_name: self.associate_last_name.clone(),
            email: self.associate_email.clone(),
            friend: self.associate_friend.is_some(),
        });

        Order {
            primary: Applicant {
                first_name: self.first_name.clone(),
                last_name: self.last_name.clone(),
                email: self.email.clone(),
                friend: self.friend.is_some(),
            },
            associate,
            donation_to_society: validation::parse_amount(&self.donation_to_society)
                .unwrap_or_default(),
            donation_to_museum: validation::parse_amount(&self.donation_to_museum)
                .unwrap_or_default(),
            giftaid: self.giftaid.is_some(),
        }
    }
}

pub(super) async fn redirect() -> Redirect {
    Redirect::to("/displayPaymentForm")
}

/// Empty membership form.
pub(super) async fn show(Extension(config): Extension<Arc<Config>>) -> Html<String> {
    pages::form(&config, &PaymentForm::default(), &FieldErrors::default())
}

/// Validate the form and ask the customer to confirm the total.
pub(super) async fn submit(
    State(checkout): State<Arc<Checkout>>,
    Extension(config): Extension<Arc<Config>>,
    Form(form): Form<PaymentForm>,
) -> Html<String> {
    match validation::check(&form) {
        Ok(()) => pages::confirmation(&config, &form, &checkout.price(&form.order())),
        Err(errors) => pages::form(&config, &form, &errors),
    }
}
