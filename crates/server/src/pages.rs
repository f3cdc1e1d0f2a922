//! HTML pages.
//!
//! Pages are small enough to be rendered with `format!`, every value
//! coming from the customer or the configuration is escaped.

use axum::response::Html;
use common::config::Config;
use db::ledger::Sale;
use rust_decimal::Decimal;

use crate::{handlers::form::PaymentForm, validation::FieldErrors};

/// Escape text for use in HTML content and attribute values.
pub(crate) fn escape(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());

    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            c => escaped.push(c),
        }
    }

    escaped
}

fn money(amount: Decimal) -> String {
    format!("£{amount:.2}")
}

fn layout(config: &Config, title: &str, body: &str) -> Html<String> {
    let organisation = escape(&config.organisation_name);

    Html(format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>{title} - {organisation}</title>
</head>
<body>
<h1>{organisation}</h1>
<h2>{title}</h2>
{body}
</body>
</html>
"#,
        title = escape(title),
    ))
}

fn mailto(address: &str) -> String {
    let address = escape(address);

    format!(r#"<a href="mailto:{address}">{address}</a>"#)
}

fn text_input(
    name: &str,
    label: &str,
    value: &str,
    mandatory: bool,
    errors: &FieldErrors,
) -> String {
    let marker = if mandatory { " *" } else { "" };
    let error = errors
        .get(name)
        .map(|message| format!(r#" <span class="error">{}</span>"#, escape(message)))
        .unwrap_or_default();

    format!(
        r#"<p><label for="{name}">{label}{marker}</label> <input type="text" id="{name}" name="{name}" value="{value}">{error}</p>"#,
        value = escape(value),
    )
}

fn checkbox(name: &str, label: &str, checked: bool) -> String {
    let checked = if checked { " checked" } else { "" };

    format!(
        r#"<p><input type="checkbox" id="{name}" name="{name}"{checked}> <label for="{name}">{label}</label></p>"#
    )
}

fn hidden(name: &str, value: &str) -> String {
    format!(
        r#"<input type="hidden" name="{name}" value="{}">"#,
        escape(value)
    )
}

/// Membership form, with inline messages for invalid fields.
pub(crate) fn form(config: &Config, form: &PaymentForm, errors: &FieldErrors) -> Html<String> {
    let mut body = String::new();

    if !errors.is_empty() {
        body.push_str(r#"<p class="error">Please correct the fields marked below.</p>"#);
    }

    body.push_str(r#"<form method="post" action="/displayPaymentForm">"#);
    body.push_str("<h3>Member</h3>");
    body.push_str(&text_input("first_name", "First name", &form.first_name, true, errors));
    body.push_str(&text_input("last_name", "Last name", &form.last_name, true, errors));
    body.push_str(&text_input("email", "Email", &form.email, true, errors));

    if config.enable_other_member_types {
        body.push_str(&checkbox(
            "friend",
            &format!("Friend of the museum ({})", money(config.friend_fee)),
            form.friend.is_some(),
        ));

        body.push_str(&format!(
            "<h3>Associate member ({})</h3>",
            money(config.associate_member_fee)
        ));
        body.push_str(&text_input(
            "associate_first_name",
            "First name",
            &form.associate_first_name,
            false,
            errors,
        ));
        body.push_str(&text_input(
            "associate_last_name",
            "Last name",
            &form.associate_last_name,
            false,
            errors,
        ));
        body.push_str(&text_input(
            "associate_email",
            "Email",
            &form.associate_email,
            false,
            errors,
        ));
        body.push_str(&checkbox(
            "associate_friend",
            &format!("Friend of the museum ({})", money(config.friend_fee)),
            form.associate_friend.is_some(),
        ));
    }

    body.push_str("<h3>Donations</h3>");
    body.push_str(&text_input(
        "donation_to_society",
        "Donation to the society",
        &form.donation_to_society,
        false,
        errors,
    ));
    body.push_str(&text_input(
        "donation_to_museum",
        "Donation to the museum",
        &form.donation_to_museum,
        false,
        errors,
    ));

    if config.enable_giftaid {
        body.push_str(&checkbox(
            "giftaid",
            "I am a UK taxpayer and want to Gift Aid my payment",
            form.giftaid.is_some(),
        ));
    }

    body.push_str(&format!(
        r#"<p>Fields marked * are mandatory. Membership costs {}.</p>"#,
        money(config.ordinary_member_fee)
    ));
    body.push_str(r#"<p><button type="submit">Continue</button></p></form>"#);

    layout(config, "Membership payment", &body)
}

/// Summary of the computed total, confirming submits the form to checkout.
pub(crate) fn confirmation(config: &Config, form: &PaymentForm, sale: &Sale) -> Html<String> {
    let mut lines = vec![(
        format!(
            "Membership {} for {} {}",
            sale.membership_year, sale.primary.first_name, sale.primary.last_name
        ),
        sale.primary.fee,
    )];

    if sale.primary.friend {
        lines.push((String::from("Friend of the museum"), sale.primary.friend_fee));
    }

    if sale.associate.is_present() {
        lines.push((
            format!(
                "Associate membership for {} {}",
                sale.associate.first_name, sale.associate.last_name
            ),
            sale.associate.fee,
        ));

        if sale.associate.friend {
            lines.push((
                String::from("Friend of the museum"),
                sale.associate.friend_fee,
            ));
        }
    }

    if sale.donation_to_society > Decimal::ZERO {
        lines.push((
            String::from("Donation to the society"),
            sale.donation_to_society,
        ));
    }

    if sale.donation_to_museum > Decimal::ZERO {
        lines.push((String::from("Donation to the museum"), sale.donation_to_museum));
    }

    let mut body = String::from("<table>");

    for (item, amount) in lines {
        body.push_str(&format!(
            "<tr><td>{}</td><td>{}</td></tr>",
            escape(&item),
            money(amount)
        ));
    }

    body.push_str(&format!(
        "<tr><th>Total</th><th>{}</th></tr></table>",
        money(sale.total())
    ));

    if sale.giftaid {
        body.push_str("<p>Your payment will be treated as a Gift Aid donation.</p>");
    }

    body.push_str(r#"<form method="post" action="/checkout">"#);

    for (name, value) in [
        ("first_name", form.first_name.as_str()),
        ("last_name", form.last_name.as_str()),
        ("email", form.email.as_str()),
        ("associate_first_name", form.associate_first_name.as_str()),
        ("associate_last_name", form.associate_last_name.as_str()),
        ("associate_email", form.associate_email.as_str()),
        ("donation_to_society", form.donation_to_society.as_str()),
        ("donation_to_museum", form.donation_to_museum.as_str()),
    ] {
        body.push_str(&hidden(name, value));
    }

    for (name, value) in [
        ("friend", &form.friend),
        ("associate_friend", &form.associate_friend),
        ("giftaid", &form.giftaid),
    ] {
        if let Some(value) = value {
            body.push_str(&hidden(name, value));
        }
    }

    body.push_str(r#"<p><button type="submit">Pay now</button></p></form>"#);
    body.push_str(r#"<p><a href="/displayPaymentForm">Start again</a></p>"#);

    layout(config, "Please confirm", &body)
}

/// Page shown once the membership has been provisioned.
pub(crate) fn success(config: &Config, sale: &Sale) -> Html<String> {
    let mut body = format!(
        "<p>Thank you {}, your membership for {} has been paid.</p>",
        escape(&sale.primary.first_name),
        sale.membership_year
    );

    if sale.associate.is_present() {
        body.push_str(&format!(
            "<p>{} is now an associate member.</p>",
            escape(&sale.associate.first_name)
        ));
    }

    body.push_str(&format!(
        "<p>If you have any questions, please contact {}.</p>",
        mailto(&config.email_address_for_questions)
    ));

    layout(config, "Payment received", &body)
}

pub(crate) fn cancel(config: &Config) -> Html<String> {
    let body = format!(
        r#"<p>Your payment has been cancelled and you have not been charged.</p>
<p><a href="/displayPaymentForm">Try again</a> or contact {}.</p>"#,
        mailto(&config.email_address_for_questions)
    );

    layout(config, "Payment cancelled", &body)
}

/// Error page for failures before the customer was charged.
pub(crate) fn pre_payment_error(config: &Config) -> Html<String> {
    let body = format!(
        "<p>We could not start your payment and you have not been charged. \
         Please try again later or contact {}.</p>",
        mailto(&config.email_address_for_questions)
    );

    layout(config, "Something went wrong", &body)
}

/// Error page for failures after the customer was charged.
pub(crate) fn post_payment_error(config: &Config) -> Html<String> {
    let body = format!(
        "<p>We could not complete your membership. If you have been charged, \
         please contact {} so that we can sort it out or refund you.</p>",
        mailto(&config.email_address_for_failures)
    );

    layout(config, "Something went wrong", &body)
}
