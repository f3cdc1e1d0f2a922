use std::{borrow::Cow, collections::HashMap, str::FromStr};

use rust_decimal::Decimal;
use validator::{Validate, ValidationError, ValidationErrors};

const NOT_A_NUMBER: &str = "must be a number";
const NEGATIVE: &str = "must be 0 or greater";
const REQUIRED: &str = "required";
const INVALID_EMAIL: &str = "must be a valid email address";

/// Validation messages keyed by form field name.
///
/// Only the first message of each field is kept.
#[derive(Debug, Default)]
pub(crate) struct FieldErrors(HashMap<&'static str, String>);

impl FieldErrors {
    pub(crate) fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<ValidationErrors> for FieldErrors {
    fn from(errors: ValidationErrors) -> Self {
        let messages = errors
            .field_errors()
            .into_iter()
            .filter_map(|(field, errors)| {
                errors.first().map(|error| {
                    let message = error
                        .message
                        .as_ref()
                        .map(|message| message.to_string())
                        .unwrap_or_else(|| error.code.to_string());

                    (field, message)
                })
            })
            .collect();

        FieldErrors(messages)
    }
}

/// Validate `value`, collecting per-field messages.
pub(crate) fn check<T: Validate>(value: &T) -> Result<(), FieldErrors> {
    value.validate().map_err(FieldErrors::from)
}

fn error(code: &'static str, message: &'static str) -> ValidationError {
    let mut error = ValidationError::new(code);
    error.message = Some(Cow::Borrowed(message));
    error
}

/// Parse a money amount, treating a blank value as zero.
pub(crate) fn parse_amount(value: &str) -> Result<Decimal, &'static str> {
    let value = value.trim();

    if value.is_empty() {
        return Ok(Decimal::ZERO);
    }

    let amount = Decimal::from_str(value).map_err(|_| NOT_A_NUMBER)?;

    if amount < Decimal::ZERO {
        return Err(NEGATIVE);
    }

    Ok(amount)
}

pub(crate) fn amount(value: &str) -> Result<(), ValidationError> {
    parse_amount(value)
        .map(|_| ())
        .map_err(|message| error("amount", message))
}

pub(crate) fn required(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(error("required", REQUIRED));
    }

    Ok(())
}

pub(crate) fn required_email(value: &str) -> Result<(), ValidationError> {
    required(value)?;
    optional_email(value)
}

pub(crate) fn optional_email(value: &str) -> Result<(), ValidationError> {
    let value = value.trim();

    if value.is_empty() || validator::validate_email(value) {
        Ok(())
    } else {
        Err(error("email", INVALID_EMAIL))
    }
}
