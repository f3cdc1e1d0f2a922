//! Typed profile fields.
//!
//! Profile values are stored as text, this module is the only place that
//! knows their textual form. Each field constant carries the Rust type of
//! its value, so call sites can't write a date into a checkbox.

use std::{marker::PhantomData, str::FromStr};

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;

const DATE_FORMAT: &str = "%Y-%m-%d";
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Conversion between a typed value and its stored textual form.
pub trait FieldValue: Sized {
    fn encode(&self) -> String;

    fn decode(value: &str) -> Option<Self>;
}

impl FieldValue for String {
    fn encode(&self) -> String {
        self.clone()
    }

    fn decode(value: &str) -> Option<Self> {
        Some(value.to_owned())
    }
}

/// Checkbox values are stored as `"0"` or `"1"`.
impl FieldValue for bool {
    fn encode(&self) -> String {
        String::from(if *self { "1" } else { "0" })
    }

    fn decode(value: &str) -> Option<Self> {
        match value {
            "1" => Some(true),
            "0" | "" => Some(false),
            _ => None,
        }
    }
}

impl FieldValue for i32 {
    fn encode(&self) -> String {
        self.to_string()
    }

    fn decode(value: &str) -> Option<Self> {
        value.trim().parse().ok()
    }
}

impl FieldValue for Decimal {
    fn encode(&self) -> String {
        format!("{self:.2}")
    }

    fn decode(value: &str) -> Option<Self> {
        Decimal::from_str(value.trim()).ok()
    }
}

impl FieldValue for NaiveDate {
    fn encode(&self) -> String {
        self.format(DATE_FORMAT).to_string()
    }

    fn decode(value: &str) -> Option<Self> {
        NaiveDate::parse_from_str(value.trim(), DATE_FORMAT).ok()
    }
}

impl FieldValue for NaiveDateTime {
    fn encode(&self) -> String {
        self.format(TIMESTAMP_FORMAT).to_string()
    }

    fn decode(value: &str) -> Option<Self> {
        NaiveDateTime::parse_from_str(value.trim(), TIMESTAMP_FORMAT).ok()
    }
}

/// Profile field addressed by its internal name.
pub struct Field<T> {
    name: &'static str,
    value: PhantomData<fn() -> T>,
}

impl<T> Field<T> {
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            value: PhantomData,
        }
    }

    /// Internal field name, as stored in `usf_name_intern`.
    pub const fn name(&self) -> &'static str {
        self.name
    }
}

impl<T> Clone for Field<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Field<T> {}

pub const FIRST_NAME: Field<String> = Field::new("FIRST_NAME");
pub const LAST_NAME: Field<String> = Field::new("LAST_NAME");
pub const EMAIL: Field<String> = Field::new("EMAIL");
pub const FRIEND_OF_THE_MUSEUM: Field<bool> = Field::new("FRIEND_OF_THE_MUSEUM");
pub const GIFT_AID: Field<bool> = Field::new("GIFT_AID");
pub const DATE_LAST_PAID: Field<NaiveDate> = Field::new("DATE_LAST_PAID");
pub const VALUE_OF_LAST_PAYMENT: Field<Decimal> = Field::new("VALUE_OF_LAST_PAYMENT");
pub const VALUE_OF_DONATION_TO_LDLHS: Field<Decimal> = Field::new("VALUE_OF_DONATION_TO_LDLHS");
pub const VALUE_OF_DONATION_TO_THE_MUSEUM: Field<Decimal> =
    Field::new("VALUE_OF_DONATION_TO_THE_MUSEUM");
pub const MEMBERS_AT_ADDRESS: Field<i32> = Field::new("MEMBERS_AT_ADDRESS");
pub const NUMBER_OF_FRIENDS_OF_THE_MUSEUM_AT_THIS_ADDRESS: Field<i32> =
    Field::new("NUMBER_OF_FRIENDS_OF_THE_MUSEUM_AT_THIS_ADDRESS");
