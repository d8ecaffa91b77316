//! Shared validation helpers for inbound HTTP adapters.
//!
//! Request bodies arrive with optional string fields so a missing key or a
//! malformed identifier produces a structured `invalid_request` payload that
//! names the offending field, rather than a bare deserialisation failure.

use std::fmt::Display;

use chrono::NaiveDate;
use serde_json::json;

use crate::domain::{BicycleId, Error, RentalId, UserId};

/// Validation error codes for HTTP request failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ErrorCode {
    MissingField,
    InvalidUuid,
    InvalidDate,
    InvalidValue,
}

impl ErrorCode {
    fn as_str(self) -> &'static str {
        match self {
            ErrorCode::MissingField => "missing_field",
            ErrorCode::InvalidUuid => "invalid_uuid",
            ErrorCode::InvalidDate => "invalid_date",
            ErrorCode::InvalidValue => "invalid_value",
        }
    }
}

/// Newtype wrapper for HTTP field names to provide type safety.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct FieldName(&'static str);

impl FieldName {
    pub(crate) const fn new(name: &'static str) -> Self {
        Self(name)
    }

    fn as_str(&self) -> &str {
        self.0
    }
}

pub(crate) const USER_ID: FieldName = FieldName::new("userID");
pub(crate) const BICYCLE_ID: FieldName = FieldName::new("bicycleID");
pub(crate) const RENTAL_ID: FieldName = FieldName::new("rentalID");

fn field_error(field: FieldName, message: impl Into<String>, code: ErrorCode) -> Error {
    Error::invalid_request(message).with_details(json!({
        "field": field.as_str(),
        "code": code.as_str(),
    }))
}

pub(crate) fn missing_field_error(field: FieldName) -> Error {
    let name = field.as_str();
    field_error(
        field,
        format!("missing required field: {name}"),
        ErrorCode::MissingField,
    )
}

/// Unwrap an optional body field or report it as missing.
pub(crate) fn require<T>(value: Option<T>, field: FieldName) -> Result<T, Error> {
    value.ok_or_else(|| missing_field_error(field))
}

/// Report a domain validation failure against a request field.
pub(crate) fn invalid_field(field: FieldName, err: impl Display) -> Error {
    field_error(field, err.to_string(), ErrorCode::InvalidValue)
}

fn invalid_uuid_error(field: FieldName, value: &str) -> Error {
    let name = field.as_str();
    Error::invalid_request(format!("{name} must be a valid UUID")).with_details(json!({
        "field": name,
        "value": value,
        "code": ErrorCode::InvalidUuid.as_str(),
    }))
}

pub(crate) fn parse_user_id(value: Option<String>) -> Result<UserId, Error> {
    let raw = require(value, USER_ID)?;
    UserId::new(&raw).map_err(|_| invalid_uuid_error(USER_ID, &raw))
}

pub(crate) fn parse_bicycle_id(value: Option<String>) -> Result<BicycleId, Error> {
    let raw = require(value, BICYCLE_ID)?;
    BicycleId::new(&raw).map_err(|_| invalid_uuid_error(BICYCLE_ID, &raw))
}

pub(crate) fn parse_rental_id(value: Option<String>) -> Result<RentalId, Error> {
    let raw = require(value, RENTAL_ID)?;
    RentalId::new(&raw).map_err(|_| invalid_uuid_error(RENTAL_ID, &raw))
}

/// Parse an ISO `YYYY-MM-DD` calendar date.
pub(crate) fn parse_iso_date(value: Option<String>, field: FieldName) -> Result<NaiveDate, Error> {
    let raw = require(value, field)?;
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").map_err(|_| {
        let name = field.as_str();
        Error::invalid_request(format!("{name} must be a date in YYYY-MM-DD form")).with_details(
            json!({
                "field": name,
                "value": raw,
                "code": ErrorCode::InvalidDate.as_str(),
            }),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::Value;

    fn detail<'a>(error: &'a Error, key: &str) -> Option<&'a str> {
        error.details().and_then(|d| d.get(key)).and_then(Value::as_str)
    }

    #[rstest]
    fn missing_user_id_names_the_field() {
        let err = parse_user_id(None).expect_err("missing id");

        assert_eq!(err.message(), "missing required field: userID");
        assert_eq!(detail(&err, "field"), Some("userID"));
        assert_eq!(detail(&err, "code"), Some("missing_field"));
    }

    #[rstest]
    fn malformed_bicycle_id_echoes_the_value() {
        let err = parse_bicycle_id(Some("bike-7".to_owned())).expect_err("bad id");

        assert_eq!(detail(&err, "value"), Some("bike-7"));
        assert_eq!(detail(&err, "code"), Some("invalid_uuid"));
    }

    #[rstest]
    fn valid_rental_id_parses() {
        let id = RentalId::random();
        assert_eq!(parse_rental_id(Some(id.to_string())), Ok(id));
    }

    #[rstest]
    #[case("1990-02-28", true)]
    #[case(" 2000-12-31 ", true)]
    #[case("28/02/1990", false)]
    #[case("1990-02-30", false)]
    fn iso_dates(#[case] raw: &str, #[case] ok: bool) {
        let field = FieldName::new("DOB");
        assert_eq!(parse_iso_date(Some(raw.to_owned()), field).is_ok(), ok);
    }
}
