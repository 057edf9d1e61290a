//! Shared validation helpers for inbound HTTP adapters.

use chrono::NaiveDate;
use serde_json::json;

use crate::domain::Error;

/// Validation error codes for HTTP request failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ErrorCode {
    MissingField,
    InvalidDate,
    InvalidHour,
}

impl ErrorCode {
    fn as_str(self) -> &'static str {
        match self {
            ErrorCode::MissingField => "missing_field",
            ErrorCode::InvalidDate => "invalid_date",
            ErrorCode::InvalidHour => "invalid_hour",
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

struct ValidationError {
    field: String,
    message: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }

    fn with_code(self, code: ErrorCode) -> Error {
        Error::invalid_request(self.message).with_details(json!({
            "field": self.field,
            "code": code.as_str(),
        }))
    }

    fn with_value(self, code: ErrorCode, value: impl Into<String>) -> Error {
        Error::invalid_request(self.message).with_details(json!({
            "field": self.field,
            "value": value.into(),
            "code": code.as_str(),
        }))
    }
}

pub(crate) fn missing_field_error(field: FieldName) -> Error {
    let field = field.as_str();
    ValidationError::new(field, format!("missing required field: {field}"))
        .with_code(ErrorCode::MissingField)
}

pub(crate) fn invalid_date_error(field: FieldName, value: &str) -> Error {
    let field = field.as_str();
    ValidationError::new(field, format!("{field} must be a YYYY-MM-DD calendar date"))
        .with_value(ErrorCode::InvalidDate, value)
}

/// Parse a `YYYY-MM-DD` calendar date field.
pub(crate) fn parse_date(value: &str, field: FieldName) -> Result<NaiveDate, Error> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|_| invalid_date_error(field, value))
}

/// Validate an hour-of-day field.
pub(crate) fn parse_hour(value: u32, field: FieldName) -> Result<u8, Error> {
    if value > 23 {
        let field = field.as_str();
        return Err(
            ValidationError::new(field, format!("{field} must be an hour between 0 and 23"))
                .with_value(ErrorCode::InvalidHour, value.to_string()),
        );
    }
    // Bounds checked above.
    Ok(value as u8)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn parses_calendar_dates() {
        let parsed = parse_date("2026-03-16", FieldName::new("date")).expect("valid date");
        assert_eq!(parsed, NaiveDate::from_ymd_opt(2026, 3, 16).expect("date"));
    }

    #[rstest]
    #[case("2026-3-16x")]
    #[case("16/03/2026")]
    #[case("2026-13-01")]
    #[case("")]
    fn rejects_malformed_dates(#[case] raw: &str) {
        let error = parse_date(raw, FieldName::new("date")).expect_err("rejected");
        assert_eq!(
            error.details().and_then(|d| d.get("code")),
            Some(&serde_json::json!("invalid_date"))
        );
    }

    #[rstest]
    #[case(0, true)]
    #[case(23, true)]
    #[case(24, false)]
    #[case(99, false)]
    fn bounds_check_hours(#[case] raw: u32, #[case] ok: bool) {
        assert_eq!(parse_hour(raw, FieldName::new("hour")).is_ok(), ok);
    }
}
