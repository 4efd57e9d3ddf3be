//! Tri-state field parsing for partial updates
//!
//! A partial-update body is a JSON object whose keys are a subset of the
//! updatable fields. Each key is parsed into a [`FieldPatch`]:
//!
//! | Input                      | Result              |
//! |----------------------------|---------------------|
//! | key absent                 | `Unchanged`         |
//! | `null` or `""`             | `Clear`             |
//! | any other accepted value   | `Set(value)`        |
//!
//! Two rules deviate from that table:
//!
//! - Required columns (`username`, `mail`, `title`, `status`) cannot be
//!   cleared; see [`required`].
//! - A blank password means "keep the current password"; see [`password`].
//!
//! The parsers take the raw `Option<&Value>` from the body so that a missing
//! key and an explicit `null` stay distinguishable.

use crate::error::{StoreError, StoreResult};
use chrono::{DateTime, NaiveDate};
use serde_json::Value;
use std::str::FromStr;

/// Date format accepted for `birth` and `due_date`
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// One field of a partial update
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum FieldPatch<T> {
    /// Key was not supplied; leave the column alone
    #[default]
    Unchanged,

    /// Key was supplied empty; set the column to NULL
    Clear,

    /// Key was supplied with a value
    Set(T),
}

impl<T> FieldPatch<T> {
    /// Collapses the patch into a nullable value, as used by inserts
    ///
    /// `Unchanged` and `Clear` both become `None`.
    pub fn into_option(self) -> Option<T> {
        match self {
            FieldPatch::Set(value) => Some(value),
            FieldPatch::Unchanged | FieldPatch::Clear => None,
        }
    }
}

/// Shared shape of every parser: absent, empty, or a value handed to `parse`
fn parse_with<T>(
    field: &str,
    raw: Option<&Value>,
    parse: impl FnOnce(&Value) -> Result<T, String>,
) -> StoreResult<FieldPatch<T>> {
    match raw {
        None => Ok(FieldPatch::Unchanged),
        Some(Value::Null) => Ok(FieldPatch::Clear),
        Some(Value::String(s)) if s.is_empty() => Ok(FieldPatch::Clear),
        Some(value) => parse(value)
            .map(FieldPatch::Set)
            .map_err(|message| StoreError::validation(field, message)),
    }
}

/// Parses a nullable text field
pub fn text(field: &str, raw: Option<&Value>) -> StoreResult<FieldPatch<String>> {
    parse_with(field, raw, |value| match value {
        Value::String(s) => Ok(s.clone()),
        _ => Err(format!("{} must be a string", field)),
    })
}

/// Parses a non-negative integer field
///
/// Accepts a JSON integer or a string holding one (form inputs arrive as
/// strings). Fractions, negative numbers and anything non-numeric are rejected.
pub fn integer(field: &str, raw: Option<&Value>) -> StoreResult<FieldPatch<i32>> {
    parse_with(field, raw, |value| {
        let parsed = match value {
            Value::Number(n) => n.as_i64(),
            Value::String(s) => s.trim().parse::<i64>().ok(),
            _ => None,
        };

        let number = parsed.ok_or_else(|| format!("{} must be a number", field))?;
        if number < 0 {
            return Err(format!("{} must be zero or greater", field));
        }
        i32::try_from(number).map_err(|_| format!("{} is too large", field))
    })
}

/// Parses a date field
///
/// Accepts `YYYY-MM-DD`, or an RFC 3339 timestamp whose date part is used.
pub fn date(field: &str, raw: Option<&Value>) -> StoreResult<FieldPatch<NaiveDate>> {
    parse_with(field, raw, |value| {
        let s = value
            .as_str()
            .ok_or_else(|| format!("{} must be a date string", field))?;

        NaiveDate::parse_from_str(s.trim(), DATE_FORMAT)
            .or_else(|_| DateTime::parse_from_rfc3339(s.trim()).map(|dt| dt.date_naive()))
            .map_err(|_| format!("{} must be a date in YYYY-MM-DD format", field))
    })
}

/// Parses a field whose value must match one of a fixed set of names
pub fn enumerated<T: FromStr>(field: &str, raw: Option<&Value>) -> StoreResult<FieldPatch<T>> {
    parse_with(field, raw, |value| {
        value
            .as_str()
            .and_then(|s| T::from_str(s).ok())
            .ok_or_else(|| format!("{} has an unsupported value", field))
    })
}

/// Parses the password field
///
/// Only a value that is non-empty after trimming changes the password.
/// Empty, whitespace-only and `null` all mean "leave it as it is"; a
/// password is never cleared through an update.
pub fn password(raw: Option<&Value>) -> StoreResult<FieldPatch<String>> {
    match raw {
        None | Some(Value::Null) => Ok(FieldPatch::Unchanged),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(FieldPatch::Unchanged),
        Some(Value::String(s)) => Ok(FieldPatch::Set(s.clone())),
        Some(_) => Err(StoreError::validation("password", "password must be a string")),
    }
}

/// Rejects `Clear` for a column that cannot hold NULL
pub fn required<T>(field: &str, patch: FieldPatch<T>) -> StoreResult<FieldPatch<T>> {
    match patch {
        FieldPatch::Clear => Err(StoreError::validation(
            field,
            format!("{} cannot be empty", field),
        )),
        other => Ok(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_absent_key_is_unchanged() {
        assert_eq!(text("gender", None).unwrap(), FieldPatch::Unchanged);
        assert_eq!(integer("age", None).unwrap(), FieldPatch::Unchanged);
        assert_eq!(date("birth", None).unwrap(), FieldPatch::Unchanged);
    }

    #[test]
    fn test_empty_string_and_null_clear() {
        assert_eq!(text("gender", Some(&json!(""))).unwrap(), FieldPatch::Clear);
        assert_eq!(text("gender", Some(&json!(null))).unwrap(), FieldPatch::Clear);
        assert_eq!(integer("age", Some(&json!(""))).unwrap(), FieldPatch::Clear);
        assert_eq!(date("birth", Some(&json!(null))).unwrap(), FieldPatch::Clear);
    }

    #[test]
    fn test_text_value_is_kept_verbatim() {
        assert_eq!(
            text("addr", Some(&json!(" 1 Main St "))).unwrap(),
            FieldPatch::Set(" 1 Main St ".to_string())
        );
        assert!(text("addr", Some(&json!(42))).is_err());
    }

    #[test]
    fn test_integer_coercion() {
        assert_eq!(integer("age", Some(&json!(5))).unwrap(), FieldPatch::Set(5));
        assert_eq!(integer("age", Some(&json!("7"))).unwrap(), FieldPatch::Set(7));
        assert_eq!(integer("age", Some(&json!(" 12 "))).unwrap(), FieldPatch::Set(12));
    }

    #[test]
    fn test_integer_rejects_non_numeric() {
        let err = integer("age", Some(&json!("abc"))).unwrap_err();
        assert!(matches!(err, StoreError::Validation { ref field, .. } if field == "age"));

        assert!(integer("age", Some(&json!(4.5))).is_err());
        assert!(integer("age", Some(&json!(true))).is_err());
        assert!(integer("age", Some(&json!(-1))).is_err());
        assert!(integer("age", Some(&json!(10_000_000_000i64))).is_err());
    }

    #[test]
    fn test_date_formats() {
        let expected = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        assert_eq!(
            date("due_date", Some(&json!("2024-05-01"))).unwrap(),
            FieldPatch::Set(expected)
        );
        assert_eq!(
            date("due_date", Some(&json!("2024-05-01T00:00:00Z"))).unwrap(),
            FieldPatch::Set(expected)
        );
        assert!(date("due_date", Some(&json!("05/01/2024"))).is_err());
        assert!(date("due_date", Some(&json!(20240501))).is_err());
    }

    #[test]
    fn test_blank_password_is_unchanged() {
        assert_eq!(password(None).unwrap(), FieldPatch::Unchanged);
        assert_eq!(password(Some(&json!(""))).unwrap(), FieldPatch::Unchanged);
        assert_eq!(password(Some(&json!("   "))).unwrap(), FieldPatch::Unchanged);
        assert_eq!(password(Some(&json!(null))).unwrap(), FieldPatch::Unchanged);
        assert_eq!(
            password(Some(&json!("s3cret"))).unwrap(),
            FieldPatch::Set("s3cret".to_string())
        );
    }

    #[test]
    fn test_required_rejects_clearing() {
        assert!(required::<String>("username", FieldPatch::Clear).is_err());
        assert_eq!(
            required::<String>("username", FieldPatch::Unchanged).unwrap(),
            FieldPatch::Unchanged
        );
        assert_eq!(
            required("username", FieldPatch::Set("bob".to_string())).unwrap(),
            FieldPatch::Set("bob".to_string())
        );
    }

    #[test]
    fn test_into_option() {
        assert_eq!(FieldPatch::Set(3).into_option(), Some(3));
        assert_eq!(FieldPatch::<i32>::Clear.into_option(), None);
        assert_eq!(FieldPatch::<i32>::Unchanged.into_option(), None);
    }
}
