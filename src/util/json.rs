//! Field accessors for decoded JSON payloads.
//!
//! The platform omits fields it considers obvious and this client refuses to
//! guess, so every lookup is explicit about which field was missing.

use serde_json::Value;

use crate::error::{Error, Result};

/// Get a field, failing with the field name if it is absent.
pub fn field<'a>(data: &'a Value, name: &'static str) -> Result<&'a Value> {
    data.get(name).ok_or(Error::MalformedPayload(name))
}

pub fn str_field<'a>(data: &'a Value, name: &'static str) -> Result<&'a str> {
    field(data, name)?
        .as_str()
        .ok_or(Error::MalformedPayload(name))
}

pub fn int_field(data: &Value, name: &'static str) -> Result<i64> {
    field(data, name)?
        .as_i64()
        .ok_or(Error::MalformedPayload(name))
}

pub fn bool_field(data: &Value, name: &'static str) -> Result<bool> {
    field(data, name)?
        .as_bool()
        .ok_or(Error::MalformedPayload(name))
}

pub fn array_field<'a>(data: &'a Value, name: &'static str) -> Result<&'a [Value]> {
    field(data, name)?
        .as_array()
        .map(Vec::as_slice)
        .ok_or(Error::MalformedPayload(name))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_present_fields() {
        let data = json!({"id": "42", "level": 3, "open": true, "items": []});

        assert_eq!(str_field(&data, "id").unwrap(), "42");
        assert_eq!(int_field(&data, "level").unwrap(), 3);
        assert!(bool_field(&data, "open").unwrap());
        assert!(array_field(&data, "items").unwrap().is_empty());
    }

    #[test]
    fn test_missing_field_names_the_field() {
        let data = json!({"id": "42"});

        let err = int_field(&data, "level").unwrap_err();
        assert!(matches!(err, Error::MalformedPayload("level")));
    }

    #[test]
    fn test_wrong_type_is_malformed() {
        let data = json!({"id": 42});

        assert!(str_field(&data, "id").is_err());
    }
}
