// Per-kind input validation. Messages are fragments shown after the
// field label, e.g. "Email must be a valid email address".

use chrono::{DateTime, NaiveDate};
use serde_json::Value;
use uuid::Uuid;

use crate::entity::FieldInfo;

/// Validate one field value, including requiredness.
///
/// Null, absent, and blank strings count as empty.
pub fn validate_value(field: &FieldInfo, value: Option<&Value>) -> Result<(), String> {
    match value {
        None | Some(Value::Null) => empty(field),
        Some(Value::String(s)) if s.trim().is_empty() => empty(field),
        Some(v) => field.kind().validate(field, v),
    }
}

fn empty(field: &FieldInfo) -> Result<(), String> {
    if field.required {
        Err("is required".to_owned())
    } else {
        Ok(())
    }
}

fn as_str(value: &Value) -> Result<&str, String> {
    value.as_str().ok_or_else(|| "must be text".to_owned())
}

pub(super) fn string(_: &FieldInfo, value: &Value) -> Result<(), String> {
    as_str(value).map(|_| ())
}

pub(super) fn email(_: &FieldInfo, value: &Value) -> Result<(), String> {
    let s = as_str(value)?;
    match s.split_once('@') {
        Some((local, domain)) if !local.is_empty() && domain.contains('.') && !domain.contains('@') => {
            Ok(())
        }
        _ => Err("must be a valid email address".to_owned()),
    }
}

pub(super) fn uuid(_: &FieldInfo, value: &Value) -> Result<(), String> {
    Uuid::parse_str(as_str(value)?)
        .map(|_| ())
        .map_err(|_| "must be a UUID".to_owned())
}

pub(super) fn reference(_: &FieldInfo, value: &Value) -> Result<(), String> {
    as_str(value).map(|_| ())
}

pub(super) fn integer(_: &FieldInfo, value: &Value) -> Result<(), String> {
    if value.is_i64() || value.is_u64() {
        Ok(())
    } else {
        Err("must be a whole number".to_owned())
    }
}

pub(super) fn number(_: &FieldInfo, value: &Value) -> Result<(), String> {
    if value.is_number() {
        Ok(())
    } else {
        Err("must be a number".to_owned())
    }
}

pub(super) fn boolean(_: &FieldInfo, value: &Value) -> Result<(), String> {
    if value.is_boolean() {
        Ok(())
    } else {
        Err("must be true or false".to_owned())
    }
}

pub(super) fn date(_: &FieldInfo, value: &Value) -> Result<(), String> {
    NaiveDate::parse_from_str(as_str(value)?, "%Y-%m-%d")
        .map(|_| ())
        .map_err(|_| "must be a date (YYYY-MM-DD)".to_owned())
}

pub(super) fn timestamp(_: &FieldInfo, value: &Value) -> Result<(), String> {
    DateTime::parse_from_rfc3339(as_str(value)?)
        .map(|_| ())
        .map_err(|_| "must be an RFC 3339 timestamp".to_owned())
}

pub(super) fn one_of(field: &FieldInfo, value: &Value) -> Result<(), String> {
    let s = as_str(value)?;
    match field.enum_values() {
        Some(values) if !values.iter().any(|v| v == s) => {
            Err(format!("must be one of: {}", values.join(", ")))
        }
        _ => Ok(()),
    }
}

pub(super) fn object(field: &FieldInfo, value: &Value) -> Result<(), String> {
    let Some(map) = value.as_object() else {
        return Err("must be an object".to_owned());
    };
    let Some(shape) = field.object_type() else {
        return Ok(());
    };
    for sub in shape.fields.values() {
        validate_value(sub, map.get(&sub.name))
            .map_err(|msg| format!("{} {msg}", sub.label()))?;
    }
    Ok(())
}
