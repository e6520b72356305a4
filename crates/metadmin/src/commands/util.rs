//! Shared helpers for command handlers.

use std::path::Path;

use serde_json::Value;

use metadmin_core::{EditorField, EntityInfo, FormValues, QueryParams};

use crate::cli::ValueArgs;
use crate::error::CliError;

/// Split `key=value`, rejecting a missing `=` or an empty key.
pub fn split_pair<'a>(raw: &'a str, flag: &str) -> Result<(&'a str, &'a str), CliError> {
    match raw.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => Ok((key.trim(), value)),
        _ => Err(CliError::Validation {
            field: flag.into(),
            reason: format!("expected KEY=VALUE, got '{raw}'"),
        }),
    }
}

/// Filter parameters from `--param` flags.
///
/// Values are taken as JSON when they parse (`tags=["a","b"]`, `n=3`)
/// and as plain strings otherwise (`status=active`).
pub fn parse_params(raw: &[String]) -> Result<Option<QueryParams>, CliError> {
    if raw.is_empty() {
        return Ok(None);
    }
    let mut params = QueryParams::new();
    for pair in raw {
        let (key, value) = split_pair(pair, "param")?;
        let value = serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_owned()));
        params.insert(key.to_owned(), value);
    }
    Ok(Some(params))
}

/// Form values from `--from-file` then `--set`, later values winning.
///
/// `--set` text goes through the field's editor so numbers, booleans,
/// and nested objects arrive typed. Unknown names pass through untouched
/// for form validation to report.
pub fn collect_values(entity: &EntityInfo, args: &ValueArgs) -> Result<FormValues, CliError> {
    let mut values = match args.from_file {
        Some(ref path) => read_object_file(path)?,
        None => FormValues::new(),
    };

    for pair in &args.set {
        let (name, raw) = split_pair(pair, "set")?;
        let value = entity.find_field(name).map_or_else(
            || Value::String(raw.to_owned()),
            |field| EditorField::for_field(field).widget.parse_input(raw),
        );
        values.insert(name.to_owned(), value);
    }
    Ok(values)
}

pub fn has_values(args: &ValueArgs) -> bool {
    !args.set.is_empty() || args.from_file.is_some()
}

/// Read and parse a JSON object file for `--from-file`.
pub fn read_object_file(path: &Path) -> Result<FormValues, CliError> {
    let contents = std::fs::read_to_string(path)?;
    match serde_json::from_str(&contents) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(CliError::Validation {
            field: "from-file".into(),
            reason: "expected a JSON object of field values".into(),
        }),
        Err(e) => Err(CliError::Validation {
            field: "from-file".into(),
            reason: format!("invalid JSON: {e}"),
        }),
    }
}

/// Display text for a raw JSON value: strings unquoted, null empty.
pub fn value_text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use metadmin_core::{FieldInfo, FieldKindName};
    use serde_json::json;

    fn user() -> EntityInfo {
        EntityInfo::new(
            "users",
            "user",
            [
                FieldInfo::new("email", FieldKindName::Email),
                FieldInfo::new("age", FieldKindName::Integer),
                FieldInfo::new("active", FieldKindName::Boolean),
            ],
        )
    }

    #[test]
    fn params_parse_json_or_fall_back_to_string() {
        let params = parse_params(&[
            "status=active".into(),
            r#"tags=["a","b"]"#.into(),
            "n=3".into(),
        ])
        .unwrap()
        .unwrap();
        assert_eq!(params["status"], json!("active"));
        assert_eq!(params["tags"], json!(["a", "b"]));
        assert_eq!(params["n"], json!(3));
    }

    #[test]
    fn no_params_means_default_list() {
        assert!(parse_params(&[]).unwrap().is_none());
    }

    #[test]
    fn malformed_pair_is_rejected() {
        assert!(matches!(
            parse_params(&["oops".into()]),
            Err(CliError::Validation { .. })
        ));
        assert!(split_pair("=x", "set").is_err());
    }

    #[test]
    fn set_values_are_typed_by_field_kind() {
        let args = ValueArgs {
            set: vec![
                "email=a@x.com".into(),
                "age=42".into(),
                "active=yes".into(),
                "nickname=al".into(),
            ],
            from_file: None,
        };
        let values = collect_values(&user(), &args).unwrap();
        assert_eq!(values["email"], json!("a@x.com"));
        assert_eq!(values["age"], json!(42));
        assert_eq!(values["active"], json!(true));
        assert_eq!(values["nickname"], json!("al"));
    }

    #[test]
    fn set_overrides_file_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("user.json");
        std::fs::write(&path, r#"{"email": "old@x.com", "age": 7}"#).unwrap();

        let args = ValueArgs {
            set: vec!["email=new@x.com".into()],
            from_file: Some(path),
        };
        let values = collect_values(&user(), &args).unwrap();
        assert_eq!(values["email"], json!("new@x.com"));
        assert_eq!(values["age"], json!(7));
    }

    #[test]
    fn file_must_hold_an_object() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("list.json");
        std::fs::write(&path, "[1, 2]").unwrap();
        assert!(read_object_file(&path).is_err());
    }

    #[test]
    fn value_text_unquotes_strings() {
        assert_eq!(value_text(Some(&json!("x"))), "x");
        assert_eq!(value_text(Some(&json!(3))), "3");
        assert_eq!(value_text(Some(&Value::Null)), "");
        assert_eq!(value_text(None), "");
    }
}
