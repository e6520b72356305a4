// Response envelope
//
// Every backend response body has the shape `{ data, error, status_code }`.
// A non-empty `error` is a logical failure even under HTTP 200.

use serde::Deserialize;

use crate::error::Error;

/// The fixed backend response wrapper.
#[derive(Debug, Deserialize)]
pub struct Envelope<T> {
    #[serde(default = "Option::default")]
    pub data: Option<T>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub status_code: Option<u16>,
}

impl<T> Envelope<T> {
    /// Strip the envelope: `Err` when `error` is non-empty, otherwise the
    /// (possibly absent) payload.
    pub fn into_result(self) -> Result<Option<T>, Error> {
        match self.error {
            Some(message) if !message.is_empty() => Err(Error::Envelope {
                message,
                status_code: self.status_code,
            }),
            _ => Ok(self.data),
        }
    }
}

/// Body shape used to pull a structured message out of a non-2xx response.
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    pub(crate) error: Option<String>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::{Value, json};

    #[test]
    fn data_without_error_is_ok() {
        let env: Envelope<Value> =
            serde_json::from_value(json!({"data": {"id": "x"}, "status_code": 200})).unwrap();
        assert_eq!(env.into_result().unwrap(), Some(json!({"id": "x"})));
    }

    #[test]
    fn error_under_success_is_failure() {
        let env: Envelope<Value> =
            serde_json::from_value(json!({"data": null, "error": "x", "status_code": 200}))
                .unwrap();
        match env.into_result() {
            Err(Error::Envelope {
                message,
                status_code,
            }) => {
                assert_eq!(message, "x");
                assert_eq!(status_code, Some(200));
            }
            other => panic!("expected envelope error, got {other:?}"),
        }
    }

    #[test]
    fn empty_error_string_is_not_a_failure() {
        let env: Envelope<Value> =
            serde_json::from_value(json!({"data": 1, "error": "", "status_code": 200})).unwrap();
        assert_eq!(env.into_result().unwrap(), Some(json!(1)));
    }

    #[test]
    fn missing_data_is_none() {
        let env: Envelope<Value> = serde_json::from_value(json!({"status_code": 200})).unwrap();
        assert!(env.into_result().unwrap().is_none());
    }
}
