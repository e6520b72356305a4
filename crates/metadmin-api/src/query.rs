// Query string encoding
//
// Filter parameters can be nested objects, so every value is serialized
// to JSON on its own before standard form-urlencoding. A string value
// therefore travels quoted (`status=%22active%22`), an object travels as
// its JSON text (`req=%7B%22id%22%3A...%7D`).

use serde_json::{Map, Value};

use crate::error::Error;

/// Query parameters for a backend call: key -> arbitrary JSON value.
pub type QueryParams = Map<String, Value>;

/// JSON-encode each value of `params`, preserving key order.
///
/// The returned pairs are handed to `reqwest::RequestBuilder::query`,
/// which applies the percent-encoding.
pub fn encode_query(params: &QueryParams) -> Result<Vec<(String, String)>, Error> {
    params
        .iter()
        .map(|(key, value)| {
            serde_json::to_string(value)
                .map(|encoded| (key.clone(), encoded))
                .map_err(|source| Error::QueryEncoding {
                    key: key.clone(),
                    source,
                })
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn params(value: Value) -> QueryParams {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected an object"),
        }
    }

    #[test]
    fn each_value_is_independently_json() {
        let pairs = encode_query(&params(json!({"status": "active", "tags": ["a", "b"]}))).unwrap();

        assert_eq!(pairs.len(), 2);
        for (key, raw) in &pairs {
            let parsed: Value = serde_json::from_str(raw).unwrap();
            match key.as_str() {
                "status" => assert_eq!(parsed, json!("active")),
                "tags" => assert_eq!(parsed, json!(["a", "b"])),
                other => panic!("unexpected key {other}"),
            }
        }
    }

    #[test]
    fn nested_object_is_one_parameter() {
        let pairs = encode_query(&params(json!({"req": {"id": "abc"}}))).unwrap();
        assert_eq!(pairs, vec![("req".to_owned(), r#"{"id":"abc"}"#.to_owned())]);
    }

    #[test]
    fn survives_form_urlencoding_round_trip() {
        let pairs = encode_query(&params(json!({"q": "a b&c", "n": 3}))).unwrap();
        let encoded = url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(pairs.iter())
            .finish();

        let decoded: Vec<(String, String)> = url::form_urlencoded::parse(encoded.as_bytes())
            .into_owned()
            .collect();
        assert_eq!(decoded, pairs);
        assert_eq!(serde_json::from_str::<Value>(&decoded[0].1).unwrap(), json!("a b&c"));
    }

    #[test]
    fn empty_params_encode_to_nothing() {
        assert!(encode_query(&QueryParams::new()).unwrap().is_empty());
    }
}
