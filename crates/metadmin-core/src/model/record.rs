// ── Generic records ──
//
// Views never know an entity's concrete shape. A record is its primary
// key plus every other field as raw JSON, in backend order.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::entity_id::EntityId;

/// Field name of every entity's primary key.
pub const ID_FIELD: &str = "id";

/// Anything with a primary key.
pub trait HasId {
    fn id(&self) -> &EntityId;
}

/// Field values submitted from a form, keyed by field name.
pub type FormValues = Map<String, Value>;

/// One backend record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub id: EntityId,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Record {
    pub fn new(id: impl Into<EntityId>) -> Self {
        Self {
            id: id.into(),
            fields: Map::new(),
        }
    }

    /// Builder-style field setter.
    #[must_use]
    pub fn with(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.fields.insert(field.to_owned(), value.into());
        self
    }

    /// Value of `field`, with `id` answered from the primary key.
    pub fn value(&self, field: &str) -> Option<Value> {
        if field == ID_FIELD {
            Some(self.id.to_json())
        } else {
            self.fields.get(field).cloned()
        }
    }

    /// The record as a flat JSON object, id first.
    pub fn to_values(&self) -> FormValues {
        let mut out = Map::with_capacity(self.fields.len() + 1);
        out.insert(ID_FIELD.to_owned(), self.id.to_json());
        for (k, v) in &self.fields {
            out.insert(k.clone(), v.clone());
        }
        out
    }
}

impl HasId for Record {
    fn id(&self) -> &EntityId {
        &self.id
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn flattens_non_id_fields() {
        let record: Record =
            serde_json::from_value(json!({"id": "u1", "email": "a@x.com", "name": "A"})).unwrap();
        assert_eq!(record.id, EntityId::from("u1"));
        assert_eq!(record.fields.len(), 2);
        assert_eq!(record.value("email"), Some(json!("a@x.com")));
        assert_eq!(record.value("id"), Some(json!("u1")));
        assert_eq!(record.value("missing"), None);
    }

    #[test]
    fn to_values_puts_id_first() {
        let record = Record::new("u1").with("email", "a@x.com");
        let keys: Vec<_> = record.to_values().keys().cloned().collect();
        assert_eq!(keys, vec!["id", "email"]);
    }
}
