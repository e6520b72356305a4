// Add / Edit templates: one input per editable field, validated on
// submit, then create or update and redirect to the detail route.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use super::{NO_DATA_MESSAGE, View};
use crate::entity::EntityInfo;
use crate::error::CoreError;
use crate::kind::{EditorField, validate_value};
use crate::model::{EntityId, FormValues, ID_FIELD, Record};
use crate::request::{DataAccess, FetchConfig, Request, RequestState, update_body};

/// One form input, pre-filled for edits.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormInput {
    #[serde(flatten)]
    pub editor: EditorField,
    pub value: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormView {
    pub title: String,
    pub submit_label: String,
    pub inputs: Vec<FormInput>,
}

impl FormView {
    /// Pre-filled input values. An edit that only changes some fields
    /// is laid over these so the update carries the whole record.
    pub fn values(&self) -> FormValues {
        self.inputs
            .iter()
            .filter_map(|input| match input.value {
                Some(Value::Null) | None => None,
                Some(ref value) => Some((input.editor.name.clone(), value.clone())),
            })
            .collect()
    }
}

/// A validation failure on one field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Result of a form submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Saved; navigate to this detail path.
    Redirect(String),
    /// Rejected before any request was issued.
    Invalid(Vec<FieldError>),
    /// The backend call failed.
    Failed(String),
}

/// Check submitted values against the descriptor.
///
/// Read-only fields and names that are not fields are rejected; every
/// editable field is run through its kind's validation.
pub fn validate_form(entity: &EntityInfo, values: &FormValues) -> Vec<FieldError> {
    let mut errors = Vec::new();

    for name in values.keys() {
        match entity.find_field(name) {
            None => errors.push(FieldError {
                field: name.clone(),
                message: format!(
                    "'{name}' is not a field of {}",
                    entity.entity_name_formatted()
                ),
            }),
            Some(field) if field.read_only => errors.push(FieldError {
                field: name.clone(),
                message: format!("{} is read-only", field.label()),
            }),
            Some(_) => {}
        }
    }

    for field in entity.fields().filter(|f| !f.read_only) {
        if let Err(msg) = validate_value(field, values.get(&field.name)) {
            errors.push(FieldError {
                field: field.name.clone(),
                message: format!("{} {msg}", field.label()),
            });
        }
    }

    errors
}

fn inputs(entity: &EntityInfo, record: Option<&Record>) -> Vec<FormInput> {
    entity
        .fields()
        .filter(|f| !f.read_only)
        .map(|field| FormInput {
            editor: EditorField::for_field(field),
            value: record.and_then(|r| r.value(&field.name)),
        })
        .collect()
}

// ── Add ─────────────────────────────────────────────────────────────

/// Create form for one entity.
#[derive(Debug)]
pub struct AddView {
    entity: Arc<EntityInfo>,
    request: Request<Record>,
}

impl AddView {
    pub fn new(access: &DataAccess, entity: Arc<EntityInfo>) -> Self {
        let request = access.add(&entity);
        Self { entity, request }
    }

    pub fn request(&self) -> &Request<Record> {
        &self.request
    }

    pub fn form(&self) -> FormView {
        let formatted = self.entity.entity_name_formatted();
        FormView {
            title: format!("Add {formatted}"),
            submit_label: format!("Add {formatted}"),
            inputs: inputs(&self.entity, None),
        }
    }

    /// Validate, create, and redirect to the new record.
    pub async fn submit(&self, values: FormValues) -> SubmitOutcome {
        let errors = validate_form(&self.entity, &values);
        if !errors.is_empty() {
            return SubmitOutcome::Invalid(errors);
        }

        debug!(entity = %self.entity.path(), "submitting add form");
        let state = self
            .request
            .fetch(FetchConfig::body(Value::Object(values)))
            .await;
        outcome(state, |created| {
            created.map(|r| self.entity.detail_path(&r.id))
        })
    }
}

// ── Edit ────────────────────────────────────────────────────────────

/// Edit form for one record; pre-loads it first.
#[derive(Debug)]
pub struct EditView {
    entity: Arc<EntityInfo>,
    id: EntityId,
    load: Request<Record>,
    save: Request<Record>,
}

impl EditView {
    pub fn new(access: &DataAccess, entity: Arc<EntityInfo>, id: EntityId) -> Self {
        let load = access.get(&entity, &id);
        let save = access.update(&entity);
        Self {
            entity,
            id,
            load,
            save,
        }
    }

    pub fn id(&self) -> &EntityId {
        &self.id
    }

    /// The slot that loads the record being edited.
    pub fn request(&self) -> &Request<Record> {
        &self.load
    }

    pub fn save_request(&self) -> &Request<Record> {
        &self.save
    }

    /// Load the record and render the pre-filled form.
    pub async fn load(&self) -> View<FormView> {
        self.load.mount().await;
        self.render()
    }

    pub fn render(&self) -> View<FormView> {
        let built: Result<_, CoreError> =
            View::from_state(&self.load.state(), |record| Ok(self.form(record)));
        built.unwrap_or_else(|e| View::Error(e.user_message()))
    }

    fn form(&self, record: &Record) -> FormView {
        FormView {
            title: format!(
                "Edit {}: {}",
                self.entity.entity_name_formatted(),
                self.entity.human_name(record)
            ),
            submit_label: format!("Save {}", self.entity.entity_name_formatted()),
            inputs: inputs(&self.entity, Some(record)),
        }
    }

    /// Validate, update, and redirect to the record.
    ///
    /// The submitted id always comes from the loaded record, whatever
    /// `values` contains.
    pub async fn submit(&self, mut values: FormValues) -> SubmitOutcome {
        let Some(loaded) = self.load.state().data else {
            return SubmitOutcome::Failed(format!(
                "{} {} has not been loaded",
                self.entity.entity_name_formatted(),
                self.id
            ));
        };

        values.remove(ID_FIELD);
        let errors = validate_form(&self.entity, &values);
        if !errors.is_empty() {
            return SubmitOutcome::Invalid(errors);
        }

        let mut payload = FormValues::with_capacity(values.len() + 1);
        payload.insert(ID_FIELD.to_owned(), loaded.id.to_json());
        payload.extend(values);

        let body = match update_body(&payload) {
            Ok(body) => body,
            Err(e) => return SubmitOutcome::Failed(e.user_message()),
        };

        debug!(entity = %self.entity.path(), id = %loaded.id, "submitting edit form");
        let state = self.save.fetch(FetchConfig::body(body)).await;
        outcome(state, |_| Some(self.entity.detail_path(&loaded.id)))
    }
}

fn outcome(
    state: RequestState<Record>,
    redirect: impl FnOnce(Option<Record>) -> Option<String>,
) -> SubmitOutcome {
    if let Some(message) = state.error {
        return SubmitOutcome::Failed(message);
    }
    redirect(state.data).map_or_else(
        || SubmitOutcome::Failed(NO_DATA_MESSAGE.to_owned()),
        SubmitOutcome::Redirect,
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::entity::FieldInfo;
    use crate::kind::FieldKindName;
    use serde_json::json;

    fn user() -> EntityInfo {
        EntityInfo::new(
            "users",
            "user",
            [
                FieldInfo::new("email", FieldKindName::Email).required(),
                FieldInfo::new("age", FieldKindName::Integer),
                FieldInfo::new("created_at", FieldKindName::Timestamp).read_only(),
            ],
        )
    }

    fn values(v: Value) -> FormValues {
        match v {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn valid_values_pass() {
        assert!(validate_form(&user(), &values(json!({"email": "a@x.com", "age": 3}))).is_empty());
    }

    #[test]
    fn errors_are_reported_per_field() {
        let errors = validate_form(&user(), &values(json!({"age": "three", "nick": "z"})));
        let fields: Vec<_> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, ["nick", "email", "age"]);
        assert_eq!(errors[1].message, "Email is required");
        assert_eq!(errors[2].message, "Age must be a whole number");
    }

    #[test]
    fn read_only_fields_are_rejected_and_not_offered() {
        let errors = validate_form(
            &user(),
            &values(json!({"email": "a@x.com", "created_at": "2024-01-01T00:00:00Z"})),
        );
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].message, "Created At is read-only");

        let names: Vec<_> = inputs(&user(), None).into_iter().map(|i| i.editor.name).collect();
        assert_eq!(names, ["email", "age"]);
    }

    #[test]
    fn edit_inputs_are_prefilled() {
        let record = Record::new("u1").with("email", "old@x.com");
        let inputs = inputs(&user(), Some(&record));
        assert_eq!(inputs[0].value, Some(json!("old@x.com")));
        assert_eq!(inputs[1].value, None);
    }

    #[test]
    fn form_values_skip_empty_inputs() {
        let record = Record::new("u1")
            .with("email", "old@x.com")
            .with("age", Value::Null)
            .with("created_at", "2024-01-01T00:00:00Z");
        let form = FormView {
            title: String::new(),
            submit_label: String::new(),
            inputs: inputs(&user(), Some(&record)),
        };
        assert_eq!(Value::Object(form.values()), json!({"email": "old@x.com"}));
    }
}
