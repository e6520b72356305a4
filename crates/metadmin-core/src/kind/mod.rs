// ── Field kind registry ──
//
// Every field kind maps to a fixed set of behaviors: how to label a
// field, which widget displays a value, which widget edits one, and how
// to validate input. The set of kinds is closed; metadata that names an
// unregistered kind fails at load time instead of at render time.

mod validate;
mod widget;

use std::str::FromStr;

use convert_case::{Case, Casing};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use strum::{Display, EnumIter, EnumString, IntoStaticStr};

use crate::entity::{EntityInfo, FieldInfo};
use crate::error::CoreError;

pub use validate::validate_value;
pub use widget::{DisplayField, DisplayWidget, EditorField, EditorWidget};

/// Registered field kind names.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Display,
    EnumString,
    EnumIter,
    IntoStaticStr,
    Serialize,
    Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum FieldKindName {
    #[strum(to_string = "string", serialize = "text")]
    String,
    #[strum(to_string = "email")]
    Email,
    #[strum(to_string = "uuid", serialize = "id")]
    Uuid,
    #[strum(to_string = "foreign_key", serialize = "reference")]
    ForeignKey,
    #[strum(to_string = "integer", serialize = "int")]
    Integer,
    #[strum(to_string = "number", serialize = "float")]
    Number,
    #[strum(to_string = "boolean", serialize = "bool")]
    Boolean,
    #[strum(to_string = "date")]
    Date,
    #[strum(to_string = "timestamp", serialize = "datetime")]
    Timestamp,
    #[strum(to_string = "enum")]
    Enum,
    #[strum(to_string = "nested", serialize = "object")]
    Nested,
}

type LabelFn = fn(&FieldInfo) -> String;
type DisplayFn = fn(&FieldInfo, &EntityInfo) -> DisplayWidget;
type EditorFn = fn(&FieldInfo) -> EditorWidget;
type ValidateFn = fn(&FieldInfo, &Value) -> Result<(), String>;

/// Behavior bundle for one field kind.
pub struct FieldKind {
    name: FieldKindName,
    label: LabelFn,
    display: DisplayFn,
    editor: EditorFn,
    validate: ValidateFn,
}

impl FieldKind {
    pub fn name(&self) -> FieldKindName {
        self.name
    }

    /// Explicit label if the field has one, else the kind's default.
    pub fn label(&self, field: &FieldInfo) -> String {
        field.label.clone().unwrap_or_else(|| (self.label)(field))
    }

    /// Widget that displays a value of this field inside `entity`.
    pub fn display_component(&self, field: &FieldInfo, entity: &EntityInfo) -> DisplayWidget {
        (self.display)(field, entity)
    }

    pub fn editor_component(&self, field: &FieldInfo) -> EditorWidget {
        (self.editor)(field)
    }

    /// Check a non-empty value. Requiredness is handled by
    /// [`validate_value`].
    pub fn validate(&self, field: &FieldInfo, value: &Value) -> Result<(), String> {
        (self.validate)(field, value)
    }
}

impl std::fmt::Debug for FieldKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FieldKind").field("name", &self.name).finish_non_exhaustive()
    }
}

// ── Registry ────────────────────────────────────────────────────────

/// Resolve a kind by its metadata name.
pub fn resolve(name: &str) -> Result<&'static FieldKind, CoreError> {
    FieldKindName::from_str(name)
        .map(kind)
        .map_err(|_| CoreError::UnknownFieldKind {
            name: name.to_owned(),
        })
}

/// The behavior bundle for a registered kind.
pub fn kind(name: FieldKindName) -> &'static FieldKind {
    match name {
        FieldKindName::String => &STRING,
        FieldKindName::Email => &EMAIL,
        FieldKindName::Uuid => &UUID,
        FieldKindName::ForeignKey => &FOREIGN_KEY,
        FieldKindName::Integer => &INTEGER,
        FieldKindName::Number => &NUMBER,
        FieldKindName::Boolean => &BOOLEAN,
        FieldKindName::Date => &DATE,
        FieldKindName::Timestamp => &TIMESTAMP,
        FieldKindName::Enum => &ENUM,
        FieldKindName::Nested => &NESTED,
    }
}

static STRING: FieldKind = FieldKind {
    name: FieldKindName::String,
    label: default_label,
    display: |_, _| DisplayWidget::Text,
    editor: |_| EditorWidget::TextInput,
    validate: validate::string,
};

static EMAIL: FieldKind = FieldKind {
    name: FieldKindName::Email,
    label: default_label,
    display: |_, _| DisplayWidget::Email,
    editor: |_| EditorWidget::EmailInput,
    validate: validate::email,
};

static UUID: FieldKind = FieldKind {
    name: FieldKindName::Uuid,
    label: uuid_label,
    display: uuid_display,
    editor: |_| EditorWidget::UuidInput,
    validate: validate::uuid,
};

static FOREIGN_KEY: FieldKind = FieldKind {
    name: FieldKindName::ForeignKey,
    label: default_label,
    display: |field, _| match field.entity_ref() {
        Some(target) => DisplayWidget::Link {
            service: target.service.clone(),
            entity: target.entity.clone(),
        },
        None => DisplayWidget::Code,
    },
    editor: |field| match field.entity_ref() {
        Some(target) => EditorWidget::ReferencePicker {
            service: target.service.clone(),
            entity: target.entity.clone(),
        },
        None => EditorWidget::UuidInput,
    },
    validate: validate::reference,
};

static INTEGER: FieldKind = FieldKind {
    name: FieldKindName::Integer,
    label: default_label,
    display: |_, _| DisplayWidget::Number,
    editor: |_| EditorWidget::IntegerInput,
    validate: validate::integer,
};

static NUMBER: FieldKind = FieldKind {
    name: FieldKindName::Number,
    label: default_label,
    display: |_, _| DisplayWidget::Number,
    editor: |_| EditorWidget::NumberInput,
    validate: validate::number,
};

static BOOLEAN: FieldKind = FieldKind {
    name: FieldKindName::Boolean,
    label: default_label,
    display: |_, _| DisplayWidget::Boolean,
    editor: |_| EditorWidget::Checkbox,
    validate: validate::boolean,
};

static DATE: FieldKind = FieldKind {
    name: FieldKindName::Date,
    label: default_label,
    display: |_, _| DisplayWidget::Date,
    editor: |_| EditorWidget::DatePicker,
    validate: validate::date,
};

static TIMESTAMP: FieldKind = FieldKind {
    name: FieldKindName::Timestamp,
    label: default_label,
    display: |_, _| DisplayWidget::Timestamp,
    editor: |_| EditorWidget::DateTimePicker,
    validate: validate::timestamp,
};

static ENUM: FieldKind = FieldKind {
    name: FieldKindName::Enum,
    label: default_label,
    display: |_, _| DisplayWidget::Badge,
    editor: |field| EditorWidget::Select {
        options: field.enum_values().map(<[String]>::to_vec).unwrap_or_default(),
    },
    validate: validate::one_of,
};

static NESTED: FieldKind = FieldKind {
    name: FieldKindName::Nested,
    label: default_label,
    display: nested_display,
    editor: |field| EditorWidget::Group {
        fields: field
            .object_type()
            .map(|t| t.fields.values().map(EditorField::for_field).collect())
            .unwrap_or_default(),
    },
    validate: validate::object,
};

// ── Shared behaviors ────────────────────────────────────────────────

fn default_label(field: &FieldInfo) -> String {
    field.name.to_case(Case::Title)
}

fn uuid_label(field: &FieldInfo) -> String {
    if field.is_primary_key() {
        "ID".to_owned()
    } else {
        default_label(field)
    }
}

/// The primary key links to the record's own detail page.
fn uuid_display(field: &FieldInfo, entity: &EntityInfo) -> DisplayWidget {
    if field.is_primary_key() {
        DisplayWidget::Link {
            service: entity.service_name().to_owned(),
            entity: entity.name().to_owned(),
        }
    } else {
        DisplayWidget::Code
    }
}

fn nested_display(field: &FieldInfo, entity: &EntityInfo) -> DisplayWidget {
    let fields = field
        .object_type()
        .map(|t| {
            t.fields
                .values()
                .map(|sub| DisplayField {
                    name: sub.name.clone(),
                    label: sub.label(),
                    widget: sub.kind().display_component(sub, entity),
                })
                .collect()
        })
        .unwrap_or_default();
    DisplayWidget::Object { fields }
}
