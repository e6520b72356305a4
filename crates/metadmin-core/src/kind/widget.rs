// ── Display and editor widgets ──
//
// Widgets are descriptions, not UI code. A front end matches on the
// variant to pick its own component; `render` gives a plain-text
// rendition for terminals and tests.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use serde_json::{Number, Value};

use crate::entity::FieldInfo;

/// How a field value is shown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "widget", rename_all = "snake_case")]
pub enum DisplayWidget {
    Text,
    /// Identifiers and other opaque strings.
    Code,
    Email,
    Number,
    Boolean,
    Date,
    Timestamp,
    /// Enum values.
    Badge,
    /// A value that identifies a record of `{service}/{entity}`.
    Link { service: String, entity: String },
    Object { fields: Vec<DisplayField> },
}

/// One sub-field of an [`DisplayWidget::Object`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DisplayField {
    pub name: String,
    pub label: String,
    pub widget: DisplayWidget,
}

impl DisplayWidget {
    /// Plain-text rendition of `value`. Absent and null render empty.
    pub fn render(&self, value: Option<&Value>) -> String {
        let Some(value) = value.filter(|v| !v.is_null()) else {
            return String::new();
        };
        match (self, value) {
            (Self::Boolean, Value::Bool(b)) => String::from(if *b { "Yes" } else { "No" }),
            (Self::Date, Value::String(s)) => render_date(s),
            (Self::Timestamp, Value::String(s)) => render_timestamp(s),
            (Self::Timestamp, Value::Number(n)) => n
                .as_i64()
                .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0))
                .map_or_else(|| n.to_string(), |dt| format_utc(&dt)),
            (Self::Object { fields }, Value::Object(map)) => fields
                .iter()
                .filter_map(|f| {
                    let rendered = f.widget.render(map.get(&f.name));
                    (!rendered.is_empty()).then(|| format!("{}: {rendered}", f.label))
                })
                .collect::<Vec<_>>()
                .join(", "),
            (_, Value::String(s)) => s.clone(),
            (_, other) => other.to_string(),
        }
    }

    /// Route to the referenced record, for link widgets.
    pub fn link_path(&self, value: Option<&Value>) -> Option<String> {
        match (self, value) {
            (Self::Link { service, entity }, Some(Value::String(id))) if !id.is_empty() => {
                Some(format!("/{service}/{entity}/{id}"))
            }
            _ => None,
        }
    }
}

fn render_date(raw: &str) -> String {
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return date.format("%Y-%m-%d").to_string();
    }
    DateTime::parse_from_rfc3339(raw)
        .map_or_else(|_| raw.to_owned(), |dt| dt.date_naive().format("%Y-%m-%d").to_string())
}

fn render_timestamp(raw: &str) -> String {
    DateTime::parse_from_rfc3339(raw)
        .map_or_else(|_| raw.to_owned(), |dt| format_utc(&dt.with_timezone(&Utc)))
}

fn format_utc(dt: &DateTime<Utc>) -> String {
    dt.format("%Y-%m-%d %H:%M:%S UTC").to_string()
}

// ── Editors ─────────────────────────────────────────────────────────

/// How a field value is entered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "widget", rename_all = "snake_case")]
pub enum EditorWidget {
    TextInput,
    EmailInput,
    UuidInput,
    /// Picks a record of `{service}/{entity}`.
    ReferencePicker { service: String, entity: String },
    IntegerInput,
    NumberInput,
    Checkbox,
    DatePicker,
    DateTimePicker,
    Select { options: Vec<String> },
    /// Inputs for the sub-fields of a nested value.
    Group { fields: Vec<EditorField> },
}

/// A labelled editor for one field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EditorField {
    pub name: String,
    pub label: String,
    pub required: bool,
    pub widget: EditorWidget,
}

impl EditorField {
    pub fn for_field(field: &FieldInfo) -> Self {
        Self {
            name: field.name.clone(),
            label: field.label(),
            required: field.required,
            widget: field.kind().editor_component(field),
        }
    }
}

impl EditorWidget {
    /// Convert raw text input into the JSON value this editor produces.
    ///
    /// Input that does not parse is kept as a string so validation can
    /// report it against the field.
    pub fn parse_input(&self, raw: &str) -> Value {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Value::Null;
        }
        match self {
            Self::IntegerInput => trimmed
                .parse::<i64>()
                .map_or_else(|_| Value::String(raw.to_owned()), Value::from),
            Self::NumberInput => trimmed
                .parse::<f64>()
                .ok()
                .and_then(Number::from_f64)
                .map_or_else(|| Value::String(raw.to_owned()), Value::Number),
            Self::Checkbox => match trimmed.to_ascii_lowercase().as_str() {
                "true" | "yes" | "on" | "1" => Value::Bool(true),
                "false" | "no" | "off" | "0" => Value::Bool(false),
                _ => Value::String(raw.to_owned()),
            },
            Self::Group { .. } => serde_json::from_str(trimmed)
                .unwrap_or_else(|_| Value::String(raw.to_owned())),
            _ => Value::String(raw.to_owned()),
        }
    }
}
